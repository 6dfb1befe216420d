//! CSS selectors and labels of the Airbnb listing and results pages.

/// Month pane currently visible in the availability calendar.
pub const VISIBLE_MONTH: &str = r#"div._ytfarf[data-visible="true"]"#;
pub const MONTH_TITLE: &str = "h3";
pub const DAY_ROWS: &str = "table._cvkwaj tbody tr";
pub const DAY_CELLS: &str = "td";

pub const NEXT_MONTH_LABEL: &str = "Move forward to switch to the next month.";
pub const PREVIOUS_MONTH_LABEL: &str = "Move backward to switch to the previous month.";
pub const CLEAR_DATES_TEXT: &str = "Clear dates";

pub const DATE_RANGE: &str = r#"[data-testid="availability-calendar-date-range"]"#;
/// Total price spans of the booking panel, most specific first.
pub const PRICE_CANDIDATES: [&str; 3] = [
    "button span.umg93v9",
    r#"div[aria-hidden="true"] span.umg93v9"#,
    "span.umuerxh",
];

pub const CHECK_IN_MARKER: &str = "check-in";
pub const MIN_NIGHTS_MARKER: &str = "night minimum";

pub const LISTING_CARD: &str = r#"[data-testid="card-container"]"#;
pub const LISTING_TITLE: &str = r#"[data-testid="listing-card-title"]"#;
pub const LISTING_LINK: &str = "a[href]";
