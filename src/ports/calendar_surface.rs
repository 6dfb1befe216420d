use async_trait::async_trait;

use crate::domain::calendar::DisplayedMonth;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Forward,
    Backward,
}

impl std::fmt::Display for NavDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "next"),
            Self::Backward => write!(f, "previous"),
        }
    }
}

/// Labels the booking panel shows once a stay is selected. Either may be
/// missing while the panel is still rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteLabels {
    pub date_range: Option<String>,
    pub total_price: Option<String>,
}

/// The interactive availability calendar of one listing page.
///
/// Every method is one round trip to the page; nothing here waits for the page
/// to settle.
#[async_trait]
pub trait CalendarSurface: Send + Sync {
    /// The month currently visible, or `SurfaceNotReady` when no month
    /// container or title is rendered.
    async fn read_month(&self) -> Result<DisplayedMonth>;

    /// Click the next/previous month control. `false` when it is missing or disabled.
    async fn click_navigation(&self, direction: NavDirection) -> Result<bool>;

    /// Click one day of the visible month. `false` when the cell is not an
    /// enabled button.
    async fn click_day(&self, week: usize, day: usize) -> Result<bool>;

    async fn read_quote_labels(&self) -> Result<QuoteLabels>;

    /// Click the "Clear dates" control. `false` when there is nothing to clear.
    async fn clear_dates(&self) -> Result<bool>;
}
