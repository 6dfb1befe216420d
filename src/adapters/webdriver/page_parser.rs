use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::adapters::webdriver::selectors;
use crate::domain::calendar::{CalendarWeek, DayCell, DisplayedMonth};
use crate::domain::listing::ListingRef;
use crate::error::{FlexstayError, Result};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| FlexstayError::SurfaceNotReady {
        reason: format!("invalid CSS selector '{css}': {e}"),
    })
}

/// Parse the visible month pane (its outer HTML) into a grid of day cells.
pub fn parse_displayed_month(html: &str) -> Result<DisplayedMonth> {
    let fragment = Html::parse_fragment(html);

    let title = fragment
        .select(&selector(selectors::MONTH_TITLE)?)
        .next()
        .map(|h| h.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| FlexstayError::SurfaceNotReady {
            reason: "month title not found".into(),
        })?;

    let cell_selector = selector(selectors::DAY_CELLS)?;
    let weeks = fragment
        .select(&selector(selectors::DAY_ROWS)?)
        .map(|row| CalendarWeek {
            cells: row.select(&cell_selector).map(parse_day_cell).collect(),
        })
        .collect();

    Ok(DisplayedMonth { title, weeks })
}

/// `None` for padding slots: no role and no day number.
fn parse_day_cell(td: ElementRef<'_>) -> Option<DayCell> {
    let attrs = td.value();
    let role = attrs.attr("role");
    if role.is_none() && td.text().all(|t| t.trim().is_empty()) {
        return None;
    }

    let label = attrs.attr("aria-label").unwrap_or_default().to_lowercase();
    Some(DayCell {
        selectable: role == Some("button") && attrs.attr("aria-disabled") == Some("false"),
        check_in: label.contains(selectors::CHECK_IN_MARKER),
        min_nights: parse_min_nights(&label),
    })
}

/// `"... 3 night minimum ..."` gives 3.
fn parse_min_nights(label: &str) -> Option<u32> {
    let end = label.find(selectors::MIN_NIGHTS_MARKER)?;
    let before = label[..end].trim_end();
    let digits_start = before
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    before[digits_start..].parse().ok()
}

/// Listing cards of a search results page. Relative links resolve against
/// `base_url`; cards without a usable link are skipped.
pub fn parse_listing_cards(html: &str, base_url: &str) -> Result<Vec<ListingRef>> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url)?;
    let title_selector = selector(selectors::LISTING_TITLE)?;
    let link_selector = selector(selectors::LISTING_LINK)?;

    let mut listings = Vec::new();
    for card in document.select(&selector(selectors::LISTING_CARD)?) {
        let Some(href) = card
            .select(&link_selector)
            .find_map(|a| a.value().attr("href"))
        else {
            debug!("Listing card without link");
            continue;
        };
        let Ok(link) = base.join(href) else {
            warn!(href, "Unusable listing link");
            continue;
        };
        let title = card
            .select(&title_selector)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled listing".to_string());

        match ListingRef::new(title, link.to_string()) {
            Ok(listing) if !listings.iter().any(|l: &ListingRef| l.id == listing.id) => {
                listings.push(listing);
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping listing card"),
        }
    }
    Ok(listings)
}
