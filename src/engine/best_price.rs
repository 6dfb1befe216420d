use tracing::warn;

use crate::domain::quote::{Quote, SearchResult, strip_year};

/// Cheapest quote among `quotes`. Ties go to the quote collected first;
/// quotes whose price cannot be read are ignored.
pub fn select_best(quotes: &[Quote]) -> SearchResult {
    let mut priced: Vec<(f64, &Quote)> = quotes
        .iter()
        .filter_map(|quote| match quote.price_value() {
            Some(value) => Some((value, quote)),
            None => {
                warn!(price = %quote.total_price, dates = %quote.date_range, "Skipping unreadable price");
                None
            }
        })
        .collect();

    // Stable, so equal prices keep collection order.
    priced.sort_by(|a, b| a.0.total_cmp(&b.0));

    match priced.first() {
        Some((_, best)) => SearchResult {
            best_dates: Some(strip_year(&best.date_range)),
            best_price: Some(best.total_price.clone()),
            has_error: false,
            error_message: None,
        },
        None => SearchResult::empty(),
    }
}
