use tracing::debug;

use crate::config::types::EngineConfig;
use crate::domain::quote::Quote;
use crate::error::Result;
use crate::ports::calendar_surface::{CalendarSurface, QuoteLabels};

/// Polls the booking panel until it shows a price for the selected stay.
pub struct QuoteExtractor<'a> {
    surface: &'a dyn CalendarSurface,
    config: &'a EngineConfig,
}

impl<'a> QuoteExtractor<'a> {
    pub fn new(surface: &'a dyn CalendarSurface, config: &'a EngineConfig) -> Self {
        Self { surface, config }
    }

    /// The rendered quote, or `None` when nothing usable appeared within the
    /// polling budget.
    pub async fn extract_quote(&self) -> Result<Option<Quote>> {
        let max_attempts = self.config.max_quote_poll_attempts;

        for attempt in 1..=max_attempts {
            match self.surface.read_quote_labels().await {
                Ok(labels) => {
                    if let Some(quote) = complete(labels) {
                        debug!(attempt, price = %quote.total_price, "Quote rendered");
                        return Ok(Some(quote));
                    }
                }
                Err(e) if !e.is_fatal_to_listing() => {
                    debug!(attempt, error = %e, "Booking panel not readable yet");
                }
                Err(e) => return Err(e),
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.config.quote_poll_interval()).await;
            }
        }

        debug!(attempts = max_attempts, "No quote rendered");
        Ok(None)
    }
}

fn complete(labels: QuoteLabels) -> Option<Quote> {
    let date_range = labels.date_range.filter(|s| !s.trim().is_empty())?;
    let total_price = labels.total_price.filter(|s| !s.trim().is_empty())?;
    Some(Quote::new(date_range.trim(), total_price.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    async fn select_jul_6_to_8(calendar: &FakeCalendar) {
        // Monday July 6th and Wednesday July 8th 2026, second row.
        calendar.click_day(1, 1).await.unwrap();
        calendar.click_day(1, 3).await.unwrap();
    }

    fn priced_july(render_after: u32) -> FakeCalendar {
        FakeCalendar::open(ym(2026, "july"), 1)
            .with_price(date(2026, 7, 6), date(2026, 7, 8), 1234)
            .render_after(render_after)
    }

    #[tokio::test]
    async fn quote_rendered_within_budget() {
        let calendar = priced_july(15);
        select_jul_6_to_8(&calendar).await;
        let config = EngineConfig::without_delays();

        let quote = QuoteExtractor::new(&calendar, &config)
            .extract_quote()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.date_range, "Jul 6, 2026 - Jul 8, 2026");
        assert_eq!(quote.total_price, "$1,234");
    }

    #[tokio::test]
    async fn quote_rendered_too_late_is_none() {
        let calendar = priced_july(21);
        select_jul_6_to_8(&calendar).await;
        let config = EngineConfig::without_delays();

        let quote = QuoteExtractor::new(&calendar, &config)
            .extract_quote()
            .await
            .unwrap();

        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn unreadable_panel_keeps_polling() {
        let calendar = priced_july(1).failing_quote_reads(2);
        select_jul_6_to_8(&calendar).await;
        let config = EngineConfig::without_delays();

        let quote = QuoteExtractor::new(&calendar, &config)
            .extract_quote()
            .await
            .unwrap()
            .unwrap();

        assert_eq!(quote.total_price, "$1,234");
    }

    #[tokio::test]
    async fn panel_never_readable_is_none() {
        let calendar = priced_july(1).failing_quote_reads(100);
        select_jul_6_to_8(&calendar).await;
        let config = EngineConfig::without_delays();

        let quote = QuoteExtractor::new(&calendar, &config)
            .extract_quote()
            .await
            .unwrap();

        assert!(quote.is_none());
    }

    #[tokio::test]
    async fn nothing_selected_yields_none() {
        let calendar = priced_july(1);
        calendar.click_day(1, 1).await.unwrap();
        let config = EngineConfig::without_delays();

        let quote = QuoteExtractor::new(&calendar, &config)
            .extract_quote()
            .await
            .unwrap();

        assert!(quote.is_none());
    }

    #[test]
    fn blank_labels_are_incomplete() {
        assert!(
            complete(QuoteLabels {
                date_range: Some("Jul 6 - Jul 8".into()),
                total_price: Some("  ".into()),
            })
            .is_none()
        );
        assert!(
            complete(QuoteLabels {
                date_range: None,
                total_price: Some("$10".into()),
            })
            .is_none()
        );
    }
}
