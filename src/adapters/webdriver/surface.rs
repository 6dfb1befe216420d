use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::adapters::webdriver::client::WebDriverClient;
use crate::adapters::webdriver::page_parser;
use crate::adapters::webdriver::scripts;
use crate::adapters::webdriver::selectors;
use crate::domain::calendar::DisplayedMonth;
use crate::error::{FlexstayError, Result};
use crate::ports::calendar_surface::{CalendarSurface, NavDirection, QuoteLabels};

/// Availability calendar of the listing page open in one browser window.
pub struct WebDriverSurface {
    client: Arc<WebDriverClient>,
    window: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderedQuote {
    date_range: Option<String>,
    total_price: Option<String>,
}

impl WebDriverSurface {
    pub fn new(client: Arc<WebDriverClient>, window: impl Into<String>) -> Self {
        Self {
            client,
            window: window.into(),
        }
    }

    async fn run(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client.in_window(&self.window, script, args).await
    }
}

#[async_trait]
impl CalendarSurface for WebDriverSurface {
    async fn read_month(&self) -> Result<DisplayedMonth> {
        let pane = self
            .run(scripts::READ_MONTH_PANE, vec![json!(selectors::VISIBLE_MONTH)])
            .await?;
        let html = pane.as_str().ok_or_else(|| FlexstayError::SurfaceNotReady {
            reason: "calendar container not found".into(),
        })?;
        page_parser::parse_displayed_month(html)
    }

    async fn click_navigation(&self, direction: NavDirection) -> Result<bool> {
        let label = match direction {
            NavDirection::Forward => selectors::NEXT_MONTH_LABEL,
            NavDirection::Backward => selectors::PREVIOUS_MONTH_LABEL,
        };
        let clicked = self.run(scripts::CLICK_BY_ARIA_LABEL, vec![json!(label)]).await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    async fn click_day(&self, week: usize, day: usize) -> Result<bool> {
        let clicked = self
            .run(
                scripts::CLICK_DAY,
                vec![
                    json!(selectors::VISIBLE_MONTH),
                    json!(selectors::DAY_ROWS),
                    json!(week),
                    json!(day),
                ],
            )
            .await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    async fn read_quote_labels(&self) -> Result<QuoteLabels> {
        let value = self
            .run(
                scripts::READ_QUOTE,
                vec![
                    json!(selectors::DATE_RANGE),
                    json!(selectors::PRICE_CANDIDATES),
                ],
            )
            .await?;
        let rendered: RenderedQuote = serde_json::from_value(value)?;
        Ok(QuoteLabels {
            date_range: rendered.date_range,
            total_price: rendered.total_price,
        })
    }

    async fn clear_dates(&self) -> Result<bool> {
        let clicked = self
            .run(scripts::CLICK_BY_TEXT, vec![json!(selectors::CLEAR_DATES_TEXT)])
            .await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }
}
