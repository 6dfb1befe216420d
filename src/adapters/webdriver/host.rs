use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{OnceCell, mpsc};
use tracing::{debug, info};

use crate::adapters::webdriver::client::WebDriverClient;
use crate::adapters::webdriver::page_parser;
use crate::adapters::webdriver::scripts;
use crate::adapters::webdriver::selectors;
use crate::adapters::webdriver::surface::WebDriverSurface;
use crate::config::types::WebDriverConfig;
use crate::domain::listing::ListingRef;
use crate::engine::feed_watch::SurfaceChanged;
use crate::error::Result;
use crate::ports::automation_host::{AutomationHost, TargetId};
use crate::ports::calendar_surface::CalendarSurface;
use crate::ports::listing_feed::ListingFeed;

/// Browser driven over WebDriver. Each listing search gets its own tab; the
/// window the session started in holds the search results.
pub struct WebDriverHost {
    client: Arc<WebDriverClient>,
    home: OnceCell<String>,
}

impl WebDriverHost {
    pub fn new(config: &WebDriverConfig) -> Result<Self> {
        Ok(Self::with_client(Arc::new(WebDriverClient::new(config)?)))
    }

    pub fn with_client(client: Arc<WebDriverClient>) -> Self {
        Self {
            client,
            home: OnceCell::new(),
        }
    }

    async fn home_window(&self) -> Result<&str> {
        let handle = self
            .home
            .get_or_try_init(|| self.client.current_window())
            .await?;
        Ok(handle.as_str())
    }

    /// Poll the results window every `every` and signal whenever its address
    /// or number of listing cards changes. The poller stops once the receiver
    /// is dropped.
    pub fn watch_results(self: &Arc<Self>, every: Duration) -> mpsc::Receiver<SurfaceChanged> {
        let (tx, rx) = mpsc::channel(16);
        let host = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            let mut last = None;
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let fingerprint = match host.results_fingerprint().await {
                    Ok(fingerprint) => fingerprint,
                    Err(e) => {
                        debug!(error = %e, "Results page not readable");
                        continue;
                    }
                };
                if last.as_ref() == Some(&fingerprint) {
                    continue;
                }
                last = Some(fingerprint);
                if tx.send(SurfaceChanged).await.is_err() {
                    break;
                }
            }
        });
        rx
    }

    async fn results_fingerprint(&self) -> Result<(String, u64)> {
        let home = self.home_window().await?.to_string();
        let url = self.client.url_of(&home).await?;
        let cards = self
            .client
            .in_window(&home, scripts::COUNT_MATCHES, vec![json!(selectors::LISTING_CARD)])
            .await?;
        Ok((url, cards.as_u64().unwrap_or(0)))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.client.quit().await
    }
}

#[async_trait]
impl AutomationHost for WebDriverHost {
    async fn open_target(&self, link: &str) -> Result<TargetId> {
        self.home_window().await?;
        let handle = self.client.open_tab(link).await?;
        info!(%link, window = %handle, "Opened listing tab");
        Ok(TargetId(handle))
    }

    async fn foreground(&self) -> Result<Option<TargetId>> {
        Ok(Some(TargetId(self.client.current_window().await?)))
    }

    async fn activate(&self, target: &TargetId) -> Result<()> {
        self.client.switch_to(&target.0).await
    }

    async fn close_target(&self, target: &TargetId) -> Result<()> {
        self.client.close_window(&target.0).await
    }

    fn surface(&self, target: &TargetId) -> Arc<dyn CalendarSurface> {
        Arc::new(WebDriverSurface::new(Arc::clone(&self.client), target.0.clone()))
    }
}

#[async_trait]
impl ListingFeed for WebDriverHost {
    async fn read_listings(&self) -> Result<Vec<ListingRef>> {
        let home = self.home_window().await?.to_string();
        let base = self.client.url_of(&home).await?;
        let html = self
            .client
            .in_window(&home, scripts::READ_DOCUMENT, Vec::new())
            .await?;
        page_parser::parse_listing_cards(html.as_str().unwrap_or_default(), &base)
    }
}

