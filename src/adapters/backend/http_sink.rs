use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{FlexstayError, Result};
use crate::ports::price_sink::{PriceSink, PriceSnapshot};

/// Posts best-price snapshots to the price history API.
pub struct HttpPriceSink {
    http: Client,
    endpoint: Url,
}

impl HttpPriceSink {
    pub fn new(api_base_url: &str, request_timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()?;
        let endpoint = Url::parse(&format!(
            "{}/listings/price",
            api_base_url.trim_end_matches('/')
        ))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PriceSink for HttpPriceSink {
    async fn record(&self, snapshot: &PriceSnapshot) -> Result<()> {
        debug!(url = %snapshot.airbnb_url, dates = %snapshot.date_range, "Recording price snapshot");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(snapshot)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FlexstayError::Backend {
                status: status.as_u16(),
            })
        }
    }
}
