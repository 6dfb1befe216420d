use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Body of `POST /listings/price` on the price history backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub airbnb_url: String,
    pub name: Option<String>,
    pub date_range: String,
    pub total_price: Option<f64>,
    pub search_context: String,
}

#[async_trait]
pub trait PriceSink: Send + Sync {
    async fn record(&self, snapshot: &PriceSnapshot) -> Result<()>;
}
