use async_trait::async_trait;

use crate::domain::listing::ListingRef;
use crate::error::Result;

/// Source of the listings shown on a search results page.
#[async_trait]
pub trait ListingFeed: Send + Sync {
    async fn read_listings(&self) -> Result<Vec<ListingRef>>;
}
