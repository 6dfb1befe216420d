use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::listing::ListingRef;
use crate::error::Result;
use crate::ports::listing_feed::ListingFeed;

/// Signal that the results page re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceChanged;

/// Collapses bursts of change signals into one.
pub struct Debouncer {
    rx: mpsc::Receiver<SurfaceChanged>,
    window: Duration,
}

impl Debouncer {
    pub fn new(rx: mpsc::Receiver<SurfaceChanged>, window: Duration) -> Self {
        Self { rx, window }
    }

    /// Wait for a change, then for `window` of quiet. Returns how many signals
    /// were folded together, or `None` once every sender is gone.
    pub async fn settled(&mut self) -> Option<usize> {
        self.rx.recv().await?;
        let mut folded = 1;
        loop {
            match tokio::time::timeout(self.window, self.rx.recv()).await {
                Ok(Some(SurfaceChanged)) => folded += 1,
                Ok(None) | Err(_) => return Some(folded),
            }
        }
    }
}

/// Re-reads the listing feed after each settled change and reports the
/// listings not seen before.
pub struct FeedWatcher {
    feed: Arc<dyn ListingFeed>,
    debouncer: Debouncer,
    seen: HashSet<String>,
}

impl FeedWatcher {
    pub fn new(feed: Arc<dyn ListingFeed>, debouncer: Debouncer) -> Self {
        Self {
            feed,
            debouncer,
            seen: HashSet::new(),
        }
    }

    /// `None` once the change source is closed.
    pub async fn next_batch(&mut self) -> Option<Result<Vec<ListingRef>>> {
        let folded = self.debouncer.settled().await?;
        debug!(folded, "Results page settled");
        Some(self.feed.read_listings().await.map(|listings| {
            listings
                .into_iter()
                .filter(|listing| self.seen.insert(listing.id.clone()))
                .collect()
        }))
    }
}
