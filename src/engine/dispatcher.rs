use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use tracing::{error, info, warn};

use crate::config::types::{EngineConfig, QueueConfig};
use crate::domain::queue::{DispatchOutcome, QueueItem, QueueStatus, StatusEvent};
use crate::domain::quote::{SearchResult, parse_price};
use crate::domain::search_params::SearchRequest;
use crate::engine::orchestrator::search_listing;
use crate::error::Result;
use crate::ports::automation_host::{AutomationHost, TargetId};
use crate::ports::clock::Clock;
use crate::ports::price_sink::{PriceSink, PriceSnapshot};

const STATUS_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Accepted; `position` is the number of items ahead of it.
    Queued { position: usize },
    /// The listing is already pending or being processed.
    AlreadyQueued,
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub is_processing: bool,
    pub active: Vec<QueueItem>,
    /// Most recent terminal outcomes, newest first.
    pub recent: Vec<(String, DispatchOutcome)>,
}

struct Entry {
    item: QueueItem,
    request: SearchRequest,
    waiters: Vec<oneshot::Sender<DispatchOutcome>>,
}

struct QueueState {
    entries: VecDeque<Entry>,
    is_processing: bool,
    history: LruCache<String, DispatchOutcome>,
}

struct Inner {
    host: Arc<dyn AutomationHost>,
    sink: Option<Arc<dyn PriceSink>>,
    clock: Arc<dyn Clock>,
    engine: EngineConfig,
    queue: QueueConfig,
    state: Mutex<QueueState>,
    events: broadcast::Sender<StatusEvent>,
}

/// Runs listing searches one at a time, each in its own short-lived target.
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(
        host: Arc<dyn AutomationHost>,
        clock: Arc<dyn Clock>,
        sink: Option<Arc<dyn PriceSink>>,
        engine: EngineConfig,
        queue: QueueConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(queue.history_size).unwrap_or(NonZeroUsize::MIN);
        let (events, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                host,
                sink,
                clock,
                engine,
                queue,
                state: Mutex::new(QueueState {
                    entries: VecDeque::new(),
                    is_processing: false,
                    history: LruCache::new(capacity),
                }),
                events,
            }),
        }
    }

    /// Status transitions of every queued listing.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.events.subscribe()
    }

    /// Queue a search. Must be called from within a Tokio runtime.
    pub fn enqueue(&self, request: SearchRequest) -> Result<EnqueueOutcome> {
        self.push(request, None)
    }

    /// Queue a search and wait for its outcome. A listing that is already
    /// queued is not searched twice; the caller shares its outcome.
    pub async fn search(&self, request: SearchRequest) -> Result<DispatchOutcome> {
        let (tx, rx) = oneshot::channel();
        self.push(request, Some(tx))?;
        Ok(rx
            .await
            .unwrap_or_else(|_| DispatchOutcome::failure("dispatcher dropped the search")))
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.lock();
        QueueSnapshot {
            is_processing: state.is_processing,
            active: state.entries.iter().map(|e| e.item.clone()).collect(),
            recent: state
                .history
                .iter()
                .map(|(id, outcome)| (id.clone(), outcome.clone()))
                .collect(),
        }
    }

    /// Last terminal outcome recorded for `listing_id`.
    pub fn last_outcome(&self, listing_id: &str) -> Option<DispatchOutcome> {
        self.inner.lock().history.peek(listing_id).cloned()
    }

    fn push(
        &self,
        request: SearchRequest,
        waiter: Option<oneshot::Sender<DispatchOutcome>>,
    ) -> Result<EnqueueOutcome> {
        request.validate()?;
        let listing_id = request.listing.id.clone();

        let start_worker = {
            let mut state = self.inner.lock();
            if let Some(existing) = state
                .entries
                .iter_mut()
                .find(|e| e.item.listing.id == listing_id)
            {
                existing.waiters.extend(waiter);
                info!(listing = %request.listing, "Listing already queued");
                return Ok(EnqueueOutcome::AlreadyQueued);
            }

            let position = state.entries.len();
            state.entries.push_back(Entry {
                item: QueueItem {
                    listing: request.listing.clone(),
                    status: QueueStatus::Pending,
                    enqueued_at: self.inner.clock.now(),
                },
                request,
                waiters: waiter.into_iter().collect(),
            });
            info!(listing_id = %listing_id, position, "Listing queued");

            let idle = !state.is_processing;
            state.is_processing = true;
            (idle, position)
        };

        self.inner.publish(&listing_id, QueueStatus::Pending);
        let (idle, position) = start_worker;
        if idle {
            tokio::spawn(Arc::clone(&self.inner).drain());
        }
        Ok(EnqueueOutcome::Queued { position })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, listing_id: &str, status: QueueStatus) {
        // No subscribers is fine.
        let _ = self.events.send(StatusEvent {
            listing_id: listing_id.to_string(),
            status,
        });
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let next = {
                let mut state = self.lock();
                if let Some(entry) = state.entries.front_mut() {
                    entry.item.status = QueueStatus::Processing;
                    Some(entry.request.clone())
                } else {
                    state.is_processing = false;
                    None
                }
            };
            let Some(request) = next else {
                break;
            };

            let listing_id = request.listing.id.clone();
            self.publish(&listing_id, QueueStatus::Processing);
            let outcome = self.process(&request).await;

            let waiters = {
                let mut state = self.lock();
                state.history.put(listing_id.clone(), outcome.clone());
                state
                    .entries
                    .pop_front()
                    .map(|entry| entry.waiters)
                    .unwrap_or_default()
            };
            self.publish(&listing_id, outcome.status());
            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }

            tokio::time::sleep(Duration::from_millis(self.queue.inter_item_delay_ms)).await;
        }
    }

    /// Search one listing in a fresh target. The target is closed and the
    /// previous foreground restored whatever happens inside.
    async fn process(&self, request: &SearchRequest) -> DispatchOutcome {
        info!(listing = %request.listing, "Processing listing");

        let previous = self.host.foreground().await.unwrap_or_else(|e| {
            warn!(error = %e, "Could not read the foreground target");
            None
        });

        let target = match self.host.open_target(&request.listing.link).await {
            Ok(target) => target,
            Err(e) => {
                error!(listing = %request.listing, error = %e, "Could not open listing");
                return DispatchOutcome::failure(e.to_string());
            }
        };

        let result = self.search_in(&target, request).await;

        if let Some(previous) = &previous
            && let Err(e) = self.host.activate(previous).await
        {
            warn!(target = %previous, error = %e, "Could not restore foreground target");
        }
        if let Err(e) = self.host.close_target(&target).await {
            warn!(%target, error = %e, "Could not close listing target");
        }

        let outcome = match result {
            Ok(result) => DispatchOutcome::from_result(result),
            Err(e) => DispatchOutcome::failure(e.to_string()),
        };

        if let Some(results) = outcome.results.as_ref().filter(|_| outcome.success) {
            self.forward(request, results).await;
        }
        info!(listing = %request.listing, success = outcome.success, "Listing processed");
        outcome
    }

    async fn search_in(&self, target: &TargetId, request: &SearchRequest) -> Result<SearchResult> {
        self.host.activate(target).await?;
        tokio::time::sleep(Duration::from_millis(self.queue.initial_render_wait_ms)).await;

        let surface = self.host.surface(target);
        let engine = self.engine.clone();
        let request = request.clone();
        let today = self.clock.today();

        // Run on its own task so a panic in the search still reaches cleanup.
        let search = tokio::spawn(async move {
            search_listing(surface.as_ref(), &engine, &request, today).await
        });
        Ok(search.await.unwrap_or_else(|e| {
            error!(error = %e, "Search task failed");
            SearchResult::failed(format!("search task failed: {e}"))
        }))
    }

    async fn forward(&self, request: &SearchRequest, results: &SearchResult) {
        let (Some(sink), Some(dates), Some(price)) =
            (&self.sink, &results.best_dates, &results.best_price)
        else {
            return;
        };
        let snapshot = PriceSnapshot {
            airbnb_url: request.listing.link.clone(),
            name: Some(request.listing.title.clone()),
            date_range: dates.clone(),
            total_price: parse_price(price),
            search_context: request.search_context(),
        };
        if let Err(e) = sink.record(&snapshot).await {
            warn!(listing = %request.listing, error = %e, "Could not record price snapshot");
        }
    }
}
