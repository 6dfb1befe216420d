use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ListResourceTemplatesResult, ListResourcesResult,
        PaginatedRequestParams, ProtocolVersion, RawResource, RawResourceTemplate,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ResourceTemplate, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::RequestContext,
    tool, tool_handler, tool_router,
};

use crate::domain::listing::ListingRef;
use crate::domain::search_params::{
    FilterMode, MAX_NIGHTS, MIN_NIGHTS, PriceBounds, SearchRequest, TripLength,
};
use crate::engine::dispatcher::{Dispatcher, EnqueueOutcome};
use crate::error::FlexstayError;
use crate::ports::clock::Clock;
use crate::ports::listing_feed::ListingFeed;

// ---------- Resource Store ----------

/// Thread-safe store of search outcomes exposed as MCP resources.
/// Keys are URIs like `flexstay://listing/12345`, values are text content.
#[derive(Clone, Default)]
pub struct ResourceStore {
    entries: Arc<RwLock<HashMap<String, ResourceEntry>>>,
}

#[derive(Clone)]
struct ResourceEntry {
    name: String,
    text: String,
}

impl ResourceStore {
    async fn insert(&self, uri: impl Into<String>, name: impl Into<String>, text: String) {
        self.entries.write().await.insert(
            uri.into(),
            ResourceEntry {
                name: name.into(),
                text,
            },
        );
    }

    async fn get(&self, uri: &str) -> Option<ResourceEntry> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn list(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(uri, entry)| (uri.clone(), entry.name.clone()))
            .collect()
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore").finish()
    }
}

// ---------- Tool parameter types ----------

#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct SearchToolParams {
    /// Listing URL (e.g. "https://www.airbnb.com/rooms/12345")
    pub link: String,
    /// Listing name, used in reports and price history (optional)
    pub title: Option<String>,
    /// "respect_filters" follows trip_length (weekend Fri-Sun, week Sun-Fri);
    /// "ignore_filters" searches fixed stays of `nights` nights.
    /// Defaults to respect_filters when a trip length is known, otherwise ignore_filters.
    pub mode: Option<FilterMode>,
    /// Nights per stay, 1-7. Required with ignore_filters.
    pub nights: Option<u32>,
    /// Trip length: "weekend_trip", "one_week" or "one_month"
    pub trip_length: Option<TripLength>,
    /// Months to search (e.g. ["july", "august"]). Searched in chronological order from today.
    pub months: Option<Vec<String>>,
    /// Flexible-date results page URL to read trip length, months and price range from.
    /// Explicit fields override what the URL says.
    pub results_url: Option<String>,
    /// Minimum total price filter of the originating search (informational)
    pub price_min: Option<u32>,
    /// Maximum total price filter of the originating search (informational)
    pub price_max: Option<u32>,
}

// ---------- MCP Server ----------

#[derive(Clone)]
pub struct FlexstayMcpServer {
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    feed: Option<Arc<dyn ListingFeed>>,
    tool_router: ToolRouter<Self>,
    resources: ResourceStore,
}

#[tool_router]
impl FlexstayMcpServer {
    pub fn new(
        dispatcher: Dispatcher,
        clock: Arc<dyn Clock>,
        feed: Option<Arc<dyn ListingFeed>>,
    ) -> Self {
        Self {
            dispatcher,
            clock,
            feed,
            tool_router: Self::tool_router(),
            resources: ResourceStore::default(),
        }
    }

    fn build_request(&self, params: SearchToolParams) -> crate::error::Result<SearchRequest> {
        let listing = ListingRef::new(
            params
                .title
                .unwrap_or_else(|| "Untitled listing".to_string()),
            params.link,
        )?;

        let mut request = match params.results_url.as_deref() {
            Some(url) => SearchRequest::from_results_url(
                listing,
                url,
                params.mode.unwrap_or(FilterMode::RespectFilters),
                params.nights.unwrap_or(MIN_NIGHTS),
            )?,
            None => SearchRequest {
                listing,
                mode: FilterMode::IgnoreFilters,
                nights: MIN_NIGHTS,
                trip_length: None,
                months: Vec::new(),
                price_bounds: PriceBounds::default(),
            },
        };

        if let Some(trip_length) = params.trip_length {
            request.trip_length = Some(trip_length);
        }
        if let Some(months) = params.months {
            request.months = months
                .iter()
                .map(|m| m.parse())
                .collect::<crate::error::Result<Vec<_>>>()?;
        }
        if params.price_min.is_some() {
            request.price_bounds.min = params.price_min;
        }
        if params.price_max.is_some() {
            request.price_bounds.max = params.price_max;
        }
        request.mode = params.mode.unwrap_or(if request.trip_length.is_some() {
            FilterMode::RespectFilters
        } else {
            FilterMode::IgnoreFilters
        });
        match (request.mode, params.nights) {
            (_, Some(nights)) => request.nights = nights,
            (FilterMode::IgnoreFilters, None) => {
                return Err(FlexstayError::InvalidRequest {
                    reason: format!(
                        "nights ({MIN_NIGHTS}-{MAX_NIGHTS}) is required when ignoring filters"
                    ),
                });
            }
            (FilterMode::RespectFilters, None) => {}
        }

        request.validate()?;
        request.sort_months(self.clock.today());
        Ok(request)
    }

    /// Search one listing calendar for its cheapest flexible-date stay.
    #[tool(
        name = "flexstay_search",
        description = "Find the cheapest stay on an Airbnb listing calendar across flexible months. Opens the listing in the browser, tries every legal check-in/check-out pair (weekend Fri-Sun, full week Sun-Fri, or N nights) in the requested months, and returns the cheapest dates and total price. Give months + trip_length/nights, or a flexible-date results_url.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn flexstay_search(
        &self,
        Parameters(params): Parameters<SearchToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match self.build_request(params) {
            Ok(request) => request,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Invalid search: {e}"
                ))]));
            }
        };

        let listing = request.listing.clone();
        let context = request.search_context();
        match self.dispatcher.search(request).await {
            Ok(outcome) if outcome.success => {
                let mut text = format!("**{}** ({})\n", listing.title, listing.id);
                let _ = writeln!(text, "Search: {context}");
                if let Some(results) = &outcome.results {
                    let _ = writeln!(text, "{results}");
                }
                let _ = writeln!(text, "{}", listing.link);
                self.resources
                    .insert(
                        format!("flexstay://listing/{}", listing.id),
                        format!("Best price: {}", listing.title),
                        text.clone(),
                    )
                    .await;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Ok(outcome) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Search failed for {listing}: {}. The listing calendar may not have loaded; try again or check the link.",
                outcome.error.as_deref().unwrap_or("unknown error")
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Could not queue search for {listing}: {e}"
            ))])),
        }
    }

    /// Queue a search without waiting for it.
    #[tool(
        name = "flexstay_enqueue",
        description = "Queue a flexible-date search for a listing and return immediately. Searches run one at a time; use flexstay_queue_status to follow progress and read results. Accepts the same parameters as flexstay_search.",
        annotations(read_only_hint = false, open_world_hint = true)
    )]
    async fn flexstay_enqueue(
        &self,
        Parameters(params): Parameters<SearchToolParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = match self.build_request(params) {
            Ok(request) => request,
            Err(e) => {
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Invalid search: {e}"
                ))]));
            }
        };

        let listing = request.listing.clone();
        match self.dispatcher.enqueue(request) {
            Ok(EnqueueOutcome::Queued { position: 0 }) => Ok(CallToolResult::success(vec![
                Content::text(format!("Queued {listing}; starting now.")),
            ])),
            Ok(EnqueueOutcome::Queued { position }) => {
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Queued {listing} behind {position} other listing(s)."
                ))]))
            }
            Ok(EnqueueOutcome::AlreadyQueued) => Ok(CallToolResult::success(vec![
                Content::text(format!("{listing} is already queued.")),
            ])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Could not queue {listing}: {e}"
            ))])),
        }
    }

    /// Show queued searches and recent results.
    #[tool(
        name = "flexstay_queue_status",
        description = "Show listings waiting or being searched, and the outcome of recently finished searches (newest first).",
        annotations(read_only_hint = true, open_world_hint = false)
    )]
    async fn flexstay_queue_status(&self) -> Result<CallToolResult, McpError> {
        let snapshot = self.dispatcher.snapshot();
        let mut text = String::new();

        if snapshot.active.is_empty() {
            text.push_str("Queue is empty.\n");
        } else {
            let _ = writeln!(text, "## Queue ({})\n", snapshot.active.len());
            for (i, item) in snapshot.active.iter().enumerate() {
                let _ = writeln!(
                    text,
                    "{}. {} [{}] since {}",
                    i + 1,
                    item.listing,
                    item.status,
                    item.enqueued_at.format("%H:%M:%S")
                );
            }
        }

        if !snapshot.recent.is_empty() {
            let _ = writeln!(text, "\n## Recent results\n");
            for (id, outcome) in &snapshot.recent {
                match (&outcome.results, &outcome.error) {
                    (Some(results), _) if outcome.success => {
                        let _ = writeln!(text, "- {id}: {results}");
                    }
                    (_, error) => {
                        let _ = writeln!(
                            text,
                            "- {id}: failed ({})",
                            error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
            }
        }

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    /// List the listings on the results page open in the browser.
    #[tool(
        name = "flexstay_results_listings",
        description = "List the listings (title, ID, link) on the Airbnb search results page currently open in the browser, ready to pass to flexstay_search or flexstay_enqueue.",
        annotations(read_only_hint = true, open_world_hint = true)
    )]
    async fn flexstay_results_listings(&self) -> Result<CallToolResult, McpError> {
        let Some(feed) = &self.feed else {
            return Ok(CallToolResult::error(vec![Content::text(
                "No results page is attached to this server.",
            )]));
        };

        match feed.read_listings().await {
            Ok(listings) if listings.is_empty() => Ok(CallToolResult::success(vec![
                Content::text("No listings found on the results page."),
            ])),
            Ok(listings) => {
                let mut text = format!("Found {} listings:\n\n", listings.len());
                for (i, listing) in listings.iter().enumerate() {
                    let _ = writeln!(
                        text,
                        "{}. **{}** (ID: {})\n   {}",
                        i + 1,
                        listing.title,
                        listing.id,
                        listing.link
                    );
                }
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Could not read the results page: {e}"
            ))])),
        }
    }
}

#[tool_handler]
impl ServerHandler for FlexstayMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Flexible-date price finder for Airbnb listing calendars.\n\
                 \n\
                 ## Tools\n\
                 - flexstay_search: search one listing and wait for the cheapest stay\n\
                 - flexstay_enqueue: queue a listing search and return immediately\n\
                 - flexstay_queue_status: queued searches and recent outcomes\n\
                 - flexstay_results_listings: listings on the results page open in the browser\n\
                 \n\
                 ## Stay rules\n\
                 With mode respect_filters, weekend_trip means Friday to Sunday and one_week means \
                 Sunday to Friday; one_month is not searched. With ignore_filters, every day starts \
                 a stay of `nights` nights (1-7). Stays crossing into the next month are tried when \
                 that month is also requested.\n\
                 \n\
                 ## Resources\n\
                 Each successful search is kept as a resource at flexstay://listing/{id}."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let entries = self.resources.list().await;
        let resources: Vec<Resource> = entries
            .into_iter()
            .map(|(uri, name)| Resource {
                annotations: None,
                raw: RawResource {
                    uri,
                    name,
                    title: None,
                    description: None,
                    mime_type: Some("text/plain".into()),
                    size: None,
                    icons: None,
                    meta: None,
                },
            })
            .collect();
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = vec![ResourceTemplate {
            annotations: None,
            raw: RawResourceTemplate {
                uri_template: "flexstay://listing/{id}".into(),
                name: "Best Price".into(),
                title: Some("Cheapest flexible-date stay".into()),
                description: Some(
                    "Cheapest dates and total price found for a listing (via flexstay_search)"
                        .into(),
                ),
                mime_type: Some("text/plain".into()),
                icons: None,
            },
        }];
        Ok(ListResourceTemplatesResult {
            resource_templates: templates,
            next_cursor: None,
            meta: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        match self.resources.get(&request.uri).await {
            Some(entry) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(entry.text, request.uri)],
            }),
            None => Err(McpError::resource_not_found(
                format!("resource not found: {}", request.uri),
                None,
            )),
        }
    }
}
