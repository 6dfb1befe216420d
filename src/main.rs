use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use mcp_flexstay::adapters::backend::http_sink::HttpPriceSink;
use mcp_flexstay::adapters::webdriver::host::WebDriverHost;
use mcp_flexstay::config::load_config;
use mcp_flexstay::engine::dispatcher::Dispatcher;
use mcp_flexstay::engine::feed_watch::{Debouncer, FeedWatcher};
use mcp_flexstay::mcp::server::FlexstayMcpServer;
use mcp_flexstay::ports::automation_host::AutomationHost;
use mcp_flexstay::ports::clock::{Clock, SystemClock};
use mcp_flexstay::ports::listing_feed::ListingFeed;
use mcp_flexstay::ports::price_sink::PriceSink;

fn find_config_path() -> PathBuf {
    let candidates = [
        PathBuf::from("config.yaml"),
        binary_dir().join("config.yaml"),
    ];

    for path in &candidates {
        if path.exists() {
            return path.clone();
        }
    }

    candidates[0].clone()
}

fn binary_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is reserved for MCP JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting mcp-flexstay server");

    let config_path = find_config_path();
    let config = load_config(&config_path)?;

    let host = Arc::new(WebDriverHost::new(&config.webdriver)?);
    tracing::info!(url = %config.webdriver.url, "Using WebDriver endpoint");

    let sink: Option<Arc<dyn PriceSink>> = match &config.backend.api_base_url {
        Some(base) => {
            let sink = HttpPriceSink::new(base, config.backend.request_timeout_secs)?;
            tracing::info!(endpoint = %sink.endpoint(), "Forwarding best prices to backend");
            Some(Arc::new(sink))
        }
        None => {
            tracing::info!("No price backend configured");
            None
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dispatcher = Dispatcher::new(
        Arc::clone(&host) as Arc<dyn AutomationHost>,
        Arc::clone(&clock),
        sink,
        config.engine,
        config.queue,
    );
    let feed = Arc::clone(&host) as Arc<dyn ListingFeed>;

    if config.feed.watch {
        let changes = host.watch_results(config.feed.poll_interval());
        let mut watcher = FeedWatcher::new(
            Arc::clone(&feed),
            Debouncer::new(changes, config.feed.debounce()),
        );
        tokio::spawn(async move {
            while let Some(batch) = watcher.next_batch().await {
                match batch {
                    Ok(fresh) if !fresh.is_empty() => {
                        let ids: Vec<&str> = fresh.iter().map(|l| l.id.as_str()).collect();
                        tracing::info!(
                            count = fresh.len(),
                            listings = ?ids,
                            "New listings on results page"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Could not read results page"),
                }
            }
        });
        tracing::info!("Watching results page for new listings");
    }

    let server = FlexstayMcpServer::new(dispatcher, clock, Some(feed));

    // Start MCP server over stdio
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    if let Err(e) = host.shutdown().await {
        tracing::warn!(error = %e, "Could not close WebDriver session");
    }
    Ok(())
}
