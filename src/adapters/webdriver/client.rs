use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{Value, json};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::types::WebDriverConfig;
use crate::error::{FlexstayError, Result};

/// Minimal W3C WebDriver client: one browser session, commands sent as JSON
/// over HTTP.
///
/// Every command runs against the session's current window, so commands that
/// target a particular window go through [`WebDriverClient::in_window`], which
/// holds the window lock for the whole switch-and-run.
pub struct WebDriverClient {
    http: Client,
    base: Url,
    capabilities: Value,
    session: OnceCell<String>,
    current: Mutex<Option<String>>,
}

impl WebDriverClient {
    pub fn new(config: &WebDriverConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut args = vec![format!("--user-agent={}", config.user_agent)];
        if config.headless {
            args.push("--headless=new".into());
        }
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        Ok(Self {
            http,
            base,
            capabilities,
            session: OnceCell::new(),
            current: Mutex::new(None),
        })
    }

    async fn session_id(&self) -> Result<&str> {
        let id = self
            .session
            .get_or_try_init(|| async {
                let url = self.base.join("session")?;
                let value = self.send(Method::POST, url, Some(&self.capabilities)).await?;
                let id = value
                    .get("sessionId")
                    .and_then(Value::as_str)
                    .ok_or_else(|| FlexstayError::DispatchFailure {
                        reason: "WebDriver session response without sessionId".into(),
                    })?
                    .to_string();
                info!(session = %id, "WebDriver session started");
                Ok::<_, FlexstayError>(id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Value> {
        debug!(%method, %url, "WebDriver command");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(value);
        }
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = value.get("message").and_then(Value::as_str).unwrap_or("");
        Err(FlexstayError::DispatchFailure {
            reason: format!("WebDriver {error} (HTTP {}): {message}", status.as_u16()),
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let session = self.session_id().await?;
        let url = self.base.join(&format!("session/{session}/{path}"))?;
        self.send(method, url, body.as_ref()).await
    }

    /// Handle of the window the session currently points at.
    pub async fn current_window(&self) -> Result<String> {
        let mut current = self.current.lock().await;
        if let Some(handle) = current.as_ref() {
            return Ok(handle.clone());
        }
        let handle = as_string(self.command(Method::GET, "window", None).await?, "window")?;
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// Open `link` in a new tab without leaving the current window.
    pub async fn open_tab(&self, link: &str) -> Result<String> {
        let mut current = self.current.lock().await;
        let previous = match current.clone() {
            Some(handle) => handle,
            None => as_string(self.command(Method::GET, "window", None).await?, "window")?,
        };

        let created = self
            .command(Method::POST, "window/new", Some(json!({ "type": "tab" })))
            .await?;
        let handle = created
            .get("handle")
            .and_then(Value::as_str)
            .ok_or_else(|| FlexstayError::DispatchFailure {
                reason: "new window response without handle".into(),
            })?
            .to_string();

        let loaded = async {
            self.switch_raw(&handle).await?;
            self.command(Method::POST, "url", Some(json!({ "url": link })))
                .await?;
            self.switch_raw(&previous).await
        }
        .await;

        if let Err(e) = loaded {
            warn!(%handle, error = %e, "Tab failed to load, closing it");
            if let Err(close) = self.discard_tab(&handle, &previous).await {
                warn!(%handle, error = %close, "Could not close failed tab");
            }
            *current = Some(previous);
            return Err(e);
        }
        *current = Some(previous);
        Ok(handle)
    }

    /// Close `handle` and point the session back at `previous`. Caller holds
    /// the window lock.
    async fn discard_tab(&self, handle: &str, previous: &str) -> Result<()> {
        self.switch_raw(handle).await?;
        self.command(Method::DELETE, "window", None).await?;
        self.switch_raw(previous).await
    }

    pub async fn switch_to(&self, handle: &str) -> Result<()> {
        let mut current = self.current.lock().await;
        self.switch_raw(handle).await?;
        *current = Some(handle.to_string());
        Ok(())
    }

    /// Close `handle`, then point the session back at the window that was
    /// current before, if it was another one.
    pub async fn close_window(&self, handle: &str) -> Result<()> {
        let mut current = self.current.lock().await;
        let previous = current.clone().filter(|h| h != handle);
        self.switch_raw(handle).await?;
        self.command(Method::DELETE, "window", None).await?;
        *current = None;
        if let Some(previous) = previous {
            self.switch_raw(&previous).await?;
            *current = Some(previous);
        }
        Ok(())
    }

    /// Run `script` in `handle`, switching to it first when needed.
    pub async fn in_window(&self, handle: &str, script: &str, args: Vec<Value>) -> Result<Value> {
        let mut current = self.current.lock().await;
        if current.as_deref() != Some(handle) {
            self.switch_raw(handle).await?;
            *current = Some(handle.to_string());
        }
        self.command(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    /// Address of the page loaded in `handle`.
    pub async fn url_of(&self, handle: &str) -> Result<String> {
        let mut current = self.current.lock().await;
        if current.as_deref() != Some(handle) {
            self.switch_raw(handle).await?;
            *current = Some(handle.to_string());
        }
        as_string(self.command(Method::GET, "url", None).await?, "url")
    }

    pub async fn quit(&self) -> Result<()> {
        if let Some(session) = self.session.get() {
            let url = self.base.join(&format!("session/{session}"))?;
            self.send(Method::DELETE, url, None).await?;
            info!(%session, "WebDriver session closed");
        }
        Ok(())
    }

    async fn switch_raw(&self, handle: &str) -> Result<()> {
        self.command(Method::POST, "window", Some(json!({ "handle": handle })))
            .await?;
        Ok(())
    }
}

fn as_string(value: Value, what: &str) -> Result<String> {
    value
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| FlexstayError::DispatchFailure {
            reason: format!("WebDriver returned no {what}"),
        })
}
