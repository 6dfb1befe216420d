use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::ports::calendar_surface::CalendarSurface;

/// Handle of one browser tab/window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(pub String);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opens and disposes the short-lived tabs listing searches run in.
#[async_trait]
pub trait AutomationHost: Send + Sync {
    /// Open `link` in a new background target.
    async fn open_target(&self, link: &str) -> Result<TargetId>;

    /// The target currently in the foreground, if the host tracks one.
    async fn foreground(&self) -> Result<Option<TargetId>>;

    async fn activate(&self, target: &TargetId) -> Result<()>;

    async fn close_target(&self, target: &TargetId) -> Result<()>;

    /// Calendar of the page loaded in `target`.
    fn surface(&self, target: &TargetId) -> Arc<dyn CalendarSurface>;
}
