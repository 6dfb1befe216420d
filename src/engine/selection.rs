use tracing::debug;

use crate::config::types::EngineConfig;
use crate::domain::calendar::CellRef;
use crate::error::Result;
use crate::ports::calendar_surface::CalendarSurface;

/// Clicks days of the displayed month and resets the picked range.
pub struct DateSelector<'a> {
    surface: &'a dyn CalendarSurface,
    config: &'a EngineConfig,
}

impl<'a> DateSelector<'a> {
    pub fn new(surface: &'a dyn CalendarSurface, config: &'a EngineConfig) -> Self {
        Self { surface, config }
    }

    /// `false` when the cell is not an enabled day.
    pub async fn select_day(&self, at: CellRef) -> Result<bool> {
        let clicked = self.surface.click_day(at.week, at.day).await?;
        if !clicked {
            debug!(week = at.week, day = at.day, "Day cell not selectable");
        }
        Ok(clicked)
    }

    /// Drop any selected range. Waits for the calendar to re-render when
    /// something was cleared.
    pub async fn clear_selection(&self) -> Result<bool> {
        let cleared = self.surface.clear_dates().await?;
        if cleared {
            tokio::time::sleep(self.config.clear_settle()).await;
        }
        Ok(cleared)
    }
}
