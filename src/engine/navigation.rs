use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::types::EngineConfig;
use crate::domain::month::{MonthToken, YearMonth};
use crate::error::{FlexstayError, Result};
use crate::ports::calendar_surface::{CalendarSurface, NavDirection};

/// Moves the calendar widget month by month until a target month is shown.
pub struct MonthNavigator<'a> {
    surface: &'a dyn CalendarSurface,
    config: &'a EngineConfig,
}

impl<'a> MonthNavigator<'a> {
    pub fn new(surface: &'a dyn CalendarSurface, config: &'a EngineConfig) -> Self {
        Self { surface, config }
    }

    pub async fn current_month(&self) -> Result<YearMonth> {
        self.surface.read_month().await?.year_month()
    }

    pub async fn navigate_forward(&self, target: MonthToken) -> Result<YearMonth> {
        self.step_until(target, NavDirection::Forward).await
    }

    pub async fn navigate_backward(&self, target: MonthToken) -> Result<YearMonth> {
        self.step_until(target, NavDirection::Backward).await
    }

    /// Show `target`, stepping in whichever direction it lies from the
    /// displayed month. Year-less targets are pinned with `today`.
    pub async fn navigate_to(&self, target: MonthToken, today: NaiveDate) -> Result<YearMonth> {
        let current = self.current_month().await?;
        if current.month == target {
            return Ok(current);
        }
        if target.resolve(today) > current {
            self.navigate_forward(target).await
        } else {
            self.navigate_backward(target).await
        }
    }

    async fn step_until(&self, target: MonthToken, direction: NavDirection) -> Result<YearMonth> {
        let max_attempts = self.config.max_navigation_attempts;

        for attempt in 1..=max_attempts {
            match self.current_month().await {
                Ok(current) if current.month == target => return Ok(current),
                Ok(current) => {
                    debug!(%current, %target, attempt, %direction, "Stepping calendar");
                    if !self.surface.click_navigation(direction).await? {
                        return Err(FlexstayError::NavigationBlocked {
                            direction: direction.to_string(),
                            target: target.to_string(),
                        });
                    }
                }
                Err(e @ FlexstayError::SurfaceNotReady { .. }) => {
                    warn!(attempt, error = %e, "Month header not readable, retrying");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.config.navigation_settle()).await;
        }

        // The last click may have landed on the target.
        if let Ok(current) = self.current_month().await
            && current.month == target
        {
            return Ok(current);
        }

        Err(FlexstayError::NavigationTimeout {
            target: target.to_string(),
            attempts: max_attempts,
        })
    }
}
