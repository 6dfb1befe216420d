use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlexstayError {
    #[error("Calendar surface not ready: {reason}")]
    SurfaceNotReady { reason: String },

    #[error("Could not navigate to target month {target} after {attempts} attempts")]
    NavigationTimeout { target: String, attempts: u32 },

    #[error("Could not click the {direction} month button while looking for {target}")]
    NavigationBlocked { direction: String, target: String },

    #[error("Day cell (week {week}, day {day}) is not selectable")]
    SelectionInvalid { week: usize, day: usize },

    #[error("No price rendered after {attempts} polls")]
    QuoteTimeout { attempts: u32 },

    #[error("Automation target failure: {reason}")]
    DispatchFailure { reason: String },

    #[error("Price backend rejected snapshot with HTTP {status}")]
    Backend { status: u16 },

    #[error("Invalid search request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl FlexstayError {
    /// Whether this error ends the search for the current listing.
    ///
    /// Candidate-level conditions (unselectable cells, missing quotes, a
    /// half-rendered surface) only cost the candidate being probed.
    pub fn is_fatal_to_listing(&self) -> bool {
        !matches!(
            self,
            Self::SurfaceNotReady { .. } | Self::SelectionInvalid { .. } | Self::QuoteTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FlexstayError>;
