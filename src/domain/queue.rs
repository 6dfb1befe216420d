use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::listing::ListingRef;
use crate::domain::quote::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl QueueStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Done => write!(f, "done"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub listing: ListingRef,
    pub status: QueueStatus,
    pub enqueued_at: DateTime<Utc>,
}

/// What the caller gets back for one listing. Failures are reported here,
/// never raised across the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<SearchResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn from_result(result: SearchResult) -> Self {
        if result.has_error {
            Self::failure(
                result
                    .error_message
                    .unwrap_or_else(|| "search failed".to_string()),
            )
        } else {
            Self {
                success: true,
                results: Some(result),
                error: None,
            }
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: None,
            error: Some(error.into()),
        }
    }

    pub fn status(&self) -> QueueStatus {
        if self.success {
            QueueStatus::Done
        } else {
            QueueStatus::Error
        }
    }
}

/// A status transition published by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub listing_id: String,
    pub status: QueueStatus,
}
