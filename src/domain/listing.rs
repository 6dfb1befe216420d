use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FlexstayError, Result};

/// A listing picked from a results page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRef {
    /// Identity used for queue de-duplication: the `/rooms/<id>` segment of
    /// the link, or the whole link when it has none.
    pub id: String,
    pub title: String,
    pub link: String,
}

impl ListingRef {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Result<Self> {
        let link = link.into();
        let parsed = Url::parse(&link)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FlexstayError::InvalidRequest {
                reason: format!("listing link must be http(s), got '{link}'"),
            });
        }
        let id = room_id(&parsed).unwrap_or_else(|| link.clone());
        Ok(Self {
            id,
            title: title.into(),
            link,
        })
    }
}

fn room_id(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "rooms")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
}

impl std::fmt::Display for ListingRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.id)
    }
}
