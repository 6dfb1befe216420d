use serde::{Deserialize, Serialize};

/// Date range and total price the calendar rendered for one selected stay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// e.g. `"Sep 19, 2025 - Sep 21, 2025"`
    pub date_range: String,
    /// e.g. `"$1,234"`
    pub total_price: String,
}

impl Quote {
    pub fn new(date_range: impl Into<String>, total_price: impl Into<String>) -> Self {
        Self {
            date_range: date_range.into(),
            total_price: total_price.into(),
        }
    }

    pub fn price_value(&self) -> Option<f64> {
        parse_price(&self.total_price)
    }
}

/// Outcome of one listing search, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub best_dates: Option<String>,
    pub best_price: Option<String>,
    pub has_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SearchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            has_error: true,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_error {
            return write!(
                f,
                "Search failed: {}",
                self.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        match (&self.best_dates, &self.best_price) {
            (Some(dates), Some(price)) => write!(f, "Best price: {price} for {dates}"),
            _ => write!(f, "No priced stay found"),
        }
    }
}

/// Numeric value of a rendered price label: the first number in the label,
/// ignoring currency symbols and thousands separators.
pub fn parse_price(label: &str) -> Option<f64> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let number: String = label[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    number.trim_end_matches('.').parse().ok()
}

/// Drop every `", <4-digit year>"` token: `"Sep 19, 2025 - Sep 21, 2025"`
/// becomes `"Sep 19 - Sep 21"`.
pub fn strip_year(date_range: &str) -> String {
    let chars: Vec<char> = date_range.chars().collect();
    let mut out = String::with_capacity(date_range.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let digits = chars[j..].iter().take_while(|c| c.is_ascii_digit()).count();
            if digits == 4 {
                i = j + 4;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
