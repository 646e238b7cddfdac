use serde::{Deserialize, Serialize};

/// Top-level wrapper shared by every Bot API response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Method-specific payload; only present when `ok` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Remote error code on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    /// Remote error description on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiEnvelope {
    pub(crate) fn description_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.description
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
    }
}
