use serde::{Deserialize, Serialize};

pub const EMPTY_INPUT_MESSAGE: &str = "Input cannot be empty. Please provide a valid statement.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub statement: String,
}

impl VerifyRequest {
    /// The trimmed statement, or `None` if there is nothing to check.
    pub fn statement(&self) -> Option<&str> {
        Some(self.statement.trim()).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
