//! Check outcomes and per-check results

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Error,
    Skipped,
    Warning,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Error => "error",
            Status::Skipped => "skipped",
            Status::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a test reports; a test may report several
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub status: Status,
    pub value: Option<JsonValue>,
    pub message: Option<String>,
    pub context: Option<JsonValue>,
}

impl Check {
    fn new(status: Status) -> Self {
        Self {
            status,
            value: None,
            message: None,
            context: None,
        }
    }

    pub fn pass() -> Self {
        Self::new(Status::Passed)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Status::Failed).with_message(message)
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(Status::Skipped).with_message(message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Status::Warning).with_message(message)
    }

    pub fn with_value(mut self, value: impl Into<JsonValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_context(mut self, context: JsonValue) -> Self {
        self.context = Some(context);
        self
    }
}

/// One reported result, as it appears in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcResult {
    pub suite: String,
    pub test: String,
    pub description: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
