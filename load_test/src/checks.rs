//! Response checks
//!
//! A check is a named pass/fail assertion. Failures are counted by the
//! metrics collector and never abort an iteration.

use serde_json::Value;
use thiserror::Error;

pub const STATUS_200_OR_404: &str = "GET /todo/{id} status 200 or 404";
pub const ID_MATCHES: &str = "ID should match";

/// Status 0 stands for "no response"; it never passes.
pub fn status_accepted(status: u16) -> bool {
    status == 200 || status == 404
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdCheckFailure {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response body has no `id` field")]
    MissingId,

    #[error("expected id {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },
}

/// Parse `body` as JSON and compare its `id` field with `expected`.
///
/// The comparison is strict: a numeric `id` never matches a string.
pub fn id_matches(body: &str, expected: &str) -> Result<(), IdCheckFailure> {
    let parsed: Value =
        serde_json::from_str(body).map_err(|e| IdCheckFailure::InvalidJson(e.to_string()))?;

    match parsed.get("id") {
        Some(Value::String(actual)) if actual == expected => Ok(()),
        Some(Value::String(actual)) => Err(IdCheckFailure::Mismatch {
            expected: expected.to_string(),
            actual: actual.clone(),
        }),
        Some(other) => Err(IdCheckFailure::Mismatch {
            expected: expected.to_string(),
            actual: other.to_string(),
        }),
        None => Err(IdCheckFailure::MissingId),
    }
}
