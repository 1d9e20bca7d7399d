//! Response bodies for the caller-facing operations.
//!
//! Successful calls answer `{"success": true, ...payload}`. Failures answer
//! `{"success": false, "category": ..., "detail": ...}` with an HTTP status
//! hint for whatever front end serves them.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{ErrorCategory, RelayResult};
use crate::settlement::SubmissionOutcome;

/// A response body plus the HTTP status it should be served with.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        Self {
            status: 200,
            body: with_success(to_value(payload), true),
        }
    }

    pub fn failure(category: ErrorCategory, detail: impl Into<Value>) -> Self {
        Self {
            status: category.status_code(),
            body: json!({
                "success": false,
                "category": category,
                "detail": detail.into(),
            }),
        }
    }

    pub fn from_result<T: Serialize>(result: &RelayResult<T>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(err) => Self::failure(err.category(), err.to_string()),
        }
    }

    /// Submissions that did not confirm keep their outcome fields
    /// (`status`, `reason`, `code`, ...) next to the failure category.
    pub fn from_outcome(result: &RelayResult<SubmissionOutcome>) -> Self {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => return Self::failure(err.category(), err.to_string()),
        };
        match outcome.category() {
            None => Self::ok(outcome),
            Some(category) => {
                let mut body = with_success(to_value(outcome), false);
                if let Value::Object(map) = &mut body {
                    map.insert("category".to_string(), json!(category));
                }
                Self {
                    status: category.status_code(),
                    body,
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.body["success"] == true
    }
}

fn to_value<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Response payload failed to serialize");
        Value::Null
    })
}

fn with_success(payload: Value, success: bool) -> Value {
    let mut map = match payload {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    map.insert("success".to_string(), Value::Bool(success));
    Value::Object(map)
}
