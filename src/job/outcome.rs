//! Terminal result of a job

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of every failure message
pub const FAILURE_PREFIX: &str = "Operation failed";

/// What a job settles to
///
/// Failure is carried as data so that one failed job never aborts the other
/// jobs dispatched in the same batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success { response: Value },
    Fail { error: String },
}

impl Outcome {
    pub fn success(response: Value) -> Self {
        Outcome::Success { response }
    }

    /// Wrap a cause as `"Operation failed: <cause>"`
    pub fn failure(cause: impl Display) -> Self {
        Outcome::Fail {
            error: format!("{FAILURE_PREFIX}: {cause}"),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Success becomes Ok(response), failure becomes Err(message)
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            Outcome::Success { response } => Ok(response),
            Outcome::Fail { error } => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_message() {
        let outcome = Outcome::failure("Remote server returned status code: 404");
        assert_eq!(
            outcome,
            Outcome::Fail {
                error: "Operation failed: Remote server returned status code: 404".to_string()
            }
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_wire_shape() {
        let success = serde_json::to_value(Outcome::success(json!({"status": "OK"}))).unwrap();
        assert_eq!(success, json!({"status": "success", "response": {"status": "OK"}}));

        let fail = serde_json::to_value(Outcome::failure("boom")).unwrap();
        assert_eq!(fail, json!({"status": "fail", "error": "Operation failed: boom"}));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Outcome::success(json!("OK")).into_result(), Ok(json!("OK")));
        assert_eq!(
            Outcome::failure("x").into_result(),
            Err("Operation failed: x".to_string())
        );
    }
}
