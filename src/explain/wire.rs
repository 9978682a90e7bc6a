//! Explain wire format
//!
//! Builds the `{explain: <command>, verbosity: <mode>}` envelope for the
//! connected release and recognizes command failures returned as replies.

use serde_json::Value;
use thiserror::Error;

use crate::classifier::Document;
use crate::version::{ServerVersion, VersionConstraint};

use super::config::Verbosity;

/// First release whose explain command accepts `verbosity`
pub const VERBOSITY_SINCE: (u64, u64) = (3, 0);

/// Wrap `command` in an explain envelope suited to `version`
pub fn explain_command(
    command: Document,
    version: &ServerVersion,
    verbosity: Verbosity,
) -> Document {
    let mut doc = Document::new();
    doc.insert("explain".to_string(), Value::Object(command));

    let (major, minor) = VERBOSITY_SINCE;
    if VersionConstraint::at_least(major, minor).matches(version) {
        doc.insert("verbosity".to_string(), Value::from(verbosity.as_str()));
    }

    doc
}

/// A reply with `ok: 0`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandFailure {
    /// Numeric server error code
    pub code: Option<i64>,
    /// Symbolic server error name
    pub code_name: Option<String>,
    /// Server error text
    pub message: String,
}

impl CommandFailure {
    /// Extract a failure from a reply; `None` if the reply is not a failure.
    ///
    /// A reply without `ok` is trusted as a success.
    pub fn from_reply(reply: &Document) -> Option<Self> {
        let failed = match reply.get("ok")? {
            Value::Bool(ok) => !ok,
            Value::Number(n) => n.as_f64() == Some(0.0),
            _ => false,
        };
        if !failed {
            return None;
        }

        let code = reply.get("code").and_then(Value::as_i64);
        let code_name = reply
            .get("codeName")
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = match (reply.get("errmsg").and_then(Value::as_str), code) {
            (Some(errmsg), _) => errmsg.to_string(),
            (None, Some(code)) => format!("command failed with code {}", code),
            (None, None) => "command failed".to_string(),
        };

        Some(Self {
            code,
            code_name,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_verbosity_only_for_newer_servers() {
        let find = doc(json!({"find": "orders", "filter": {}}));

        let modern =
            explain_command(find.clone(), &"3.2.16".parse().unwrap(), Verbosity::QueryPlanner);
        assert_eq!(modern["verbosity"], json!("queryPlanner"));
        assert_eq!(modern.keys().next().map(String::as_str), Some("explain"));

        let legacy = explain_command(find, &"2.6.12".parse().unwrap(), Verbosity::ExecutionStats);
        assert!(!legacy.contains_key("verbosity"));
    }

    #[test]
    fn test_successful_replies() {
        assert_eq!(CommandFailure::from_reply(&doc(json!({"ok": 1}))), None);
        assert_eq!(CommandFailure::from_reply(&doc(json!({"ok": 1.0}))), None);
        assert_eq!(CommandFailure::from_reply(&doc(json!({"ok": true}))), None);
        assert_eq!(CommandFailure::from_reply(&doc(json!({"queryPlanner": {}}))), None);
    }

    #[test]
    fn test_failed_reply() {
        let failure = CommandFailure::from_reply(&doc(json!({
            "ok": 0.0,
            "errmsg": "ns does not exist",
            "code": 26,
            "codeName": "NamespaceNotFound"
        })))
        .unwrap();

        assert_eq!(failure.to_string(), "ns does not exist");
        assert_eq!(failure.code, Some(26));
        assert_eq!(failure.code_name.as_deref(), Some("NamespaceNotFound"));
    }

    #[test]
    fn test_failed_reply_without_message() {
        let failure = CommandFailure::from_reply(&doc(json!({"ok": 0, "code": 59}))).unwrap();
        assert_eq!(failure.message, "command failed with code 59");

        let failure = CommandFailure::from_reply(&doc(json!({"ok": false}))).unwrap();
        assert_eq!(failure.message, "command failed");
    }
}
