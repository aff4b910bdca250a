//! The two-field `{ output, error }` envelope every bridge call returns.

use serde::Serialize;

use super::error::ErrorCode;

/// Payload of an envelope: one line, many lines, or a structured object built by a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Scalar(String),
    Lines(Vec<String>),
    Object(serde_json::Value),
}

impl Output {
    /// Collapse a transcript body: one line is a scalar, more is a list, none is an empty string.
    pub fn collapse(mut lines: Vec<String>) -> Self {
        match lines.len() {
            0 => Output::Scalar(String::new()),
            1 => Output::Scalar(lines.remove(0)),
            _ => Output::Lines(lines),
        }
    }

    /// Flatten back into lines. An empty scalar yields no lines; objects yield none.
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Output::Scalar(s) if s.is_empty() => Vec::new(),
            Output::Scalar(s) => vec![s],
            Output::Lines(lines) => lines,
            Output::Object(_) => Vec::new(),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Output::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_lines(&self) -> Option<&[String]> {
        match self {
            Output::Lines(lines) => Some(lines),
            _ => None,
        }
    }
}

/// Normalized result of one bridge call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub output: Output,
    pub error: ErrorCode,
}

impl NormalizedResult {
    pub fn ok(output: Output) -> Self {
        Self {
            output,
            error: ErrorCode::NoError,
        }
    }

    /// Failure envelope carrying the canonical message of `code` as a scalar.
    pub fn failure(code: ErrorCode) -> Self {
        Self {
            output: Output::Scalar(code.message().to_string()),
            error: code,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_shapes() {
        assert_eq!(Output::collapse(vec![]), Output::Scalar(String::new()));
        assert_eq!(
            Output::collapse(vec!["a".into()]),
            Output::Scalar("a".into())
        );
        assert_eq!(
            Output::collapse(vec!["a".into(), "b".into()]),
            Output::Lines(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn envelope_json_shape() {
        let r = NormalizedResult::ok(Output::Lines(vec!["x".into(), "y".into()]));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, serde_json::json!({ "output": ["x", "y"], "error": 0 }));

        let f = NormalizedResult::failure(ErrorCode::InvalidCommand);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "output": "Invalid command.", "error": 1 })
        );
    }

    #[test]
    fn into_lines_drops_empty_scalar() {
        assert!(Output::Scalar(String::new()).into_lines().is_empty());
        assert_eq!(Output::Scalar("j".into()).into_lines(), vec!["j".to_string()]);
    }
}
