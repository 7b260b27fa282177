//! Execution results reported by the remote compiler backend.
//!
//! `ExecutionResult` is used as a hash-map key by
//! [`SamplesVerifier::collect`](crate::SamplesVerifier::collect), so every
//! type reachable from it derives `Eq + Hash` and the diagnostic map is a
//! `BTreeMap` (hashing must not depend on insertion order).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Diagnostic severity as reported by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
    #[serde(other)]
    Unknown,
}

/// Line/column position inside a snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextPosition {
    pub line: u32,
    pub ch: u32,
}

/// Source range a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextInterval {
    pub start: TextPosition,
    pub end: TextPosition,
}

/// A single compiler diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub interval: Option<TextInterval>,
}

impl ErrorDescriptor {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            class_name: None,
            interval: None,
        }
    }
}

/// One frame of a captured stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub class_name: String,
    pub method_name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub line_number: i32,
}

/// Exception thrown while the snippet was running.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDescriptor {
    #[serde(default)]
    pub message: Option<String>,
    pub full_name: String,
    #[serde(default)]
    pub stack_trace: Vec<StackFrame>,
    #[serde(default)]
    pub cause: Option<Box<ExceptionDescriptor>>,
}

impl ExceptionDescriptor {
    pub fn new(full_name: impl Into<String>, message: Option<String>) -> Self {
        Self {
            message,
            full_name: full_name.into(),
            stack_trace: Vec::new(),
            cause: None,
        }
    }

    /// Message to show a reader; falls back to the exception class name.
    pub fn display_message(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.full_name)
    }
}

/// The structured outcome of running one code unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionResult {
    /// Raw program output, possibly wrapped in stream markup.
    pub text: String,
    /// Diagnostics keyed by category (the backend keys them by file name).
    pub errors: BTreeMap<String, Vec<ErrorDescriptor>>,
    /// Present only when execution terminated abnormally.
    pub exception: Option<ExceptionDescriptor>,
}

impl ExecutionResult {
    /// A clean run that printed `text`.
    pub fn with_output(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// All diagnostic messages, flattened in category order.
    pub fn diagnostics(&self) -> Vec<&str> {
        self.errors
            .values()
            .flatten()
            .map(|e| e.message.as_str())
            .collect()
    }

    pub fn has_diagnostics(&self) -> bool {
        self.errors.values().any(|list| !list.is_empty())
    }

    /// A snippet fails iff it produced a diagnostic or threw.
    pub fn is_failure(&self) -> bool {
        self.has_diagnostics() || self.exception.is_some()
    }

    /// Program output with the backend's stream markup removed.
    pub fn output(&self) -> String {
        static STREAM_TAGS: OnceLock<Option<Regex>> = OnceLock::new();
        match STREAM_TAGS.get_or_init(|| Regex::new(r"</?(outStream|errStream|errorStream)>").ok())
        {
            Some(re) => re.replace_all(&self.text, "").into_owned(),
            None => self.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn result_with_errors(messages: &[&str]) -> ExecutionResult {
        let mut errors = BTreeMap::new();
        errors.insert(
            "File.kt".to_string(),
            messages
                .iter()
                .map(|m| ErrorDescriptor::new(Severity::Error, *m))
                .collect(),
        );
        ExecutionResult {
            text: String::new(),
            errors,
            exception: None,
        }
    }

    #[test]
    fn test_clean_result_is_not_failure() {
        let result = ExecutionResult::with_output("<outStream>hi\n</outStream>");
        assert!(!result.is_failure());
        assert_eq!(result.output(), "hi\n");
    }

    #[test]
    fn test_empty_error_lists_are_not_diagnostics() {
        let result = result_with_errors(&[]);
        assert!(!result.has_diagnostics());
        assert!(!result.is_failure());
    }

    #[test]
    fn test_diagnostics_flatten_in_category_order() {
        let mut result = result_with_errors(&["unresolved reference: foo"]);
        result.errors.insert(
            "A.kt".to_string(),
            vec![ErrorDescriptor::new(Severity::Warning, "unused variable")],
        );
        assert_eq!(
            result.diagnostics(),
            vec!["unused variable", "unresolved reference: foo"]
        );
        assert!(result.is_failure());
    }

    #[test]
    fn test_exception_alone_is_failure() {
        let result = ExecutionResult {
            exception: Some(ExceptionDescriptor::new(
                "java.lang.IllegalStateException",
                Some("boom".to_string()),
            )),
            ..ExecutionResult::default()
        };
        assert!(result.is_failure());
        assert_eq!(result.exception.unwrap().display_message(), "boom");
    }

    #[test]
    fn test_equal_results_collapse_as_map_keys() {
        let mut map = HashMap::new();
        map.insert(result_with_errors(&["x"]), "first");
        map.insert(result_with_errors(&["x"]), "second");
        assert_eq!(map.len(), 1);
        assert_eq!(map.values().next(), Some(&"second"));
    }

    #[test]
    fn test_decodes_backend_payload() {
        let payload = serde_json::json!({
            "text": "",
            "errors": {
                "File.kt": [{
                    "interval": {"start": {"line": 0, "ch": 4}, "end": {"line": 0, "ch": 7}},
                    "message": "Unresolved reference: foo",
                    "severity": "ERROR",
                    "className": "red_wavy_line"
                }, {
                    "message": "something odd",
                    "severity": "TYPO"
                }]
            },
            "exception": null
        });
        let result: ExecutionResult = serde_json::from_value(payload).unwrap();
        let errors = &result.errors["File.kt"];
        assert_eq!(errors[0].severity, Severity::Error);
        assert_eq!(errors[0].interval.unwrap().start.ch, 4);
        assert_eq!(errors[1].severity, Severity::Unknown);
    }
}
