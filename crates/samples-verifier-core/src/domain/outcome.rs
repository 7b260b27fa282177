//! Run outcomes: partial data plus an explicit completion status.

use serde::Serialize;

use super::code::Code;
use super::error::VerifierError;
use super::execution::ExecutionResult;

/// How a verification run ended.
#[derive(Debug)]
pub enum RunStatus {
    /// Every eligible document was walked.
    Completed,
    /// The run stopped early; callbacks that already fired are kept.
    Aborted { error: VerifierError },
}

/// Data gathered by a run together with how the run ended.
#[derive(Debug)]
pub struct RunOutcome<T> {
    pub value: T,
    pub status: RunStatus,
}

impl<T> RunOutcome<T> {
    pub fn completed(value: T) -> Self {
        Self {
            value,
            status: RunStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, RunStatus::Completed)
    }

    /// The failure that stopped the run, if any.
    pub fn error(&self) -> Option<&VerifierError> {
        match &self.status {
            RunStatus::Completed => None,
            RunStatus::Aborted { error } => Some(error),
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Convert into a `Result`, discarding partial data on abort.
    pub fn into_result(self) -> Result<T, VerifierError> {
        match self.status {
            RunStatus::Completed => Ok(self.value),
            RunStatus::Aborted { error } => Err(error),
        }
    }
}

/// A snippet that produced diagnostics or threw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnippetFailure {
    pub code: Code,
    pub errors: Vec<String>,
    pub exception: Option<String>,
    /// Program output, recorded only alongside diagnostics without an exception.
    pub output: Option<String>,
}

impl SnippetFailure {
    /// Classify a result; `None` means the snippet passed.
    pub fn from_result(code: &Code, result: &ExecutionResult) -> Option<Self> {
        let errors: Vec<String> = result.diagnostics().into_iter().map(String::from).collect();
        let exception = result
            .exception
            .as_ref()
            .map(|e| e.display_message().to_string());

        if errors.is_empty() && exception.is_none() {
            return None;
        }

        let output = if !errors.is_empty() && exception.is_none() {
            Some(result.output())
        } else {
            None
        };

        Some(Self {
            code: code.clone(),
            errors,
            exception,
            output,
        })
    }
}

/// Outcome of `check`: how many snippets ran and which ones failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub snippets_checked: usize,
    pub failures: Vec<SnippetFailure>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::execution::{ErrorDescriptor, ExceptionDescriptor, Severity};
    use std::collections::BTreeMap;

    #[test]
    fn test_passing_result_yields_no_failure() {
        let code = Code::new("println(1)");
        let result = ExecutionResult::with_output("1");
        assert!(SnippetFailure::from_result(&code, &result).is_none());
    }

    #[test]
    fn test_diagnostics_without_exception_keep_output() {
        let code = Code::new("val x = ");
        let mut errors = BTreeMap::new();
        errors.insert(
            "File.kt".to_string(),
            vec![ErrorDescriptor::new(Severity::Error, "Expecting an element")],
        );
        let result = ExecutionResult {
            text: "<outStream>partial</outStream>".to_string(),
            errors,
            exception: None,
        };
        let failure = SnippetFailure::from_result(&code, &result).unwrap();
        assert_eq!(failure.errors, vec!["Expecting an element".to_string()]);
        assert_eq!(failure.output.as_deref(), Some("partial"));
        assert!(failure.exception.is_none());
    }

    #[test]
    fn test_exception_only_failure() {
        let code = Code::new("error(\"x\")");
        let result = ExecutionResult {
            exception: Some(ExceptionDescriptor::new(
                "java.lang.IllegalStateException",
                Some("x".to_string()),
            )),
            ..ExecutionResult::default()
        };
        let failure = SnippetFailure::from_result(&code, &result).unwrap();
        assert!(failure.errors.is_empty());
        assert_eq!(failure.exception.as_deref(), Some("x"));
        assert!(failure.output.is_none());
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = RunOutcome::completed(3);
        assert!(ok.is_completed());
        assert!(ok.error().is_none());
        assert_eq!(ok.into_result().unwrap(), 3);

        let aborted = RunOutcome {
            value: 1,
            status: RunStatus::Aborted {
                error: VerifierError::Git("unreachable".into()),
            },
        };
        assert!(!aborted.is_completed());
        assert!(aborted.error().is_some());
        assert_eq!(aborted.into_value(), 1);
    }
}
