//! Domain models for the samples verifier.
//!
//! - `Code`: one extracted snippet
//! - `FileType`: which document format to scan
//! - `ExecutionResult`: what the backend reported for one snippet
//! - `RunOutcome`: data gathered by a run plus how the run ended

pub mod code;
pub mod error;
pub mod execution;
pub mod outcome;

pub use code::{Code, FileType};
pub use error::{Result, VerifierError};
pub use execution::{
    ErrorDescriptor, ExceptionDescriptor, ExecutionResult, Severity, StackFrame, TextInterval,
    TextPosition,
};
pub use outcome::{CheckReport, RunOutcome, RunStatus, SnippetFailure};
