//! Samples Verifier Core Library
//!
//! Checks that code samples embedded in a project's documentation still
//! compile and run: clone the repository, extract attributed snippets from
//! Markdown or HTML documents, execute each one on a Kotlin compiler server
//! and report what failed.

pub mod config;
pub mod domain;
pub mod execution;
pub mod extract;
pub mod fakes;
pub mod git;
pub mod obs;
pub mod reporting;
pub mod telemetry;
pub mod verifier;
pub mod walker;

pub use config::{CloneConfig, ExecutionConfig, KotlinEnv, VerifierConfig};
pub use domain::{
    CheckReport, Code, ErrorDescriptor, ExceptionDescriptor, ExecutionResult, FileType, Result,
    RunOutcome, RunStatus, Severity, SnippetFailure, VerifierError,
};
pub use execution::{
    execute_with_controls, ControlledClient, ExecutionClient, KotlinCompilerClient,
};
pub use extract::{DocumentExtractor, SnippetExtractor};
pub use git::{capture_head_sha, repository_name, GitCli, RepositoryAcquirer};
pub use reporting::{
    render_check_report_md, write_check_report_json, CheckReportArtifact, CheckSummaryArtifact,
};
pub use telemetry::init_tracing;
pub use verifier::{DefaultVerifier, SamplesVerifier};
pub use walker::{DocumentWalker, SnippetStream};

/// Samples verifier version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
