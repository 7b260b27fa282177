//! Structured observability hooks for verification run lifecycle events.
//!
//! This module provides:
//! - A run-scoped tracing span via [`run_span`]
//! - Emission functions for key lifecycle events: start, acquisition, file
//!   processing, snippet failure, abort, cleanup failure, finish
//!
//! Verbosity follows `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use std::path::Path;

use tracing::{error, info, info_span, warn, Span};

use crate::domain::{FileType, SnippetFailure};

/// Span tagging every event of one run with its run id and repository url.
///
/// Attach it with [`tracing::Instrument`] so it stays correct across awaits.
pub fn run_span(run_id: &str, url: &str) -> Span {
    info_span!("samples_verifier.run", run_id = %run_id, url = %url)
}

/// Emit event: run started for a repository.
pub fn emit_run_started(operation: &str, file_type: FileType, attributes: &[String]) {
    info!(
        event = "run.started",
        operation = %operation,
        file_type = %file_type,
        attributes = ?attributes,
        "Cloning repository..."
    );
}

/// Emit event: repository materialized locally.
pub fn emit_repository_acquired(local_dir: &Path, head_sha: Option<&str>) {
    info!(
        event = "repository.acquired",
        local_dir = %local_dir.display(),
        head_sha = head_sha.unwrap_or("unknown"),
        "Repository cloned"
    );
}

/// Emit event: a document is about to be scanned.
pub fn emit_file_processing(path: &Path) {
    info!(event = "file.processing", path = %path.display(), "Processing {}...", path.display());
}

/// Emit event: a snippet failed; mirrors the human-readable check report.
pub fn emit_snippet_failed(failure: &SnippetFailure) {
    info!(event = "snippet.failed", "Code: \n{}", failure.code);
    if !failure.errors.is_empty() {
        info!(event = "snippet.failed", "Errors: \n{}", failure.errors.join("\n"));
    }
    match (&failure.exception, &failure.output) {
        (Some(exception), _) => info!(event = "snippet.failed", "Exception: \n{}", exception),
        (None, Some(output)) => info!(event = "snippet.failed", "Output: \n{}", output),
        (None, None) => {}
    }
}

/// Emit event: the run stopped early.
pub fn emit_run_aborted(error: &dyn std::fmt::Display) {
    error!(event = "run.aborted", error = %error, "{}", error);
}

/// Emit event: removing the scratch directory failed (warning level).
pub fn emit_cleanup_failed(local_dir: &Path, error: &dyn std::fmt::Display) {
    warn!(event = "cleanup.failed", local_dir = %local_dir.display(), error = %error);
}

/// Emit event: run finished with duration, snippet count and completion status.
pub fn emit_run_finished(duration_ms: u64, snippets: usize, completed: bool) {
    info!(
        event = "run.finished",
        duration_ms = duration_ms,
        snippets = snippets,
        completed = completed,
    );
}
