use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::domain::{CheckReport, FileType, RunOutcome, SnippetFailure};

pub const CHECK_REPORT_SCHEMA_VERSION: &str = "1.0";

/// Summary section persisted in the check report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckSummaryArtifact {
    pub snippets_checked: usize,
    pub snippets_failed: usize,
    pub run_completed: bool,
    pub abort_reason: Option<String>,
    pub overall_pass: bool,
}

/// Check results artifact written for CI consumers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub repository_url: String,
    pub file_type: FileType,
    pub attributes: Vec<String>,
    pub summary: CheckSummaryArtifact,
    pub failures: Vec<SnippetFailure>,
}

impl CheckReportArtifact {
    pub fn new(
        url: &str,
        file_type: FileType,
        attributes: &[String],
        outcome: &RunOutcome<CheckReport>,
    ) -> Self {
        let report = &outcome.value;
        let abort_reason = outcome.error().map(|e| e.to_string());
        Self {
            schema_version: CHECK_REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            repository_url: url.to_string(),
            file_type,
            attributes: attributes.to_vec(),
            summary: CheckSummaryArtifact {
                snippets_checked: report.snippets_checked,
                snippets_failed: report.failed_count(),
                run_completed: abort_reason.is_none(),
                overall_pass: abort_reason.is_none() && report.passed(),
                abort_reason,
            },
            failures: report.failures.clone(),
        }
    }
}

/// Write the check report in pretty JSON format.
pub fn write_check_report_json(path: &Path, artifact: &CheckReportArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize check report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render a markdown summary of a check run.
pub fn render_check_report_md(artifact: &CheckReportArtifact) -> String {
    let summary = &artifact.summary;
    let mut out = String::new();
    out.push_str("# Samples Check\n\n");
    out.push_str(&format!("- repository: `{}`\n", artifact.repository_url));
    out.push_str(&format!(
        "- checked: {}\n- failed: {}\n",
        summary.snippets_checked, summary.snippets_failed
    ));
    if let Some(reason) = &summary.abort_reason {
        out.push_str(&format!("- aborted: {}\n", reason));
    }
    out.push_str(&format!(
        "- result: {}\n",
        if summary.overall_pass { "PASS" } else { "FAIL" }
    ));

    for (idx, failure) in artifact.failures.iter().enumerate() {
        out.push_str(&format!("\n## Failure {}\n\n", idx + 1));
        out.push_str("```kotlin\n");
        out.push_str(failure.code.as_str());
        if !failure.code.as_str().ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
        for error in &failure.errors {
            out.push_str(&format!("- error: {}\n", error));
        }
        if let Some(exception) = &failure.exception {
            out.push_str(&format!("- exception: {}\n", exception));
        }
        if let Some(output) = &failure.output {
            out.push_str("- output:\n\n```text\n");
            out.push_str(output);
            if !output.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
    }
    out
}
