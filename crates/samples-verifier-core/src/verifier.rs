//! The verification orchestrator.
//!
//! Every public operation runs the same pipeline: create a scratch directory,
//! acquire the repository into it, stream code units out of the matching
//! documents, hand each code unit to an operation-specific handler, and
//! remove the scratch directory. Acquisition, walk and transport failures
//! stop the run early; they are logged and returned as
//! [`RunStatus::Aborted`] next to whatever data was gathered before the
//! failure. The scratch directory is removed on every path.

use std::collections::HashMap;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::config::VerifierConfig;
use crate::domain::{
    CheckReport, Code, ExecutionResult, FileType, Result, RunOutcome, RunStatus, SnippetFailure,
};
use crate::execution::{ControlledClient, ExecutionClient, KotlinCompilerClient};
use crate::extract::{DocumentExtractor, SnippetExtractor};
use crate::git::{repository_name, GitCli, RepositoryAcquirer};
use crate::obs;
use crate::walker::SnippetStream;

/// Verifier wired to `git`, the built-in extractors and the HTTP backend.
pub type DefaultVerifier =
    SamplesVerifier<GitCli, DocumentExtractor, ControlledClient<KotlinCompilerClient>>;

/// Orchestrates acquisition, extraction and execution of documentation samples.
pub struct SamplesVerifier<A, X, E> {
    acquirer: A,
    extractor: X,
    client: E,
    work_dir: Option<PathBuf>,
}

impl DefaultVerifier {
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        config.validate()?;
        let client = ControlledClient::new(
            KotlinCompilerClient::from_config(config)?,
            config.execution.clone(),
        );
        let acquirer = GitCli::new(config.clone.clone());
        let verifier = SamplesVerifier::new(acquirer, DocumentExtractor, client);
        Ok(match &config.work_dir {
            Some(dir) => verifier.with_work_dir(dir.clone()),
            None => verifier,
        })
    }
}

impl<A, X, E> SamplesVerifier<A, X, E>
where
    A: RepositoryAcquirer,
    X: SnippetExtractor,
    E: ExecutionClient,
{
    pub fn new(acquirer: A, extractor: X, client: E) -> Self {
        Self {
            acquirer,
            extractor,
            client,
            work_dir: None,
        }
    }

    /// Create per-run scratch directories under `dir` instead of the system
    /// temp directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Execute every code unit and keep one representative per distinct result.
    ///
    /// The map is keyed by [`ExecutionResult`]: snippets whose results are
    /// identical collapse into a single entry holding the last such snippet.
    pub async fn collect(
        &self,
        url: &str,
        attributes: &[String],
        file_type: FileType,
    ) -> RunOutcome<HashMap<ExecutionResult, Code>> {
        let mut handler = Collector {
            client: &self.client,
            results: HashMap::new(),
        };
        let status = self
            .process_repository("collect", url, attributes, file_type, &mut handler)
            .await;
        RunOutcome {
            value: handler.results,
            status,
        }
    }

    /// Execute every code unit and report the ones that failed.
    ///
    /// A snippet fails iff it produced at least one diagnostic or threw.
    /// Failures are logged as they are found and returned in the report.
    pub async fn check(
        &self,
        url: &str,
        attributes: &[String],
        file_type: FileType,
    ) -> RunOutcome<CheckReport> {
        let mut handler = Checker {
            client: &self.client,
            report: CheckReport::default(),
        };
        let status = self
            .process_repository("check", url, attributes, file_type, &mut handler)
            .await;
        RunOutcome {
            value: handler.report,
            status,
        }
    }

    /// Classify code units without executing them.
    ///
    /// `classifier` receives every code unit in walk order and returns one
    /// value per unit; values are zipped with the units into a map keyed by
    /// the classifier output. It also runs over the partial list when the
    /// run aborted.
    pub async fn parse<T, F>(
        &self,
        url: &str,
        attributes: &[String],
        file_type: FileType,
        classifier: F,
    ) -> RunOutcome<HashMap<T, Code>>
    where
        T: Eq + Hash,
        F: FnOnce(&[Code]) -> Vec<T>,
    {
        let mut handler = Gatherer { codes: Vec::new() };
        let status = self
            .process_repository("parse", url, attributes, file_type, &mut handler)
            .await;

        let codes = handler.codes;
        let values = classifier(&codes);
        if values.len() != codes.len() {
            warn!(
                event = "parse.length_mismatch",
                codes = codes.len(),
                values = values.len(),
                "classifier output length differs from input; extra entries dropped"
            );
        }

        RunOutcome {
            value: values.into_iter().zip(codes).collect(),
            status,
        }
    }

    async fn process_repository<H: CodeHandler>(
        &self,
        operation: &str,
        url: &str,
        attributes: &[String],
        file_type: FileType,
        handler: &mut H,
    ) -> RunStatus {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id, url);

        async move {
            let started = Instant::now();
            obs::emit_run_started(operation, file_type, attributes);

            let mut processed = 0usize;
            let status = match self.scratch_dir(url) {
                Ok(scratch) => {
                    let result = self
                        .run_pipeline(
                            scratch.path(),
                            url,
                            attributes,
                            file_type,
                            handler,
                            &mut processed,
                        )
                        .await;
                    release(scratch);
                    match result {
                        Ok(()) => RunStatus::Completed,
                        Err(error) => RunStatus::Aborted { error },
                    }
                }
                Err(error) => RunStatus::Aborted { error },
            };

            if let RunStatus::Aborted { error } = &status {
                obs::emit_run_aborted(error);
            }
            obs::emit_run_finished(
                started.elapsed().as_millis() as u64,
                processed,
                matches!(status, RunStatus::Completed),
            );
            status
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline<H: CodeHandler>(
        &self,
        local_dir: &Path,
        url: &str,
        attributes: &[String],
        file_type: FileType,
        handler: &mut H,
        processed: &mut usize,
    ) -> Result<()> {
        self.acquirer.acquire(local_dir, url).await?;

        for code in SnippetStream::new(local_dir, file_type, attributes, &self.extractor) {
            handler.handle(code?).await?;
            *processed += 1;
        }
        Ok(())
    }

    /// A fresh, uniquely named directory whose prefix is derived from `url`.
    fn scratch_dir(&self, url: &str) -> Result<TempDir> {
        let prefix = format!("{}-", repository_name(url));
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);
        let dir = match &self.work_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// Remove a run's scratch directory, logging rather than propagating failure.
fn release(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    let result = match scratch.close() {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(_) if path.is_file() => std::fs::remove_file(&path),
        other => other,
    };
    if let Err(err) = result {
        obs::emit_cleanup_failed(&path, &err);
    }
}

/// Per-operation reaction to one extracted code unit.
#[async_trait]
trait CodeHandler: Send {
    async fn handle(&mut self, code: Code) -> Result<()>;
}

struct Collector<'a, E> {
    client: &'a E,
    results: HashMap<ExecutionResult, Code>,
}

#[async_trait]
impl<'a, E: ExecutionClient> CodeHandler for Collector<'a, E> {
    async fn handle(&mut self, code: Code) -> Result<()> {
        let result = self.client.execute(&code).await?;
        self.results.insert(result, code);
        Ok(())
    }
}

struct Checker<'a, E> {
    client: &'a E,
    report: CheckReport,
}

#[async_trait]
impl<'a, E: ExecutionClient> CodeHandler for Checker<'a, E> {
    async fn handle(&mut self, code: Code) -> Result<()> {
        let result = self.client.execute(&code).await?;
        self.report.snippets_checked += 1;
        if let Some(failure) = SnippetFailure::from_result(&code, &result) {
            obs::emit_snippet_failed(&failure);
            self.report.failures.push(failure);
        }
        Ok(())
    }
}

struct Gatherer {
    codes: Vec<Code>,
}

#[async_trait]
impl CodeHandler for Gatherer {
    async fn handle(&mut self, code: Code) -> Result<()> {
        self.codes.push(code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FailingAcquirer, FixtureAcquirer, ScriptedExecutionClient};

    #[tokio::test]
    async fn scratch_dirs_are_unique_per_run() {
        let work = tempfile::tempdir().unwrap();
        let verifier = SamplesVerifier::new(
            FixtureAcquirer::new(),
            DocumentExtractor,
            ScriptedExecutionClient::new(),
        )
        .with_work_dir(work.path());

        let a = verifier.scratch_dir("https://host/org/docs.git").unwrap();
        let b = verifier.scratch_dir("https://host/org/docs.git").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("docs-"));
        assert!(a.path().starts_with(work.path()));
    }

    #[test]
    fn release_removes_directory_tree() {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::create_dir_all(path.join("nested/deeper")).unwrap();
        std::fs::write(path.join("nested/deeper/a.md"), "x").unwrap();

        release(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn release_tolerates_already_removed_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::remove_dir_all(&path).unwrap();

        release(scratch);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn failed_acquisition_aborts_with_git_error() {
        let acquirer = FailingAcquirer::new("authentication failed");
        let verifier = SamplesVerifier::new(
            acquirer.clone(),
            DocumentExtractor,
            ScriptedExecutionClient::new(),
        );

        let outcome = verifier
            .check("https://host/org/private.git", &[], FileType::Markdown)
            .await;

        assert!(!outcome.is_completed());
        assert!(outcome
            .error()
            .unwrap()
            .to_string()
            .contains("authentication failed"));
        assert_eq!(outcome.value.snippets_checked, 0);
        for dir in acquirer.requested_dirs() {
            assert!(!dir.exists());
        }
    }
}
