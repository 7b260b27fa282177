//! In-memory fakes for the verifier's collaborators (testing only)
//!
//! Provides `FixtureAcquirer`, `FailingAcquirer`, `RecordingExtractor` and
//! `ScriptedExecutionClient`, which satisfy the collaborator traits without
//! network access. Clones share their recorded state, so a test can hand one
//! clone to the verifier and inspect the other afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{Code, ExecutionResult, FileType, Result, VerifierError};
use crate::execution::ExecutionClient;
use crate::extract::{DocumentExtractor, SnippetExtractor};
use crate::git::RepositoryAcquirer;

// ---------------------------------------------------------------------------
// FixtureAcquirer
// ---------------------------------------------------------------------------

/// Acquirer that writes a fixed file tree into the requested directory.
#[derive(Debug, Clone, Default)]
pub struct FixtureAcquirer {
    files: Vec<(PathBuf, String)>,
    requested: Arc<Mutex<Vec<PathBuf>>>,
}

impl FixtureAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `relative` (parent directories are created).
    pub fn with_file(mut self, relative: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.push((relative.into(), content.into()));
        self
    }

    /// Every local directory this acquirer was asked to populate.
    pub fn requested_dirs(&self) -> Vec<PathBuf> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryAcquirer for FixtureAcquirer {
    async fn acquire(&self, local_dir: &Path, _url: &str) -> Result<()> {
        self.requested.lock().unwrap().push(local_dir.to_path_buf());
        for (relative, content) in &self.files {
            let path = local_dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FailingAcquirer
// ---------------------------------------------------------------------------

/// Acquirer that always fails as if the remote were unreachable.
#[derive(Debug, Clone)]
pub struct FailingAcquirer {
    reason: String,
    requested: Arc<Mutex<Vec<PathBuf>>>,
}

impl FailingAcquirer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            requested: Arc::default(),
        }
    }

    pub fn requested_dirs(&self) -> Vec<PathBuf> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryAcquirer for FailingAcquirer {
    async fn acquire(&self, local_dir: &Path, url: &str) -> Result<()> {
        self.requested.lock().unwrap().push(local_dir.to_path_buf());
        // leave debris behind so cleanup has something to remove
        std::fs::write(local_dir.join("partial"), url)?;
        Err(VerifierError::Git(format!("{url}: {}", self.reason)))
    }
}

// ---------------------------------------------------------------------------
// RecordingExtractor
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ExtractionLog {
    files: Vec<PathBuf>,
    yielded: usize,
    unreadable: Option<String>,
}

/// [`DocumentExtractor`] that records which files it was given and how many
/// code units it produced.
#[derive(Debug, Clone, Default)]
pub struct RecordingExtractor {
    log: Arc<Mutex<ExtractionLog>>,
}

impl RecordingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with an I/O error when asked to extract a file named `file_name`.
    pub fn unreadable(self, file_name: impl Into<String>) -> Self {
        self.log.lock().unwrap().unreadable = Some(file_name.into());
        self
    }

    /// File names (without directories) passed to `extract`, in call order.
    pub fn file_names(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap()
            .files
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    pub fn yielded(&self) -> usize {
        self.log.lock().unwrap().yielded
    }
}

impl SnippetExtractor for RecordingExtractor {
    fn extract(
        &self,
        path: &Path,
        file_type: FileType,
        attributes: &[String],
    ) -> Result<Vec<Code>> {
        let mut log = self.log.lock().unwrap();
        log.files.push(path.to_path_buf());
        let name = path.file_name().map(|n| n.to_string_lossy());
        if log.unreadable.is_some() && name.as_deref() == log.unreadable.as_deref() {
            return Err(VerifierError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is unreadable", path.display()),
            )));
        }
        let codes = DocumentExtractor.extract(path, file_type, attributes)?;
        log.yielded += codes.len();
        Ok(codes)
    }
}

// ---------------------------------------------------------------------------
// ScriptedExecutionClient
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Script {
    results: HashMap<Code, ExecutionResult>,
    unreachable_on: Option<Code>,
    executed: Vec<Code>,
}

/// Execution client answering from a table of canned results.
///
/// Unscripted code units get a clean, empty result.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutionClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(self, code: impl Into<Code>, result: ExecutionResult) -> Self {
        self.script
            .lock()
            .unwrap()
            .results
            .insert(code.into(), result);
        self
    }

    /// Fail with a transport error when `code` is submitted.
    pub fn unreachable_on(self, code: impl Into<Code>) -> Self {
        self.script.lock().unwrap().unreachable_on = Some(code.into());
        self
    }

    /// Code units submitted so far, in order.
    pub fn executed(&self) -> Vec<Code> {
        self.script.lock().unwrap().executed.clone()
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().executed.len()
    }
}

#[async_trait]
impl ExecutionClient for ScriptedExecutionClient {
    async fn execute(&self, code: &Code) -> Result<ExecutionResult> {
        let mut script = self.script.lock().unwrap();
        script.executed.push(code.clone());
        if script.unreachable_on.as_ref() == Some(code) {
            return Err(VerifierError::Transport(
                "compiler server unreachable".to_string(),
            ));
        }
        Ok(script.results.get(code).cloned().unwrap_or_default())
    }
}
