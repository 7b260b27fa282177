//! Repository acquisition through the `git` command line.

use std::path::Path;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use tokio::process::Command as AsyncCommand;

use crate::config::CloneConfig;
use crate::domain::error::{Result, VerifierError};
use crate::obs;

/// Materializes a remote repository into a local directory.
#[async_trait]
pub trait RepositoryAcquirer: Send + Sync {
    /// Fetch `url` into `local_dir`, which exists and is empty.
    async fn acquire(&self, local_dir: &Path, url: &str) -> Result<()>;
}

/// Acquirer that shells out to `git clone`.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    config: CloneConfig,
}

impl GitCli {
    pub fn new(config: CloneConfig) -> Self {
        Self { config }
    }

    fn clone_args(&self, local_dir: &Path, url: &str) -> Vec<String> {
        let mut args = vec!["clone".to_string(), "--quiet".to_string()];
        if let Some(depth) = self.config.depth {
            args.push("--depth".to_string());
            args.push(depth.to_string());
        }
        if let Some(branch) = &self.config.branch {
            args.push("--branch".to_string());
            args.push(branch.clone());
        }
        args.push("--".to_string());
        args.push(url.to_string());
        args.push(local_dir.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl RepositoryAcquirer for GitCli {
    async fn acquire(&self, local_dir: &Path, url: &str) -> Result<()> {
        let child = AsyncCommand::new("git")
            .args(self.clone_args(local_dir, url))
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VerifierError::Git(format!("failed to run git: {e}")))?;

        let output = tokio::time::timeout(self.config.timeout(), child.wait_with_output())
            .await
            .map_err(|_| VerifierError::Timeout {
                operation: format!("git clone {url}"),
                limit_ms: self.config.timeout_ms,
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VerifierError::Git(format!(
                "git clone {url} failed: {}",
                stderr.trim()
            )));
        }

        let head_sha = head_sha(local_dir).await;
        obs::emit_repository_acquired(local_dir, head_sha.as_deref());
        Ok(())
    }
}

/// HEAD of a fresh clone, read without blocking the executor; `None` when
/// `git rev-parse` fails.
async fn head_sha(repo_dir: &Path) -> Option<String> {
    let output = AsyncCommand::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_dir)
        .stdin(Stdio::null())
        .output()
        .await
        .ok()?;
    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !sha.is_empty()).then_some(sha)
}

/// Derive a directory name from a repository URL: the last path segment with
/// its extension stripped (`https://host/org/docs.git` -> `docs`).
pub fn repository_name(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or_default();
    let stem = match segment.rfind('.') {
        Some(0) | None => segment,
        Some(idx) => &segment[..idx],
    };
    let name: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "repository".to_string()
    } else {
        name
    }
}

/// Capture the HEAD commit SHA from a git repository.
///
/// Runs `git rev-parse HEAD` in the given directory. Returns an error if the
/// directory is not inside a git repository or if git is not available.
pub fn capture_head_sha(repo_dir: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .map_err(|e| VerifierError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VerifierError::Git(format!(
            "git rev-parse HEAD failed: {stderr}"
        )));
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() {
        return Err(VerifierError::Git(
            "git rev-parse HEAD returned empty output".to_string(),
        ));
    }

    Ok(sha)
}
