//! Verifier configuration.
//!
//! Values come from [`VerifierConfig::default`], optionally overridden from
//! `SAMPLES_VERIFIER_*` environment variables via [`VerifierConfig::from_env`].

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::{Result, VerifierError};

pub const ENV_COMPILER_URL: &str = "SAMPLES_VERIFIER_COMPILER_URL";
pub const ENV_KOTLIN_ENV: &str = "SAMPLES_VERIFIER_KOTLIN_ENV";
pub const ENV_WORK_DIR: &str = "SAMPLES_VERIFIER_WORK_DIR";
pub const ENV_CLONE_TIMEOUT_MS: &str = "SAMPLES_VERIFIER_CLONE_TIMEOUT_MS";
pub const ENV_EXEC_TIMEOUT_MS: &str = "SAMPLES_VERIFIER_EXEC_TIMEOUT_MS";
pub const ENV_EXEC_MAX_RETRIES: &str = "SAMPLES_VERIFIER_EXEC_MAX_RETRIES";

/// Largest accepted `execution.max_retries`.
pub const MAX_EXEC_RETRIES: u32 = 16;

/// Which backend target executes snippets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KotlinEnv {
    /// Compile and run on the JVM.
    #[default]
    Jvm,
    /// Translate to JavaScript.
    Js,
}

impl KotlinEnv {
    /// Backend endpoint path for this target.
    pub fn endpoint(self) -> &'static str {
        match self {
            KotlinEnv::Jvm => "api/compiler/run",
            KotlinEnv::Js => "api/compiler/translate",
        }
    }

    /// `confType` value sent with each request.
    pub fn conf_type(self) -> &'static str {
        match self {
            KotlinEnv::Jvm => "java",
            KotlinEnv::Js => "js",
        }
    }
}

impl fmt::Display for KotlinEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KotlinEnv::Jvm => f.write_str("jvm"),
            KotlinEnv::Js => f.write_str("js"),
        }
    }
}

impl FromStr for KotlinEnv {
    type Err = VerifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jvm" | "java" => Ok(KotlinEnv::Jvm),
            "js" => Ok(KotlinEnv::Js),
            other => Err(VerifierError::InvalidConfig(format!(
                "unknown kotlin env: {other} (expected jvm or js)"
            ))),
        }
    }
}

/// Repository acquisition settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Upper bound for one `git clone` (milliseconds).
    pub timeout_ms: u64,
    /// Shallow clone depth; `None` fetches full history.
    pub depth: Option<u32>,
    /// Branch or tag to check out instead of the default branch.
    pub branch: Option<String>,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 300_000,
            depth: Some(1),
            branch: None,
        }
    }
}

impl CloneConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Remote execution controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Maximum wall-clock time for a single attempt (milliseconds).
    pub timeout_ms: u64,
    /// Maximum number of retries (0 = no retries, run once).
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries (milliseconds).
    pub backoff_base_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 2,
            backoff_base_ms: 500,
        }
    }
}

/// Top-level verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Base URL of the Kotlin compiler server.
    pub compiler_url: String,
    pub kotlin_env: KotlinEnv,
    /// Parent directory for per-run scratch clones; system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    pub clone: CloneConfig,
    pub execution: ExecutionConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            compiler_url: "http://localhost:8080".to_string(),
            kotlin_env: KotlinEnv::default(),
            work_dir: None,
            clone: CloneConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl VerifierConfig {
    /// Defaults overridden by any `SAMPLES_VERIFIER_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_COMPILER_URL) {
            config.compiler_url = url;
        }
        if let Some(env) = lookup(ENV_KOTLIN_ENV) {
            config.kotlin_env = env.parse()?;
        }
        if let Some(dir) = lookup(ENV_WORK_DIR) {
            config.work_dir = Some(PathBuf::from(dir));
        }
        if let Some(ms) = lookup(ENV_CLONE_TIMEOUT_MS) {
            config.clone.timeout_ms = parse_number(ENV_CLONE_TIMEOUT_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_EXEC_TIMEOUT_MS) {
            config.execution.timeout_ms = parse_number(ENV_EXEC_TIMEOUT_MS, &ms)?;
        }
        if let Some(n) = lookup(ENV_EXEC_MAX_RETRIES) {
            config.execution.max_retries = parse_number(ENV_EXEC_MAX_RETRIES, &n)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compiler_url.trim().is_empty() {
            return Err(VerifierError::InvalidConfig(
                "compiler_url must not be empty".to_string(),
            ));
        }
        if self.clone.timeout_ms == 0 {
            return Err(VerifierError::InvalidConfig(
                "clone.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.execution.max_retries > MAX_EXEC_RETRIES {
            return Err(VerifierError::InvalidConfig(format!(
                "execution.max_retries must be at most {MAX_EXEC_RETRIES}, got {}",
                self.execution.max_retries
            )));
        }
        if self.execution.timeout_ms == 0 {
            return Err(VerifierError::InvalidConfig(
                "execution.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| VerifierError::InvalidConfig(format!("{key} must be a number, got {raw:?}")))
}
