//! Remote execution of code units against a Kotlin compiler server.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{KotlinEnv, VerifierConfig};
use crate::domain::{
    Code, ErrorDescriptor, ExceptionDescriptor, ExecutionResult, Result, VerifierError,
};

/// File name every snippet is submitted under.
pub const SNIPPET_FILE_NAME: &str = "File.kt";

/// Sends one code unit to an execution backend.
///
/// Ordinary compile and runtime errors are reported inside the returned
/// [`ExecutionResult`]; only transport-level failures are errors.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn execute(&self, code: &Code) -> Result<ExecutionResult>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile<'a> {
    name: &'a str,
    text: &'a str,
    public_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRequest<'a> {
    args: &'a str,
    files: Vec<ProjectFile<'a>>,
    conf_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CompilerResponse {
    text: Option<String>,
    js_code: Option<String>,
    errors: BTreeMap<String, Vec<ErrorDescriptor>>,
    exception: Option<ExceptionDescriptor>,
}

impl From<CompilerResponse> for ExecutionResult {
    fn from(response: CompilerResponse) -> Self {
        ExecutionResult {
            text: response.text.or(response.js_code).unwrap_or_default(),
            errors: response.errors,
            exception: response.exception,
        }
    }
}

/// HTTP client for the Kotlin compiler server API.
#[derive(Debug, Clone)]
pub struct KotlinCompilerClient {
    http_client: reqwest::Client,
    endpoint: String,
    env: KotlinEnv,
}

impl KotlinCompilerClient {
    pub fn new(compiler_url: &str, env: KotlinEnv, request_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("samples-verifier/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()?;
        let endpoint = format!("{}/{}", compiler_url.trim_end_matches('/'), env.endpoint());

        Ok(Self {
            http_client,
            endpoint,
            env,
        })
    }

    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        Self::new(
            &config.compiler_url,
            config.kotlin_env,
            Duration::from_millis(config.execution.timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExecutionClient for KotlinCompilerClient {
    async fn execute(&self, code: &Code) -> Result<ExecutionResult> {
        let request = ProjectRequest {
            args: "",
            files: vec![ProjectFile {
                name: SNIPPET_FILE_NAME,
                text: code.as_str(),
                public_id: "",
            }],
            conf_type: self.env.conf_type(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::Transport(format!(
                "{} returned {status}: {}",
                self.endpoint,
                body.trim()
            )));
        }

        let body: CompilerResponse = response.json().await?;
        debug!(endpoint = %self.endpoint, errors = body.errors.len(), "snippet executed");
        Ok(body.into())
    }
}
