//! Samples Verifier CLI
//!
//! The `samples-verifier` command clones a documentation repository and
//! checks the code samples embedded in its Markdown or HTML files.
//!
//! ## Commands
//!
//! - `collect`: Execute every sample and print the distinct results
//! - `check`: Execute every sample and report the ones that fail
//! - `parse`: Classify samples without executing them

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::Level;

use samples_verifier_core::config::{ENV_COMPILER_URL, ENV_KOTLIN_ENV, ENV_WORK_DIR};
use samples_verifier_core::{
    render_check_report_md, write_check_report_json, CheckReportArtifact, Code, DefaultVerifier,
    ExecutionResult, FileType, KotlinEnv, RunOutcome, VerifierConfig,
};

#[derive(Parser)]
#[command(name = "samples-verifier")]
#[command(author = "Samples Verifier Developers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify code samples embedded in documentation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Base URL of the Kotlin compiler server
    #[arg(long, global = true, env = ENV_COMPILER_URL)]
    compiler_url: Option<String>,

    /// Target platform samples are executed on
    #[arg(long, global = true, env = ENV_KOTLIN_ENV)]
    kotlin_env: Option<KotlinEnv>,

    /// Parent directory for per-run scratch clones
    #[arg(long, global = true, env = ENV_WORK_DIR)]
    work_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by every run command.
#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Repository URL to clone
    url: String,

    /// Attribute a block must carry to be selected (repeatable)
    #[arg(short, long = "attribute")]
    attributes: Vec<String>,

    /// Document format to scan
    #[arg(short = 't', long = "file-type", default_value = "md")]
    file_type: FileType,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute every sample and print one representative per distinct result
    Collect {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Execute every sample and report the ones that fail
    Check {
        #[command(flatten)]
        run: RunArgs,

        /// Write a JSON check report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Classify samples without executing them
    Parse {
        #[command(flatten)]
        run: RunArgs,

        /// How each sample is keyed in the output
        #[arg(long, value_enum, default_value_t = Classifier::Digest)]
        classifier: Classifier,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Classifier {
    /// SHA-256 of the sample text
    Digest,
    /// Position of the sample in walk order
    Index,
}

#[derive(Debug, Serialize)]
struct CollectedEntry<'a> {
    code: &'a Code,
    output: String,
    result: &'a ExecutionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    samples_verifier_core::init_tracing(cli.json, level);

    let config = build_config(&cli)?;
    let verifier =
        DefaultVerifier::from_config(&config).context("Failed to configure samples verifier")?;

    match cli.command {
        Commands::Collect { run } => cmd_collect(&verifier, &run).await,
        Commands::Check { run, report } => cmd_check(&verifier, &run, report.as_deref()).await,
        Commands::Parse { run, classifier } => cmd_parse(&verifier, &run, classifier).await,
    }
}

/// Environment-derived configuration with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<VerifierConfig> {
    let mut config = VerifierConfig::from_env().context("Invalid environment configuration")?;
    if let Some(url) = &cli.compiler_url {
        config.compiler_url = url.clone();
    }
    if let Some(env) = cli.kotlin_env {
        config.kotlin_env = env;
    }
    if let Some(dir) = &cli.work_dir {
        config.work_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_collect(verifier: &DefaultVerifier, run: &RunArgs) -> Result<()> {
    let outcome = verifier
        .collect(&run.url, &run.attributes, run.file_type)
        .await;

    let mut entries: Vec<CollectedEntry<'_>> = outcome
        .value
        .iter()
        .map(|(result, code)| CollectedEntry {
            code,
            output: result.output(),
            result,
        })
        .collect();
    entries.sort_by(|a, b| a.code.cmp(b.code));

    println!("{}", serde_json::to_string_pretty(&entries)?);

    if let Some(err) = outcome.error() {
        bail!("collect aborted after {} results: {}", entries.len(), err);
    }
    Ok(())
}

async fn cmd_check(
    verifier: &DefaultVerifier,
    run: &RunArgs,
    report_path: Option<&Path>,
) -> Result<()> {
    let outcome = verifier
        .check(&run.url, &run.attributes, run.file_type)
        .await;
    let artifact = CheckReportArtifact::new(&run.url, run.file_type, &run.attributes, &outcome);

    if let Some(path) = report_path {
        write_check_report_json(path, &artifact)?;
    }
    print!("{}", render_check_report_md(&artifact));

    if !artifact.summary.overall_pass {
        bail!(
            "{} of {} samples failed{}",
            artifact.summary.snippets_failed,
            artifact.summary.snippets_checked,
            if artifact.summary.run_completed {
                ""
            } else {
                " (run aborted)"
            }
        );
    }
    Ok(())
}

async fn cmd_parse(
    verifier: &DefaultVerifier,
    run: &RunArgs,
    classifier: Classifier,
) -> Result<()> {
    let (mapping, aborted) = match classifier {
        Classifier::Digest => keyed_by(
            verifier
                .parse(&run.url, &run.attributes, run.file_type, digest_classifier)
                .await,
            |digest| digest,
        ),
        Classifier::Index => keyed_by(
            verifier
                .parse(&run.url, &run.attributes, run.file_type, index_classifier)
                .await,
            |idx| format!("{:06}", idx),
        ),
    };

    println!("{}", serde_json::to_string_pretty(&mapping)?);

    if let Some(reason) = aborted {
        bail!("parse aborted after {} samples: {}", mapping.len(), reason);
    }
    Ok(())
}

/// Re-key a parse outcome for printing, keeping partial data and the abort
/// reason, if any.
fn keyed_by<T>(
    outcome: RunOutcome<HashMap<T, Code>>,
    key: impl Fn(T) -> String,
) -> (BTreeMap<String, Code>, Option<String>) {
    let aborted = outcome.error().map(|e| e.to_string());
    let mapping = outcome
        .value
        .into_iter()
        .map(|(k, code)| (key(k), code))
        .collect();
    (mapping, aborted)
}

/// Key each sample by the hex SHA-256 of its text.
fn digest_classifier(codes: &[Code]) -> Vec<String> {
    codes
        .iter()
        .map(|code| {
            let mut hasher = Sha256::new();
            hasher.update(code.as_str().as_bytes());
            hex::encode(hasher.finalize())
        })
        .collect()
}

fn index_classifier(codes: &[Code]) -> Vec<usize> {
    (0..codes.len()).collect()
}
