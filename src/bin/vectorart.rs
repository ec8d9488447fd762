//! CLI binary for vector-art-client.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, drives a `Workflow` and prints the results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vector_art_client::{
    ClientConfig, DownloadError, ProgressCallback, Workflow, WorkflowOutput, WorkflowProgressCallback,
    WorkflowStatus,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal callback: a spinner showing the workflow status label, plus the
/// one-line notice when a step fails.
struct CliProgressCallback {
    /// `None` when progress display is disabled; notices are still printed.
    bar: Option<ProgressBar>,
    quiet: bool,
    noticed: AtomicBool,
}

impl CliProgressCallback {
    fn new(show_progress: bool, quiet: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Vector art");
            bar.set_message("Starting…");
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });

        Arc::new(Self {
            bar,
            quiet,
            noticed: AtomicBool::new(false),
        })
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Whether a failure notice has already been shown to the user.
    fn noticed(&self) -> bool {
        self.noticed.load(Ordering::SeqCst)
    }
}

impl WorkflowProgressCallback for CliProgressCallback {
    fn on_status_change(&self, status: &WorkflowStatus) {
        if let Some(bar) = &self.bar {
            bar.set_message(status.label());
        }
    }

    fn on_poll_pending(&self, attempt: u32, max_polls: u32) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("PROCESSING... ({attempt}/{max_polls})"));
        }
    }

    fn on_download_fallback(&self, error: &DownloadError) {
        if !self.quiet {
            self.println(format!("  {} {}", cyan("↻"), dim(&format!("{error}, retrying directly"))));
        }
    }

    fn on_notice(&self, message: &str) {
        self.noticed.store(true, Ordering::SeqCst);
        self.println(format!("{} {}", red("✘"), message));
    }

    fn on_artifact_saved(&self, path: &Path) {
        if !self.quiet {
            self.println(format!("  {} saved {}", green("✓"), bold(&path.display().to_string())));
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload, generate and save vector_art_<id>.png in the current directory
  vectorart photo.jpg

  # Save into a directory
  vectorart photo.heic -o out/

  # Only upload, print the public URL
  vectorart --upload-only photo.png

  # Generate but leave the result on the CDN
  vectorart --no-download --json photo.jpg

  # Poll faster and give up sooner
  vectorart --poll-interval-ms 500 --max-polls 20 photo.jpg

ENVIRONMENT VARIABLES:
  VECTORART_OUTPUT_DIR        Directory the result is saved into
  VECTORART_UPLOAD_SERVICE    Base URL of the signed-upload service
  VECTORART_CONTENT_DOMAIN    Domain uploaded files are served from
  VECTORART_JOB_SERVICE       Base URL of the generation job service
  VECTORART_DOWNLOAD_PROXY    Same-origin download proxy endpoint
  RUST_LOG                    Overrides the log filter (e.g. vector_art_client=debug)
"#;

/// Turn a photo into vector-style art.
#[derive(Parser, Debug)]
#[command(
    name = "vectorart",
    version,
    about = "Turn a photo into vector-style art",
    long_about = "Upload an image, submit it to the vector-art generation service, wait for the \
job to finish and save the result locally as vector_art_<id>.png.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file to convert.
    image: PathBuf,

    /// Directory to save the result into.
    #[arg(short, long, env = "VECTORART_OUTPUT_DIR", default_value = ".")]
    output: PathBuf,

    /// Stop after the upload and print the public URL.
    #[arg(long, conflicts_with = "no_download")]
    upload_only: bool,

    /// Generate but do not download the result.
    #[arg(long, env = "VECTORART_NO_DOWNLOAD")]
    no_download: bool,

    /// Output structured JSON (WorkflowOutput) on stdout.
    #[arg(long, env = "VECTORART_JSON")]
    json: bool,

    /// Delay between job status checks, in milliseconds.
    #[arg(long, env = "VECTORART_POLL_INTERVAL_MS", default_value_t = 2000)]
    poll_interval_ms: u64,

    /// Maximum number of status checks before giving up.
    #[arg(long, env = "VECTORART_MAX_POLLS", default_value_t = 60,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: u32,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "VECTORART_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Override the upload service base URL.
    #[arg(long, env = "VECTORART_UPLOAD_SERVICE")]
    upload_service: Option<String>,

    /// Override the job service base URL.
    #[arg(long, env = "VECTORART_JOB_SERVICE")]
    job_service: Option<String>,

    /// Override the download proxy URL.
    #[arg(long, env = "VECTORART_DOWNLOAD_PROXY")]
    download_proxy: Option<String>,

    /// Override the content domain uploads are served from.
    #[arg(long, env = "VECTORART_CONTENT_DOMAIN")]
    content_domain: Option<String>,

    /// Disable the progress spinner.
    #[arg(long, env = "VECTORART_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VECTORART_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VECTORART_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would fight with the spinner, so they are only shown
    // when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let progress = CliProgressCallback::new(show_progress, cli.quiet);
    let config = build_config(&cli, progress.clone() as ProgressCallback)?;
    let mut workflow = Workflow::new(config).context("Failed to initialise client")?;

    let outcome = drive(&cli, &mut workflow).await;
    progress.finish();

    let output = match outcome {
        Ok(output) => output,
        // The notice is the whole user-facing report for a failed step.
        Err(_) if progress.noticed() => std::process::exit(1),
        Err(e) => return Err(e).context("Workflow failed"),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.upload_only {
        println!("{}", output.uploaded_url);
    } else {
        match &output.artifact {
            Some(artifact) => println!("{}", artifact.path.display()),
            None => println!("{}", output.result_url),
        }
    }

    if !cli.quiet && !cli.json {
        match &output.artifact {
            Some(artifact) => eprintln!(
                "{}  job {}  {} bytes via {:?}  →  {}",
                green("✔"),
                output.job_id,
                artifact.size_bytes,
                artifact.strategy,
                bold(&artifact.path.display().to_string()),
            ),
            None if !cli.upload_only => {
                eprintln!("{}  job {}  result at {}", green("✔"), output.job_id, dim(&output.result_url))
            }
            None => eprintln!("{}  uploaded", green("✔")),
        }
    }

    Ok(())
}

/// Run the steps the flags ask for.
async fn drive(cli: &Cli, workflow: &mut Workflow) -> Result<WorkflowOutput> {
    let uploaded_url = workflow.select_path(&cli.image).await?;
    if cli.upload_only {
        return Ok(WorkflowOutput {
            uploaded_url,
            job_id: String::new(),
            result_url: String::new(),
            artifact: None,
        });
    }

    let result_url = workflow.generate().await?;
    let job_id = workflow.job().map(|j| j.job_id.clone()).unwrap_or_default();
    let artifact = if cli.no_download {
        None
    } else {
        Some(workflow.download().await?)
    };

    Ok(WorkflowOutput {
        uploaded_url,
        job_id,
        result_url,
        artifact,
    })
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, progress: ProgressCallback) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .output_dir(&cli.output)
        .poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .max_polls(cli.max_polls)
        .request_timeout_secs(cli.timeout)
        .progress_callback(progress);

    if let Some(ref url) = cli.upload_service {
        builder = builder.upload_service_url(url);
    }
    if let Some(ref url) = cli.job_service {
        builder = builder.job_service_url(url);
    }
    if let Some(ref url) = cli.download_proxy {
        builder = builder.download_proxy_url(url);
    }
    if let Some(ref url) = cli.content_domain {
        builder = builder.content_domain(url);
    }

    builder.build().context("Invalid configuration")
}
