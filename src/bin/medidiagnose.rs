//! CLI binary for medidiagnose.
//!
//! A thin shim over the library crate: flags map onto `ClientConfig`, runs
//! persist to a `FileResultStore`, and results print as a terminal view.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use medidiagnose::api::DEFAULT_API_URL;
use medidiagnose::report::{self, PageGeometry};
use medidiagnose::view::{self, RESULTS_PATIENT_LABEL};
use medidiagnose::{
    ApiClient, ClientConfig, DiagnosisSession, FileResultStore, MediaKind, PersistedResult,
    ProcessingError, ProcessingProgressCallback, ProcessingState, ProgressCallback, ResultId,
    ResultsView, UploadFile,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

/// Spinner that follows the session through its steps.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&[
                    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿",
                ]);
        bar.set_style(style);
        bar.set_prefix("Uploading");
        bar.set_message("Preparing medical report…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_run_start(&self, file_name: &str, kind: MediaKind) {
        self.bar.println(format!(
            "{} {} {}",
            cyan("◆"),
            bold(&format!("Processing {file_name}")),
            dim(&format!("({} path)", kind.as_str()))
        ));
    }

    fn on_state_change(&self, state: &ProcessingState) {
        if let Some(step) = state.step().filter(|s| *s > 0) {
            self.bar
                .set_prefix(format!("Step {step}/{}", medidiagnose::session::TOTAL_STEPS));
        }
        self.bar.set_message(state.label());
    }

    fn on_run_complete(&self, id: ResultId) {
        self.bar.finish_and_clear();
        eprintln!("{}  Diagnosis stored as {}", green("✔"), bold(&id.to_string()));
    }

    // The cause reaches the user once, through the error returned from `main`.
    fn on_run_failed(&self, _error: &ProcessingError) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Diagnose a scanned report and print the results view
  medidiagnose diagnose blood-panel.png

  # Diagnose a PDF and export the printable report
  medidiagnose diagnose discharge-summary.pdf --pdf report.pdf

  # Show a stored result again
  medidiagnose results 1760000000000

  # Ask the server to build the report instead of rendering locally
  medidiagnose results 1760000000000 --pdf report.pdf --server-pdf

  # Paginate a screenshot of the results view into A4 pages
  medidiagnose snapshot results.png -o results.pdf

ACCEPTED FILES:
  Images   jpg, jpeg, png, gif, bmp, tiff, webp   → POST {api-url}/ocr
  PDF      pdf                                    → POST {api-url}/process-pdf

ENVIRONMENT VARIABLES:
  MEDIDIAGNOSE_API_URL     Base URL of the OCR/diagnosis services
  MEDIDIAGNOSE_STORE_DIR   Directory holding stored results (<id>.json)
  RUST_LOG                 Overrides the log filter (e.g. medidiagnose=debug)
"#;

/// Submit medical reports for AI diagnosis and export the results.
#[derive(Parser, Debug)]
#[command(
    name = "medidiagnose",
    version,
    about = "Submit medical reports for AI diagnosis and export the results",
    long_about = "Send a medical report (image or PDF) through OCR/text extraction and an AI \
diagnosis service, store the structured result, and render it in the terminal or as a \
printable PDF report.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the OCR/diagnosis services.
    #[arg(long, global = true, env = "MEDIDIAGNOSE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Directory where results are stored.
    #[arg(long, global = true, env = "MEDIDIAGNOSE_STORE_DIR", default_value = ".medidiagnose/results")]
    store_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MEDIDIAGNOSE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the requested result.
    #[arg(short, long, global = true, env = "MEDIDIAGNOSE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a report through extraction and diagnosis, then show the result.
    Diagnose {
        /// Image or PDF medical report.
        file: PathBuf,

        /// Also write the PDF report to this path.
        #[arg(long, env = "MEDIDIAGNOSE_PDF")]
        pdf: Option<PathBuf>,

        /// Label printed after "Patient:" in the PDF report.
        #[arg(long, env = "MEDIDIAGNOSE_PATIENT", default_value = "Patient")]
        patient: String,

        /// Print the stored result as JSON instead of the terminal view.
        #[arg(long, env = "MEDIDIAGNOSE_JSON")]
        json: bool,
    },

    /// Show a stored result, or the not-found card.
    Results {
        /// Result id printed by `diagnose`.
        id: ResultId,

        /// Write the PDF report to this path.
        #[arg(long, env = "MEDIDIAGNOSE_PDF")]
        pdf: Option<PathBuf>,

        /// Build the PDF with the server's /generate-pdf endpoint.
        #[arg(long, env = "MEDIDIAGNOSE_SERVER_PDF", requires = "pdf")]
        server_pdf: bool,

        /// Label printed after "Patient:" in the PDF report.
        #[arg(long, env = "MEDIDIAGNOSE_PATIENT", default_value = RESULTS_PATIENT_LABEL)]
        patient: String,

        /// Print the stored result as JSON instead of the terminal view.
        #[arg(long, env = "MEDIDIAGNOSE_JSON")]
        json: bool,
    },

    /// Paginate a raster capture (PNG, JPEG, …) into a multi-page PDF.
    Snapshot {
        /// Capture to paginate.
        image: PathBuf,

        /// Output PDF path.
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would fight with the spinner, so only errors show
    // while it is active.
    let show_progress = !cli.quiet
        && matches!(cli.command, Command::Diagnose { json: false, .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Diagnose {
            ref file,
            ref pdf,
            ref patient,
            json,
        } => run_diagnose(&cli, file, pdf.as_deref(), patient, json, show_progress).await,
        Command::Results {
            id,
            ref pdf,
            server_pdf,
            ref patient,
            json,
        } => run_results(&cli, id, pdf.as_deref(), server_pdf, patient, json).await,
        Command::Snapshot {
            ref image,
            ref output,
        } => run_snapshot(&cli, image, output).await,
    }
}

async fn run_diagnose(
    cli: &Cli,
    file: &Path,
    pdf: Option<&Path>,
    patient: &str,
    json: bool,
    show_progress: bool,
) -> Result<()> {
    let upload = UploadFile::from_path(file)
        .await
        .with_context(|| format!("Cannot submit {}", file.display()))?;

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ProcessingProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, patient, progress)?;

    let store = Arc::new(FileResultStore::new(&cli.store_dir));
    let mut session = DiagnosisSession::new(&config, store.clone());
    let id = session
        .process_file(upload)
        .await
        .context("Diagnosis failed")?;

    let view = ResultsView::load(store.as_ref(), id).await;
    let result = view
        .result()
        .context("Stored result could not be read back")?;

    print_result(id, result, json)?;

    if let Some(out) = pdf {
        let bytes = report::generate_report_with(
            &result.diagnosis_data,
            &result.extracted_text,
            &config.patient_label,
            &config.geometry,
        )
        .context("Failed to render PDF report")?;
        report::write_pdf(out, &bytes)
            .await
            .context("Failed to write PDF report")?;
        if !cli.quiet {
            eprintln!("{}  Report written to {}", green("✔"), bold(&out.display().to_string()));
        }
    }
    Ok(())
}

async fn run_results(
    cli: &Cli,
    id: ResultId,
    pdf: Option<&Path>,
    server_pdf: bool,
    patient: &str,
    json: bool,
) -> Result<()> {
    let config = build_config(cli, patient, None)?;
    let store = FileResultStore::new(&cli.store_dir);

    let result = match ResultsView::load(&store, id).await {
        ResultsView::Found { result, .. } => result,
        ResultsView::NotFound { message } => {
            if json {
                let body = serde_json::json!({ "id": id.to_string(), "error": message });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", red(view::NOT_FOUND_TITLE));
                println!("{message}");
                println!("{}", dim("Start a new diagnosis: medidiagnose diagnose <FILE>"));
            }
            anyhow::bail!("No diagnosis available for {id}");
        }
    };

    print_result(id, &result, json)?;

    if let Some(out) = pdf {
        let bytes = if server_pdf {
            ApiClient::new(config.api_url.clone())
                .generate_remote_report(&result.diagnosis_data, &result.extracted_text)
                .await
                .context("Server-side report generation failed")?
        } else {
            report::generate_report_with(
                &result.diagnosis_data,
                &result.extracted_text,
                &config.patient_label,
                &config.geometry,
            )
            .context("Failed to render PDF report")?
        };
        report::write_pdf(out, &bytes)
            .await
            .context("Failed to write PDF report")?;
        if !cli.quiet {
            eprintln!("{}  Report written to {}", green("✔"), bold(&out.display().to_string()));
        }
    } else if !cli.quiet && !json {
        eprintln!(
            "{}",
            dim(&format!("Export with --pdf {}", view::report_file_name(id)))
        );
    }
    Ok(())
}

async fn run_snapshot(cli: &Cli, image: &Path, output: &Path) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read capture {}", image.display()))?;

    // Decoding and cropping are CPU-bound.
    let geometry = PageGeometry::default();
    let pdf = tokio::task::spawn_blocking(move || report::snapshot_bytes_to_pdf(&bytes, &geometry))
        .await
        .context("Snapshot task panicked")?
        .context("Failed to paginate capture")?;

    report::write_pdf(output, &pdf)
        .await
        .context("Failed to write snapshot PDF")?;
    if !cli.quiet {
        eprintln!(
            "{}  Snapshot written to {}",
            green("✔"),
            bold(&output.display().to_string())
        );
    }
    Ok(())
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, patient: &str, progress: Option<ProgressCallback>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .api_url(cli.api_url.clone())
        .patient_label(patient);
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn print_result(id: ResultId, result: &PersistedResult, json: bool) -> Result<()> {
    if json {
        let body = serde_json::json!({ "id": id.to_string(), "result": result });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to serialise result")?
        );
    } else {
        println!("{}", view::render_result(result));
        println!("{} {}", dim("Result id:"), cyan(&id.to_string()));
    }
    Ok(())
}
