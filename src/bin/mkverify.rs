//! CLI binary for marksheet-verify.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, shows a spinner while the model call is in flight,
//! and renders the comparison table.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use marksheet_verify::{
    extract_marksheet, verify_marksheet, ComparisonRow, ExtractionConfig, ManualEntry,
    MatchVerdict, VerificationOutput,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Compare a photographed mark sheet against typed values
  mkverify marksheet.jpg --name "John Doe" --roll-no 12 --year 2021 --result pass

  # Extraction only — print the recovered record as JSON
  mkverify --extract-only marksheet.png

  # Full structured output (record, rows, verdicts, stats)
  mkverify marksheet.jpg --name "John Doe" --json

  # Point at a different OpenAI-compatible endpoint
  mkverify --api-base http://localhost:11434/v1/chat/completions \
           --model llama3.2-vision marksheet.jpg --name "John Doe"

ENVIRONMENT VARIABLES:
  GROQ_API_KEY        API key for the default Groq endpoint
  MKVERIFY_MODEL      Override the vision model ID
  MKVERIFY_API_BASE   Override the chat-completions endpoint URL

SETUP:
  1. Set API key:     export GROQ_API_KEY=gsk_...
  2. Verify:          mkverify marksheet.jpg --name "John Doe" --roll-no 12

  Accepted image types: jpg, jpeg, png (decided by file extension).
  A field left blank is shown as "Not Provided" and never counts as a match.
"#;

/// Validate manually entered mark-sheet fields against a photographed mark sheet.
#[derive(Parser, Debug)]
#[command(
    name = "mkverify",
    version,
    about = "Validate manually entered mark-sheet fields against a photographed mark sheet",
    long_about = "Extract Name, Roll No., Examination Year, and Result from a mark-sheet \
photograph using a Vision Language Model, then compare the extracted values against the \
manually entered ones and flag which fields match.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the mark-sheet image (jpg, jpeg, or png).
    image: PathBuf,

    /// Manually entered candidate name.
    #[arg(long)]
    name: Option<String>,

    /// Manually entered roll number.
    #[arg(long)]
    roll_no: Option<String>,

    /// Manually entered examination year.
    #[arg(long)]
    year: Option<String>,

    /// Manually entered result.
    #[arg(long, value_enum)]
    result: Option<ResultArg>,

    /// Vision model ID.
    #[arg(long, env = "MKVERIFY_MODEL")]
    model: Option<String>,

    /// Chat-completions endpoint URL (any OpenAI-compatible server).
    #[arg(long, env = "MKVERIFY_API_BASE")]
    api_base: Option<String>,

    /// API key; falls back to GROQ_API_KEY.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Max model output tokens.
    #[arg(long, env = "MKVERIFY_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "MKVERIFY_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// API call timeout in seconds.
    #[arg(long, env = "MKVERIFY_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom instruction prompt.
    #[arg(long, env = "MKVERIFY_PROMPT")]
    prompt: Option<PathBuf>,

    /// Output structured JSON instead of the table.
    #[arg(long, env = "MKVERIFY_JSON")]
    json: bool,

    /// Print the extracted record only, skip the comparison.
    #[arg(long)]
    extract_only: bool,

    /// Disable the spinner.
    #[arg(long, env = "MKVERIFY_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MKVERIFY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "MKVERIFY_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ResultArg {
    Pass,
    Fail,
}

impl ResultArg {
    fn as_str(self) -> &'static str {
        match self {
            ResultArg::Pass => "Pass",
            ResultArg::Fail => "Fail",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let config = build_config(&cli).await?;

    // ── Spinner while the model call is in flight ────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message("Extracting details from image…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let output = extract_marksheet(&cli.image, &config).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        let output = output.context("Extraction failed")?;

        match output.outcome.record() {
            Some(record) => {
                let json = serde_json::to_string_pretty(record)
                    .context("Failed to serialise record")?;
                println!("{json}");
                print_stats_line(&cli, &output.stats);
                return Ok(());
            }
            None => {
                let error = output.outcome.error().expect("failed outcome has error");
                eprintln!("{} {}", red("✘"), red(&format!("Error: {error}")));
                std::process::exit(1);
            }
        }
    }

    // ── Verify mode ──────────────────────────────────────────────────────
    let manual = ManualEntry {
        name: cli.name.clone().unwrap_or_default(),
        roll_no: cli.roll_no.clone().unwrap_or_default(),
        examination_year: cli.year.clone().unwrap_or_default(),
        result: cli.result.map(|r| r.as_str().to_string()).unwrap_or_default(),
    };

    let output = verify_marksheet(&cli.image, &manual, &config).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let output = output.context("Verification failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        if !output.outcome.is_extracted() {
            std::process::exit(1);
        }
        return Ok(());
    }

    match output.rows {
        Some(ref rows) => {
            print_table(rows);
            print_summary(&output);
            print_stats_line(&cli, &output.stats);
        }
        None => {
            // Extraction failed: show the message, no partial table.
            let error = output.outcome.error().expect("failed outcome has error");
            eprintln!("{} {}", red("✘"), red(&format!("Error: {error}")));
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref base) = cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref path) = cli.prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {path:?}"))?;
        builder = builder.prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

/// Render the four comparison rows as a plain table with padded columns.
fn print_table(rows: &[ComparisonRow]) {
    let width_of = |s: &str| s.chars().count();
    let headers = ["Field", "Manual Input", "Extracted Value", "Match"];
    let mut widths = headers.map(width_of);
    for row in rows {
        widths[0] = widths[0].max(width_of(row.field.label()));
        widths[1] = widths[1].max(width_of(&row.manual));
        widths[2] = widths[2].max(width_of(&row.extracted));
        widths[3] = widths[3].max(width_of(&row.verdict.to_string()));
    }

    // Pads with the raw cell width, then applies colour; ANSI escapes have
    // zero visible width so the trailing pipes stay aligned.
    let cell = |i: usize, text: &str, paint: Option<fn(&str) -> String>| {
        let padding = " ".repeat(widths[i] - width_of(text) + 1);
        let text = paint.map_or_else(|| text.to_string(), |p| p(text));
        format!("| {text}{padding}")
    };

    let header_line: String = headers
        .iter()
        .enumerate()
        .map(|(i, h)| cell(i, h, None))
        .collect::<String>()
        + "|";
    println!("{}", bold(&header_line));
    println!(
        "|{}|{}|{}|{}|",
        "-".repeat(widths[0] + 2),
        "-".repeat(widths[1] + 2),
        "-".repeat(widths[2] + 2),
        "-".repeat(widths[3] + 2),
    );
    for row in rows {
        let paint = match row.verdict {
            MatchVerdict::Yes => green as fn(&str) -> String,
            MatchVerdict::No => red as fn(&str) -> String,
        };
        println!(
            "{}{}{}{}|",
            cell(0, row.field.label(), None),
            cell(1, &row.manual, None),
            cell(2, &row.extracted, None),
            cell(3, &row.verdict.to_string(), Some(paint)),
        );
    }
}

fn print_summary(output: &VerificationOutput) {
    let rows = output.rows.as_deref().unwrap_or_default();
    let matched = rows.iter().filter(|r| r.verdict.is_match()).count();
    if output.all_match() {
        eprintln!(
            "{} all {} fields match",
            green("✔"),
            bold(&rows.len().to_string())
        );
    } else {
        eprintln!(
            "{} {}/{} fields match",
            red("✘"),
            bold(&matched.to_string()),
            rows.len()
        );
    }
}

fn print_stats_line(cli: &Cli, stats: &marksheet_verify::ExtractionStats) {
    if !cli.quiet {
        eprintln!(
            "   {}  {}",
            dim(&format!(
                "{} tokens in  /  {} tokens out",
                stats.prompt_tokens, stats.completion_tokens
            )),
            dim(&format!("{}ms  ({})", stats.duration_ms, stats.model)),
        );
    }
}
