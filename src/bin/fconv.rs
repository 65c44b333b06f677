//! CLI binary for file-converter.
//!
//! A thin shim over the library crate that drives one `ConversionSession`
//! per invocation and saves the artifact.

use anyhow::{Context, Result};
use clap::Parser;
use file_converter::{
    describe, inspect, read_source_file, ConversionConfig, ConversionSession, ConversionState,
    FormatTable, Notification, Notifier, Severity, SourceFile,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICK_STRINGS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Terminal notifier ────────────────────────────────────────────────────────

/// Prints session notifications to stderr, above the progress bar if one is
/// drawn.
struct CliNotifier {
    bar: Option<ProgressBar>,
}

impl Notifier for CliNotifier {
    fn notify(&self, n: Notification) {
        let line = match n.severity {
            Severity::Info => {
                format!("{} {}  {}", green("✔"), bold(&n.title), dim(&n.description))
            }
            Severity::Destructive => {
                format!("{} {}  {}", red("✘"), bold(&n.title), red(&n.description))
            }
        };
        match &self.bar {
            Some(bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(TICK_STRINGS);
    bar.set_style(style);
    bar.set_prefix("Converting");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # CSV to pretty-printed JSON, written next to the current directory
  fconv people.csv --to json

  # PNG to JPEG into a specific directory
  fconv photo.png --to jpg -o converted/

  # Write the artifact to stdout
  fconv data.json --to csv --stdout > data.csv

  # Show what a file can become, without converting it
  fconv --inspect-only photo.webp

  # Print the full compatibility table
  fconv --list-formats

ENVIRONMENT VARIABLES:
  FCONV_OUTPUT_DIR   Default output directory
  FCONV_TICK_MS      Progress tick interval in milliseconds
  RUST_LOG           tracing filter, overrides -v / -q
"#;

/// Convert images and structured text files between formats.
#[derive(Parser, Debug)]
#[command(
    name = "fconv",
    version,
    about = "Convert images and structured text files between formats",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file to convert.
    #[arg(required_unless_present = "list_formats")]
    input: Option<PathBuf>,

    /// Target format identifier (png, jpg, webp, gif, bmp, txt, csv, json, xml).
    #[arg(short, long, required_unless_present_any = ["list_formats", "inspect_only"])]
    to: Option<String>,

    /// Declared media type of the input; guessed from the extension if unset.
    #[arg(long)]
    from: Option<String>,

    /// Directory for the converted file.
    #[arg(short, long, env = "FCONV_OUTPUT_DIR", default_value = ".")]
    output: PathBuf,

    /// Write the artifact to stdout instead of a file.
    #[arg(long, conflicts_with = "json")]
    stdout: bool,

    /// Print a JSON summary instead of human-readable output.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Print the input's media type and legal targets only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Print the compatibility table and exit.
    #[arg(long)]
    list_formats: bool,

    /// Progress tick interval in milliseconds.
    #[arg(long, env = "FCONV_TICK_MS", default_value_t = 100)]
    tick_ms: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.stdout;
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

    // ── List-formats mode ────────────────────────────────────────────────
    if cli.list_formats {
        print_formats(cli.json)?;
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .context("An input file is required")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = match &cli.from {
            Some(_) => describe(&load(&cli, &input).await?),
            None => inspect(&input).await.context("Failed to inspect file")?,
        };
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise file info")?
            );
        } else {
            println!("File:         {}", info.name);
            println!("Media type:   {}", info.media_type);
            println!("Size:         {} bytes", info.size_bytes);
            println!("Category:     {}", info.category);
            if info.targets.is_empty() {
                println!("Targets:      {}", dim("none"));
            } else {
                for (i, target) in info.targets.iter().enumerate() {
                    let heading = if i == 0 { "Targets:" } else { "" };
                    println!("{heading:<14}{:<6}{}", target.format, dim(&target.label));
                }
            }
        }
        return Ok(());
    }

    let target = cli.to.clone().context("--to is required")?;

    // ── Build session ────────────────────────────────────────────────────
    let config = ConversionConfig::builder()
        .tick_interval_ms(cli.tick_ms)
        .build()
        .context("Invalid configuration")?;

    let bar = show_progress.then(progress_bar);
    let mut session = ConversionSession::new(config);
    if !cli.quiet && !cli.json {
        session = session.with_notifier(Arc::new(CliNotifier { bar: bar.clone() }));
    }

    let source = load(&cli, &input).await?;
    if !cli.quiet && !cli.json {
        eprintln!(
            "{} {}  {}",
            cyan("◆"),
            bold(source.name()),
            dim(&format!("{}, {} bytes", source.declared_media_type(), source.size_bytes()))
        );
    }
    session.select_file(source);
    session
        .select_format(&target)
        .with_context(|| format!("Cannot convert to '{target}'"))?;

    // ── Run conversion ───────────────────────────────────────────────────
    let watcher = bar.clone().map(|bar| {
        let mut states = session.progress_stream();
        tokio::spawn(async move {
            while let Some(state) = states.next().await {
                match state {
                    ConversionState::Idle => {}
                    ConversionState::Converting { progress } => bar.set_position(progress.into()),
                    ConversionState::Completed(_) => {
                        bar.set_position(100);
                        bar.finish_and_clear();
                        break;
                    }
                    ConversionState::Error { .. } => {
                        bar.abandon();
                        break;
                    }
                }
            }
        })
    });

    let started = Instant::now();
    let outcome = session.convert().await;
    if let Some(watcher) = watcher {
        if session.state().is_finished() {
            watcher.await.ok();
        } else {
            watcher.abort();
        }
    }
    let result = outcome.context("Conversion failed")?;
    let elapsed_ms = started.elapsed().as_millis();

    // ── Deliver artifact ─────────────────────────────────────────────────
    let download = session.download().context("No converted file available")?;

    if cli.stdout {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(&download.bytes)
            .context("Failed to write to stdout")?;
        handle.flush().context("Failed to flush stdout")?;
        return Ok(());
    }

    let path = download
        .save_to_dir(&cli.output)
        .await
        .with_context(|| format!("Failed to save into {}", cli.output.display()))?;

    if cli.json {
        let summary = serde_json::json!({
            "input": input.display().to_string(),
            "output": path.display().to_string(),
            "result": result,
            "size_bytes": result.size_bytes(),
            "duration_ms": elapsed_ms,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            green("✔"),
            result.size_bytes(),
            elapsed_ms,
            bold(&path.display().to_string()),
        );
    }

    Ok(())
}

/// Read the input, honouring `--from` when given.
async fn load(cli: &Cli, input: &Path) -> Result<SourceFile> {
    let source = read_source_file(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(match &cli.from {
        Some(media_type) => {
            SourceFile::new(source.name(), source.shared_bytes(), media_type.as_str())
        }
        None => source,
    })
}

/// Print every table row with its labelled targets.
fn print_formats(json: bool) -> Result<()> {
    let table = FormatTable::standard();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(table.entries()).context("Failed to serialise table")?
        );
        return Ok(());
    }
    for entry in table.entries() {
        let targets: Vec<String> = entry
            .outputs
            .iter()
            .map(|f| format!("{f} {}", dim(&format!("({})", table.label_of(f)))))
            .collect();
        println!(
            "{} {:<6} {}",
            bold(&format!("{:<18}", entry.input_media_type)),
            entry.category,
            targets.join(", ")
        );
    }
    println!();
    println!("{}", dim("Audio, video and office documents are not supported."));
    Ok(())
}
