use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::ThreadPoolBuilder;
use wordfreq::config::{CountConfig, TrailingToken, DEFAULT_BUFFER_SIZE, DEFAULT_WORKERS};
use wordfreq::{write_report, Counter, ReportFormat};

#[derive(Parser, Debug)]
#[command(author, version, about = "Parallel newline-delimited word frequency counter", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    /// Input file, one word per line
    #[arg(short = 'f', long, value_name = "PATH")]
    file: PathBuf,

    /// Number of chunks scanned concurrently (power of two)
    #[arg(short = 't', long, value_name = "N", default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Per-scanner read buffer size
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Discard a final word that is not terminated by a newline
    #[arg(long)]
    drop_trailing: bool,

    /// Emit JSON lines instead of count:word lines
    #[arg(long)]
    json: bool,

    /// Limit Rayon worker threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Write run metrics as JSON to this path
    #[arg(long, value_name = "PATH")]
    metrics: Option<PathBuf>,

    /// Disable progress logging and the spinner
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    run(cli)
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = match (quiet, verbose) {
        (0, 0) => None,
        (1, _) => Some(LevelFilter::Warn),
        (q, _) if q > 1 => Some(LevelFilter::Error),
        (_, 1) => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    // Explicit -v/-q flags win over RUST_LOG.
    if let Some(level) = level {
        builder.filter_level(level);
    }
    let _ = builder.try_init();
}

fn run(cli: Cli) -> Result<()> {
    let show_progress = !cli.no_progress && cli.quiet == 0;
    let cfg = CountConfig::builder()
        .workers(cli.workers)
        .buffer_size(cli.buffer_size)
        .trailing_token(if cli.drop_trailing {
            TrailingToken::Drop
        } else {
            TrailingToken::Count
        })
        .show_progress(show_progress)
        .build()?;

    if let Some(threads) = cli.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("unable to configure Rayon thread pool")?;
    }

    let spinner = if show_progress && io::stderr().is_terminal() {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} counting words... {elapsed}")
            .context("invalid spinner template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let artifacts = Counter::new(cfg)
        .count_path(&cli.file)
        .with_context(|| format!("failed to count words in {}", cli.file.display()))?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let elapsed = start.elapsed();

    let format = if cli.json {
        ReportFormat::Json
    } else {
        ReportFormat::Plain
    };
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_report(&artifacts.table, &mut out, format).context("failed to write report")?;
    out.flush().context("failed to flush report")?;

    if let Some(path) = &cli.metrics {
        let file = File::create(path)
            .with_context(|| format!("failed to create metrics file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &artifacts.metrics)
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush metrics to {}", path.display()))?;
    }

    let throughput = if elapsed.as_secs_f64() > 0.0 {
        bytes_to_mebibytes(artifacts.metrics.file_size) / elapsed.as_secs_f64()
    } else {
        0.0
    };
    info!(
        "done: distinct={} tokens={} workers={} duration={elapsed:.2?} throughput={throughput:.2} MiB/s",
        artifacts.table.len(),
        artifacts.table.total(),
        artifacts.metrics.workers
    );

    Ok(())
}

fn bytes_to_mebibytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
