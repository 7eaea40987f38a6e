//! Parallel word-frequency counting over large newline-delimited text files.
//!
//! The crate exposes both a library API and a `wordfreq` command line interface.
//! A run partitions the input into newline-aligned chunks, scans every chunk
//! concurrently into an ordered [`FrequencyTable`], and folds the per-chunk
//! tables together in `log2(N)` synchronized merge rounds.
//!
//! ```no_run
//! use wordfreq::{Counter, CountConfig, ReportFormat};
//!
//! # fn main() -> wordfreq::Result<()> {
//! let cfg = CountConfig::builder()
//!     .workers(8)
//!     .show_progress(false)
//!     .build()?;
//! let artifacts = Counter::new(cfg).count_path("/path/to/words.txt")?;
//! let stdout = std::io::stdout();
//! wordfreq::report::write_report(&artifacts.table, stdout.lock(), ReportFormat::Plain)?;
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature.  Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `wordfreq = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown
)]

pub mod config;
pub mod counter;
pub mod error;
pub mod metrics;
pub mod planner;
pub mod reduce;
pub mod report;
pub mod scanner;
pub mod source;
pub mod table;

pub use config::{CountBuilder, CountConfig, TrailingToken};
pub use counter::{CountArtifacts, Counter};
pub use error::{Result, WordFreqError};
pub use metrics::{ChunkMetrics, CountMetrics, RoundMetrics};
pub use planner::{plan_chunks, Chunk};
pub use reduce::{reduce_tables, MergePlan, MergeRound};
pub use report::{write_report, ReportFormat};
pub use scanner::{scan_chunk, ChunkScan};
pub use source::{ByteSource, FileSource};
pub use table::{FrequencyTable, WordEntry};
