//! High-level counting pipeline: plan, scan concurrently, then reduce.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::{CountBuilder, CountConfig};
use crate::error::Result;
use crate::metrics::{sample_rss_kb, CountMetrics};
use crate::planner::plan_chunks;
use crate::reduce::reduce_tables;
use crate::scanner::{scan_chunk, ChunkScan};
use crate::source::{ByteSource, FileSource};
use crate::table::FrequencyTable;

/// Façade configuring and executing counting runs.
#[derive(Debug, Clone)]
pub struct Counter {
    cfg: CountConfig,
}

/// Artifacts returned after a counting run completes.
#[must_use]
#[derive(Debug, Clone)]
pub struct CountArtifacts {
    /// Consolidated word counts, in ascending word order.
    pub table: FrequencyTable,
    /// Detailed metrics captured during the run.
    pub metrics: CountMetrics,
}

impl Counter {
    /// Creates a new counter for the supplied configuration.
    #[must_use]
    pub fn new(cfg: CountConfig) -> Self {
        Self { cfg }
    }

    /// Returns a [`CountBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> CountBuilder {
        CountConfig::builder()
    }

    /// Returns an immutable reference to the underlying configuration.
    #[must_use]
    pub fn config(&self) -> &CountConfig {
        &self.cfg
    }

    /// Opens `path` and counts its words.
    pub fn count_path<P: AsRef<Path>>(&self, path: P) -> Result<CountArtifacts> {
        self.cfg.validate()?;
        let source = FileSource::open(path)?;
        self.count_source(&source)
    }

    /// Counts the words of any random-access byte source.
    ///
    /// The first scanner error aborts the run; no partial table is returned.
    pub fn count_source<S: ByteSource + ?Sized>(&self, source: &S) -> Result<CountArtifacts> {
        self.cfg.validate()?;
        let run_start = Instant::now();
        let file_size = source.len();

        let chunks = plan_chunks(source, self.cfg.workers)?;
        if self.cfg.show_progress {
            info!(
                "planned {} chunks over {} bytes (~{} bytes each)",
                chunks.len(),
                file_size,
                file_size / chunks.len() as u64
            );
        }

        let scan_start = Instant::now();
        let scans = chunks
            .par_iter()
            .map(|chunk| scan_chunk(source, chunk, &self.cfg))
            .collect::<Result<Vec<ChunkScan>>>()?;
        let scan_duration = scan_start.elapsed();

        let mut metrics = CountMetrics::new(file_size, self.cfg.workers);
        let mut tables = Vec::with_capacity(scans.len());
        for scan in scans {
            if self.cfg.show_progress {
                debug!(
                    "chunk {:>4} [{}, {}) tokens {:>10} distinct {:>10} in {:.2?}",
                    scan.metrics.index,
                    scan.metrics.start,
                    scan.metrics.end,
                    scan.metrics.tokens,
                    scan.metrics.distinct,
                    scan.metrics.elapsed
                );
            }
            metrics.chunks.push(scan.metrics);
            tables.push(scan.table);
        }

        let merge_start = Instant::now();
        let (table, rounds) = reduce_tables(tables, self.cfg.show_progress)?;
        metrics.rounds = rounds;
        metrics.scan_duration = scan_duration;
        metrics.merge_duration = merge_start.elapsed();
        metrics.total_duration = run_start.elapsed();
        metrics.rss_kb = sample_rss_kb();

        if self.cfg.show_progress {
            info!(
                "counted {} tokens ({} distinct) with {} workers in {:.2?} (scan {:.2?}, merge {:.2?})",
                metrics.tokens(),
                table.len(),
                self.cfg.workers,
                metrics.total_duration,
                metrics.scan_duration,
                metrics.merge_duration
            );
        }

        Ok(CountArtifacts { table, metrics })
    }
}

impl fmt::Display for CountArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} distinct words from {} tokens",
            self.table.len(),
            self.table.total()
        )?;
        writeln!(
            f,
            "Workers: {} | merge rounds: {}",
            self.metrics.workers,
            self.metrics.rounds.len()
        )?;
        writeln!(f, "Total duration: {:?}", self.metrics.total_duration)?;
        Ok(())
    }
}
