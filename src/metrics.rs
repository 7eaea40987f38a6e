//! Metrics describing the scan and merge phases of a counting run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Metrics captured for each scanned chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetrics {
    /// Chunk position within the plan.
    pub index: usize,
    /// First byte offset of the chunk.
    pub start: u64,
    /// One past the last byte offset of the chunk.
    pub end: u64,
    /// Bytes read by the scanner.
    pub bytes: u64,
    /// Tokens recorded in the chunk table.
    pub tokens: u64,
    /// Distinct words in the chunk table.
    pub distinct: usize,
    /// Time spent scanning the chunk.
    pub elapsed: Duration,
}

/// Metrics captured for each merge round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundMetrics {
    /// Sequential round number (1-indexed).
    pub round: usize,
    /// Pair merges executed concurrently in the round.
    pub pairs: usize,
    /// Words whose counts were summed across pairs.
    pub matched: usize,
    /// Entries moved from consumed tables into surviving ones.
    pub transferred: usize,
    /// Largest surviving table after the round.
    pub largest_table: usize,
    /// Wall-clock time of the round, barrier included.
    pub elapsed: Duration,
}

/// Aggregate metrics produced by a counting run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountMetrics {
    /// Size of the input in bytes.
    pub file_size: u64,
    /// Number of chunks the input was split into.
    pub workers: usize,
    /// Per-chunk scan snapshots, ordered by chunk index.
    pub chunks: Vec<ChunkMetrics>,
    /// Per-round merge snapshots.
    pub rounds: Vec<RoundMetrics>,
    /// Duration of the scan phase.
    pub scan_duration: Duration,
    /// Duration of the merge phase.
    pub merge_duration: Duration,
    /// Total duration of the run.
    pub total_duration: Duration,
    /// Resident set size sampled after the run, on Linux.
    pub rss_kb: Option<usize>,
}

impl CountMetrics {
    /// Creates an empty metrics container for a run over `file_size` bytes.
    #[must_use]
    pub fn new(file_size: u64, workers: usize) -> Self {
        Self {
            file_size,
            workers,
            chunks: Vec::with_capacity(workers),
            rounds: Vec::new(),
            scan_duration: Duration::ZERO,
            merge_duration: Duration::ZERO,
            total_duration: Duration::ZERO,
            rss_kb: None,
        }
    }

    /// Total tokens recorded across all chunks.
    #[must_use]
    pub fn tokens(&self) -> u64 {
        self.chunks.iter().map(|chunk| chunk.tokens).sum()
    }
}

#[cfg(target_os = "linux")]
fn current_rss_kb() -> Option<usize> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open("/proc/self/status").ok()?;
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest
                .split_whitespace()
                .find_map(|part| part.parse::<usize>().ok());
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn current_rss_kb() -> Option<usize> {
    None
}

/// Samples the current resident set size (RSS) on supported platforms.
pub fn sample_rss_kb() -> Option<usize> {
    current_rss_kb()
}
