//! Configuration builders controlling chunking, scanning, and logging.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordFreqError};

/// Default number of chunks (and scan workers) per run.
pub const DEFAULT_WORKERS: usize = 8;

/// Largest accepted number of chunks per run.
pub const MAX_WORKERS: usize = 1 << 16;

/// Default size of the per-scanner read buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Treatment of a final token that reaches end-of-file without a newline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TrailingToken {
    /// Count the unterminated token like any other word.
    #[default]
    Count,
    /// Discard the unterminated token.
    Drop,
}

/// Configuration for a counting run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountConfig {
    /// Number of chunks the input is split into; must be a power of two.
    pub workers: usize,
    /// Maximum number of bytes a scanner reads per positional read.
    pub buffer_size: usize,
    /// What to do with an unterminated token at end-of-file.
    pub trailing_token: TrailingToken,
    /// Enables per-chunk and per-round logging through the `log` facade.
    pub show_progress: bool,
}

impl CountConfig {
    /// Returns a builder initialised with [`CountConfig::default`].
    #[must_use]
    pub fn builder() -> CountBuilder {
        CountBuilder::default()
    }

    /// Validates the invariants required for counting.
    pub fn validate(&self) -> Result<()> {
        validate_workers(self.workers)?;
        if self.buffer_size == 0 {
            return Err(WordFreqError::InvalidConfig(
                "buffer_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            trailing_token: TrailingToken::Count,
            show_progress: true,
        }
    }
}

/// Builder for [`CountConfig`].
#[derive(Debug, Default, Clone)]
pub struct CountBuilder {
    cfg: CountConfig,
}

impl CountBuilder {
    /// Creates a builder with [`CountConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of chunks (and scan workers).
    #[must_use]
    pub fn workers(mut self, value: usize) -> Self {
        self.cfg.workers = value;
        self
    }

    /// Sets the scanner read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(mut self, value: usize) -> Self {
        self.cfg.buffer_size = value;
        self
    }

    /// Chooses how an unterminated token at end-of-file is treated.
    #[must_use]
    pub fn trailing_token(mut self, value: TrailingToken) -> Self {
        self.cfg.trailing_token = value;
        self
    }

    /// Enables or disables progress logging.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder, returning a validated [`CountConfig`].
    pub fn build(self) -> Result<CountConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Checks that `workers` is a power of two in `1..=MAX_WORKERS`.
pub fn validate_workers(workers: usize) -> Result<()> {
    if !is_power_of_two(workers) || workers > MAX_WORKERS {
        return Err(WordFreqError::InvalidConfig(format!(
            "workers ({workers}) must be a power of two between 1 and {MAX_WORKERS}"
        )));
    }
    Ok(())
}

/// Returns true when `n` is a power of two greater than zero.
#[must_use]
pub fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}
