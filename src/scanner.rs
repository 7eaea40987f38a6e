//! Per-chunk tokenization into an ordered frequency table.

use std::io;
use std::time::Instant;

use bstr::ByteSlice;

use crate::config::{CountConfig, TrailingToken};
use crate::error::Result;
use crate::metrics::ChunkMetrics;
use crate::planner::Chunk;
use crate::source::{source_error, ByteSource};
use crate::table::FrequencyTable;

/// Table and metrics produced by scanning one chunk.
#[derive(Debug, Clone)]
pub struct ChunkScan {
    /// Word counts for the chunk.
    pub table: FrequencyTable,
    /// Scan statistics for the chunk.
    pub metrics: ChunkMetrics,
}

/// Reads `chunk` from `source` and counts its newline-delimited tokens.
///
/// The chunk is read in pieces of at most [`CountConfig::buffer_size`] bytes.
/// A token cut off by the end of a piece is carried over and completed by the
/// next one, so tokens are never lost or split.  Empty lines count as the
/// empty word.  An unterminated token at the very end of the source is
/// handled according to [`CountConfig::trailing_token`].
pub fn scan_chunk<S: ByteSource + ?Sized>(
    source: &S,
    chunk: &Chunk,
    cfg: &CountConfig,
) -> Result<ChunkScan> {
    let started = Instant::now();
    let mut table = FrequencyTable::new();
    let mut tokens = 0u64;

    let buffer_len = usize::try_from(chunk.len())
        .map_or(cfg.buffer_size, |len| len.min(cfg.buffer_size));
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(buffer_len)?;
    buffer.resize(buffer_len, 0u8);

    let mut carry: Vec<u8> = Vec::new();
    let mut cursor = chunk.start;
    while cursor < chunk.end {
        let want = usize::try_from(chunk.end - cursor)
            .map_or(buffer_len, |left| left.min(buffer_len));
        let read = source
            .read_full_at(&mut buffer[..want], cursor)
            .map_err(|err| source_error(source, err))?;
        if read == 0 {
            let err = io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "chunk {} ended at byte {cursor}, expected data up to {}",
                    chunk.index, chunk.end
                ),
            );
            return Err(source_error(source, err));
        }
        cursor += read as u64;

        let mut rest = &buffer[..read];
        while let Some(pos) = rest.find_byte(b'\n') {
            let token = &rest[..pos];
            if carry.is_empty() {
                table.record(token)?;
            } else {
                carry.try_reserve(token.len())?;
                carry.extend_from_slice(token);
                table.record(&carry)?;
                carry.clear();
            }
            tokens += 1;
            rest = &rest[pos + 1..];
        }
        carry.try_reserve(rest.len())?;
        carry.extend_from_slice(rest);
    }

    // Interior chunks end on a newline, so only the final chunk can carry here.
    if !carry.is_empty()
        && chunk.end == source.len()
        && cfg.trailing_token == TrailingToken::Count
    {
        table.record(&carry)?;
        tokens += 1;
    }

    let metrics = ChunkMetrics {
        index: chunk.index,
        start: chunk.start,
        end: chunk.end,
        bytes: cursor - chunk.start,
        tokens,
        distinct: table.len(),
        elapsed: started.elapsed(),
    };
    Ok(ChunkScan { table, metrics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WordFreqError;

    fn whole(data: &[u8]) -> Chunk {
        Chunk {
            index: 0,
            start: 0,
            end: data.len() as u64,
        }
    }

    fn cfg(buffer_size: usize, trailing_token: TrailingToken) -> CountConfig {
        CountConfig {
            buffer_size,
            trailing_token,
            show_progress: false,
            ..CountConfig::default()
        }
    }

    fn counts(table: &FrequencyTable) -> Vec<(Vec<u8>, u64)> {
        table.iter().map(|(word, count)| (word.to_vec(), count)).collect()
    }

    #[test]
    fn counts_repeated_words() {
        let data = b"a\nb\na\nb\na\n".to_vec();
        let scan = scan_chunk(&data, &whole(&data), &CountConfig::default()).unwrap();
        assert_eq!(
            counts(&scan.table),
            vec![(b"a".to_vec(), 3), (b"b".to_vec(), 2)]
        );
        assert_eq!(scan.metrics.tokens, 5);
        assert_eq!(scan.metrics.distinct, 2);
        assert_eq!(scan.metrics.bytes, data.len() as u64);
    }

    #[test]
    fn tokens_survive_every_buffer_split() {
        let data = b"alpha\nbeta\n\ngamma\nalpha\ndelta\n".to_vec();
        let expected =
            scan_chunk(&data, &whole(&data), &cfg(1024, TrailingToken::Count)).unwrap();
        for buffer_size in 1..=data.len() {
            let scan =
                scan_chunk(&data, &whole(&data), &cfg(buffer_size, TrailingToken::Count)).unwrap();
            assert_eq!(scan.table, expected.table, "buffer size {buffer_size}");
        }
        assert_eq!(expected.table.get(b""), Some(1));
        assert_eq!(expected.table.get(b"alpha"), Some(2));
    }

    #[test]
    fn trailing_token_policy_applies_at_end_of_source() {
        let data = b"one\ntwo".to_vec();
        let counted = scan_chunk(&data, &whole(&data), &cfg(3, TrailingToken::Count)).unwrap();
        assert_eq!(counted.table.get(b"two"), Some(1));
        assert_eq!(counted.metrics.tokens, 2);

        let dropped = scan_chunk(&data, &whole(&data), &cfg(3, TrailingToken::Drop)).unwrap();
        assert_eq!(dropped.table.get(b"two"), None);
        assert_eq!(dropped.table.get(b"one"), Some(1));
    }

    #[test]
    fn scans_only_its_own_range() {
        let data = b"skip\nkeep\nkeep\nlater\n".to_vec();
        let chunk = Chunk {
            index: 1,
            start: 5,
            end: 15,
        };
        let scan = scan_chunk(&data, &chunk, &CountConfig::default()).unwrap();
        assert_eq!(counts(&scan.table), vec![(b"keep".to_vec(), 2)]);
        assert_eq!(scan.metrics.index, 1);
    }

    #[test]
    fn empty_chunk_yields_empty_table() {
        let data = b"word\n".to_vec();
        let chunk = Chunk {
            index: 3,
            start: 5,
            end: 5,
        };
        let scan = scan_chunk(&data, &chunk, &CountConfig::default()).unwrap();
        assert!(scan.table.is_empty());
        assert_eq!(scan.metrics.tokens, 0);
    }

    #[test]
    fn short_source_is_reported_as_unexpected_eof() {
        let data = b"abc\n".to_vec();
        let chunk = Chunk {
            index: 0,
            start: 0,
            end: 10,
        };
        let err = scan_chunk(&data, &chunk, &CountConfig::default()).expect_err("should fail");
        assert!(matches!(
            err,
            WordFreqError::Io { ref source, .. } if source.kind() == io::ErrorKind::UnexpectedEof
        ));
    }
}
