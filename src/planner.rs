//! Partitioning of a byte source into newline-aligned chunks.

use bstr::ByteSlice;
use serde::{Deserialize, Serialize};

use crate::config::validate_workers;
use crate::error::Result;
use crate::source::{source_error, ByteSource};

/// Number of bytes read per probe while searching for a line boundary.
const PROBE_WINDOW: usize = 4096;

/// Contiguous byte range assigned to a single scanner.
///
/// `end` is exclusive, so an empty chunk has `start == end`.  Every interior
/// boundary sits immediately after a newline byte.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within the plan.
    pub index: usize,
    /// First byte offset covered by the chunk.
    pub start: u64,
    /// One past the last byte offset covered by the chunk.
    pub end: u64,
}

impl Chunk {
    /// Number of bytes in the chunk.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns true when the chunk covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `source` into `workers` chunks whose boundaries never split a line.
///
/// Raw ranges are `floor(len / workers)` bytes wide.  Each interior boundary is
/// pushed forward past the next newline, so a line straddling a raw boundary
/// belongs entirely to the earlier chunk.  The final chunk always runs to the
/// end of the source and absorbs any remainder.  When a boundary finds no
/// newline before end-of-file it lands on the end and the chunks after it are
/// empty.
pub fn plan_chunks<S: ByteSource + ?Sized>(source: &S, workers: usize) -> Result<Vec<Chunk>> {
    validate_workers(workers)?;

    let size = source.len();
    let step = size / workers as u64;
    let mut boundaries = Vec::with_capacity(workers + 1);
    boundaries.push(0u64);

    let mut previous = 0u64;
    for index in 1..workers {
        let raw = step * index as u64;
        // A boundary at or past `raw` is already a line start.
        let boundary = if raw <= previous {
            previous
        } else {
            align_to_line_start(source, raw)?
        };
        boundaries.push(boundary);
        previous = boundary;
    }
    boundaries.push(size);

    Ok(boundaries
        .windows(2)
        .enumerate()
        .map(|(index, bounds)| Chunk {
            index,
            start: bounds[0],
            end: bounds[1],
        })
        .collect())
}

/// Returns the first offset `>= raw` that follows a newline, or the source length.
fn align_to_line_start<S: ByteSource + ?Sized>(source: &S, raw: u64) -> Result<u64> {
    let size = source.len();
    if raw == 0 || raw >= size {
        return Ok(raw.min(size));
    }

    let mut probe = vec![0u8; PROBE_WINDOW];
    let mut offset = raw - 1;
    while offset < size {
        let read = source
            .read_at(&mut probe, offset)
            .map_err(|err| source_error(source, err))?;
        if read == 0 {
            break;
        }
        if let Some(pos) = probe[..read].find_byte(b'\n') {
            return Ok(offset + pos as u64 + 1);
        }
        offset += read as u64;
    }
    Ok(size)
}
