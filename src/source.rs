//! Random-access byte sources read with position-independent reads.
//!
//! Every read names its own offset, so a single source can be shared by all
//! scanners without any cursor coordination.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Result, WordFreqError};

/// Read-only, randomly addressable input of known length.
pub trait ByteSource: Sync {
    /// Total number of bytes in the source.
    fn len(&self) -> u64;

    /// Returns true when the source holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads up to `buf.len()` bytes starting at `offset`, returning the number read.
    ///
    /// A return value of zero signals end-of-source.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Reads until `buf` is full or the source is exhausted.
    fn read_full_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        Ok(filled)
    }

    /// Path backing the source, used to annotate IO errors.
    fn path(&self) -> Option<&Path> {
        None
    }
}

impl ByteSource for [u8] {
    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= <[u8]>::len(self) {
            return Ok(0);
        }
        let available = &self[start..];
        let read = available.len().min(buf.len());
        buf[..read].copy_from_slice(&available[..read]);
        Ok(read)
    }
}

impl ByteSource for Vec<u8> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.as_slice().read_at(buf, offset)
    }
}

/// File opened for reading with its size captured at open time.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    path: PathBuf,
    len: u64,
}

impl FileSource {
    /// Opens `path` read-only and records its length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|err| WordFreqError::io(err, Some(path.to_path_buf())))?;
        let metadata = file
            .metadata()
            .map_err(|err| WordFreqError::io(err, Some(path.to_path_buf())))?;
        if !metadata.is_file() {
            return Err(WordFreqError::InvalidConfig(format!(
                "input path {path:?} is not a regular file"
            )));
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
            len: metadata.len(),
        })
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        positional_read(&self.file, buf, offset)
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(unix)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(not(any(unix, windows)))]
fn positional_read(_file: &File, _buf: &mut [u8], _offset: u64) -> io::Result<usize> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "positional reads are not supported on this platform",
    ))
}

/// Wraps an IO error with the source's path, if it has one.
pub(crate) fn source_error<S: ByteSource + ?Sized>(source: &S, err: io::Error) -> WordFreqError {
    WordFreqError::io(err, source.path().map(Path::to_path_buf))
}
