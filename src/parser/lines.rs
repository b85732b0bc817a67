//! Logical-line reconstruction.
//!
//! Each record in the export starts with a `M/D/YYYY H:MM` timestamp. When
//! a recipient list is long the exporting tool wraps it onto further
//! physical lines, so a record is rebuilt by appending every following line
//! that does not start with a timestamp.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SiftError};

/// Size of the internal read buffer.
const READ_BUFFER_SIZE: usize = 128 * 1024;

fn record_start_re() -> &'static Regex {
    static RECORD_START_RE: OnceLock<Regex> = OnceLock::new();
    RECORD_START_RE.get_or_init(|| {
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}").expect("valid record start regex")
    })
}

/// Whether a physical line opens a new record.
pub fn is_record_start(line: &str) -> bool {
    record_start_re().is_match(line)
}

/// Iterator over the logical lines of one export.
///
/// The first physical line is the header and is always skipped. Blank lines
/// are ignored. Lines that appear before the first record start are
/// orphans and are discarded.
pub struct LogicalLines<R> {
    reader: R,
    path: PathBuf,
    current: Option<String>,
    header_skipped: bool,
    finished: bool,
    buf: Vec<u8>,
}

impl LogicalLines<BufReader<File>> {
    /// Open `path` for a fresh pass over its logical lines.
    ///
    /// The file handle lives inside the iterator and is released when the
    /// iterator is dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| SiftError::io(&path, e))?;
        Ok(Self::new(
            BufReader::with_capacity(READ_BUFFER_SIZE, file),
            path,
        ))
    }
}

impl<R: BufRead> LogicalLines<R> {
    /// Wrap an already-open reader. `path` is only used in error messages.
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            current: None,
            header_skipped: false,
            finished: false,
            buf: Vec::with_capacity(4096),
        }
    }

    /// Read the next physical line without its line terminator.
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_physical(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| SiftError::io(&self.path, e))?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        Ok(Some(decode_line(&self.buf)))
    }
}

impl<R: BufRead> Iterator for LogicalLines<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if !self.header_skipped {
            self.header_skipped = true;
            match self.read_physical() {
                Ok(Some(_header)) => {}
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        loop {
            let line = match self.read_physical() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.finished = true;
                    return self.current.take().map(Ok);
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            if is_record_start(&line) {
                if let Some(done) = self.current.replace(line) {
                    return Some(Ok(done));
                }
            } else if let Some(current) = self.current.as_mut() {
                current.push(' ');
                current.push_str(line.trim());
            }
        }
    }
}

/// Decode one physical line.
///
/// Tries UTF-8 first, then falls back to Windows-1252, which accepts every
/// byte. A leading BOM is dropped.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
