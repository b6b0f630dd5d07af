//! Replay playback reader.
//!
//! [`ReplayReader`] yields records from any `BufRead` source. Blank lines
//! (including a trailing newline) and lines that are not valid UTF-8 are
//! skipped; a Windows `\r\n` terminator is tolerated.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::ReplayError;
use crate::trace::ReplayTrace;

/// Reads replay records from a byte stream.
pub struct ReplayReader<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    records_read: usize,
    skipped: usize,
    done: bool,
}

impl<R: BufRead> ReplayReader<R> {
    /// Wrap a source.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            records_read: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Read the next record, or `None` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<String>, ReplayError> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }
            let line = trim_line_end(&self.buf);
            if line.iter().all(u8::is_ascii_whitespace) {
                self.skipped += 1;
                continue;
            }
            match std::str::from_utf8(line) {
                Ok(text) => {
                    self.records_read += 1;
                    return Ok(Some(text.to_string()));
                }
                Err(e) => {
                    tracing::debug!(
                        after_record = self.records_read,
                        error = %e,
                        "skipping non-UTF-8 replay line"
                    );
                    self.skipped += 1;
                }
            }
        }
    }

    /// Number of records returned so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Number of blank or malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for ReplayReader<R> {
    type Item = Result<String, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Load every record persisted at `path` into a trace.
pub fn load_trace(path: impl AsRef<Path>) -> Result<ReplayTrace, ReplayError> {
    let path = path.as_ref();
    let mut reader = ReplayReader::new(BufReader::new(File::open(path)?));
    let mut trace = ReplayTrace::new();
    while let Some(record) = reader.next_record()? {
        trace.push(record);
    }
    tracing::debug!(
        path = %path.display(),
        records = trace.len(),
        skipped = reader.skipped(),
        "replay loaded"
    );
    Ok(trace)
}
