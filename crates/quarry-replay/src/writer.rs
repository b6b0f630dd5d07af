//! Replay recording writer.
//!
//! [`ReplayWriter`] streams newline-terminated records to any `Write`
//! sink. [`save_trace`] persists a whole [`ReplayTrace`] to a file.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ReplayError;
use crate::trace::ReplayTrace;

/// How [`save_trace`] treats an existing destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate and replace the destination.
    #[default]
    Overwrite,
    /// Append after the existing content.
    Append,
}

/// Writes replay records to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use quarry_replay::{ReplayReader, ReplayWriter};
///
/// let mut buf = Vec::new();
/// let mut writer = ReplayWriter::new(&mut buf);
/// writer.write_record("tick=1").unwrap();
/// writer.write_record("tick=2").unwrap();
/// assert_eq!(writer.records_written(), 2);
/// drop(writer);
///
/// let records: Vec<String> = ReplayReader::new(buf.as_slice())
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(records, ["tick=1", "tick=2"]);
/// ```
pub struct ReplayWriter<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> ReplayWriter<W> {
    /// Wrap a sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records_written: 0,
        }
    }

    /// Write one record followed by a newline.
    ///
    /// Records containing `\n` or `\r` are rejected, as are blank ones: the
    /// reader would split the first and drop the second.
    pub fn write_record(&mut self, record: &str) -> Result<(), ReplayError> {
        check_record(self.records_written, record)?;
        self.writer.write_all(record.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    /// Write every record of a trace, in order.
    pub fn write_trace(&mut self, trace: &ReplayTrace) -> Result<(), ReplayError> {
        for record in trace {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ReplayError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reject a record the line-per-record format cannot carry back intact.
fn check_record(index: usize, record: &str) -> Result<(), ReplayError> {
    if record.contains(['\n', '\r']) {
        return Err(ReplayError::MultilineRecord { index });
    }
    if record.bytes().all(|b| b.is_ascii_whitespace()) {
        return Err(ReplayError::BlankRecord { index });
    }
    Ok(())
}

/// Persist a trace to `path`.
///
/// With [`WriteMode::Overwrite`] the destination is replaced; with
/// [`WriteMode::Append`] the records follow whatever is already there.
///
/// Every record is checked before the file is opened, so a rejected trace
/// leaves the destination untouched.
pub fn save_trace(
    path: impl AsRef<Path>,
    trace: &ReplayTrace,
    mode: WriteMode,
) -> Result<(), ReplayError> {
    let path = path.as_ref();
    for (index, record) in trace.iter().enumerate() {
        check_record(index, record)?;
    }
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Overwrite => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };
    let file = options.open(path)?;
    let mut writer = ReplayWriter::new(BufWriter::new(file));
    writer.write_trace(trace)?;
    writer.flush()?;
    tracing::debug!(
        path = %path.display(),
        records = writer.records_written(),
        ?mode,
        "replay saved"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_newline_terminated() {
        let mut writer = ReplayWriter::new(Vec::new());
        writer.write_record("a").unwrap();
        writer.write_record("b c").unwrap();
        assert_eq!(writer.into_inner(), b"a\nb c\n");
    }

    #[test]
    fn blank_record_is_rejected() {
        let mut writer = ReplayWriter::new(Vec::new());
        writer.write_record("ok").unwrap();
        let err = writer.write_record("").unwrap_err();
        assert!(matches!(err, ReplayError::BlankRecord { index: 1 }));
        let err = writer.write_record(" \t ").unwrap_err();
        assert!(matches!(err, ReplayError::BlankRecord { index: 1 }));
        assert_eq!(writer.records_written(), 1);
        assert_eq!(writer.into_inner(), b"ok\n");
    }

    #[test]
    fn multiline_record_is_rejected() {
        let mut writer = ReplayWriter::new(Vec::new());
        writer.write_record("ok").unwrap();
        let err = writer.write_record("bad\nrecord").unwrap_err();
        assert!(matches!(err, ReplayError::MultilineRecord { index: 1 }));
        assert_eq!(writer.records_written(), 1);
        assert_eq!(writer.into_inner(), b"ok\n");
    }

    #[test]
    fn write_trace_writes_all_records() {
        let trace: ReplayTrace = vec!["1".to_string(), "2".to_string(), "3".to_string()].into();
        let mut writer = ReplayWriter::new(Vec::new());
        writer.write_trace(&trace).unwrap();
        assert_eq!(writer.records_written(), 3);
        assert_eq!(writer.into_inner(), trace.to_text().into_bytes());
    }
}
