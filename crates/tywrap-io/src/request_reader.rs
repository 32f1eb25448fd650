use std::io::Read;

use crate::error::LineError;
use crate::reader::{BoundedLine, SyncBoundedLineReader};

/// A single request line pulled off the input stream, or `None` at clean EOF.
///
/// Blank lines are swallowed internally and never surfaced — the caller only
/// ever sees non-empty candidate request lines or a transport error.
pub struct RequestLineReader<R: Read> {
    reader: SyncBoundedLineReader<R>,
}

impl<R: Read> RequestLineReader<R> {
    /// `max_line_bytes` is the configured request size ceiling. Passing
    /// `usize::MAX` effectively disables the ceiling.
    pub fn new(reader: R, max_line_bytes: usize) -> Self {
        Self {
            reader: SyncBoundedLineReader::new(reader, max_line_bytes),
        }
    }
}

impl<R: Read> Iterator for RequestLineReader<R> {
    type Item = Result<String, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.reader.next()?;
            match next {
                BoundedLine::IoError { .. } => return Some(Err(LineError::Io)),
                BoundedLine::LineTooLong {
                    observed_bytes,
                    max_line_bytes,
                    ..
                } => {
                    return Some(Err(LineError::TooLarge {
                        observed_bytes,
                        max_line_bytes,
                    }))
                }
                BoundedLine::Line { bytes, .. } => {
                    let line = match String::from_utf8(bytes) {
                        Ok(line) => line,
                        Err(_) => return Some(Err(LineError::InvalidUtf8)),
                    };
                    let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
                    if line.trim().is_empty() {
                        continue;
                    }
                    return Some(Ok(line));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn skips_blank_lines() {
        let input = Cursor::new(b"\n  \n{\"a\":1}\n".to_vec());
        let mut reader = RequestLineReader::new(input, 1024);
        assert_eq!(reader.next().unwrap().unwrap(), "{\"a\":1}");
        assert!(reader.next().is_none());
    }

    #[test]
    fn reassembles_fragmented_reads() {
        struct Fragmented(Vec<&'static [u8]>);
        impl Read for Fragmented {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() {
                    return Ok(0);
                }
                let chunk = self.0.remove(0);
                buf[..chunk.len()].copy_from_slice(chunk);
                Ok(chunk.len())
            }
        }
        let input = Fragmented(vec![b"{\"a\"", b":1}\n"]);
        let mut reader = RequestLineReader::new(input, 1024);
        assert_eq!(reader.next().unwrap().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn reports_oversized_line() {
        let input = Cursor::new(vec![b'x'; 64]);
        let mut reader = RequestLineReader::new(input, 16);
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, LineError::TooLarge { max_line_bytes: 16, .. }));
    }
}
