use thiserror::Error;

/// Failure modes raised while pulling one framed request line off the input stream.
///
/// These are transport-level failures only; they say nothing about whether the
/// line's *contents* are a well-formed request (see `tywrap-protocol` for that).
#[derive(Debug, Error, Clone)]
pub enum LineError {
    #[error("I/O error while reading request stream")]
    Io,
    #[error("invalid UTF-8 in request line")]
    InvalidUtf8,
    #[error("request line too large (observed_bytes={observed_bytes}, max_line_bytes={max_line_bytes})")]
    TooLarge {
        observed_bytes: usize,
        max_line_bytes: usize,
    },
}
