#![forbid(unsafe_code)]
//! Bounded-memory, line-oriented reading of the bridge's request stream.
//!
//! This crate owns exactly the "get me the next complete line, without ever
//! buffering more than one oversized line's worth of garbage" problem. It
//! knows nothing about JSON, the `tywrap/1` envelope, or dispatch — those
//! live in `tywrap-protocol` and `tywrap-runtime`.

mod error;
mod reader;
mod request_reader;

pub use error::LineError;
pub use reader::{BoundedLine, SyncBoundedLineReader};
pub use request_reader::RequestLineReader;
