#![forbid(unsafe_code)]
//! The `tywrap/1` wire protocol: request/response envelopes, the method
//! vocabulary, and the closed error taxonomy the bridge is allowed to emit.
//!
//! This crate is pure data plus validation — it does not read or write any
//! stream. `tywrap-io` frames the lines, `tywrap-runtime` dispatches the
//! parsed requests, and `tywrap-codec` turns handler results back into
//! `serde_json::Value`s that land in a [`ResponseEnvelope`].

mod error;
mod method;
mod request;
mod response;

pub use error::{BridgeError, ErrorBody};
pub use method::Method;
pub use request::{validate_envelope, RequestEnvelope};
pub use response::ResponseEnvelope;

/// The literal `protocol` tag every envelope must carry.
pub const PROTOCOL: &str = "tywrap/1";
/// Protocol version advertised by `meta` and implied by [`PROTOCOL`].
pub const PROTOCOL_VERSION: u32 = 1;
/// `id` used on responses whose request could not be parsed far enough to
/// recover an id (malformed JSON, non-object payload, ...).
pub const UNRECOVERABLE_ID: i64 = -1;
