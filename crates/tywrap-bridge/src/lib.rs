#![forbid(unsafe_code)]
//! The `tywrap/1` bridge: wires a framed stdin/stdout loop to request
//! validation, decoding, dispatch, and response encoding.
//!
//! This crate is the "C1 + C8" glue — reading lines, packaging errors, and
//! writing responses — around `tywrap-io` (framing), `tywrap-protocol`
//! (envelopes), `tywrap-codec` (values), and `tywrap-runtime` (dispatch).
//! Embedders construct a [`tywrap_runtime::Registry`] of their own functions
//! and classes and hand it to [`serve`]; `main` additionally ships a tiny
//! built-in registry for smoke-testing the bridge end to end.

pub mod builtins;
pub mod config;

use std::io::{self, Read, Write};

use serde_json::Value;
use tracing::{debug, warn};
use tywrap_codec::{decode_request_value, encode_response};
use tywrap_io::{LineError, RequestLineReader};
use tywrap_protocol::{validate_envelope, BridgeError, ResponseEnvelope, UNRECOVERABLE_ID};
use tywrap_runtime::Dispatcher;

pub use config::{Config, ConfigError};

/// Diagnostics written to standard error are a debugging aid with no
/// semantic contract; bound them so a pathological payload can't blow up
/// memory on the stderr path the way an unbounded line could on stdin.
const MAX_STDERR_DIAGNOSTIC_BYTES: usize = 2 * 1024;

/// Runs the bridge loop to completion: reads framed request lines from
/// `input`, dispatches each through `dispatcher`, and writes one response
/// line per request line to `output`. Returns on clean EOF or a broken
/// output pipe; propagates any other I/O error.
pub fn serve<R: Read, W: Write, E: Write>(
    input: R,
    mut output: W,
    mut stderr: E,
    mut dispatcher: Dispatcher,
    config: &Config,
) -> io::Result<()> {
    let reader = RequestLineReader::new(input, config.request_ceiling_bytes);

    for line in reader {
        let response = match line {
            Ok(raw_line) => process_line(&raw_line, &mut dispatcher, config, &mut stderr),
            Err(LineError::TooLarge {
                observed_bytes,
                max_line_bytes,
            }) => {
                let err = BridgeError::RequestTooLarge {
                    observed_bytes,
                    max_bytes: max_line_bytes,
                };
                write_diagnostic(&mut stderr, &err.to_string());
                ResponseEnvelope::failure(UNRECOVERABLE_ID, err.to_body())
            }
            Err(LineError::InvalidUtf8) => {
                let err = BridgeError::JsonDecode("invalid UTF-8 in request line".to_string());
                write_diagnostic(&mut stderr, &err.to_string());
                ResponseEnvelope::failure(UNRECOVERABLE_ID, err.to_body())
            }
            Err(LineError::Io) => {
                warn!("tywrap-bridge: I/O error reading request stream; exiting");
                break;
            }
        };

        if write_response_line(&mut output, &response).is_err() {
            // Broken output pipe: the caller has gone away. Exit cleanly,
            // per the protocol's exit-code contract.
            break;
        }
    }

    Ok(())
}

fn process_line(
    line: &str,
    dispatcher: &mut Dispatcher,
    config: &Config,
    stderr: &mut impl Write,
) -> ResponseEnvelope {
    let raw: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            let err = BridgeError::JsonDecode(e.to_string());
            write_diagnostic(stderr, &err.to_string());
            return ResponseEnvelope::failure(UNRECOVERABLE_ID, err.to_body());
        }
    };

    let request = match validate_envelope(&raw) {
        Ok(request) => request,
        Err((id, err)) => {
            write_diagnostic(stderr, &err.to_string());
            return ResponseEnvelope::failure(id.unwrap_or(UNRECOVERABLE_ID), err.to_body());
        }
    };

    let id = request.id;
    match dispatch_decoded(request, dispatcher) {
        Ok(value) => match encode_response(&value, &config.codec) {
            Ok(json) => ResponseEnvelope::success(id, json),
            Err(err) => ResponseEnvelope::failure(id, err.to_body()),
        },
        Err(err) => ResponseEnvelope::failure(id, err.to_body()),
    }
}

fn dispatch_decoded(
    request: tywrap_protocol::RequestEnvelope,
    dispatcher: &mut Dispatcher,
) -> Result<tywrap_codec::HostValue, BridgeError> {
    let params = decode_request_value(Value::Object(request.params))?;
    debug!(method = request.method.as_str(), id = request.id, "dispatching request");
    dispatcher.dispatch(request.method, params)
}

fn write_response_line<W: Write>(output: &mut W, response: &ResponseEnvelope) -> io::Result<()> {
    let line = match serde_json::to_string(response) {
        Ok(line) => line,
        Err(e) => {
            let fallback = ResponseEnvelope::failure(
                response.id,
                BridgeError::Protocol(format!("failed to encode response: {e}")).to_body(),
            );
            serde_json::to_string(&fallback).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
        }
    };
    output.write_all(line.as_bytes())?;
    output.write_all(b"\n")?;
    output.flush()
}

fn write_diagnostic(stderr: &mut impl Write, message: &str) {
    let bounded = if message.len() > MAX_STDERR_DIAGNOSTIC_BYTES {
        let mut end = MAX_STDERR_DIAGNOSTIC_BYTES;
        while end > 0 && !message.is_char_boundary(end) {
            end -= 1;
        }
        &message[..end]
    } else {
        message
    };
    let _ = writeln!(stderr, "tywrap-bridge: {bounded}");
}
