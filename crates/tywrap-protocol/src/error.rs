use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bound on the diagnostic text an internal handler failure may carry.
/// Matches the stderr diagnostic cap used by the envelope validator.
pub const MAX_TRACEBACK_BYTES: usize = 8 * 1024;

/// The closed error taxonomy the bridge is allowed to produce. Every error
/// path the bridge can take maps to exactly one of these kinds. Bridge-internal
/// kinds never carry a traceback;
/// only `Handler` (an exception raised by user code) does.
#[derive(Debug, Error, Clone)]
pub enum BridgeError {
    #[error("{0}")]
    Protocol(String),

    #[error("request exceeds configured size ceiling (observed_bytes={observed_bytes}, max_bytes={max_bytes})")]
    RequestTooLarge {
        observed_bytes: usize,
        max_bytes: usize,
    },

    #[error("response exceeds configured size ceiling (observed_bytes={observed_bytes}, max_bytes={max_bytes})")]
    PayloadTooLarge {
        observed_bytes: usize,
        max_bytes: usize,
    },

    #[error("{0}")]
    Codec(String),

    #[error("unknown handle: {0}")]
    InstanceHandle(String),

    #[error("{message}")]
    Handler {
        /// Short symbolic name of the handler's exception kind, carried
        /// verbatim into `error.type`.
        kind: String,
        message: String,
        traceback: Option<String>,
    },

    #[error("{0}")]
    JsonDecode(String),
}

impl BridgeError {
    /// The short symbolic `error.type` string for this error.
    pub fn error_type(&self) -> String {
        match self {
            BridgeError::Protocol(_) => "ProtocolError".to_string(),
            BridgeError::RequestTooLarge { .. } => "RequestTooLargeError".to_string(),
            BridgeError::PayloadTooLarge { .. } => "PayloadTooLargeError".to_string(),
            BridgeError::Codec(_) => "CodecError".to_string(),
            BridgeError::InstanceHandle(_) => "InstanceHandleError".to_string(),
            BridgeError::Handler { kind, .. } => kind.clone(),
            BridgeError::JsonDecode(_) => "JSONDecodeError".to_string(),
        }
    }

    /// Truncates a handler-supplied traceback to [`MAX_TRACEBACK_BYTES`],
    /// respecting UTF-8 character boundaries.
    pub fn bound_traceback(traceback: String) -> String {
        if traceback.len() <= MAX_TRACEBACK_BYTES {
            return traceback;
        }
        let mut end = MAX_TRACEBACK_BYTES;
        while end > 0 && !traceback.is_char_boundary(end) {
            end -= 1;
        }
        traceback[..end].to_string()
    }

    pub fn to_body(&self) -> ErrorBody {
        let traceback = match self {
            BridgeError::Handler { traceback, .. } => traceback.clone(),
            _ => None,
        };
        ErrorBody {
            r#type: self.error_type(),
            message: self.to_string(),
            traceback,
        }
    }
}

/// The `error` field of a response envelope.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}
