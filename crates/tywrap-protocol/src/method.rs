use serde::{Deserialize, Serialize};

/// The request's action verb (`call`, `instantiate`, ...). Distinct from a
/// method attached to an instance, which `call_method`'s `methodName` names.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Call,
    Instantiate,
    CallMethod,
    DisposeInstance,
    Meta,
}

impl Method {
    /// Parses the raw `method` string from a request envelope.
    ///
    /// Returns `None` for anything outside the closed vocabulary; the caller
    /// turns that into a `ProtocolError("Unknown method")`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "call" => Some(Method::Call),
            "instantiate" => Some(Method::Instantiate),
            "call_method" => Some(Method::CallMethod),
            "dispose_instance" => Some(Method::DisposeInstance),
            "meta" => Some(Method::Meta),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Call => "call",
            Method::Instantiate => "instantiate",
            Method::CallMethod => "call_method",
            Method::DisposeInstance => "dispose_instance",
            Method::Meta => "meta",
        }
    }
}
