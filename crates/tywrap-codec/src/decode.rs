//! Decodes request-side JSON arguments back into host-native values.
//!
//! Requests never carry Arrow-encoded payloads — only a plain JSON document,
//! with bytes represented by one of the two accepted bytes-envelope shapes.
//! Every JSON scalar maps onto its natural [`HostValue`] variant so handler
//! code sees real host types rather than a generic JSON tree; only a bytes
//! envelope needs special recognition, since JSON itself has no byte-string
//! type to decode into.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Number, Value};
use tywrap_protocol::BridgeError;

use crate::value::HostValue;

fn protocol_error(message: impl Into<String>) -> BridgeError {
    BridgeError::Protocol(message.into())
}

/// Decodes a JSON value — typically a request's `params` object, or any
/// value nested within it — into its host-native representation.
pub fn decode_request_value(value: Value) -> Result<HostValue, BridgeError> {
    match value {
        Value::Null => Ok(HostValue::Null),
        Value::Bool(b) => Ok(HostValue::Bool(b)),
        Value::Number(n) => Ok(decode_number(n)),
        Value::String(s) => Ok(HostValue::String(s)),
        Value::Array(items) => {
            let decoded: Result<Vec<HostValue>, BridgeError> =
                items.into_iter().map(decode_request_value).collect();
            Ok(HostValue::List(decoded?))
        }
        Value::Object(map) => {
            if let Some(bytes) = try_decode_bytes_envelope(&map)? {
                return Ok(HostValue::Bytes(bytes));
            }
            let mut decoded = Vec::with_capacity(map.len());
            for (key, item) in map {
                decoded.push((key, decode_request_value(item)?));
            }
            Ok(HostValue::Map(decoded))
        }
    }
}

fn decode_number(n: Number) -> HostValue {
    if let Some(i) = n.as_i64() {
        HostValue::Int(i)
    } else if let Some(f) = n.as_f64() {
        HostValue::Float(f)
    } else {
        // A JSON number outside both i64 and f64 range (e.g. a u64 above
        // 2^53 that doesn't round-trip through f64 losslessly); keep it as
        // raw JSON rather than lose precision silently.
        HostValue::Json(Value::Number(n))
    }
}

/// Recognizes both accepted bytes-envelope shapes:
/// `{"__tywrap_bytes__": true, "b64": "..."}` and
/// `{"__type__": "bytes", "encoding": "base64", "data": "..."}`.
/// Returns `Ok(None)` when `map` is not a bytes envelope at all (an ordinary
/// object), and `Err` when it looks like one but is malformed.
fn try_decode_bytes_envelope(map: &serde_json::Map<String, Value>) -> Result<Option<Vec<u8>>, BridgeError> {
    if let Some(Value::Bool(true)) = map.get("__tywrap_bytes__") {
        let b64 = map
            .get("b64")
            .and_then(Value::as_str)
            .ok_or_else(|| protocol_error("bytes envelope missing `b64` field"))?;
        return decode_base64_bytes(b64).map(Some);
    }

    if let Some(Value::String(tag)) = map.get("__type__") {
        if tag == "bytes" {
            let encoding = map.get("encoding").and_then(Value::as_str).unwrap_or("");
            if encoding != "base64" {
                return Err(protocol_error(format!(
                    "unsupported bytes envelope encoding: {encoding}"
                )));
            }
            let data = map
                .get("data")
                .and_then(Value::as_str)
                .ok_or_else(|| protocol_error("bytes envelope missing `data` field"))?;
            return decode_base64_bytes(data).map(Some);
        }
    }

    Ok(None)
}

fn decode_base64_bytes(encoded: &str) -> Result<Vec<u8>, BridgeError> {
    BASE64
        .decode(encoded)
        .map_err(|_| protocol_error("Invalid bytes envelope: invalid base64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tywrap_bytes_shape() {
        let input = json!({"__tywrap_bytes__": true, "b64": "SGVsbG8="});
        let decoded = decode_request_value(input).unwrap();
        assert_eq!(decoded, HostValue::Bytes(b"Hello".to_vec()));
    }

    #[test]
    fn decodes_type_bytes_shape() {
        let input = json!({"__type__": "bytes", "encoding": "base64", "data": "SGk="});
        let decoded = decode_request_value(input).unwrap();
        assert_eq!(decoded, HostValue::Bytes(b"Hi".to_vec()));
    }

    #[test]
    fn recurses_through_nested_structures() {
        let input = json!({
            "payload": [
                {"__tywrap_bytes__": true, "b64": "AQID"},
                {"ordinary": 1},
            ],
        });
        let decoded = decode_request_value(input).unwrap();
        let HostValue::Map(entries) = decoded else { panic!("expected Map") };
        let (_, payload) = &entries[0];
        let HostValue::List(items) = payload else { panic!("expected List") };
        assert_eq!(items[0], HostValue::Bytes(vec![1, 2, 3]));
        assert_eq!(items[1], HostValue::Map(vec![("ordinary".to_string(), HostValue::Int(1))]));
    }

    #[test]
    fn rejects_unsupported_encoding() {
        let input = json!({"__type__": "bytes", "encoding": "hex", "data": "deadbeef"});
        let err = decode_request_value(input).unwrap_err();
        assert_eq!(err.error_type(), "ProtocolError");
    }

    #[test]
    fn rejects_invalid_base64() {
        let input = json!({"__tywrap_bytes__": true, "b64": "not valid base64!!"});
        let err = decode_request_value(input).unwrap_err();
        assert_eq!(err.error_type(), "ProtocolError");
        assert!(err.to_string().contains("invalid base64"));
    }

    #[test]
    fn scalars_decode_to_their_natural_variant() {
        assert_eq!(decode_request_value(json!(null)).unwrap(), HostValue::Null);
        assert_eq!(decode_request_value(json!(true)).unwrap(), HostValue::Bool(true));
        assert_eq!(decode_request_value(json!(42)).unwrap(), HostValue::Int(42));
        assert_eq!(decode_request_value(json!(1.5)).unwrap(), HostValue::Float(1.5));
        assert_eq!(
            decode_request_value(json!("hi")).unwrap(),
            HostValue::String("hi".to_string())
        );
    }
}
