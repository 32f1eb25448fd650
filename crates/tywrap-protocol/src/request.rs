use serde_json::Value;

use crate::error::BridgeError;
use crate::method::Method;
use crate::PROTOCOL;

/// A validated request envelope: `protocol` checked, `id` a non-negative
/// integer, `method` in the closed vocabulary, `params` an object (or empty
/// if absent/null).
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub id: i64,
    pub method: Method,
    pub params: serde_json::Map<String, Value>,
}

/// Validates a parsed JSON value against the `tywrap/1` envelope contract.
///
/// On failure, returns the id recovered so far (if any) alongside the
/// error, so the caller can still echo it on the error response rather than
/// falling back to `-1`. `id` is considered recoverable as soon as it parses
/// as a non-negative integer, independent of whether later fields are valid.
pub fn validate_envelope(raw: &Value) -> Result<RequestEnvelope, (Option<i64>, BridgeError)> {
    let obj = raw
        .as_object()
        .ok_or_else(|| (None, BridgeError::Protocol("request must be a JSON object".into())))?;

    let recovered_id = obj.get("id").and_then(Value::as_i64).filter(|id| *id >= 0);

    let protocol = obj.get("protocol").and_then(Value::as_str);
    if protocol != Some(PROTOCOL) {
        return Err((
            recovered_id,
            BridgeError::Protocol(format!("invalid protocol: {protocol:?}")),
        ));
    }

    let id = recovered_id.ok_or_else(|| {
        (
            None,
            BridgeError::Protocol(format!("invalid request id: {:?}", obj.get("id"))),
        )
    })?;

    let method_str = match obj.get("method").and_then(Value::as_str) {
        Some(method) => method,
        None => return Err((Some(id), BridgeError::Protocol("missing method".into()))),
    };

    let method = match Method::parse(method_str) {
        Some(method) => method,
        None => return Err((Some(id), BridgeError::Protocol("Unknown method".into()))),
    };

    let params = match obj.get("params") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => return Err((Some(id), BridgeError::Protocol("invalid params".into()))),
    };

    Ok(RequestEnvelope { id, method, params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_envelope() {
        let raw = json!({"protocol":"tywrap/1","id":1,"method":"meta","params":{}});
        let env = validate_envelope(&raw).unwrap();
        assert_eq!(env.id, 1);
        assert_eq!(env.method, Method::Meta);
    }

    #[test]
    fn defaults_missing_params_to_empty_object() {
        let raw = json!({"protocol":"tywrap/1","id":2,"method":"meta"});
        let env = validate_envelope(&raw).unwrap();
        assert!(env.params.is_empty());
    }

    #[test]
    fn rejects_wrong_protocol_but_recovers_id() {
        let raw = json!({"protocol":"other","id":3,"method":"meta"});
        let (id, err) = validate_envelope(&raw).unwrap_err();
        assert_eq!(id, Some(3));
        assert_eq!(err.error_type(), "ProtocolError");
    }

    #[test]
    fn rejects_negative_id_as_unrecoverable() {
        let raw = json!({"protocol":"tywrap/1","id":-1,"method":"meta"});
        let (id, _) = validate_envelope(&raw).unwrap_err();
        assert_eq!(id, None);
    }

    #[test]
    fn rejects_non_object_params() {
        let raw = json!({"protocol":"tywrap/1","id":4,"method":"meta","params":[1,2]});
        let (id, err) = validate_envelope(&raw).unwrap_err();
        assert_eq!(id, Some(4));
        assert_eq!(err.error_type(), "ProtocolError");
    }

    #[test]
    fn rejects_unknown_method() {
        let raw = json!({"protocol":"tywrap/1","id":5,"method":"bogus"});
        let (id, err) = validate_envelope(&raw).unwrap_err();
        assert_eq!(id, Some(5));
        assert_eq!(err.error_type(), "ProtocolError");
    }
}
