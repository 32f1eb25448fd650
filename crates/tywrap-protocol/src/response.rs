use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ErrorBody;
use crate::PROTOCOL;

/// A response envelope: exactly one of `result` or `error`, never both.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub id: i64,
    outcome: Outcome,
}

#[derive(Debug, Clone)]
enum Outcome {
    Result(Value),
    Error(ErrorBody),
}

impl ResponseEnvelope {
    pub fn success(id: i64, result: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn failure(id: i64, error: ErrorBody) -> Self {
        Self {
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ResponseEnvelope", 3)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("protocol", PROTOCOL)?;
        match &self.outcome {
            Outcome::Result(value) => state.serialize_field("result", value)?,
            Outcome::Error(body) => state.serialize_field("error", body)?,
        }
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_result_only() {
        let env = ResponseEnvelope::success(1, json!({"a": 1}));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["protocol"], "tywrap/1");
        assert_eq!(value["result"], json!({"a": 1}));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failure_serializes_error_only() {
        let env = ResponseEnvelope::failure(
            -1,
            ErrorBody {
                r#type: "ProtocolError".into(),
                message: "bad".into(),
                traceback: None,
            },
        );
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["id"], -1);
        assert_eq!(value["error"]["type"], "ProtocolError");
        assert!(value.get("result").is_none());
    }
}
