use tywrap_codec::{FallbackMode, HostValue};
use tywrap_protocol::{BridgeError, Method};

use crate::capability::CapabilityReport;
use crate::instance::InstanceRegistry;
use crate::registry::Registry;

/// Routes a validated, request-side-decoded request to its handler:
/// `call`/`instantiate` resolve against the static [`Registry`],
/// `call_method`/`dispose_instance` resolve against the live
/// [`InstanceRegistry`], and `meta` reports capabilities.
pub struct Dispatcher {
    registry: Registry,
    instances: InstanceRegistry,
    fallback_mode: FallbackMode,
}

impl Dispatcher {
    pub fn new(registry: Registry, fallback_mode: FallbackMode) -> Self {
        Self {
            registry,
            instances: InstanceRegistry::new(),
            fallback_mode,
        }
    }

    /// `params` is the request's `params` object, already passed through the
    /// request-value decoder — bytes envelopes resolved, scalars in their
    /// natural host type.
    pub fn dispatch(&mut self, method: Method, params: HostValue) -> Result<HostValue, BridgeError> {
        let entries = match params {
            HostValue::Map(entries) => entries,
            _ => Vec::new(),
        };
        match method {
            Method::Call => self.handle_call(&entries),
            Method::Instantiate => self.handle_instantiate(&entries),
            Method::CallMethod => self.handle_call_method(&entries),
            Method::DisposeInstance => self.handle_dispose_instance(&entries),
            Method::Meta => self.handle_meta(),
        }
    }

    fn handle_call(&self, params: &[(String, HostValue)]) -> Result<HostValue, BridgeError> {
        let module = required_str(params, "module")?;
        let function_name = required_str(params, "functionName")?;
        let args = positional_args(params)?;
        let kwargs = keyword_args(params)?;
        self.registry.call(module, function_name, &args, &kwargs)
    }

    fn handle_instantiate(&mut self, params: &[(String, HostValue)]) -> Result<HostValue, BridgeError> {
        let module = required_str(params, "module")?;
        let class_name = required_str(params, "className")?;
        let args = positional_args(params)?;
        let kwargs = keyword_args(params)?;

        let handle = self.instances.reserve();
        match self.registry.instantiate(module, class_name, &args, &kwargs) {
            Ok(instance) => {
                self.instances.commit(&handle, instance);
                Ok(HostValue::String(handle))
            }
            Err(e) => {
                self.instances.abandon(&handle);
                Err(e)
            }
        }
    }

    fn handle_call_method(&mut self, params: &[(String, HostValue)]) -> Result<HostValue, BridgeError> {
        let handle = required_str(params, "handle")?.to_string();
        let method_name = required_str(params, "methodName")?;
        let args = positional_args(params)?;
        let kwargs = keyword_args(params)?;
        self.instances.call_method(&handle, method_name, &args, &kwargs)
    }

    fn handle_dispose_instance(&mut self, params: &[(String, HostValue)]) -> Result<HostValue, BridgeError> {
        let handle = required_str(params, "handle")?;
        Ok(HostValue::Bool(self.instances.dispose(handle)))
    }

    fn handle_meta(&self) -> Result<HostValue, BridgeError> {
        let report = CapabilityReport::collect(self.fallback_mode, self.instances.live_count());
        let value = serde_json::to_value(report)
            .map_err(|e| BridgeError::Codec(format!("failed to encode capability report: {e}")))?;
        Ok(HostValue::Json(value))
    }
}

fn required_str<'a>(params: &'a [(String, HostValue)], key: &str) -> Result<&'a str, BridgeError> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .and_then(|(_, value)| match value {
            HostValue::String(s) => Some(s.as_str()),
            _ => None,
        })
        .ok_or_else(|| BridgeError::Protocol(format!("missing or invalid `{key}`")))
}

/// `args` must be absent, null, or a list; any other JSON type is a
/// protocol violation rather than silently-empty arguments.
fn positional_args(params: &[(String, HostValue)]) -> Result<Vec<HostValue>, BridgeError> {
    match params.iter().find(|(name, _)| name == "args") {
        None => Ok(Vec::new()),
        Some((_, HostValue::Null)) => Ok(Vec::new()),
        Some((_, HostValue::List(items))) => Ok(items.clone()),
        Some(_) => Err(BridgeError::Protocol("args must be a list".to_string())),
    }
}

/// `kwargs` must be absent, null, or an object; any other JSON type is a
/// protocol violation rather than silently-empty keyword arguments.
fn keyword_args(params: &[(String, HostValue)]) -> Result<Vec<(String, HostValue)>, BridgeError> {
    match params.iter().find(|(name, _)| name == "kwargs") {
        None => Ok(Vec::new()),
        Some((_, HostValue::Null)) => Ok(Vec::new()),
        Some((_, HostValue::Map(entries))) => Ok(entries.clone()),
        Some(_) => Err(BridgeError::Protocol("kwargs must be an object".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tywrap_codec::decode_request_value;
    use tywrap_protocol::validate_envelope;

    fn dispatch(dispatcher: &mut Dispatcher, raw: Value) -> Result<HostValue, BridgeError> {
        let request = validate_envelope(&raw).unwrap();
        let params = decode_request_value(Value::Object(request.params)).unwrap();
        dispatcher.dispatch(request.method, params)
    }

    fn dispatcher_with_double() -> Dispatcher {
        let mut registry = Registry::new();
        registry.register_function(
            "math",
            "double",
            Box::new(|args, _kwargs| {
                let n = match args.first() {
                    Some(HostValue::Int(n)) => *n,
                    _ => 0,
                };
                Ok(HostValue::Int(n * 2))
            }),
        );
        Dispatcher::new(registry, FallbackMode::None)
    }

    #[test]
    fn dispatches_call() {
        let mut dispatcher = dispatcher_with_double();
        let result = dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 1, "method": "call",
                "params": {"module": "math", "functionName": "double", "args": [21]},
            }),
        )
        .unwrap();
        assert_eq!(result, HostValue::Int(42));
    }

    #[test]
    fn meta_reports_zero_instances_initially() {
        let mut dispatcher = dispatcher_with_double();
        let result = dispatch(
            &mut dispatcher,
            json!({"protocol": "tywrap/1", "id": 1, "method": "meta"}),
        )
        .unwrap();
        match result {
            HostValue::Json(value) => assert_eq!(value["instances"], 0),
            other => panic!("expected Json, got {other:?}"),
        }
    }

    #[test]
    fn call_method_on_unknown_handle_errors() {
        let mut dispatcher = dispatcher_with_double();
        let err = dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 1, "method": "call_method",
                "params": {"handle": "999", "methodName": "anything"},
            }),
        )
        .unwrap_err();
        assert_eq!(err.error_type(), "InstanceHandleError");
    }

    #[test]
    fn dispose_instance_is_idempotent() {
        let mut registry = Registry::new();
        registry.register_class(
            "widgets",
            "Counter",
            Box::new(|_args, _kwargs| Ok(Box::new(CounterInstance(0)) as Box<dyn crate::instance::Instance>)),
        );
        let mut dispatcher = Dispatcher::new(registry, FallbackMode::None);

        let handle = match dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 1, "method": "instantiate",
                "params": {"module": "widgets", "className": "Counter"},
            }),
        )
        .unwrap()
        {
            HostValue::String(handle) => handle,
            other => panic!("expected String handle, got {other:?}"),
        };

        let result = dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 2, "method": "dispose_instance",
                "params": {"handle": handle.clone()},
            }),
        )
        .unwrap();
        assert_eq!(result, HostValue::Bool(true));

        let result = dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 3, "method": "dispose_instance",
                "params": {"handle": handle},
            }),
        )
        .unwrap();
        assert_eq!(result, HostValue::Bool(false));
    }

    #[test]
    fn non_list_args_is_a_protocol_error() {
        let mut dispatcher = dispatcher_with_double();
        let err = dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 1, "method": "call",
                "params": {"module": "math", "functionName": "double", "args": "not a list"},
            }),
        )
        .unwrap_err();
        assert_eq!(err.error_type(), "ProtocolError");
    }

    #[test]
    fn non_object_kwargs_is_a_protocol_error() {
        let mut dispatcher = dispatcher_with_double();
        let err = dispatch(
            &mut dispatcher,
            json!({
                "protocol": "tywrap/1", "id": 1, "method": "call",
                "params": {"module": "math", "functionName": "double", "kwargs": 42},
            }),
        )
        .unwrap_err();
        assert_eq!(err.error_type(), "ProtocolError");
    }

    struct CounterInstance(i64);
    impl crate::instance::Instance for CounterInstance {
        fn call_method(
            &mut self,
            _method_name: &str,
            _args: &[HostValue],
            _kwargs: &[(String, HostValue)],
        ) -> Result<HostValue, BridgeError> {
            self.0 += 1;
            Ok(HostValue::Int(self.0))
        }
    }
}
