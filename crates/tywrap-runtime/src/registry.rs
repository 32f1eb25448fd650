use std::collections::HashMap;

use tywrap_codec::HostValue;
use tywrap_protocol::BridgeError;

use crate::instance::Instance;

/// A bound host function, looked up by `(module, functionName)`. Positional
/// arguments and keyword arguments arrive already decoded (bytes envelopes
/// restored, scalars in their natural host type).
pub type FunctionHandler =
    Box<dyn Fn(&[HostValue], &[(String, HostValue)]) -> Result<HostValue, BridgeError> + Send + Sync>;

/// A bound host constructor, looked up by `(module, className)`. Rust has no
/// runtime equivalent of `importlib.import_module` + `getattr`, so the set of
/// callable modules/functions/classes is registered ahead of time rather than
/// resolved dynamically at dispatch time.
pub type Constructor = Box<
    dyn Fn(&[HostValue], &[(String, HostValue)]) -> Result<Box<dyn Instance>, BridgeError> + Send + Sync,
>;

/// The closed set of functions and classes a bridge process exposes to its
/// caller. Built once at startup; `call`/`instantiate` look up into it by
/// `(module, name)`.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<(String, String), FunctionHandler>,
    constructors: HashMap<(String, String), Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_function(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        handler: FunctionHandler,
    ) {
        self.functions.insert((module.into(), name.into()), handler);
    }

    pub fn register_class(
        &mut self,
        module: impl Into<String>,
        name: impl Into<String>,
        constructor: Constructor,
    ) {
        self.constructors.insert((module.into(), name.into()), constructor);
    }

    pub fn call(
        &self,
        module: &str,
        function_name: &str,
        args: &[HostValue],
        kwargs: &[(String, HostValue)],
    ) -> Result<HostValue, BridgeError> {
        let handler = self
            .functions
            .get(&(module.to_string(), function_name.to_string()))
            .ok_or_else(|| {
                BridgeError::Protocol(format!("no such function: {module}.{function_name}"))
            })?;
        handler(args, kwargs)
    }

    pub fn instantiate(
        &self,
        module: &str,
        class_name: &str,
        args: &[HostValue],
        kwargs: &[(String, HostValue)],
    ) -> Result<Box<dyn Instance>, BridgeError> {
        let constructor = self
            .constructors
            .get(&(module.to_string(), class_name.to_string()))
            .ok_or_else(|| BridgeError::Protocol(format!("no such class: {module}.{class_name}")))?;
        constructor(args, kwargs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_registered_function() {
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
        let result = registry.call("math", "double", &[HostValue::Int(21)], &[]).unwrap();
        assert_eq!(result, HostValue::Int(42));
    }

    #[test]
    fn unknown_function_is_a_protocol_error() {
        let registry = Registry::new();
        let err = registry.call("math", "double", &[], &[]).unwrap_err();
        assert_eq!(err.error_type(), "ProtocolError");
    }
}
