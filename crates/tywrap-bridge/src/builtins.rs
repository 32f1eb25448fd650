//! A tiny built-in registry used to smoke-test the bridge end to end.
//!
//! Real embedders build their own [`Registry`] from their own functions and
//! classes; this module exists only so `main` has something to dispatch
//! against without pulling in an application domain.

use tywrap_codec::HostValue;
use tywrap_protocol::BridgeError;
use tywrap_runtime::{Instance, Registry};

/// Builds the registry the bridge binary serves by default: an `echo`
/// function under module `M`, and a `Counter` class demonstrating the
/// instantiate / call_method / dispose_instance lifecycle.
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register_function(
        "M",
        "echo",
        Box::new(|args, _kwargs| Ok(args.first().cloned().unwrap_or(HostValue::Null))),
    );

    registry.register_class(
        "M",
        "Counter",
        Box::new(|args, _kwargs| {
            let start = match args.first() {
                Some(HostValue::Int(n)) => *n,
                Some(HostValue::Null) | None => 0,
                Some(other) => {
                    return Err(BridgeError::Handler {
                        kind: "TypeError".to_string(),
                        message: format!("Counter() expects an int start value, got {other:?}"),
                        traceback: None,
                    })
                }
            };
            Ok(Box::new(Counter(start)) as Box<dyn Instance>)
        }),
    );

    registry
}

struct Counter(i64);

impl Instance for Counter {
    fn call_method(
        &mut self,
        method_name: &str,
        args: &[HostValue],
        _kwargs: &[(String, HostValue)],
    ) -> Result<HostValue, BridgeError> {
        match method_name {
            "increment" => {
                let step = match args.first() {
                    Some(HostValue::Int(n)) => *n,
                    _ => 1,
                };
                self.0 += step;
                Ok(HostValue::Int(self.0))
            }
            "value" => Ok(HostValue::Int(self.0)),
            other => Err(BridgeError::Handler {
                kind: "AttributeError".to_string(),
                message: format!("Counter has no method '{other}'"),
                traceback: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_returns_its_argument() {
        let registry = default_registry();
        let result = registry
            .call("M", "echo", &[HostValue::Int(7)], &[])
            .unwrap();
        assert_eq!(result, HostValue::Int(7));
    }

    #[test]
    fn counter_lifecycle() {
        let registry = default_registry();
        let mut instance = registry
            .instantiate("M", "Counter", &[HostValue::Int(10)], &[])
            .unwrap();
        let result = instance
            .call_method("increment", &[HostValue::Int(5)], &[])
            .unwrap();
        assert_eq!(result, HostValue::Int(15));
        assert_eq!(instance.call_method("value", &[], &[]).unwrap(), HostValue::Int(15));
    }

    #[test]
    fn counter_rejects_unknown_method() {
        let registry = default_registry();
        let mut instance = registry.instantiate("M", "Counter", &[], &[]).unwrap();
        let err = instance.call_method("reset", &[], &[]).unwrap_err();
        assert_eq!(err.error_type(), "AttributeError");
    }
}
