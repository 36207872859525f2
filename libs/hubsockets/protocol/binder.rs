//! Argument binding
//!
//! Incoming invocation arguments are checked one by one against the types
//! declared when the handler was registered. Handlers declare those types
//! either explicitly (`Vec<ArgType>`) or through a [`HubArgs`] tuple.

use crate::error::{HubError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Runtime description of one expected argument
#[derive(Clone, Copy)]
pub struct ArgType {
    type_name: &'static str,
    check: fn(&Value) -> std::result::Result<(), serde_json::Error>,
}

fn check_as<T: DeserializeOwned>(value: &Value) -> std::result::Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

impl ArgType {
    pub fn of<T: DeserializeOwned + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            check: check_as::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Verify that `value` decodes as this type
    pub fn check(&self, value: &Value) -> std::result::Result<(), serde_json::Error> {
        (self.check)(value)
    }
}

impl fmt::Debug for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgType").field(&self.type_name).finish()
    }
}

/// Supplies the expected argument types for a hub method
pub trait InvocationBinder {
    /// `None` when no handler is registered for `target`
    fn parameter_types(&self, target: &str) -> Option<Vec<ArgType>>;
}

/// Binder that knows no methods, used when arguments should stay unbound
pub struct NoBinder;

impl InvocationBinder for NoBinder {
    fn parameter_types(&self, _target: &str) -> Option<Vec<ArgType>> {
        None
    }
}

/// Bind `arguments` of an invocation of `target` against `types`
///
/// Returns the human readable cause on mismatch.
pub fn bind_arguments(
    target: &str,
    arguments: &[Value],
    types: &[ArgType],
) -> std::result::Result<(), String> {
    if arguments.len() != types.len() {
        return Err(format!(
            "Invocation provides {} argument(s) but target expects {}.",
            arguments.len(),
            types.len()
        ));
    }

    for (index, (argument, arg_type)) in arguments.iter().zip(types).enumerate() {
        if let Err(e) = arg_type.check(argument) {
            return Err(format!(
                "Argument {} of '{}' is not a valid {}: {}",
                index,
                target,
                arg_type.type_name(),
                e
            ));
        }
    }

    Ok(())
}

/// Typed handler arguments, implemented for tuples of up to eight elements
pub trait HubArgs: Sized + Send + 'static {
    fn arg_types() -> Vec<ArgType>;

    fn from_arguments(arguments: &[Value]) -> Result<Self>;
}

macro_rules! impl_hub_args {
    ($count:expr; $($name:ident : $index:tt),*) => {
        impl<$($name),*> HubArgs for ($($name,)*)
        where
            $($name: DeserializeOwned + Send + 'static,)*
        {
            fn arg_types() -> Vec<ArgType> {
                vec![$(ArgType::of::<$name>()),*]
            }

            #[allow(unused_variables)]
            fn from_arguments(arguments: &[Value]) -> Result<Self> {
                if arguments.len() != $count {
                    return Err(HubError::InvocationBinding(format!(
                        "Invocation provides {} argument(s) but target expects {}.",
                        arguments.len(),
                        $count
                    )));
                }
                Ok(($(
                    <$name as Deserialize>::deserialize(&arguments[$index])
                        .map_err(|e| HubError::InvocationBinding(e.to_string()))?,
                )*))
            }
        }
    };
}

impl_hub_args!(0;);
impl_hub_args!(1; A: 0);
impl_hub_args!(2; A: 0, B: 1);
impl_hub_args!(3; A: 0, B: 1, C: 2);
impl_hub_args!(4; A: 0, B: 1, C: 2, D: 3);
impl_hub_args!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_hub_args!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_hub_args!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_hub_args!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// Serialize outgoing arguments into the wire argument list
///
/// Tuples and sequences become one argument per element, `()` becomes no
/// arguments and any other value becomes a single argument.
pub fn to_arguments<A: Serialize>(args: A) -> Result<Vec<Value>> {
    match serde_json::to_value(args)? {
        Value::Array(values) => Ok(values),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![other]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bind_rejects_wrong_arity() {
        let types = vec![ArgType::of::<String>()];
        let cause = bind_arguments("inc", &[], &types).unwrap_err();
        assert_eq!(cause, "Invocation provides 0 argument(s) but target expects 1.");
    }

    #[test]
    fn test_bind_rejects_wrong_type() {
        let types = vec![ArgType::of::<i32>()];
        let cause = bind_arguments("add", &[json!("nope")], &types).unwrap_err();
        assert!(cause.starts_with("Argument 0 of 'add' is not a valid i32"));
    }

    #[test]
    fn test_tuple_args_decode_in_order() {
        let args = vec![json!("A"), json!(2), json!(true)];
        let (a, b, c) = <(String, i64, bool)>::from_arguments(&args).unwrap();
        assert_eq!(a, "A");
        assert_eq!(b, 2);
        assert!(c);
        assert_eq!(<(String, i64, bool)>::arg_types().len(), 3);
    }

    #[test]
    fn test_unit_args_accept_nothing() {
        assert!(<()>::from_arguments(&[]).is_ok());
        assert!(<()>::from_arguments(&[json!(1)]).is_err());
    }

    #[test]
    fn test_to_arguments_shapes() {
        assert_eq!(to_arguments(()).unwrap(), Vec::<Value>::new());
        assert_eq!(to_arguments(("hi",)).unwrap(), vec![json!("hi")]);
        assert_eq!(to_arguments(("a", 1)).unwrap(), vec![json!("a"), json!(1)]);
        assert_eq!(to_arguments(42).unwrap(), vec![json!(42)]);
    }
}
