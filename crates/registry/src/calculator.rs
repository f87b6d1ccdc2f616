//! The calculator demo: four arithmetic tools and a greeting resource.

use crate::error::{InvocationError, RegistryError, Result};
use crate::operation::{Arguments, Param, ReturnType, Value};
use crate::registry::Registry;

/// Server name announced during initialization.
pub const SERVER_NAME: &str = "Calculator Demo";

/// Template of the greeting resource.
pub const GREETING_TEMPLATE: &str = "greeting://{name}";

const OPERANDS: [Param; 2] = [Param::integer("a"), Param::integer("b")];

/// Build the calculator registry.
pub fn calculator() -> std::result::Result<Registry, RegistryError> {
    Ok(Registry::builder(SERVER_NAME, env!("CARGO_PKG_VERSION"))
        .tool("add", "Add two numbers", &OPERANDS, ReturnType::Integer, add)?
        .tool("subtract", "Subtract two numbers", &OPERANDS, ReturnType::Integer, subtract)?
        .tool("multiply", "Multiply two numbers", &OPERANDS, ReturnType::Integer, multiply)?
        .tool("divide", "Divide two numbers", &OPERANDS, ReturnType::Float, divide)?
        .resource(
            GREETING_TEMPLATE,
            "get_greeting",
            "Greet a person by name",
            &[Param::string("name")],
            "text/plain",
            get_greeting,
        )?
        .build())
}

fn operands(args: &Arguments) -> Result<(i64, i64)> {
    Ok((args.integer("a")?, args.integer("b")?))
}

fn overflow(args: &Arguments) -> InvocationError {
    InvocationError::Overflow {
        operation: args.operation().to_string(),
    }
}

fn add(args: &Arguments) -> Result<Value> {
    let (a, b) = operands(args)?;
    a.checked_add(b).map(Value::Integer).ok_or_else(|| overflow(args))
}

fn subtract(args: &Arguments) -> Result<Value> {
    let (a, b) = operands(args)?;
    a.checked_sub(b).map(Value::Integer).ok_or_else(|| overflow(args))
}

fn multiply(args: &Arguments) -> Result<Value> {
    let (a, b) = operands(args)?;
    a.checked_mul(b).map(Value::Integer).ok_or_else(|| overflow(args))
}

/// Division by zero yields positive infinity regardless of the dividend's
/// sign. This is a result, not an error.
fn divide(args: &Arguments) -> Result<Value> {
    let (a, b) = operands(args)?;
    if b == 0 {
        return Ok(Value::Float(f64::INFINITY));
    }
    Ok(Value::Float(a as f64 / b as f64))
}

fn get_greeting(args: &Arguments) -> Result<Value> {
    Ok(Value::Text(format!("Hello, {}!", args.text("name")?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, a: i64, b: i64) -> Result<Value> {
        calculator().unwrap().call(name, Some(&json!({"a": a, "b": b})))
    }

    #[test]
    fn integer_arithmetic() {
        for (a, b) in [(1, 7), (-5, 3), (0, 0), (123_456, -789)] {
            assert_eq!(call("add", a, b), Ok(Value::Integer(a + b)));
            assert_eq!(call("subtract", a, b), Ok(Value::Integer(a - b)));
            assert_eq!(call("multiply", a, b), Ok(Value::Integer(a * b)));
        }
    }

    #[test]
    fn division_is_float() {
        assert_eq!(call("divide", 7, 2), Ok(Value::Float(3.5)));
        assert_eq!(call("divide", -9, 3), Ok(Value::Float(-3.0)));
        assert_eq!(call("divide", 1, 3), Ok(Value::Float(1.0 / 3.0)));
    }

    #[test]
    fn division_by_zero_is_positive_infinity() {
        for a in [5, 0, -5, i64::MAX, i64::MIN] {
            match call("divide", a, 0) {
                Ok(Value::Float(f)) => assert!(f.is_infinite() && f > 0.0, "divide({a}, 0) = {f}"),
                other => panic!("divide({a}, 0) returned {other:?}"),
            }
        }
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(matches!(call("add", i64::MAX, 1), Err(InvocationError::Overflow { .. })));
        assert!(matches!(call("subtract", i64::MIN, 1), Err(InvocationError::Overflow { .. })));
        assert!(matches!(call("multiply", i64::MAX, 2), Err(InvocationError::Overflow { .. })));
    }

    #[test]
    fn unknown_tool_never_returns_a_value() {
        assert_eq!(
            call("modulo", 1, 2),
            Err(InvocationError::UnknownTool("modulo".to_string()))
        );
    }

    #[test]
    fn tools_are_listed_in_registration_order() {
        let registry = calculator().unwrap();
        let names: Vec<String> = registry.tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, ["add", "subtract", "multiply", "divide"]);
        let again: Vec<String> = registry.tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(names, again);
    }

    #[test]
    fn divide_declares_float_result() {
        let registry = calculator().unwrap();
        let divide = registry.tools().into_iter().find(|t| t.name == "divide").unwrap();
        let output = divide.output_schema.unwrap();
        assert_eq!(output["properties"]["result"]["type"], json!(["number", "string"]));
    }

    #[test]
    fn huge_quotients_use_exponent_form() {
        let value = call("divide", i64::MAX, 1).unwrap();
        assert_eq!(value.to_string(), "9.223372036854776e+18");
    }

    #[test]
    fn greeting_resource() {
        let registry = calculator().unwrap();
        let (value, mime) = registry.read("greeting://hello").unwrap();
        assert_eq!(value.to_string(), "Hello, hello!");
        assert_eq!(mime, "text/plain");
    }

    #[test]
    fn greeting_is_only_a_template() {
        let registry = calculator().unwrap();
        assert!(registry.resources().is_empty());
        let templates = registry.resource_templates().unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].raw.uri_template, GREETING_TEMPLATE);
        assert_eq!(templates[0].raw.name, "get_greeting");
    }

    #[test]
    fn unmatched_uri_is_unknown_resource() {
        let registry = calculator().unwrap();
        assert_eq!(
            registry.read("farewell://hello"),
            Err(InvocationError::UnknownResource("farewell://hello".to_string()))
        );
    }
}
