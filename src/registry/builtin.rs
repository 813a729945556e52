//! Node kinds shipped with the engine.
//!
//! | kind       | inputs                              | outputs          |
//! |------------|-------------------------------------|------------------|
//! | `number`   | -                                   | `value: number`  |
//! | `text`     | -                                   | `value: string`  |
//! | `add`      | `a: number`, `b: number` (optional) | `result: number` |
//! | `subtract` | `a: number`, `b: number` (optional) | `result: number` |
//! | `multiply` | `a: number`, `b: number` (optional) | `result: number` |
//! | `divide`   | `a: number`, `b: number` (optional) | `result: number` |
//! | `concat`   | `a: string`, `b: string` (optional) | `text: string`   |
//! | `toText`   | `value: any`                        | `text: string`   |
//! | `output`   | `value: any`                        | `value: any`     |
//!
//! Optional inputs fall back to the entry of the same name in the node's `data`.

use super::{DataType, HandleDefinition, Invocation, NodeMetadata, PortValues, RegistryBuilder};
use crate::error::ComputeError;
use serde_json::Value;

fn single_output(handle: &str, value: Value) -> Result<PortValues, ComputeError> {
    Ok(PortValues::from([(handle.to_string(), value)]))
}

fn number_value(n: f64) -> Result<Value, ComputeError> {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| ComputeError::Failed(format!("result {} is not a finite number", n)))
}

fn binary_number_metadata(kind: &str) -> NodeMetadata {
    NodeMetadata::new(kind)
        .with_input(HandleDefinition::required("a", DataType::number()))
        .with_input(HandleDefinition::optional("b", DataType::number()))
        .with_output(HandleDefinition::output("result", DataType::number()))
}

/// Defines the arithmetic kinds, their computations and their registration in one go.
macro_rules! define_arithmetic_kinds {
    ( $( ($fn_name:ident, $kind:expr, |$a:ident, $b:ident| $body:expr) ),* $(,)? ) => {
        $(
            fn $fn_name(invocation: &Invocation) -> Result<PortValues, ComputeError> {
                let $a = invocation.number("a")?;
                let $b = invocation.number("b")?;
                let result: Result<f64, ComputeError> = $body;
                single_output("result", number_value(result?)?)
            }
        )*

        fn register_arithmetic(builder: RegistryBuilder) -> RegistryBuilder {
            builder
                $( .register(binary_number_metadata($kind), $fn_name) )*
        }
    };
}

define_arithmetic_kinds! {
    (compute_add, "add", |a, b| Ok(a + b)),
    (compute_subtract, "subtract", |a, b| Ok(a - b)),
    (compute_multiply, "multiply", |a, b| Ok(a * b)),
    (compute_divide, "divide", |a, b| {
        if b == 0.0 {
            Err(ComputeError::Failed("division by zero".to_string()))
        } else {
            Ok(a / b)
        }
    }),
}

fn compute_number(invocation: &Invocation) -> Result<PortValues, ComputeError> {
    let value = invocation
        .data_field("value")
        .filter(|v| v.is_number())
        .ok_or_else(|| ComputeError::InvalidData("'value' must be a number".to_string()))?;
    single_output("value", value.clone())
}

fn compute_text(invocation: &Invocation) -> Result<PortValues, ComputeError> {
    let value = invocation
        .data_field("value")
        .filter(|v| v.is_string())
        .ok_or_else(|| ComputeError::InvalidData("'value' must be a string".to_string()))?;
    single_output("value", value.clone())
}

fn compute_concat(invocation: &Invocation) -> Result<PortValues, ComputeError> {
    let a = invocation.text("a")?;
    let separator = invocation
        .data_field("separator")
        .and_then(Value::as_str)
        .unwrap_or("");
    let text = match invocation.inputs.get("b") {
        Some(_) => format!("{}{}{}", a, separator, invocation.text("b")?),
        None => a.to_string(),
    };
    single_output("text", Value::String(text))
}

fn compute_to_text(invocation: &Invocation) -> Result<PortValues, ComputeError> {
    let text = match invocation.input("value")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    single_output("text", Value::String(text))
}

fn compute_output(invocation: &Invocation) -> Result<PortValues, ComputeError> {
    single_output("value", invocation.input("value")?.clone())
}

pub(super) fn register_builtin_kinds(builder: RegistryBuilder) -> RegistryBuilder {
    register_arithmetic(builder)
        .register(
            NodeMetadata::new("number")
                .with_output(HandleDefinition::output("value", DataType::number())),
            compute_number,
        )
        .register(
            NodeMetadata::new("text")
                .with_output(HandleDefinition::output("value", DataType::string())),
            compute_text,
        )
        .register(
            NodeMetadata::new("concat")
                .with_input(HandleDefinition::required("a", DataType::string()))
                .with_input(HandleDefinition::optional("b", DataType::string()))
                .with_output(HandleDefinition::output("text", DataType::string())),
            compute_concat,
        )
        .register(
            NodeMetadata::new("toText")
                .with_input(HandleDefinition::required("value", DataType::any()))
                .with_output(HandleDefinition::output("text", DataType::string())),
            compute_to_text,
        )
        .register(
            NodeMetadata::new("output")
                .with_input(HandleDefinition::required("value", DataType::any()))
                .with_output(HandleDefinition::output("value", DataType::any())),
            compute_output,
        )
}
