//! Operation definitions: typed parameters, argument binding and results.

use std::fmt;

use serde_json::{Map, Value as Json, json};

use crate::error::{InvocationError, Result};
use crate::template::UriTemplate;

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    String,
}

impl ParamType {
    fn json_type(self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::String => "string",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_type())
    }
}

/// Declared type of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Integer,
    Float,
    String,
}

impl ReturnType {
    fn json_schema(self) -> Json {
        match self {
            ReturnType::Integer => json!({ "type": "integer" }),
            // Non-finite results have no JSON number form and travel as strings.
            ReturnType::Float => json!({ "type": ["number", "string"] }),
            ReturnType::String => json!({ "type": "string" }),
        }
    }
}

/// A named, typed parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
}

impl Param {
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::Integer,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::String,
        }
    }
}

/// A bound argument value, already coerced to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Integer(i64),
    Text(String),
}

/// Arguments validated against a parameter list, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    operation: &'static str,
    values: Vec<(&'static str, Arg)>,
}

impl Arguments {
    /// Validate raw JSON arguments against `params`.
    ///
    /// Every parameter must be present and coercible; extra keys are ignored.
    pub fn bind(operation: &'static str, params: &[Param], raw: Option<&Json>) -> Result<Self> {
        let empty = Map::new();
        let object = match raw {
            None | Some(Json::Null) => &empty,
            Some(Json::Object(map)) => map,
            Some(_) => {
                return Err(InvocationError::ArgumentsNotObject {
                    operation: operation.to_string(),
                });
            }
        };

        let mut values = Vec::with_capacity(params.len());
        for param in params {
            let value = object
                .get(param.name)
                .ok_or_else(|| InvocationError::MissingArgument {
                    operation: operation.to_string(),
                    name: param.name.to_string(),
                })?;
            let arg = coerce(value, param.ty).map_err(|reason| InvocationError::InvalidArgument {
                operation: operation.to_string(),
                name: param.name.to_string(),
                expected: param.ty,
                reason,
            })?;
            values.push((param.name, arg));
        }

        Ok(Self { operation, values })
    }

    /// Name of the operation these arguments were bound for.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// An integer argument. Binding guarantees presence and type for
    /// declared parameters; asking for anything else is reported as missing.
    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(Arg::Integer(n)) => Ok(*n),
            _ => Err(self.missing(name)),
        }
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(Arg::Text(s)) => Ok(s),
            _ => Err(self.missing(name)),
        }
    }

    fn get(&self, name: &str) -> Option<&Arg> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    fn missing(&self, name: &str) -> InvocationError {
        InvocationError::MissingArgument {
            operation: self.operation.to_string(),
            name: name.to_string(),
        }
    }
}

fn coerce(value: &Json, ty: ParamType) -> std::result::Result<Arg, String> {
    match ty {
        ParamType::Integer => coerce_integer(value).map(Arg::Integer),
        ParamType::String => match value {
            Json::String(s) => Ok(Arg::Text(s.clone())),
            other => Err(format!("expected a string, got {}", kind(other))),
        },
    }
}

fn coerce_integer(value: &Json) -> std::result::Result<i64, String> {
    match value {
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                Some(f) if f.fract() != 0.0 => Err(format!("{f} has a fractional part")),
                _ => Err(format!("{n} is out of range")),
            }
        }
        Json::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{s}' is not an integer")),
        other => Err(format!("expected an integer, got {}", kind(other))),
    }
}

fn kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Typed outcome of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// JSON form used for structured content.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Integer(n) => json!(n),
            Value::Float(f) if f.is_finite() => json!(f),
            Value::Float(_) => Json::String(self.to_string()),
            Value::Text(s) => json!(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) if x.is_nan() => f.write_str("nan"),
            Value::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "inf" } else { "-inf" })
            }
            Value::Float(x) => f.write_str(&render_float(*x)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip form of a finite float.
///
/// Whole numbers keep a trailing `.0`. Magnitudes below `1e-4` or from
/// `1e16` up use an exponent with an explicit sign and at least two digits
/// (`9.223372036854776e+18`, `1e-05`).
fn render_float(x: f64) -> String {
    // Debug already switches to exponent form at the same magnitudes.
    let repr = format!("{x:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

/// A pure handler over validated arguments.
pub type OperationFn = fn(&Arguments) -> Result<Value>;

/// Name, documentation and types shared by every operation kind.
#[derive(Debug, Clone)]
pub struct Signature {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<Param>,
    pub returns: ReturnType,
}

impl Signature {
    /// JSON Schema for the arguments object.
    pub fn input_schema(&self) -> Map<String, Json> {
        let properties: Map<String, Json> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "title": title_case(p.name), "type": p.ty.json_type() }),
                )
            })
            .collect();
        let required: Vec<&str> = self.params.iter().map(|p| p.name).collect();

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Json::Object(properties));
        schema.insert("required".to_string(), json!(required));
        schema.insert("title".to_string(), json!(format!("{}Arguments", self.name)));
        schema
    }

    /// JSON Schema for structured content: the value wrapped under `result`.
    pub fn output_schema(&self) -> Map<String, Json> {
        let mut result = self.returns.json_schema();
        if let Some(obj) = result.as_object_mut() {
            obj.insert("title".to_string(), json!("Result"));
        }

        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), json!({ "result": result }));
        schema.insert("required".to_string(), json!(["result"]));
        schema.insert("title".to_string(), json!(format!("{}Output", self.name)));
        schema
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A registered operation.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Dispatched by name.
    Tool {
        signature: Signature,
        handler: OperationFn,
    },
    /// Dispatched by matching a uri against `template`.
    Resource {
        signature: Signature,
        template: UriTemplate,
        mime_type: &'static str,
        handler: OperationFn,
    },
}

impl Operation {
    pub fn signature(&self) -> &Signature {
        match self {
            Operation::Tool { signature, .. } | Operation::Resource { signature, .. } => signature,
        }
    }

    pub fn name(&self) -> &'static str {
        self.signature().name
    }

    pub fn is_tool(&self) -> bool {
        matches!(self, Operation::Tool { .. })
    }

    /// Bind `raw` against the signature and run the handler.
    pub fn invoke(&self, raw: Option<&Json>) -> Result<Value> {
        let (signature, handler) = match self {
            Operation::Tool { signature, handler } => (signature, handler),
            Operation::Resource {
                signature, handler, ..
            } => (signature, handler),
        };
        let args = Arguments::bind(signature.name, &signature.params, raw)?;
        handler(&args)
    }
}
