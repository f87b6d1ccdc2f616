//! The operation registry.

use serde_json::Value as Json;
use tracing::info;

use crate::error::{InvocationError, RegistryError, Result};
use crate::operation::{Operation, OperationFn, Param, ReturnType, Signature, Value};
use crate::template::UriTemplate;

/// An immutable, insertion-ordered set of operations.
///
/// Built once with [`Registry::builder`]; lookups never mutate, so a
/// registry can be shared behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct Registry {
    name: String,
    version: String,
    operations: Vec<Operation>,
}

impl Registry {
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> RegistryBuilder {
        RegistryBuilder {
            registry: Registry {
                name: name.into(),
                version: version.into(),
                operations: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Invoke the tool `name` with raw JSON arguments.
    pub fn call(&self, name: &str, arguments: Option<&Json>) -> Result<Value> {
        let op = self
            .operations
            .iter()
            .find(|op| op.is_tool() && op.name() == name)
            .ok_or_else(|| InvocationError::UnknownTool(name.to_string()))?;
        op.invoke(arguments)
    }

    /// Read the resource at `uri`, returning its value and MIME type.
    ///
    /// Templates are tried in registration order; the first match wins.
    pub fn read(&self, uri: &str) -> Result<(Value, &'static str)> {
        for op in &self.operations {
            let Operation::Resource {
                template,
                mime_type,
                ..
            } = op
            else {
                continue;
            };
            let Some(bindings) = template.matches(uri) else {
                continue;
            };

            let arguments: serde_json::Map<String, Json> = bindings
                .into_iter()
                .map(|(name, value)| (name, Json::String(value)))
                .collect();
            let value = op.invoke(Some(&Json::Object(arguments)))?;
            return Ok((value, *mime_type));
        }

        Err(InvocationError::UnknownResource(uri.to_string()))
    }
}

/// Collects operations and checks uniqueness before freezing them.
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn tool(
        mut self,
        name: &'static str,
        description: &'static str,
        params: &[Param],
        returns: ReturnType,
        handler: OperationFn,
    ) -> std::result::Result<Self, RegistryError> {
        if self
            .registry
            .operations
            .iter()
            .any(|op| op.is_tool() && op.name() == name)
        {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        self.registry.operations.push(Operation::Tool {
            signature: Signature {
                name,
                description,
                params: params.to_vec(),
                returns,
            },
            handler,
        });
        Ok(self)
    }

    pub fn resource(
        mut self,
        template: &str,
        name: &'static str,
        description: &'static str,
        params: &[Param],
        mime_type: &'static str,
        handler: OperationFn,
    ) -> std::result::Result<Self, RegistryError> {
        let template = UriTemplate::parse(template)?;

        let placeholders = template.params();
        let mismatch = placeholders.len() != params.len()
            || params
                .iter()
                .any(|p| !placeholders.iter().any(|name| name == p.name));
        if mismatch {
            return Err(RegistryError::InvalidTemplate {
                template: template.as_str().to_string(),
                reason: "placeholders must match the declared parameters".to_string(),
            });
        }

        let duplicate = self.registry.operations.iter().any(|op| match op {
            Operation::Resource { template: t, .. } => t.as_str() == template.as_str(),
            Operation::Tool { .. } => false,
        });
        if duplicate {
            return Err(RegistryError::Duplicate(template.as_str().to_string()));
        }

        self.registry.operations.push(Operation::Resource {
            signature: Signature {
                name,
                description,
                params: params.to_vec(),
                returns: ReturnType::String,
            },
            template,
            mime_type,
            handler,
        });
        Ok(self)
    }

    pub fn build(self) -> Registry {
        info!(
            name = %self.registry.name,
            operations = self.registry.operations.len(),
            "registry built"
        );
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(args: &crate::operation::Arguments) -> Result<Value> {
        Ok(Value::Text(args.text("id")?.to_string()))
    }

    fn one(_: &crate::operation::Arguments) -> Result<Value> {
        Ok(Value::Integer(1))
    }

    #[test]
    fn duplicate_tool_is_rejected() {
        let err = Registry::builder("t", "0")
            .tool("one", "", &[], ReturnType::Integer, one)
            .unwrap()
            .tool("one", "", &[], ReturnType::Integer, one)
            .err()
            .expect("duplicate");
        assert_eq!(err, RegistryError::Duplicate("one".to_string()));
    }

    #[test]
    fn duplicate_template_is_rejected() {
        let err = Registry::builder("t", "0")
            .resource("item://{id}", "a", "", &[Param::string("id")], "text/plain", echo)
            .unwrap()
            .resource("item://{id}", "b", "", &[Param::string("id")], "text/plain", echo)
            .err()
            .expect("duplicate");
        assert_eq!(err, RegistryError::Duplicate("item://{id}".to_string()));
    }

    #[test]
    fn template_must_cover_parameters() {
        let err = Registry::builder("t", "0")
            .resource("item://{key}", "a", "", &[Param::string("id")], "text/plain", echo)
            .err()
            .expect("mismatch");
        assert!(matches!(err, RegistryError::InvalidTemplate { .. }));
    }

    #[test]
    fn first_matching_template_wins() {
        let registry = Registry::builder("t", "0")
            .resource("item://{id}", "a", "", &[Param::string("id")], "text/plain", echo)
            .unwrap()
            .resource("item://{id}/x", "b", "", &[Param::string("id")], "text/markdown", echo)
            .unwrap()
            .build();
        let (value, mime) = registry.read("item://abc").unwrap();
        assert_eq!(value, Value::Text("abc".to_string()));
        assert_eq!(mime, "text/plain");
        let (_, mime) = registry.read("item://abc/x").unwrap();
        assert_eq!(mime, "text/markdown");
    }

    #[test]
    fn resources_are_not_callable_as_tools() {
        let registry = Registry::builder("t", "0")
            .resource("item://{id}", "item", "", &[Param::string("id")], "text/plain", echo)
            .unwrap()
            .build();
        assert_eq!(
            registry.call("item", Some(&json!({"id": "x"}))),
            Err(InvocationError::UnknownTool("item".to_string()))
        );
        assert!(registry.operations().iter().all(|op| !op.is_tool()));
    }
}
