//! Registry error types.

use thiserror::Error;

use crate::operation::ParamType;

/// Failure of a single tool call or resource read.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvocationError {
    /// No tool is registered under this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// No resource template matches this uri.
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Arguments were supplied but are not a JSON object.
    #[error("{operation}: arguments must be an object")]
    ArgumentsNotObject { operation: String },

    /// A declared parameter has no value.
    #[error("{operation}: missing required argument '{name}'")]
    MissingArgument { operation: String, name: String },

    /// A value could not be coerced to the declared type.
    #[error("{operation}: argument '{name}' is not a valid {expected}: {reason}")]
    InvalidArgument {
        operation: String,
        name: String,
        expected: ParamType,
        reason: String,
    },

    /// Integer arithmetic left the representable range.
    #[error("{operation}: integer overflow")]
    Overflow { operation: String },
}

/// Problems detected while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// A tool name or resource template was registered twice.
    #[error("duplicate registration: {0}")]
    Duplicate(String),

    /// A uri template failed to parse or disagrees with its parameters.
    #[error("invalid uri template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

pub type Result<T> = std::result::Result<T, InvocationError>;
