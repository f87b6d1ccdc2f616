//! Operation registry for the calculator server.
//!
//! A [`Registry`] is an ordered, immutable set of [`Operation`]s. Tools are
//! dispatched by name, resources by matching a uri against a
//! [`UriTemplate`]. Arguments arrive as JSON and are validated against each
//! operation's typed parameters before the pure handler runs.
//!
//! The registry implements [`rmcp::ServerHandler`], so it can be served
//! directly over stdio:
//!
//! ```no_run
//! use rmcp::{ServiceExt, transport::stdio};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = registry::calculator()?.serve(stdio()).await?;
//! service.waiting().await?;
//! # Ok(())
//! # }
//! ```

mod calculator;
mod error;
mod operation;
mod registry;
mod server;
mod template;

pub use calculator::{GREETING_TEMPLATE, SERVER_NAME, calculator};
pub use error::{InvocationError, RegistryError, Result};
pub use operation::{
    Arg, Arguments, Operation, OperationFn, Param, ParamType, ReturnType, Signature, Value,
};
pub use registry::{Registry, RegistryBuilder};
pub use template::UriTemplate;
