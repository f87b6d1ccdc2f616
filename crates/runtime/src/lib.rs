//! Calculator session driver.
//!
//! This crate drives one illustrative conversation with an MCP server:
//! spawn it, complete the handshake, discover resources, templates and
//! tools, read a resource and call a tool.
//!
//! # Overview
//!
//! - **Session**: a handshake-scoped conversation over one child process.
//!   Created by [`Session::connect`], released by [`Session::close`].
//! - **run_demo**: the fixed sequence, printed step by step and returned as a
//!   [`Transcript`].
//!
//! Failures are reported by stage: [`Error::Connect`], [`Error::Handshake`]
//! or [`Error::Invocation`]. Nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use mcp::ServerConfig;
//!
//! # async fn example() -> runtime::Result<()> {
//! let config = ServerConfig::new("calc", "/usr/local/bin/calc-server");
//! let transcript = runtime::run_demo(config, &mut std::io::stdout()).await?;
//! assert_eq!(transcript.greeting.content, "Hello, hello!");
//! # Ok(())
//! # }
//! ```

mod error;
mod session;

pub use error::{Error, Result};
pub use session::{DEMO_TOOL, GREETING_URI, ResourceText, Session, Transcript, run_demo};
