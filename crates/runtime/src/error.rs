use thiserror::Error;

/// Failures of a driver run, by the stage that failed.
///
/// The underlying protocol error is kept as the `source`, so callers can
/// print the whole chain.
#[derive(Debug, Error)]
pub enum Error {
    /// The server process could not be started.
    #[error("failed to connect to server '{server}'")]
    Connect {
        server: String,
        #[source]
        source: mcp::Error,
    },

    /// The initialize exchange failed.
    #[error("handshake with server '{server}' failed")]
    Handshake {
        server: String,
        #[source]
        source: mcp::Error,
    },

    /// A discovery, read or call step failed.
    #[error("{operation} failed")]
    Invocation {
        operation: String,
        #[source]
        source: mcp::Error,
    },

    /// The server returned something the driver cannot use.
    #[error("unexpected reply to {operation}: {detail}")]
    UnexpectedReply { operation: String, detail: String },

    /// Releasing the channel failed.
    #[error("failed to close the session")]
    Close(#[source] mcp::Error),

    /// Console output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
