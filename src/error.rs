use thiserror::Error;

/// Fatal failures that can only happen during process bootstrap, before any
/// client has been accepted. A `StartupError` always ends the process.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("base directory {path:?} does not exist or is not a directory")]
    BaseDirectory {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind {addr}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bind address {host}:{port}")]
    InvalidAddress {
        host: String,
        port: u16,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Recoverable, session-scoped failures. Every variant ends the owning
/// session (the control connection is torn down) but never the process.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("control channel I/O error")]
    Io(#[from] std::io::Error),

    #[error("command line exceeded the {0} byte buffer")]
    BufferOverflow(usize),
}

/// Outcome of resolving a client-supplied path against the base directory.
/// Not a `SessionError`: a jail rejection is routine client behavior and is
/// translated directly into a 550 reply by the dispatcher.
#[derive(Error, Debug)]
pub enum JailError {
    #[error("no such file or directory")]
    NotFound,

    #[error("path escapes the base directory")]
    Escaped,
}
