//! Anonymous, read-only FTP server. See `SPEC_FULL.md` and `DESIGN.md` in
//! the repository root for the full component breakdown and grounding
//! ledger; this crate implements components A-J from that document.

pub mod command;
pub mod config;
pub mod data_channel;
pub mod error;
pub mod jail;
pub mod linebuf;
pub mod listing;
pub mod reply;
pub mod server;
pub mod session;

pub use config::{Args, Config};
pub use error::{JailError, SessionError, StartupError};
pub use server::Server;
