//! Operator-facing CLI surface and the immutable configuration derived from
//! it. `Config` is computed once at startup and shared read-only (behind an
//! `Arc`) with every session — no runtime mutation, per spec §9.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::StartupError;

/// Anonymous, read-only FTP server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Listening address
    #[arg(short = 's', long = "host", default_value = "0.0.0.0")]
    pub host: String,

    /// Listening port
    #[arg(short = 'p', long = "port", default_value_t = 21)]
    pub port: u16,

    /// Base directory to serve
    #[arg(short = 'd', long = "dir", default_value = "/")]
    pub dir: String,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical, absolute host path the virtual root `/` maps to.
    pub base_directory: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, StartupError> {
        let bind_addr = format!("{}:{}", args.host, args.port)
            .parse()
            .map_err(|source| StartupError::InvalidAddress {
                host: args.host.clone(),
                port: args.port,
                source,
            })?;

        let base_directory = canonicalize_base(Path::new(&args.dir))?;

        Ok(Config {
            base_directory,
            bind_addr,
        })
    }
}

fn canonicalize_base(dir: &Path) -> Result<PathBuf, StartupError> {
    std::fs::canonicalize(dir).map_err(|source| StartupError::BaseDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

pub fn log_level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
