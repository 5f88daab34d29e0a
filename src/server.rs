//! Component G: binds the control listener and spawns one independent
//! session per accepted connection. Sessions share nothing but the
//! read-only `Arc<Config>` (spec §5: "No global mutex is required").

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::StartupError;
use crate::session::Session;

pub struct Server {
    config: Arc<Config>,
    listener: TcpListener,
}

impl Server {
    pub async fn bind(config: Config) -> Result<Self, StartupError> {
        let listener =
            TcpListener::bind(config.bind_addr)
                .await
                .map_err(|source| StartupError::Bind {
                    addr: config.bind_addr,
                    source,
                })?;

        Ok(Server {
            config: Arc::new(config),
            listener,
        })
    }

    /// Runs the accept loop forever. Each accepted connection is handed to
    /// its own `tokio::task`; the loop itself never blocks on a session.
    pub async fn serve(&self) -> ! {
        info!(
            addr = %self.config.bind_addr,
            base = %self.config.base_directory.display(),
            "listening"
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!(%peer_addr, "accepted connection");
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        Session::new(config, stream, peer_addr).run().await;
                    });
                }
                Err(err) => {
                    warn!(%err, "accept failed, continuing");
                }
            }
        }
    }
}

pub fn report_startup_error(err: &StartupError) {
    error!(%err, "fatal startup error");
}
