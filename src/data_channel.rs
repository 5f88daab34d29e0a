//! Models the PORT/PASV duality as a single tagged variant so that LIST and
//! RETR never branch on transfer mode themselves — they just call `open`.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tracing::debug;

use crate::error::SessionError;

pub enum DataChannel {
    None,
    Active(SocketAddr),
    Passive(TcpListener),
}

impl Default for DataChannel {
    fn default() -> Self {
        DataChannel::None
    }
}

impl DataChannel {
    /// `PORT h1,h2,h3,h4,p1,p2`: record the client's listening endpoint.
    pub fn set_active(&mut self, endpoint: SocketAddr) {
        *self = DataChannel::Active(endpoint);
    }

    /// `PASV`: bind a fresh listener on `local_ip`, replacing any previous
    /// passive listener (which is dropped, releasing its port).
    pub async fn set_passive(&mut self, local_ip: std::net::IpAddr) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind((local_ip, 0)).await?;
        let addr = listener.local_addr()?;
        *self = DataChannel::Passive(listener);
        Ok(addr)
    }

    /// Opens the one data connection this mode describes. Active mode
    /// connects outward; passive mode accepts the single pending connection
    /// and releases the listener immediately afterward (invariant 3).
    pub async fn open(&mut self) -> Result<TcpStream, SessionError> {
        match std::mem::replace(self, DataChannel::None) {
            DataChannel::Active(addr) => {
                debug!(%addr, "connecting active data channel");
                let stream = TcpStream::connect(addr).await?;
                *self = DataChannel::Active(addr);
                Ok(stream)
            }
            DataChannel::Passive(listener) => {
                debug!(addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(), "accepting passive data channel");
                let (stream, _) = listener.accept().await?;
                Ok(stream)
            }
            DataChannel::None => Err(SessionError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "no data connection was prepared (PORT or PASV required)",
            ))),
        }
    }

    pub fn is_prepared(&self) -> bool {
        !matches!(self, DataChannel::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn none_rejects_open() {
        let mut ch = DataChannel::None;
        assert!(ch.open().await.is_err());
    }

    #[tokio::test]
    async fn passive_then_active_replaces_mode() {
        let mut ch = DataChannel::None;
        let addr = ch
            .set_passive("127.0.0.1".parse().unwrap())
            .await
            .unwrap();
        assert!(ch.is_prepared());
        assert_ne!(addr.port(), 0);

        ch.set_active("127.0.0.1:9999".parse().unwrap());
        assert!(matches!(ch, DataChannel::Active(_)));
    }

    #[tokio::test]
    async fn two_consecutive_pasv_yield_different_ports() {
        let mut ch = DataChannel::None;
        let a1 = ch
            .set_passive("127.0.0.1".parse().unwrap())
            .await
            .unwrap();
        let a2 = ch
            .set_passive("127.0.0.1".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(a1.port(), a2.port());
    }
}
