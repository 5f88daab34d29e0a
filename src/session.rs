//! Per-connection FTP control-channel state machine (component F). One
//! `Session` owns one accepted control connection outright; it is never
//! shared with any other task.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::command::{self, Command, TransferTypeArg};
use crate::config::Config;
use crate::data_channel::DataChannel;
use crate::error::SessionError;
use crate::jail;
use crate::linebuf::{LineBuffer, DEFAULT_CAPACITY};
use crate::listing;
use crate::reply::Reply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

/// One command, one state transition, one reply. Pulled out as a trait
/// (rather than an inherent method) so the dispatch step stays swappable
/// the same way the upstream command-handler surface did.
#[async_trait]
pub trait CommandHandler {
    async fn dispatch(&mut self, command: Command) -> Result<Continue, SessionError>;
}

pub struct Session {
    config: Arc<Config>,
    peer_addr: SocketAddr,
    read_half: tokio::net::tcp::OwnedReadHalf,
    write_half: BufWriter<tokio::net::tcp::OwnedWriteHalf>,
    line_buffer: LineBuffer,
    /// Virtual directory, always starts and ends with `/`.
    cwd: String,
    transfer_type: TransferType,
    data_channel: DataChannel,
}

impl Session {
    pub fn new(config: Arc<Config>, stream: TcpStream, peer_addr: SocketAddr) -> Self {
        let (read_half, write_half) = stream.into_split();
        Session {
            config,
            peer_addr,
            read_half,
            write_half: BufWriter::new(write_half),
            line_buffer: LineBuffer::new(DEFAULT_CAPACITY),
            cwd: "/".to_string(),
            transfer_type: TransferType::Ascii,
            data_channel: DataChannel::None,
        }
    }

    /// Drives the session to completion: greeting, then a strictly serial
    /// read-one-command / emit-one-reply loop until QUIT, EOF, or a fatal
    /// control-channel error.
    pub async fn run(mut self) {
        if let Err(err) = self.send(Reply::Greeting220).await {
            warn!(peer = %self.peer_addr, %err, "failed to send greeting");
            return;
        }

        loop {
            let line = match self.line_buffer.read_line(&mut self.read_half).await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!(peer = %self.peer_addr, "client closed control connection");
                    return;
                }
                Err(err) => {
                    warn!(peer = %self.peer_addr, %err, "control channel error, terminating session");
                    return;
                }
            };

            let command = command::parse(&line);
            debug!(peer = %self.peer_addr, ?command, "parsed command");

            match self.dispatch(command).await {
                Ok(Continue::Proceed) => continue,
                Ok(Continue::Stop) => {
                    info!(peer = %self.peer_addr, "session ended by QUIT");
                    return;
                }
                Err(err) => {
                    warn!(peer = %self.peer_addr, %err, "session-fatal error, terminating session");
                    return;
                }
            }
        }
    }

    async fn handle_type(&mut self, kind: TransferTypeArg) -> Result<(), SessionError> {
        self.transfer_type = match kind {
            TransferTypeArg::Ascii => TransferType::Ascii,
            TransferTypeArg::Binary => TransferType::Binary,
        };
        self.send(Reply::Ok200).await
    }

    async fn handle_pwd(&mut self) -> Result<(), SessionError> {
        let cwd = self.cwd.clone();
        self.send(Reply::Pwd257(&cwd)).await
    }

    async fn handle_cwd(&mut self, target: &str) -> Result<(), SessionError> {
        match jail::resolve(&self.config.base_directory, &self.cwd, target) {
            Ok(host_path) => {
                self.cwd = jail::project_into_cwd(&self.config.base_directory, &host_path);
                self.send(Reply::FileActionOk250).await
            }
            Err(err) => {
                debug!(peer = %self.peer_addr, %target, ?err, "CWD rejected by path jail");
                self.send(Reply::FileActionFailed550).await
            }
        }
    }

    async fn handle_port(&mut self, addr: SocketAddr) -> Result<(), SessionError> {
        self.data_channel.set_active(addr);
        self.send(Reply::Ok200).await
    }

    async fn handle_pasv(&mut self) -> Result<(), SessionError> {
        let local_ip = self.write_half.get_ref().local_addr()?.ip();
        match self.data_channel.set_passive(local_ip).await {
            Ok(addr) => {
                info!(peer = %self.peer_addr, %addr, "entered passive mode");
                let octets = match addr.ip() {
                    std::net::IpAddr::V4(v4) => v4.octets(),
                    std::net::IpAddr::V6(_) => [127, 0, 0, 1],
                };
                self.send(Reply::Passive227(
                    octets[0],
                    octets[1],
                    octets[2],
                    octets[3],
                    addr.port(),
                ))
                .await
            }
            Err(err) => Err(SessionError::Io(err)),
        }
    }

    async fn handle_list(&mut self, path: Option<String>) -> Result<(), SessionError> {
        let target = path.as_deref().unwrap_or(".");
        let resolved = match jail::resolve(&self.config.base_directory, &self.cwd, target) {
            Ok(p) => p,
            Err(err) => {
                debug!(peer = %self.peer_addr, ?err, "LIST target rejected");
                return self.send(Reply::FileActionFailed550).await;
            }
        };

        let listing = match listing::list_dir(&resolved) {
            Ok(listing) => listing,
            Err(err) => {
                debug!(peer = %self.peer_addr, %err, "LIST could not read directory");
                return self.send(Reply::FileActionFailed550).await;
            }
        };

        self.send(Reply::Opening150).await?;
        let transfer_ok = self.stream_out(listing.as_bytes()).await;
        if transfer_ok {
            info!(peer = %self.peer_addr, bytes = listing.len(), "LIST transfer complete");
            self.send(Reply::TransferComplete226).await?;
        } else {
            warn!(peer = %self.peer_addr, "LIST transfer aborted by data channel error");
        }
        Ok(())
    }

    async fn handle_retr(&mut self, file_name: &str) -> Result<(), SessionError> {
        let resolved = match jail::resolve(&self.config.base_directory, &self.cwd, file_name) {
            Ok(p) => p,
            Err(err) => {
                debug!(peer = %self.peer_addr, %file_name, ?err, "RETR target rejected");
                return self.send(Reply::FileActionFailed550).await;
            }
        };

        if !resolved.is_file() {
            return self.send(Reply::FileActionFailed550).await;
        }

        let contents = match tokio::fs::read(&resolved).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(peer = %self.peer_addr, %err, "RETR could not open file");
                return self.send(Reply::FileActionFailed550).await;
            }
        };

        self.send(Reply::Opening150).await?;
        let transfer_ok = self.stream_out(&contents).await;
        if transfer_ok {
            info!(peer = %self.peer_addr, %file_name, bytes = contents.len(), "RETR transfer complete");
            self.send(Reply::TransferComplete226).await?;
        } else {
            warn!(peer = %self.peer_addr, %file_name, "RETR transfer aborted by data channel error");
        }
        Ok(())
    }

    /// Opens the prepared data channel, writes `bytes`, and tears the
    /// channel down. Returns `false` (without sending 226) on any
    /// data-channel I/O failure, per the short-write abort policy in §4.F/§7.
    async fn stream_out(&mut self, bytes: &[u8]) -> bool {
        let mut data_stream = match self.data_channel.open().await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(peer = %self.peer_addr, %err, "failed to open data connection");
                return false;
            }
        };

        let write_result = data_stream.write_all(bytes).await;
        let _ = data_stream.shutdown().await;
        write_result.is_ok()
    }

    async fn send(&mut self, reply: Reply<'_>) -> Result<(), SessionError> {
        let line = reply.to_line();
        self.write_half.write_all(line.as_bytes()).await?;
        self.write_half.flush().await?;
        Ok(())
    }
}

pub enum Continue {
    Proceed,
    Stop,
}

#[async_trait]
impl CommandHandler for Session {
    async fn dispatch(&mut self, command: Command) -> Result<Continue, SessionError> {
        match command {
            Command::User => self.send(Reply::NeedPassword331).await?,
            Command::Pass => self.send(Reply::LoggedIn230).await?,
            Command::Noop => self.send(Reply::Ok200).await?,
            Command::Syst => self.send(Reply::Syst215("UNIX Type: L8")).await?,
            Command::Type(kind) => self.handle_type(kind).await?,
            Command::Pwd => self.handle_pwd().await?,
            Command::Cwd(target) => self.handle_cwd(&target).await?,
            Command::Port(addr) => self.handle_port(addr).await?,
            Command::Pasv => self.handle_pasv().await?,
            Command::List(path) => self.handle_list(path).await?,
            Command::Retr(name) => self.handle_retr(&name).await?,
            Command::Quit => {
                self.send(Reply::Goodbye221).await?;
                return Ok(Continue::Stop);
            }
            Command::Invalid => self.send(Reply::SyntaxError500).await?,
        }
        Ok(Continue::Proceed)
    }
}
