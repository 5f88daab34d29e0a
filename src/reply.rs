//! RFC 959 status-line framing. A `Reply` is always a single `CRLF`-terminated
//! line; this server never emits multiline replies.

use std::fmt;

/// A numeric FTP reply, optionally carrying a single formatted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    Opening150,
    Ok200,
    Syst215(&'a str),
    Greeting220,
    Goodbye221,
    TransferComplete226,
    Passive227(u8, u8, u8, u8, u16),
    LoggedIn230,
    FileActionOk250,
    Pwd257(&'a str),
    NeedPassword331,
    SyntaxError500,
    FileActionFailed550,
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Reply::Opening150 => write!(f, "150 Opening data connection"),
            Reply::Ok200 => write!(f, "200 Command OK"),
            Reply::Syst215(msg) => write!(f, "215 {msg}"),
            Reply::Greeting220 => write!(f, "220 Service ready"),
            Reply::Goodbye221 => write!(f, "221 Goodbye"),
            Reply::TransferComplete226 => write!(f, "226 Transfer complete"),
            Reply::Passive227(h1, h2, h3, h4, port) => write!(
                f,
                "227 Entering Passive Mode ({h1},{h2},{h3},{h4},{},{})",
                port / 256,
                port % 256
            ),
            Reply::LoggedIn230 => write!(f, "230 Logged in"),
            Reply::FileActionOk250 => write!(f, "250 File action OK"),
            Reply::Pwd257(cwd) => write!(f, "257 \"{cwd}\""),
            Reply::NeedPassword331 => write!(f, "331 Password expected"),
            Reply::SyntaxError500 => write!(f, "500 Syntax error"),
            Reply::FileActionFailed550 => write!(f, "550 Requested action not taken"),
        }
    }
}

impl Reply<'_> {
    /// Renders the reply as the exact bytes to put on the wire, `CRLF` included.
    pub fn to_line(&self) -> String {
        format!("{self}\r\n")
    }
}
