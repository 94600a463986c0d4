use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can end a relay session or refuse a configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Zero-byte read: the expected end of a session.
    #[error("peer closed")]
    PeerClosed,

    #[error("invalid password: {0}")]
    InvalidPassword(String),

    #[error("empty socks frame")]
    EmptyFrame,

    #[error("unexpected socks version {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("invalid socks request: {0} bytes")]
    InvalidRequest(usize),

    #[error("unsupported socks command {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("unsupported address type {0:#04x}")]
    UnsupportedAddressType(u8),

    #[error("domain is not utf8")]
    InvalidDomain,

    #[error("cannot connect to {0}")]
    Unreachable(String),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, Error::PeerClosed)
    }
}
