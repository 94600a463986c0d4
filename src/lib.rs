pub mod cipher;
pub mod config;
pub mod error;
pub mod local;
pub mod secure;
pub mod server;
pub mod socks5;
pub mod tunnel;

pub use error::{Error, Result};

/// Pause after a failed accept, e.g. when out of file descriptors.
pub const ACCEPT_BACKOFF: std::time::Duration = std::time::Duration::from_millis(100);
