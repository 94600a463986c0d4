//! JSON configuration shared by both agents.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::cipher::Cipher;
use crate::{Error, Result};

fn default_server_listen_ip() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base64 of a 256 byte permutation, see `cipher::random_password`.
    pub password: String,
    #[serde(alias = "listen_ip")]
    pub local_ip: String,
    #[serde(alias = "listen_port")]
    pub local_port: u16,
    pub server_ip: String,
    pub server_port: u16,
    /// Interface the server agent binds.
    #[serde(default = "default_server_listen_ip")]
    pub server_listen_ip: String,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn cipher(&self) -> Result<Arc<Cipher>> {
        Ok(Arc::new(Cipher::new(&self.password)?))
    }

    pub fn local_addr(&self) -> String {
        join(&self.local_ip, self.local_port)
    }

    pub fn server_addr(&self) -> String {
        join(&self.server_ip, self.server_port)
    }

    pub fn server_listen_addr(&self) -> String {
        join(&self.server_listen_ip, self.server_port)
    }
}

fn join(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
