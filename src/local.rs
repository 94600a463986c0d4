use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::cipher::Cipher;
use crate::tunnel;
use crate::{Result, ACCEPT_BACKOFF};

/// Client side agent: plain SOCKS5 in, ciphered stream out to the server.
#[derive(Clone)]
pub struct Local {
    cipher: Arc<Cipher>,
    server_addr: String,
}

impl Local {
    pub fn new(cipher: Arc<Cipher>, server_addr: impl Into<String>) -> Self {
        Self {
            cipher,
            server_addr: server_addr.into(),
        }
    }

    /// Accept forever, one task per client.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!("listening on {}", listener.local_addr()?);

        loop {
            let (client, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            info!(%peer, "accepted client");

            let local = self.clone();
            tokio::spawn(async move {
                local.handle_client(client).await;
            });
        }
    }

    async fn handle_client(&self, mut client: TcpStream) {
        let peer = client.peer_addr().ok();

        let mut server = match TcpStream::connect(&self.server_addr).await {
            Ok(server) => server,
            Err(e) => {
                warn!(server = %self.server_addr, error = %e, "cannot connect to server");
                info!(?peer, "closing client socket");
                return;
            }
        };

        match tunnel::bridge(&mut client, &mut server, &self.cipher).await {
            Err(e) if e.is_peer_closed() => info!(?peer, "relay finished"),
            Err(e) => warn!(?peer, error = %e, "relay failed"),
            Ok(()) => {}
        }

        info!(server = %self.server_addr, "closing server socket");
        drop(server);
        info!(?peer, "closing client socket");
    }
}
