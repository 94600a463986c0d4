use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::cipher::Cipher;
use crate::secure::SecureSocket;
use crate::socks5::{self, Request};
use crate::tunnel;
use crate::{Result, ACCEPT_BACKOFF};

/// Server side agent: ciphered SOCKS5 in, plain TCP out to the destination.
#[derive(Clone)]
pub struct Server {
    cipher: Arc<Cipher>,
}

impl Server {
    pub fn new(cipher: Arc<Cipher>) -> Self {
        Self { cipher }
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

            let server = self.clone();
            tokio::spawn(async move {
                server.handle_client(client).await;
            });
        }
    }

    async fn handle_client(&self, mut client: TcpStream) {
        let peer = client.peer_addr().ok();
        let mut remote = None;

        match self.process(&mut client, &mut remote).await {
            Err(e) if e.is_peer_closed() => info!(?peer, "relay finished"),
            Err(e) => warn!(?peer, error = %e, "session aborted"),
            Ok(()) => {}
        }

        if let Some(remote) = remote {
            info!(remote = ?remote.peer_addr().ok(), "closing remote socket");
            drop(remote);
        }
        info!(?peer, "closing client socket");
    }

    /// Negotiate, connect and relay. The destination stream is parked in
    /// `remote` as soon as it exists so the caller closes it on every path.
    async fn process(
        &self,
        client: &mut TcpStream,
        remote: &mut Option<TcpStream>,
    ) -> Result<()> {
        let cipher = &*self.cipher;
        let mut secure = SecureSocket::new(&mut *client, cipher);

        let hello = secure.decrypt_recv().await?;
        socks5::check_hello(&hello)?;
        secure.encrypt_send(&socks5::NO_AUTH_REPLY).await?;

        let frame = secure.decrypt_recv().await?;
        let request = Request::parse(&frame)?;
        debug!(%request, addr_type = %request.addr_type(), "socks request");

        let stream = remote.insert(request.connect().await?);
        info!(%request, "connected to remote");

        secure.encrypt_send(&socks5::SUCCESS_REPLY).await?;

        tunnel::bridge(stream, client, cipher).await
    }
}
