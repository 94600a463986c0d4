use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::cipher::Cipher;
use crate::secure::{SecureSocket, BUFFER_SIZE};
use crate::{Error, Result};

/// Plain read from `src`, encrypt, write to `dst`.
///
/// Only ever returns an error; `Error::PeerClosed` once `src` is drained.
pub async fn encrypt_copy<R, W>(dst: &mut SecureSocket<'_, W>, src: &mut R) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0; BUFFER_SIZE];
    loop {
        match src.read(&mut buf).await? {
            0 => return Err(Error::PeerClosed),
            len => dst.encrypt_send(&buf[..len]).await?,
        }
    }
}

/// Decrypting read from `src`, plain write to `dst`.
pub async fn decrypt_copy<R, W>(dst: &mut W, src: &mut SecureSocket<'_, R>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let msg = src.decrypt_recv().await?;
        if msg.is_empty() {
            return Err(Error::PeerClosed);
        }
        dst.write_all(&msg).await?;
    }
}

/// Relay between a cleartext stream and a ciphered one until either side
/// ends.
///
/// Both directions run joined on the caller's task. The first one to fail
/// ends the join and the other is dropped on the spot, so by the time this
/// returns neither direction holds the streams any more. The returned error
/// is whatever stopped the relay, `Error::PeerClosed` in the normal case.
pub async fn bridge<P, S>(plain: &mut P, secure: &mut S, cipher: &Cipher) -> Result<()>
where
    P: AsyncRead + AsyncWrite + Unpin,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut plain_read, mut plain_write) = io::split(plain);
    let (secure_read, secure_write) = io::split(secure);
    let mut secure_read = SecureSocket::new(secure_read, cipher);
    let mut secure_write = SecureSocket::new(secure_write, cipher);

    let outbound = encrypt_copy(&mut secure_write, &mut plain_read);
    let inbound = decrypt_copy(&mut plain_write, &mut secure_read);

    tokio::try_join!(outbound, inbound)?;

    Ok(())
}
