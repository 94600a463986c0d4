use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::cipher::Cipher;
use crate::Result;

pub const BUFFER_SIZE: usize = 4096;

/// Transport endpoint whose bytes travel through the cipher.
///
/// `S` may be a whole stream or one half of a split stream; reading needs
/// `AsyncRead`, writing needs `AsyncWrite`. Nothing is buffered across calls,
/// so one `encrypt_send` is not guaranteed to arrive as one `decrypt_recv`.
pub struct SecureSocket<'a, S> {
    stream: S,
    cipher: &'a Cipher,
}

impl<'a, S> SecureSocket<'a, S> {
    pub fn new(stream: S, cipher: &'a Cipher) -> Self {
        Self { stream, cipher }
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S> SecureSocket<'_, S>
where
    S: AsyncRead + Unpin,
{
    /// Read at most `BUFFER_SIZE` bytes and decrypt them. Empty means the
    /// peer closed.
    pub async fn decrypt_recv(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0; BUFFER_SIZE];
        let len = self.stream.read(&mut buf).await?;
        buf.truncate(len);
        self.cipher.decrypt(&mut buf);
        Ok(buf)
    }
}

impl<S> SecureSocket<'_, S>
where
    S: AsyncWrite + Unpin,
{
    pub async fn encrypt_send(&mut self, msg: &[u8]) -> Result<()> {
        let mut buf = msg.to_vec();
        self.cipher.encrypt(&mut buf);
        self.stream.write_all(&buf).await?;
        Ok(())
    }
}
