use std::time::Duration;

use subsock::cipher::{random_password, Cipher};
use subsock::secure::SecureSocket;
use subsock::tunnel;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

fn cipher() -> Cipher {
    Cipher::new(&random_password()).unwrap()
}

#[tokio::test]
async fn secure_socket() {
    let cipher = cipher();
    let (a, b) = duplex(8192);
    let mut a = SecureSocket::new(a, &cipher);
    let mut b = SecureSocket::new(b, &cipher);

    a.encrypt_send(b"hello world").await.unwrap();
    assert_eq!(b.decrypt_recv().await.unwrap(), b"hello world");

    // bytes on the wire are substituted
    b.encrypt_send(b"ping").await.unwrap();
    let mut raw = [0; 4];
    a.get_mut().read_exact(&mut raw).await.unwrap();
    let mut expected = *b"ping";
    cipher.encrypt(&mut expected);
    assert_eq!(raw, expected);

    drop(a);
    assert!(b.decrypt_recv().await.unwrap().is_empty());
}

#[tokio::test]
async fn relay_both_directions() {
    let cipher = cipher();
    let (mut app, mut plain) = duplex(8192);
    let (mut peer, mut secure) = duplex(8192);

    let relay_cipher = cipher.clone();
    let relay =
        tokio::spawn(async move { tunnel::bridge(&mut plain, &mut secure, &relay_cipher).await });

    app.write_all(b"hello").await.unwrap();
    let mut buf = [0; 5];
    peer.read_exact(&mut buf).await.unwrap();
    cipher.decrypt(&mut buf);
    assert_eq!(&buf, b"hello");

    let mut msg = *b"world";
    cipher.encrypt(&mut msg);
    peer.write_all(&msg).await.unwrap();
    app.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"world");

    // the ciphered side stays open, closing the plain side must still end
    // the relay
    drop(app);
    let result = timeout(Duration::from_secs(1), relay)
        .await
        .expect("relay left running")
        .unwrap();
    assert!(result.unwrap_err().is_peer_closed());

    let mut rest = Vec::new();
    peer.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn ciphered_side_hang_up() {
    let cipher = cipher();
    let (mut app, mut plain) = duplex(8192);
    let (peer, mut secure) = duplex(8192);

    let relay =
        tokio::spawn(async move { tunnel::bridge(&mut plain, &mut secure, &cipher).await });

    drop(peer);
    let result = timeout(Duration::from_secs(1), relay)
        .await
        .expect("relay left running")
        .unwrap();
    assert!(result.unwrap_err().is_peer_closed());

    let mut rest = Vec::new();
    app.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}
