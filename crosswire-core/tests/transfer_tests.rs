//! Data transfer integration tests over loopback.

use crosswire_core::error::NetError;
use crosswire_core::listener::TcpListener;
use crosswire_core::resolve::Endpoint;
use crosswire_core::stream::TcpStream;

use std::thread;

/// A connected (client, server) pair over loopback.
fn stream_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::listen_on("127.0.0.1", "0").expect("listen");
    let addr = listener.local_addr();
    let client = TcpStream::connect(Endpoint::tcp(addr)).expect("connect");
    let (server, _peer) = listener.accept().expect("accept");
    (client, server)
}

/// Reads exactly `len` bytes, reassembling across however many recv calls
/// the transport needs.
fn recv_exact(stream: &TcpStream, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        let chunk = stream.recv(len - out.len()).expect("recv");
        assert!(!chunk.is_empty(), "peer shut down mid-payload");
        out.extend_from_slice(&chunk);
    }
    out
}

#[test]
fn test_empty_send_returns_zero() {
    let (client, _server) = stream_pair();
    assert_eq!(client.send(&[]).expect("empty send"), 0);
}

#[test]
fn test_empty_send_skips_transport() {
    // The transport is never consulted for an empty payload: even after
    // the peer is gone the call still reports zero rather than an error.
    let (client, server) = stream_pair();
    server.close();
    thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(client.send(&[]).expect("empty send"), 0);
}

#[test]
fn test_recv_zero_capacity_is_invalid() {
    let (client, _server) = stream_pair();
    assert!(matches!(
        client.recv(0),
        Err(NetError::InvalidArgument(_))
    ));
}

#[test]
fn test_recv_into_empty_buffer_is_invalid() {
    let (client, _server) = stream_pair();
    let mut buf = [];
    assert!(matches!(
        client.recv_into(&mut buf),
        Err(NetError::InvalidArgument(_))
    ));
}

#[test]
fn test_roundtrip_in_order() {
    let (client, server) = stream_pair();

    client.send_all(b"hello, ").expect("send");
    client.send_all(b"cross").expect("send");
    client.send_all(b"wire").expect("send");

    let payload = recv_exact(&server, 16);
    assert_eq!(&payload, b"hello, crosswire");

    // And the other direction on the same pair.
    server.send_all(&payload).expect("echo");
    assert_eq!(recv_exact(&client, 16), payload);
}

#[test]
fn test_orderly_shutdown_reads_empty() {
    let (client, server) = stream_pair();
    client.close();

    let chunk = server.recv(64).expect("recv after peer close");
    assert!(chunk.is_empty(), "orderly shutdown must read as empty, got {chunk:?}");
}

#[test]
fn test_recv_nonblocking_would_block() {
    let (client, _server) = stream_pair();
    client.set_nonblocking().expect("nonblocking");
    match client.recv(64) {
        Err(NetError::WouldBlock) => {}
        other => panic!("expected WouldBlock, got {other:?}"),
    }
    client.set_blocking().expect("blocking again");
}

#[test]
fn test_send_all_delivers_large_payload() {
    // Larger than any default socket buffer, so send_all must loop over
    // partial writes while the reader drains concurrently.
    let payload: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let (client, server) = stream_pair();
    let reader = thread::spawn(move || recv_exact(&server, expected.len()));

    let sent = client.send_all(&payload).expect("send_all");
    assert_eq!(sent, payload.len());
    client.close();

    assert_eq!(reader.join().expect("reader thread"), payload);
}

#[test]
fn test_send_all_nonblocking_surfaces_would_block() {
    let (client, _server) = stream_pair();
    client.set_nonblocking().expect("nonblocking");

    // Keep pushing until the socket buffer fills; the retry loop must hand
    // WouldBlock back instead of spinning.
    let chunk = vec![0u8; 256 * 1024];
    loop {
        match client.send_all(&chunk) {
            Ok(_) => continue,
            Err(NetError::WouldBlock) => break,
            Err(other) => panic!("expected WouldBlock, got {other:?}"),
        }
    }
}
