//! Socket lifecycle integration tests over loopback.

use crosswire_core::error::{ConnectReason, NetError};
use crosswire_core::listener::TcpListener;
use crosswire_core::resolve::Endpoint;
use crosswire_core::stream::TcpStream;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

fn loopback_listener() -> TcpListener {
    TcpListener::listen_on("127.0.0.1", "0").expect("listen on loopback")
}

#[test]
fn test_listen_service_zero_assigns_port() {
    let listener = TcpListener::listen("0").expect("listen");
    assert_ne!(listener.local_addr().port(), 0);
}

#[test]
fn test_listen_on_specific_interface() {
    let listener = loopback_listener();
    assert_eq!(
        listener.local_addr().ip(),
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    );
}

#[test]
fn test_listen_unknown_service_fails_resolution() {
    let err = TcpListener::listen("definitely-not-a-service").unwrap_err();
    assert!(matches!(err, NetError::Resolution { .. }));
}

#[test]
fn test_rebind_same_port_fails_bind() {
    let listener = loopback_listener();
    let port = listener.local_addr().port();
    let err = TcpListener::listen_on("127.0.0.1", &port.to_string()).unwrap_err();
    assert!(matches!(err, NetError::Bind(_)));
}

#[test]
fn test_accept_nonblocking_returns_would_block() {
    let listener = loopback_listener();
    listener.set_nonblocking().expect("nonblocking");
    match listener.accept() {
        Err(NetError::WouldBlock) => {}
        other => panic!("expected WouldBlock, got {other:?}"),
    }
}

#[test]
fn test_connect_to_closed_port_is_refused() {
    let port = portpicker::pick_unused_port().expect("free port");
    let endpoint = Endpoint::tcp(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port));
    match TcpStream::connect_timeout(endpoint, Duration::from_secs(5)) {
        Err(NetError::Connect { reason, .. }) => {
            assert_eq!(reason, ConnectReason::Refused);
        }
        other => panic!("expected refused connect, got {other:?}"),
    }
}

#[test]
fn test_connect_host_walks_candidates() {
    let listener = loopback_listener();
    let port = listener.local_addr().port();

    let stream = TcpStream::connect_host("localhost", &port.to_string()).expect("connect");
    let (_accepted, peer) = listener.accept().expect("accept");
    assert_eq!(peer.port(), stream.local_addr().expect("local addr").port());
}

#[test]
fn test_connect_close_repeatedly_leaks_nothing() {
    let listener = loopback_listener();
    let addr = listener.local_addr();

    let server = thread::spawn(move || {
        // Accept and immediately drop each connection.
        for _ in 0..50 {
            let _ = listener.accept().expect("accept");
        }
    });

    for _ in 0..50 {
        let stream = TcpStream::connect(Endpoint::tcp(addr)).expect("connect");
        stream.close();
    }
    server.join().expect("server thread");
}

#[test]
fn test_backlog_queues_unaccepted_connections() {
    // Backlog is 10; half that many pending connects must all succeed
    // without anyone calling accept.
    let listener = loopback_listener();
    let addr = listener.local_addr();

    let mut pending = Vec::new();
    for _ in 0..5 {
        pending.push(TcpStream::connect(Endpoint::tcp(addr)).expect("queued connect"));
    }
    assert_eq!(pending.len(), 5);
}

#[test]
fn test_listener_stays_usable_after_accept() {
    let listener = loopback_listener();
    let addr = listener.local_addr();

    for _ in 0..3 {
        let client = TcpStream::connect(Endpoint::tcp(addr)).expect("connect");
        let (accepted, peer) = listener.accept().expect("accept");
        assert_eq!(peer, client.local_addr().expect("local addr"));
        accepted.close();
        client.close();
    }
}
