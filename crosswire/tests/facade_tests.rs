//! End-to-end test through the public facade: a multiplexed echo server on
//! one thread, a blocking client on another.

use crosswire::prelude::*;
use std::thread;
use std::time::Duration;

#[test]
fn test_multiplexed_echo_roundtrip() {
    crosswire::dev_tracing::init_tracing();

    let listener = TcpListener::listen_on("127.0.0.1", "0").expect("listen");
    let addr = listener.local_addr();

    let server = thread::spawn(move || {
        listener.set_nonblocking().expect("nonblocking listener");

        const LISTENER: Token = Token(0);
        const CONN: Token = Token(1);
        let poller = Poller::new();
        poller.add(&listener, LISTENER, Interest::READABLE);

        let mut conn: Option<TcpStream> = None;
        let mut events = Events::with_capacity(16);
        let mut echoed = 0usize;

        loop {
            poller.wait(&mut events, Some(Duration::from_secs(10)));
            for event in &events {
                if event.token == LISTENER && event.readable {
                    match listener.accept() {
                        Ok((stream, _peer)) => {
                            stream.set_nonblocking().expect("nonblocking conn");
                            poller.add(&stream, CONN, Interest::READABLE | Interest::HUP);
                            conn = Some(stream);
                        }
                        Err(NetError::WouldBlock) => {}
                        Err(e) => panic!("accept failed: {e}"),
                    }
                } else if event.token == CONN {
                    let stream = conn.as_ref().expect("registered connection");
                    loop {
                        match stream.recv(1024) {
                            Ok(data) if data.is_empty() => {
                                // Orderly shutdown; the session is over.
                                poller.remove(stream);
                                return echoed;
                            }
                            Ok(data) => {
                                // Echo in blocking mode to keep the test
                                // simple on the write side.
                                stream.set_blocking().expect("blocking for echo");
                                stream.send_all(&data).expect("echo");
                                stream.set_nonblocking().expect("back to nonblocking");
                                echoed += data.len();
                            }
                            Err(NetError::WouldBlock) => break,
                            Err(e) => panic!("recv failed: {e}"),
                        }
                    }
                }
            }
        }
    });

    let client = TcpStream::connect_host("127.0.0.1", &addr.port().to_string()).expect("connect");
    client.send_all(b"over the crosswire").expect("send");

    let mut received = Vec::new();
    while received.len() < 18 {
        let chunk = client.recv(18 - received.len()).expect("recv");
        assert!(!chunk.is_empty(), "server closed early");
        received.extend_from_slice(&chunk);
    }
    assert_eq!(&received, b"over the crosswire");

    client.close();
    assert_eq!(server.join().expect("server thread"), 18);
}
