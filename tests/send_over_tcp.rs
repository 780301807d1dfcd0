//! Requests written to a real TCP peer.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use wire_transport::http::{build_message, make_full_request, Message, RequestOptions, RequestType};

mod common;

const OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";

#[tokio::test]
async fn post_request_reaches_peer_byte_exact() {
    let (addr, captured) = common::start_capture_peer(OK).await;

    let msg = Message::new(format!("post://{addr}/submit"), "a=1&b=2");
    let req = build_message(&msg).unwrap();
    assert_eq!(req.fragment_count(), 2);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    req.send_to_async(&mut stream).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();

    let expected = format!(
        "POST /submit HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nContent-Length: 7\r\n\r\na=1&b=2",
        addr.port()
    );
    assert_eq!(captured.await.unwrap(), expected.into_bytes());
    assert!(response.starts_with(b"HTTP/1.1 200 OK"));
}

#[tokio::test]
async fn normalized_request_goes_out_as_passthrough() {
    let (addr, captured) = common::start_capture_peer(OK).await;

    let msg = Message::new(format!("http://{addr}/items/9"), "");
    let opts = RequestOptions::new()
        .headers("Accept: application/json\r\n")
        .content(b"{\"qty\":2}")
        .content_type("application/json")
        .request_type(RequestType::Put);
    let full = make_full_request(&msg, &opts).unwrap();
    assert!(full.addr.starts_with("full://"));

    let req = build_message(&full).unwrap();
    assert_eq!(req.fragment_count(), 1);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    req.send_to_async(&mut stream).await.unwrap();
    stream.shutdown().await.unwrap();

    let expected = format!(
        "PUT /items/9 HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nAccept: application/json\r\n\
         Content-Length: 9\r\nContent-Type: application/json\r\n\r\n{{\"qty\":2}}",
        addr.port()
    );
    assert_eq!(String::from_utf8(captured.await.unwrap()).unwrap(), expected);
}
