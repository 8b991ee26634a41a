//! Mock server helpers for artifact downloads

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve `content` at `/{file}`
pub async fn mock_artifact(server: &MockServer, file: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", file)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(server)
        .await;
}

/// Serve `content` at `/{file}` and require exactly `times` requests
pub async fn mock_artifact_expecting(server: &MockServer, file: &str, content: &[u8], times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", file)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .expect(times)
        .mount(server)
        .await;
}

/// Answer `/{file}` with `status` and no body
pub async fn mock_status(server: &MockServer, file: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", file)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// One-shot HTTP server whose response carries no Content-Length
///
/// The body is delimited by closing the connection. Returns the URL to fetch.
pub async fn serve_without_length(body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 2048];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        for chunk in body.chunks(7) {
            socket.write_all(chunk).await.unwrap();
        }
        socket.shutdown().await.unwrap();
    });

    format!("http://{}/artifact.exe", addr)
}
