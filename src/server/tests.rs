//! Tests for the HTTP server implementation.

#[cfg(test)]
mod server_tests {
    use std::collections::VecDeque;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use serde::Serialize;
    use serde_json::{json, Value};
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    use crate::routes;
    use crate::server::http_server::reject_over_capacity;
    use crate::server::{Error, HttpResponse, HttpServer, ServerConfig, StatusCode, DEFAULT_PORT};

    // Mock TcpStream for testing; each chunk is returned by a separate read
    struct MockTcpStream {
        read_chunks: VecDeque<Vec<u8>>,
        write_data: Vec<u8>,
        shut_down: bool,
    }

    impl MockTcpStream {
        fn new(read_data: &[u8]) -> Self {
            Self {
                read_chunks: VecDeque::from([read_data.to_vec()]),
                write_data: Vec::new(),
                shut_down: false,
            }
        }

        fn chunked(chunks: &[&str]) -> Self {
            Self {
                read_chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                write_data: Vec::new(),
                shut_down: false,
            }
        }

        fn written(&self) -> String {
            String::from_utf8(self.write_data.clone()).unwrap()
        }
    }

    impl AsyncRead for MockTcpStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            if let Some(mut chunk) = this.read_chunks.pop_front() {
                let n = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..n]);
                if n < chunk.len() {
                    this.read_chunks.push_front(chunk.split_off(n));
                }
            }
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockTcpStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.write_data.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            self.get_mut().shut_down = true;
            Poll::Ready(Ok(()))
        }
    }

    /// Split a raw response into status line, headers and body.
    fn split_response(raw: &str) -> (String, Vec<(String, String)>, String) {
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap().to_string();
        let headers = lines
            .map(|l| {
                let (k, v) = l.split_once(": ").unwrap();
                (k.to_string(), v.to_string())
            })
            .collect();
        (status_line, headers, body.to_string())
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    async fn exchange(request: &[u8]) -> (Result<(), Error>, MockTcpStream) {
        let router = routes::router().unwrap();
        let mut stream = MockTcpStream::new(request);
        let result = HttpServer::handle_connection(&mut stream, &router, 1024).await;
        (result, stream)
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            addr: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 100,
            read_buffer_size: 4096,
        };

        let server = HttpServer::new(config.clone(), routes::router().unwrap());
        assert_eq!(server.config.addr, config.addr);
        assert_eq!(server.config.max_connections, 100);
        assert_eq!(server.config.read_buffer_size, 4096);
        assert_eq!(server.router().routes().count(), 4);
    }

    #[tokio::test]
    async fn test_handle_connection_with_valid_request() {
        let (result, stream) = exchange(b"GET /influezone/health HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(result.is_ok());
        assert!(stream.shut_down);

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        assert_eq!(header(&headers, "Content-Length"), Some(body.len().to_string().as_str()));
        assert_eq!(header(&headers, "Connection"), Some("close"));
        assert_eq!(body, r#"{"status":"InflueZone API healthy"}"#);
    }

    #[tokio::test]
    async fn test_handle_connection_with_not_found() {
        let (result, stream) = exchange(b"GET /does-not-exist HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(result.is_ok());

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 404 Not Found");
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        assert_eq!(body, r#"{"error":"Not found"}"#);
    }

    #[tokio::test]
    async fn test_handle_connection_with_method_mismatch() {
        let (result, stream) = exchange(b"POST /influezone/health HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\n\r\n{}").await;
        assert!(result.is_ok());

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 404 Not Found");
        assert!(header(&headers, "Allow").is_none());
        assert_eq!(body, r#"{"error":"Not found"}"#);
    }

    #[tokio::test]
    async fn test_handle_connection_ignores_query() {
        let (result, stream) = exchange(b"GET /benimdukkanim/store?utm=mail HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert!(result.is_ok());

        let (status_line, _, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(body, r#"{"message":"Store homepage placeholder"}"#);
    }

    #[tokio::test]
    async fn test_handle_connection_with_invalid_request() {
        let (result, stream) = exchange(b"INVALID REQUEST").await;
        assert!(matches!(result, Err(Error::ParseError(_))));

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 400 Bad Request");
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        assert_eq!(body, r#"{"error":"Bad request"}"#);
    }

    #[tokio::test]
    async fn test_handle_connection_with_empty_read() {
        let (result, stream) = exchange(b"").await;
        assert!(result.is_ok());
        assert!(stream.write_data.is_empty());
    }

    #[tokio::test]
    async fn test_handle_connection_with_split_head() {
        let router = routes::router().unwrap();
        let mut stream = MockTcpStream::chunked(&[
            "GET /influezone/dash",
            "board HTTP/1.1\r\nHo",
            "st: localhost\r\n\r\n",
        ]);

        let result = HttpServer::handle_connection(&mut stream, &router, 1024).await;
        assert!(result.is_ok());

        let (status_line, _, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(body, r#"{"message":"Influencer dashboard placeholder"}"#);
    }

    #[tokio::test]
    async fn test_reject_over_capacity() {
        let mut stream = MockTcpStream::new(b"");
        reject_over_capacity(&mut stream).await.unwrap();

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 503 Service Unavailable");
        assert_eq!(header(&headers, "Content-Length"), Some(body.len().to_string().as_str()));
        assert_eq!(body, r#"{"error":"Server is at capacity"}"#);
        assert!(stream.shut_down);
    }

    #[tokio::test]
    async fn test_head_request_omits_body() {
        let (result, stream) = exchange(b"HEAD /influezone/health HTTP/1.1\r\nHost: a\r\n\r\n").await;
        assert!(result.is_ok());
        assert!(stream.shut_down);

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 404 Not Found");
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        assert_eq!(header(&headers, "Content-Length"), Some("21"));
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn test_oversized_head_is_refused() {
        let router = routes::router().unwrap();
        let request = format!(
            "GET /influezone/health HTTP/1.1\r\nHost: a\r\nX-Big: {}\r\n\r\n",
            "x".repeat(9000)
        );
        let mut stream = MockTcpStream::new(request.as_bytes());

        let result = HttpServer::handle_connection(&mut stream, &router, 8192).await;
        assert!(matches!(result, Err(Error::HeadTooLarge(8192))));

        let (status_line, headers, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 431 Request Header Fields Too Large");
        assert_eq!(header(&headers, "Content-Length"), Some(body.len().to_string().as_str()));
        assert_eq!(body, r#"{"error":"Request header fields too large"}"#);
    }

    #[tokio::test]
    async fn test_head_that_exactly_fills_buffer_is_served() {
        let router = routes::router().unwrap();
        let request = b"GET /influezone/health HTTP/1.1\r\nHost: a\r\n\r\n";
        let mut stream = MockTcpStream::new(request);

        let result = HttpServer::handle_connection(&mut stream, &router, request.len()).await;
        assert!(result.is_ok());

        let (status_line, _, body) = split_response(&stream.written());
        assert_eq!(status_line, "HTTP/1.1 200 OK");
        assert_eq!(body, r#"{"status":"InflueZone API healthy"}"#);
    }

    #[derive(Serialize)]
    struct Payload {
        name: &'static str,
        count: u32,
    }

    #[test]
    fn test_response_with_json() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_json(&Payload { name: "store", count: 3 })
            .unwrap();

        assert_eq!(response.body, br#"{"name":"store","count":3}"#);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("CONTENT-LENGTH"), Some("26"));
        assert!(response.header("Server").unwrap().starts_with("showcase-api/"));

        let raw = String::from_utf8(response.to_bytes()).unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.ends_with("\r\n\r\n{\"name\":\"store\",\"count\":3}"));

        let head = String::from_utf8(response.head_bytes()).unwrap();
        assert!(head.ends_with("\r\n\r\n"));
        assert_eq!(raw, format!("{head}{{\"name\":\"store\",\"count\":3}}"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
        assert_eq!(StatusCode::ServiceUnavailable.reason_phrase(), "Service Unavailable");
        assert_eq!(StatusCode::RequestHeaderFieldsTooLarge.as_u16(), 431);
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| vars.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_config_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr.port(), DEFAULT_PORT);
        assert!(config.addr.ip().is_unspecified());
        assert!(config.addr.is_ipv6());
        assert_eq!(config.max_connections, 1024);
        assert_eq!(config.read_buffer_size, 8192);
    }

    #[test]
    fn test_config_from_vars() {
        let vars = [("PORT", "8081"), ("HOST", "127.0.0.1"), ("MAX_CONNECTIONS", "16"), ("READ_BUFFER_SIZE", " 2048 ")];
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.addr, "127.0.0.1:8081".parse().unwrap());
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.read_buffer_size, 2048);
    }

    #[test]
    fn test_config_empty_port_uses_default() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "")])).unwrap();
        assert_eq!(config.addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let result = ServerConfig::from_lookup(lookup(&[("PORT", "http")]));
        assert!(matches!(result, Err(Error::Config { key: "PORT", ref value }) if value == "http"));

        let result = ServerConfig::from_lookup(lookup(&[("PORT", "70000")]));
        assert!(matches!(result, Err(Error::Config { key: "PORT", .. })));

        let result = ServerConfig::from_lookup(lookup(&[("HOST", "localhost")]));
        assert!(matches!(result, Err(Error::Config { key: "HOST", .. })));

        let result = ServerConfig::from_lookup(lookup(&[("MAX_CONNECTIONS", "0")]));
        assert!(matches!(result, Err(Error::Config { key: "MAX_CONNECTIONS", .. })));
    }

    async fn fetch(addr: std::net::SocketAddr, request: &str) -> (String, Vec<(String, String)>, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();
        split_response(&raw)
    }

    #[tokio::test]
    async fn test_serve_over_loopback() {
        let config = ServerConfig {
            addr: "127.0.0.1:0".parse().unwrap(),
            ..ServerConfig::default()
        };
        let server = HttpServer::new(config, routes::router().unwrap());
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let cases = [
            ("GET", "/influezone/health", "200 OK", json!({ "status": "InflueZone API healthy" })),
            ("GET", "/influezone/dashboard", "200 OK", json!({ "message": "Influencer dashboard placeholder" })),
            ("GET", "/benimdukkanim/health", "200 OK", json!({ "status": "BenimDükkanım API healthy" })),
            ("GET", "/benimdukkanim/store", "200 OK", json!({ "message": "Store homepage placeholder" })),
            ("GET", "/benimdukkanim/store?x=1", "200 OK", json!({ "message": "Store homepage placeholder" })),
            ("GET", "/does-not-exist", "404 Not Found", json!({ "error": "Not found" })),
            ("GET", "/influezone/Health", "404 Not Found", json!({ "error": "Not found" })),
            ("POST", "/influezone/health", "404 Not Found", json!({ "error": "Not found" })),
        ];

        for (method, path, status, expected) in cases {
            let request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\n\r\n");
            let (status_line, headers, body) = fetch(addr, &request).await;

            assert_eq!(status_line, format!("HTTP/1.1 {status}"), "{method} {path}");
            assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
            assert_eq!(header(&headers, "Content-Length"), Some(body.len().to_string().as_str()));
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body, expected, "{method} {path}");
        }

        shutdown_tx.send(()).unwrap();
        let result = handle.await.unwrap();
        assert!(result.is_ok());

        // The listener is closed once serve returns
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
