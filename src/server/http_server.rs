//! HTTP server implementation.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::parser::{parse_request, Method};
use crate::router::Router;
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::response::{HttpResponse, StatusCode};

/// How long a client may take to send its request head.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// How long shutdown waits for in-flight connections.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// An HTTP server answering every connection from a fixed [`Router`].
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Arc<Router>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and route table.
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router: Arc::new(router),
        }
    }

    /// The route table this server dispatches to.
    pub fn router(&self) -> &Router {
        &self.router
    }

    fn display_server_info(&self, addr: SocketAddr) {
        info!("Server running on port {port}", port = addr.port());
        info!("Registered endpoints:");
        for route in self.router.routes() {
            info!("  {} {}", route.method, route.path);
        }
    }

    /// Bind the configured address.
    ///
    /// An unspecified IPv6 address falls back to `0.0.0.0` on hosts
    /// without IPv6 support.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let addr = self.config.addr;
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) if addr.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED) => {
                warn!("Could not bind {addr} ({e}), falling back to IPv4");
                TcpListener::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), addr.port())).await?
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Bound {addr}", addr = listener.local_addr()?);
        Ok(listener)
    }

    /// Bind the configured address and serve until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.bind().await?;
        self.serve(listener, async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
                Err(e) => {
                    error!("Error setting up Ctrl+C handler: {e}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
    }

    /// Accept connections on `listener` until `shutdown` resolves, then
    /// stop accepting and wait for in-flight connections to finish.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send,
    {
        self.display_server_info(listener.local_addr()?);

        // Create a semaphore to limit concurrent connections
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                Some(res) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = res {
                        error!("Connection task failed: {e}");
                    }
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((socket, addr)) => {
                            self.handle_new_connection(socket, addr, &semaphore, &mut tasks).await;
                        }
                        Err(e) => Self::handle_accept_error(e).await,
                    }
                }
            }
        }

        drop(listener);
        Self::perform_shutdown(&mut tasks).await;

        Ok(())
    }

    async fn handle_new_connection(
        &self,
        mut socket: TcpStream,
        addr: SocketAddr,
        semaphore: &Arc<Semaphore>,
        tasks: &mut JoinSet<()>,
    ) {
        debug!("Connection from {addr}");

        let Ok(permit) = semaphore.clone().try_acquire_owned() else {
            warn!("Connection limit reached, rejecting connection from {addr}");
            if let Err(e) = reject_over_capacity(&mut socket).await {
                debug!("Failed to send 503 to {addr}: {e}");
            }
            return;
        };

        let router = self.router.clone();
        let read_buffer_size = self.config.read_buffer_size;

        tasks.spawn(async move {
            // The permit is dropped when the task completes, releasing the semaphore slot
            let _permit = permit;

            match Self::handle_connection(&mut socket, &router, read_buffer_size).await {
                Ok(()) => {}
                Err(e @ (Error::ParseError(_) | Error::HeadTooLarge(_))) => {
                    warn!("Rejected request from {addr}: {e}");
                }
                Err(e) => error!("Error handling connection from {addr}: {e}"),
            }
        });
    }

    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");
        // Usually fd exhaustion; back off before accepting again
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    async fn perform_shutdown(tasks: &mut JoinSet<()>) {
        info!("Waiting for {len} active connections to complete...", len = tasks.len());
        let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
            while let Some(res) = tasks.join_next().await {
                if let Err(e) = res {
                    error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Shutdown timed out, aborting {len} connections", len = tasks.len());
            tasks.abort_all();
        }

        info!("Server shutdown complete");
    }

    /// Serve a single request on `socket` and close it.
    ///
    /// Unparseable requests are answered with a 400 and reported as
    /// [`Error::ParseError`]; a head that overflows the read buffer gets a 431
    /// and [`Error::HeadTooLarge`]. Every parsed request gets the router's
    /// answer, without a body if the method is `HEAD`.
    pub async fn handle_connection(
        socket: &mut (impl AsyncRead + AsyncWrite + Unpin),
        router: &Router,
        read_buffer_size: usize,
    ) -> Result<(), Error> {
        let head = match tokio::time::timeout(READ_TIMEOUT, read_head(socket, read_buffer_size)).await {
            Ok(head) => head?,
            Err(_) => {
                return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out reading request").into());
            }
        };

        if head.is_empty() {
            return Ok(()); // Connection closed
        }

        if head.len() == read_buffer_size && !head_complete(&head) {
            let response = json_error(StatusCode::RequestHeaderFieldsTooLarge, "Request header fields too large")?;
            send(socket, response, false).await?;
            return Err(Error::HeadTooLarge(read_buffer_size));
        }

        let request = match parse_request(&head) {
            Ok(req) => req,
            Err(e) => {
                let response = json_error(StatusCode::BadRequest, "Bad request")?;
                send(socket, response, false).await?;
                return Err(Error::ParseError(e));
            }
        };

        let response = router.handle(&request);
        info!(
            "{method} {target} {version} -> {status}",
            method = request.method,
            target = request.target,
            version = request.version,
            status = response.status.as_u16()
        );

        send(socket, response, request.method == Method::HEAD).await
    }
}

/// Read until the end of the request head, EOF, or a full buffer.
async fn read_head(socket: &mut (impl AsyncRead + Unpin), read_buffer_size: usize) -> Result<Vec<u8>, Error> {
    let mut buf = vec![0; read_buffer_size];
    let mut len = 0;

    while len < buf.len() {
        let n = socket.read(&mut buf[len..]).await?;
        if n == 0 {
            break;
        }
        len += n;
        if head_complete(&buf[..len]) {
            break;
        }
    }

    buf.truncate(len);
    Ok(buf)
}

fn head_complete(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.windows(2).any(|w| w == b"\n\n")
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn json_error(status: StatusCode, message: &str) -> Result<HttpResponse, Error> {
    HttpResponse::new(status).with_json(&ErrorBody { error: message })
}

async fn send(socket: &mut (impl AsyncWrite + Unpin), response: HttpResponse, head_only: bool) -> Result<(), Error> {
    let response = response.with_header("Connection", "close");
    let bytes = if head_only { response.head_bytes() } else { response.to_bytes() };
    socket.write_all(&bytes).await?;
    socket.shutdown().await?;
    Ok(())
}

/// Answer a connection that arrived while every slot was taken.
pub(crate) async fn reject_over_capacity(socket: &mut (impl AsyncWrite + Unpin)) -> Result<(), Error> {
    send(socket, json_error(StatusCode::ServiceUnavailable, "Server is at capacity")?, false).await
}
