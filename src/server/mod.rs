//! The HTTP listener.
//!
//! Accepts TCP connections, reads one request per connection, hands it to a
//! [`Router`](crate::router::Router) and writes the response back.

mod response;
mod config;
mod error;
mod http_server;
mod tests;

// Re-export public items
pub use response::{HttpResponse, StatusCode, SERVER_NAME};
pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::Error;
pub use http_server::HttpServer;
