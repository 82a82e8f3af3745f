//! Canned JSON API for the InflueZone and BenimDükkanım demo front-ends.
//!
//! The service answers a fixed table of `GET` routes with pre-encoded JSON
//! bodies and everything else with `404 {"error":"Not found"}`. Every
//! response carries `Content-Type: application/json` and a `Content-Length`
//! equal to the body's byte length.
//!
//! # Examples
//!
//! ## Dispatching without a socket
//!
//! ```
//! use showcase_api::{routes, Method, StatusCode};
//!
//! let router = routes::router().unwrap();
//!
//! let response = router.dispatch(Method::GET, "/influezone/health");
//! assert_eq!(response.status, StatusCode::Ok);
//! assert_eq!(response.body, br#"{"status":"InflueZone API healthy"}"#);
//!
//! let response = router.dispatch(Method::POST, "/influezone/health");
//! assert_eq!(response.status, StatusCode::NotFound);
//! ```
//!
//! ## Parsing a request
//!
//! ```
//! use showcase_api::{parse_request, Method};
//!
//! let request = parse_request(b"GET /benimdukkanim/store?ref=home HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
//! assert_eq!(request.method, Method::GET);
//! assert_eq!(request.path, "/benimdukkanim/store");
//! assert_eq!(request.get_query_param("ref").unwrap(), "home");
//! ```
//!
//! ## Running the server
//!
//! ```no_run
//! use showcase_api::{routes, HttpServer, ServerConfig};
//!
//! # async fn run() -> Result<(), showcase_api::ServerError> {
//! let server = HttpServer::new(ServerConfig::from_env()?, routes::router()?);
//! server.start().await
//! # }
//! ```

pub mod parser;
pub mod router;
pub mod routes;
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{Error as ParserError, HttpRequest, HttpVersion, Method, parse_request};
pub use router::{CannedResponse, Route, Router};
pub use server::{Error as ServerError, HttpResponse, HttpServer, ServerConfig, StatusCode};
