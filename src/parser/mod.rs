//! HTTP request parsing.
//!
//! Turns the raw bytes read from a connection into an [`HttpRequest`]. Anything
//! that does not look like an HTTP request is rejected here, before routing.

mod request;
mod method;
mod version;
mod error;

// Re-export public items
pub use request::HttpRequest;
pub use method::Method;
pub use version::HttpVersion;
pub use error::Error;

pub use request::parse_request;
