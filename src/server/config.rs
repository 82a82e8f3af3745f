//! Server configuration.

use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::str::FromStr;

use crate::server::error::Error;

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 3000;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to. Port 0 picks a free port; the default `[::]`
    /// accepts IPv4 clients too where the OS allows dual-stack sockets.
    pub addr: SocketAddr,
    /// The maximum number of concurrent connections.
    pub max_connections: usize,
    /// The read buffer size, which also caps the size of a request head.
    pub read_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 1024,
            read_buffer_size: 8192,
        }
    }
}

impl ServerConfig {
    /// Build a configuration from the process environment.
    ///
    /// Reads `HOST`, `PORT`, `MAX_CONNECTIONS` and `READ_BUFFER_SIZE`; unset
    /// or empty variables keep their defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();

        let host: IpAddr = parse_var(&lookup, "HOST")?.unwrap_or(defaults.addr.ip());
        let port: u16 = parse_var(&lookup, "PORT")?.unwrap_or(defaults.addr.port());
        let max_connections = parse_var(&lookup, "MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections);
        let read_buffer_size = parse_var(&lookup, "READ_BUFFER_SIZE")?.unwrap_or(defaults.read_buffer_size);

        if max_connections == 0 {
            return Err(Error::Config { key: "MAX_CONNECTIONS", value: "0".to_string() });
        }
        if read_buffer_size == 0 {
            return Err(Error::Config { key: "READ_BUFFER_SIZE", value: "0".to_string() });
        }

        Ok(Self {
            addr: SocketAddr::new(host, port),
            max_connections,
            read_buffer_size,
        })
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, Error> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config { key, value }),
        _ => Ok(None),
    }
}
