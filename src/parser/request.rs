//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// Represents a parsed HTTP request head.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target exactly as it appeared on the request line
    pub target: String,
    /// The path component of the target, without query or fragment
    pub path: String,
    /// The HTTP version
    pub version: HttpVersion,
    /// The HTTP headers
    pub headers: HashMap<String, String>,
    /// Query parameters, left percent-encoded
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Create a new HTTP request from a method and a raw request target.
    ///
    /// The target may be in origin-form (`/a/b?x=1`), absolute-form
    /// (`http://host/a/b?x=1`) or the asterisk-form `*`.
    pub fn new(
        method: Method,
        target: impl Into<String>,
        version: HttpVersion,
        headers: HashMap<String, String>,
    ) -> Result<Self, Error> {
        let target = target.into();
        let (path, query) = split_target(&target)?;
        let query_params = query.map(parse_query).unwrap_or_default();

        Ok(Self {
            method,
            path: path.to_string(),
            target,
            version,
            headers,
            query_params,
        })
    }

    /// Get a header value, ignoring the case of the name.
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v))
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Get a query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }
}

/// Split a request target into its path and optional query string.
fn split_target(target: &str) -> Result<(&str, Option<&str>), Error> {
    let without_fragment = target.split_once('#').map_or(target, |(t, _)| t);

    let absolute = without_fragment
        .strip_prefix("http://")
        .or_else(|| without_fragment.strip_prefix("https://"));

    let origin = match absolute {
        // Drop the authority; what follows it is origin-form.
        Some(rest) => rest.find(|c: char| c == '/' || c == '?').map_or("", |i| &rest[i..]),
        None if without_fragment == "*" || without_fragment.starts_with('/') => without_fragment,
        None => return Err(Error::InvalidPath(target.to_string())),
    };

    let (path, query) = match origin.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (origin, None),
    };

    if path.is_empty() {
        // Only reachable for absolute-form targets such as `http://host?x=1`.
        return Ok(("/", query));
    }

    Ok((path, query))
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Parse an HTTP request head from a byte slice.
///
/// Only the request line and headers are examined; any body bytes that
/// follow the blank line are ignored.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    let input_str = std::str::from_utf8(input)
        .map_err(|_| Error::MalformedRequestLine("Invalid UTF-8".to_string()))?;

    let mut lines = input_str.lines();

    let request_line = match lines.next() {
        Some(line) if !line.trim().is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let &[method, target, version] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    };

    let method = Method::from_str(method)?;
    let version = HttpVersion::from_str(version)?;

    let mut headers = HashMap::new();
    for line in lines {
        // Empty line indicates the end of headers
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::InvalidHeaderFormat(line.to_string()));
        };

        headers.insert(name.trim().to_string(), value.trim().to_string());
    }

    if version.requires_host() && !headers.keys().any(|k| k.eq_ignore_ascii_case("Host")) {
        return Err(Error::MissingHeader("Host".to_string()));
    }

    HttpRequest::new(method, target, version, headers)
}
