//! Request routing.
//!
//! A [`Router`] is an ordered table of `(method, path)` bindings to canned
//! JSON responses. Matching is exact and case-sensitive on both method and
//! path, the first matching entry wins, and anything unmatched gets the
//! JSON 404 fallback. Dispatch cannot fail.

mod canned;

pub use canned::CannedResponse;

use log::debug;

use crate::parser::{HttpRequest, Method};
use crate::server::HttpResponse;

/// A single entry in the route table.
#[derive(Debug, Clone)]
pub struct Route {
    /// The method to match.
    pub method: Method,
    /// The exact path to match.
    pub path: String,
    /// The response sent when the route matches.
    pub reply: CannedResponse,
}

/// An immutable-once-built route table with a 404 fallback.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
    fallback: CannedResponse,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Create an empty router that answers everything with `{"error":"Not found"}`.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: CannedResponse::not_found(),
        }
    }

    /// Append a route to the table.
    pub fn route(mut self, method: Method, path: impl Into<String>, reply: CannedResponse) -> Self {
        self.routes.push(Route {
            method,
            path: path.into(),
            reply,
        });
        self
    }

    /// The routes in match order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Find the canned response for a method and path.
    pub fn lookup(&self, method: Method, path: &str) -> &CannedResponse {
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
            .map_or(&self.fallback, |route| &route.reply)
    }

    /// Produce the response for a method and path.
    ///
    /// `path` must already have its query string removed.
    pub fn dispatch(&self, method: Method, path: &str) -> HttpResponse {
        let reply = self.lookup(method, path);
        debug!("{method} {path} matched with status {}", reply.status().as_u16());
        reply.to_response()
    }

    /// Produce the response for a parsed request.
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        self.dispatch(request.method, &request.path)
    }
}
