//! The route table served by the binary.
//!
//! Two demo front-ends share this stub: the InflueZone influencer portal
//! and the BenimDükkanım storefront. Each gets a health check and one
//! placeholder page endpoint.

use serde::Serialize;

use crate::parser::Method;
use crate::router::{CannedResponse, Router};
use crate::server::StatusCode;

/// Body of the health endpoints.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

/// Body of the placeholder page endpoints.
#[derive(Debug, Serialize)]
pub struct PlaceholderBody {
    pub message: &'static str,
}

fn health(status: &'static str) -> Result<CannedResponse, serde_json::Error> {
    CannedResponse::json(StatusCode::Ok, &HealthBody { status })
}

fn placeholder(message: &'static str) -> Result<CannedResponse, serde_json::Error> {
    CannedResponse::json(StatusCode::Ok, &PlaceholderBody { message })
}

/// Build the route table for both products.
pub fn router() -> Result<Router, serde_json::Error> {
    let router = Router::new()
        // InflueZone
        .route(Method::GET, "/influezone/health", health("InflueZone API healthy")?)
        .route(Method::GET, "/influezone/dashboard", placeholder("Influencer dashboard placeholder")?)
        // BenimDükkanım
        .route(Method::GET, "/benimdukkanim/health", health("BenimDükkanım API healthy")?)
        .route(Method::GET, "/benimdukkanim/store", placeholder("Store homepage placeholder")?);

    Ok(router)
}
