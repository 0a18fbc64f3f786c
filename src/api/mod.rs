//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for the gateway's endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! Both endpoints are documented with OpenAPI annotations using `utoipa`; the
//! rendered reference is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
