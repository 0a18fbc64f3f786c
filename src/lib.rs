//! # pokegate: Image Forwarding Gateway and Chat Relay
//!
//! `pokegate` is the thin HTTP backend for the Pokémon battle-assistant app.
//! It sits between the browser frontend and two local services: an
//! image-processing endpoint that identifies uploaded pictures, and an Ollama
//! text-generation backend that answers battle-strategy questions.
//!
//! ## What It Does
//!
//! The gateway does no image or text processing of its own. `/image` accepts an
//! upload in either of two wire encodings - a raw `application/octet-stream`
//! body or a `multipart/form-data` form whose first part is taken regardless of
//! field name - normalizes it into the single-field multipart request the
//! downstream processor expects, POSTs it there, and relays the processor's
//! status, headers, and body back to the caller byte-for-byte. `/chat` wraps a
//! free-text question in a fixed battle-strategy system instruction and returns
//! the backend's raw completion. Neither endpoint keeps any state between
//! requests.
//!
//! ## Request Flow
//!
//! Each request is an independent transaction with two terminal outcomes: the
//! forwarded (or generated) payload, or a JSON `{"error": ...}` body. Client
//! mistakes (no file in the upload, missing question) are 400s that never reach
//! a downstream service; everything unexpected - downstream unreachable, parse
//! failure, backend error - is caught at the handler boundary and surfaces as a
//! 500 with a generic message. There are no retries: one downstream failure is
//! a terminal failure for that request.
//!
//! The chat relay is optional. Deployments that only forward images run with
//! `chat.enabled: false` (the default) and never register the `/chat` route.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use pokegate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = pokegate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize structured logging
//!     pokegate::telemetry::init_telemetry()?;
//!
//!     // Create and start the application, shutting down on Ctrl+C
//!     Application::new(config)
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod downstream;
pub mod errors;
pub mod llm;
mod openapi;
mod prompt;
pub mod telemetry;

#[cfg(test)]
mod test;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::downstream::ImageForwarder;
use crate::llm::CompletionClient;

/// Application state shared across all request handlers.
///
/// Holds the configuration plus the two outbound clients, both constructed
/// from config at startup so tests can substitute mock downstream servers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub forwarder: ImageForwarder,
    pub chat: Option<CompletionClient>,
}

/// Build the application router with all endpoints and middleware.
///
/// - `/image` - upload relay (both encodings on the one route)
/// - `/chat` - question relay, only when the chat relay is configured
/// - `/healthz` - liveness check
/// - `/docs` - OpenAPI reference
///
/// CORS is wide open: the frontend is served from a different origin and the
/// gateway has no authentication surface of its own.
pub fn build_router(state: AppState) -> Router {
    // The raw-body path enforces its own cap while reading, and the multipart
    // path is uncapped, so the framework's default body limit is lifted here.
    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/image",
            post(api::handlers::images::relay_image).layer(DefaultBodyLimit::disable()),
        );

    if state.chat.is_some() {
        router = router.route("/chat", post(api::handlers::chat::ask));
    }

    router
        .with_state(state)
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns the router and its configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the outbound clients and router
/// 2. **Serve**: [`Application::serve`] binds the TCP port and handles requests
/// 3. **Shutdown**: the provided shutdown future drains the server gracefully
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance from configuration.
    pub fn new(config: Config) -> Self {
        let forwarder = ImageForwarder::new(config.downstream.url.clone());
        let chat = config.chat.enabled.then(|| CompletionClient::new(&config.chat));

        let state = AppState::builder()
            .config(config.clone())
            .forwarder(forwarder)
            .maybe_chat(chat)
            .build();

        let router = build_router(state);

        Self { router, config }
    }

    /// Convert the application into a test server (for tests)
    #[cfg(test)]
    pub(crate) fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Gateway listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
