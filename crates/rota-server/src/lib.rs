//! rota-server - HTTP server for rota.
//!
//! Hosts the chat event endpoint, schedule inspection, manual job triggers, and
//! the background reminder and advance jobs.
//!
//! # Example
//!
//! ```ignore
//! use rota_core::RotaConfig;
//! use rota_server::{create_app, create_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RotaConfig::load().unwrap();
//!     let (state, runtime) = create_app(&config).await.unwrap();
//!     runtime.start().await.unwrap();
//!
//!     let app = create_server(state.with_runtime(runtime));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod error;
pub mod factory;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use factory::{create_app, create_state_with, create_store};
pub use state::AppState;

use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

/// Create the server with all routes and middleware.
pub fn create_server(state: AppState) -> Router {
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// Create the server with API key authentication.
pub fn create_server_with_auth(state: AppState, api_key: impl Into<String>) -> Router {
    let api_key: Arc<str> = Arc::from(api_key.into());
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn_with_state(
            api_key,
            middleware::auth_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}
