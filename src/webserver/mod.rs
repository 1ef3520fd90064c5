//! HTTP / WebSocket surface
//!
//! Thin axum layer over the dashboard service: the `/ws` viewer endpoint,
//! webhook ingestion and a few status routes.

mod server;

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use server::{build_app, serve};
pub use state::AppState;
