//! incident-relay
//!
//! Relays incident webhooks into a sqlite store and serves a live metrics
//! dashboard over WebSocket.

pub mod arguments;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod logger;
pub mod run;
pub mod store;
pub mod webserver;
