//! HTTP API Layer
//!
//! Upload, progress-streaming, and static stem-serving endpoints for
//! the Stemflow daemon. One router, shared state, SSE for progress.

pub mod error;
pub mod handler;
pub mod server;
pub mod state;
pub mod types;

pub use server::{HttpServer, HttpServerConfig};
pub use state::AppState;
