//! HTTP and `WebSocket` transport for the Mimic mock API server.
//!
//! This crate binds the route table materialized by `mimic-core` onto an
//! Axum server:
//!
//! - **Configured routes** under the base path, each answering with a
//!   static body, an expanded mock template, or a page of either
//! - **CRUD collections** (`crud: true` routes) with list, read, create,
//!   update and delete, persisted to the configuration file
//! - **`WebSocket` endpoint** replying to `{"event": name}` requests and
//!   pushing interval events per connection
//!
//! # Architecture
//!
//! Everything request handlers need lives in the shared [`AppState`].
//! Route and event resolution is lock-free; only CRUD mutations take the
//! repository mutex, so id assignment and persistence are serialized.
//! Failures are reported as JSON `{"error", "status"}` bodies, and
//! handler panics are caught and answered with a 500.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ServerError;
pub use router::build_router;
pub use server::{ListenConfig, StartupError, spawn_server, start_server};
pub use state::AppState;
