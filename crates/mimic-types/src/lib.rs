//! Shared type definitions for the Mimic mock API server.
//!
//! This crate is the single source of truth for the declarative
//! configuration document and the `WebSocket` wire envelope. It carries no
//! behavior beyond small accessors; loading, validation and persistence
//! live in `mimic-core`.
//!
//! # Modules
//!
//! - [`config`] -- The root [`Config`] document and its nested route,
//!   method, mock, pagination and `WebSocket` sections
//! - [`verb`] -- The closed [`HttpVerb`] variant used as method keys
//! - [`envelope`] -- `WebSocket` inbound message and outbound [`Envelope`]

pub mod config;
pub mod envelope;
pub mod verb;

// Re-export all public types at crate root for convenience.
pub use config::{
    Config, MethodConfig, MockSpec, PaginationSpec, ResponseKind, RouteConfig, ServerConfig,
    WebSocketConfig, WebSocketEventConfig, WebSocketEventMock,
};
pub use envelope::{Envelope, InboundMessage};
pub use verb::{HttpVerb, UnsupportedVerb};
