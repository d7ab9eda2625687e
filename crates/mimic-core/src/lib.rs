//! Route and event materialization for the Mimic mock API server.
//!
//! This crate turns a declarative [`Config`](mimic_types::Config) into
//! everything the transport layer needs, without depending on it:
//!
//! # Modules
//!
//! - [`config`] -- Loading, format detection and validation of the
//!   configuration document.
//! - [`store`] -- [`ConfigStore`], which writes the whole document back to
//!   the file it was loaded from.
//! - [`routes`] -- The [`RouteTable`]: one [`Binding`] per route and verb,
//!   with last-bound-wins shadowing.
//! - [`resolver`] -- Static / templated response resolution and pagination.
//! - [`repository`] -- The CRUD [`Repository`] owning mutable collections.
//! - [`events`] -- The `WebSocket` [`EventDispatcher`].
//!
//! [`ConfigStore`]: store::ConfigStore
//! [`RouteTable`]: routes::RouteTable
//! [`Binding`]: routes::Binding
//! [`Repository`]: repository::Repository
//! [`EventDispatcher`]: events::EventDispatcher

pub mod config;
pub mod events;
pub mod repository;
pub mod resolver;
pub mod routes;
pub mod store;
