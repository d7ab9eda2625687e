//! Shared application state for the mock API server.
//!
//! [`AppState`] holds everything materialized from the configuration at
//! startup: the route table, the CRUD repository, the template expander
//! and the `WebSocket` event dispatcher. It also counts live push timers
//! so connection cleanup can be observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mimic_core::events::EventDispatcher;
use mimic_core::repository::{Repository, RepositoryError};
use mimic_core::routes::RouteTable;
use mimic_core::store::ConfigStore;
use mimic_template::{MockEngine, TemplateExpander};
use mimic_types::Config;
use tokio::sync::Mutex;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// repository sits behind a mutex so id assignment, append and
/// persistence happen as one step across worker threads.
pub struct AppState {
    /// Bindings materialized from the configuration.
    pub routes: RouteTable,
    /// Owner of the CRUD collections and of the configuration file.
    pub repository: Mutex<Repository>,
    /// Expander used for route mocks.
    pub expander: Arc<dyn TemplateExpander>,
    /// `WebSocket` event resolution.
    pub events: EventDispatcher,
    push_timers: Arc<AtomicUsize>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("routes", &self.routes)
            .field("events", &self.events)
            .field("push_timers", &self.active_push_timers())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build the state with the default [`MockEngine`].
    ///
    /// `store` is where CRUD mutations are persisted; `None` keeps them in
    /// memory.
    pub fn new(config: Config, store: Option<ConfigStore>) -> Result<Self, RepositoryError> {
        Self::with_expander(config, store, Arc::new(MockEngine::new()))
    }

    /// Build the state with a custom template expander.
    pub fn with_expander(
        config: Config,
        store: Option<ConfigStore>,
        expander: Arc<dyn TemplateExpander>,
    ) -> Result<Self, RepositoryError> {
        let routes = RouteTable::build(&config);
        let events = EventDispatcher::new(config.websocket.as_ref(), Arc::clone(&expander));
        let repository = Repository::new(config, store)?;
        Ok(Self {
            routes,
            repository: Mutex::new(repository),
            expander,
            events,
            push_timers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of interval push timers currently running across all
    /// `WebSocket` connections.
    pub fn active_push_timers(&self) -> usize {
        self.push_timers.load(Ordering::SeqCst)
    }

    /// Register a running push timer. The count drops when the returned
    /// guard is dropped.
    pub(crate) fn track_push_timer(&self) -> PushTimerGuard {
        self.push_timers.fetch_add(1, Ordering::SeqCst);
        PushTimerGuard {
            active: Arc::clone(&self.push_timers),
        }
    }
}

/// Keeps one push timer counted in [`AppState::active_push_timers`].
#[derive(Debug)]
pub(crate) struct PushTimerGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for PushTimerGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
