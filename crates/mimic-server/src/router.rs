//! Axum router construction.
//!
//! Every binding of the route table becomes a method route on the
//! transport. Paths are mounted once each; when several bindings share a
//! verb and path, the last one bound is the one that serves requests.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::routing::{MethodFilter, MethodRouter};
use mimic_core::routes::{Binding, RouteAction};
use mimic_types::HttpVerb;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::panic_response;
use crate::handlers::{self, PageQuery, X_TOTAL_COUNT};
use crate::state::AppState;
use crate::ws;

type SharedState = Arc<AppState>;
type PathParams = Path<Vec<(String, String)>>;
type PageQueryResult = Result<Query<PageQuery>, QueryRejection>;

/// Build the complete Axum router from the state's route table.
///
/// Each binding is logged as it is bound. Unmatched paths get a JSON 404.
/// CORS allows any origin and exposes `X-Total-Count` to browsers.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([X_TOTAL_COUNT.clone()]);

    for binding in state.routes.bindings() {
        info!(method = %binding.verb, path = %binding.path, "route bound");
    }

    let mut router = Router::new();
    for group in state.routes.effective() {
        let mut methods = MethodRouter::new();
        for binding in group.bindings {
            methods = attach(methods, binding);
        }
        router = router.route(group.path, methods);
    }

    router
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}

const fn method_filter(verb: HttpVerb) -> MethodFilter {
    match verb {
        HttpVerb::Get => MethodFilter::GET,
        HttpVerb::Post => MethodFilter::POST,
        HttpVerb::Put => MethodFilter::PUT,
        HttpVerb::Delete => MethodFilter::DELETE,
    }
}

/// Attach the handler for `binding`.
fn attach(methods: MethodRouter<SharedState>, binding: &Binding) -> MethodRouter<SharedState> {
    let filter = method_filter(binding.verb);

    match (binding.action.clone(), binding.route_index) {
        (RouteAction::Resolve(method), _) => methods.on(
            filter,
            move |State(state): State<SharedState>, query: PageQueryResult| {
                let method = Arc::clone(&method);
                async move { handlers::resolve(&state, &method, &page_query(query)) }
            },
        ),
        (RouteAction::WebSocket, _) => methods.on(
            filter,
            |upgrade: WebSocketUpgrade, State(state): State<SharedState>| async move {
                ws::upgrade(upgrade, state)
            },
        ),
        (RouteAction::List(pagination), Some(route)) => methods.on(
            filter,
            move |State(state): State<SharedState>, query: PageQueryResult| {
                handlers::list(state, route, pagination.clone(), page_query(query))
            },
        ),
        (RouteAction::Read, Some(route)) => methods.on(
            filter,
            move |State(state): State<SharedState>, Path(params): PathParams| {
                handlers::read(state, route, params)
            },
        ),
        (RouteAction::Create, Some(route)) => methods.on(
            filter,
            move |State(state): State<SharedState>, body: Bytes| {
                handlers::create(state, route, body)
            },
        ),
        (RouteAction::Update, Some(route)) => methods.on(
            filter,
            move |State(state): State<SharedState>, Path(params): PathParams, body: Bytes| {
                handlers::update(state, route, params, body)
            },
        ),
        (RouteAction::Delete, Some(route)) => methods.on(
            filter,
            move |State(state): State<SharedState>, Path(params): PathParams| {
                handlers::delete(state, route, params)
            },
        ),
        (_, None) => {
            warn!(method = %binding.verb, path = %binding.path, "collection binding without a route, skipped");
            methods
        }
    }
}

fn page_query(query: PageQueryResult) -> PageQuery {
    query.map(|Query(q)| q).unwrap_or_default()
}
