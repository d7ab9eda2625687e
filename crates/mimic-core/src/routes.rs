//! The route table.
//!
//! [`RouteTable::build`] turns the configuration into an ordered list of
//! [`Binding`]s: one per route and declared verb, in configuration order,
//! plus the `WebSocket` endpoint. Two bindings may share a verb and path;
//! the transport can only hold one, so [`RouteTable::effective`] keeps the
//! last one and warns about the rest.
//!
//! Parameter names are unified per position: the first name bound after a
//! given prefix is reused by every later path sharing that prefix, so
//! `/users/:userId` and the `/users/{id}` suffix of a PUT on `/users` end
//! up as one transport path.

use std::collections::HashMap;
use std::sync::Arc;

use mimic_types::{Config, HttpVerb, MethodConfig, PaginationSpec, RouteConfig};
use tracing::warn;

/// What a binding does when a request reaches it.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteAction {
    /// Resolve a static or templated response.
    Resolve(Arc<MethodConfig>),
    /// List a CRUD collection, optionally paginated.
    List(Option<PaginationSpec>),
    /// Read one CRUD record by `{id}`.
    Read,
    /// Append a CRUD record.
    Create,
    /// Merge into the CRUD record at `{id}`.
    Update,
    /// Remove the CRUD record at `{id}`.
    Delete,
    /// Upgrade to the `WebSocket` event endpoint.
    WebSocket,
}

/// One verb bound at one full path.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Full path in the transport's syntax (`/api/users/{id}`).
    pub path: String,
    /// Index of the originating route in `Config::routes`. `None` for the
    /// `WebSocket` endpoint.
    pub route_index: Option<usize>,
    /// Handler selection.
    pub action: RouteAction,
}

/// All bindings sharing one path, with at most one binding per verb.
#[derive(Debug, Clone, PartialEq)]
pub struct PathBindings<'a> {
    /// The shared full path.
    pub path: &'a str,
    /// The winning binding of each verb, in verb order.
    pub bindings: Vec<&'a Binding>,
}

/// Ordered bindings materialized from a [`Config`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTable {
    bindings: Vec<Binding>,
}

impl RouteTable {
    /// Materialize every route, then the `WebSocket` endpoint when enabled.
    pub fn build(config: &Config) -> Self {
        let base = config.server.base_path.as_str();
        let mut bindings = Vec::new();

        for (index, route) in config.routes.iter().enumerate() {
            if route.crud {
                bind_crud(&mut bindings, base, index, route);
            } else {
                for (verb, method) in &route.methods {
                    let method = Arc::new(method.clone());
                    bindings.push(Binding {
                        verb: *verb,
                        path: verb_path(base, &route.path, *verb),
                        route_index: Some(index),
                        action: RouteAction::Resolve(method),
                    });
                }
            }
        }

        if let Some(ws) = config.websocket.as_ref().filter(|ws| ws.enabled) {
            bindings.push(Binding {
                verb: HttpVerb::Get,
                path: mount("", &ws.path),
                route_index: None,
                action: RouteAction::WebSocket,
            });
        }

        let mut names = ParamNames::default();
        for binding in &mut bindings {
            binding.path = names.unify(&binding.path);
        }

        Self { bindings }
    }

    /// Every binding, in binding order, including shadowed ones.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Bindings grouped per path in first-appearance order.
    ///
    /// When several bindings share a verb and path the last one wins; each
    /// shadowed binding is reported with a warning.
    pub fn effective(&self) -> Vec<PathBindings<'_>> {
        let mut groups: Vec<PathBindings<'_>> = Vec::new();

        for binding in &self.bindings {
            let group = match groups.iter_mut().position(|g| g.path == binding.path) {
                Some(i) => groups.get_mut(i),
                None => {
                    groups.push(PathBindings {
                        path: &binding.path,
                        bindings: Vec::new(),
                    });
                    groups.last_mut()
                }
            };
            let Some(group) = group else { continue };

            if let Some(slot) = group.bindings.iter_mut().find(|b| b.verb == binding.verb) {
                warn!(
                    method = %binding.verb,
                    path = %binding.path,
                    shadowed_route = ?slot.route_index,
                    winning_route = ?binding.route_index,
                    "duplicate binding, last bound handler wins"
                );
                *slot = binding;
            } else {
                group.bindings.push(binding);
            }
        }

        for group in &mut groups {
            group.bindings.sort_by_key(|b| b.verb);
        }
        groups
    }

    /// The first binding for `verb` at the full `path`.
    pub fn find(&self, path: &str, verb: HttpVerb) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| b.verb == verb && b.path == path)
    }
}

fn bind_crud(bindings: &mut Vec<Binding>, base: &str, index: usize, route: &RouteConfig) {
    let collection = mount(base, &route.path);
    let single = format!("{}/{{id}}", collection.trim_end_matches('/'));

    for verb in route.methods.keys() {
        let (path, action) = match verb {
            HttpVerb::Get => {
                let pagination = route
                    .method(HttpVerb::Get)
                    .and_then(MethodConfig::active_pagination)
                    .cloned();
                bindings.push(Binding {
                    verb: HttpVerb::Get,
                    path: collection.clone(),
                    route_index: Some(index),
                    action: RouteAction::List(pagination),
                });
                (single.clone(), RouteAction::Read)
            }
            HttpVerb::Post => (collection.clone(), RouteAction::Create),
            HttpVerb::Put => (single.clone(), RouteAction::Update),
            HttpVerb::Delete => (single.clone(), RouteAction::Delete),
        };
        bindings.push(Binding {
            verb: *verb,
            path,
            route_index: Some(index),
            action,
        });
    }
}

/// Parameter names registered so far, keyed by the path prefix up to and
/// including the parameter, with parameter names erased.
#[derive(Debug, Default)]
struct ParamNames {
    registered: HashMap<String, String>,
}

impl ParamNames {
    /// Rewrite every `{param}` segment of `path` to the name first
    /// registered at its position.
    fn unify(&mut self, path: &str) -> String {
        let mut shape = String::new();
        let mut segments = Vec::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            shape.push('/');
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    shape.push_str("{}");
                    let name = self
                        .registered
                        .entry(shape.clone())
                        .or_insert_with(|| name.to_owned());
                    segments.push(format!("{{{name}}}"));
                }
                None => {
                    shape.push_str(segment);
                    segments.push(segment.to_owned());
                }
            }
        }

        if segments.is_empty() {
            "/".to_owned()
        } else {
            format!("/{}", segments.join("/"))
        }
    }
}

/// Full path of `verb` on a route: PUT and DELETE get an `/{id}` suffix.
fn verb_path(base: &str, path: &str, verb: HttpVerb) -> String {
    let full = mount(base, path);
    if verb.targets_single_resource() {
        format!("{}/{{id}}", full.trim_end_matches('/'))
    } else {
        full
    }
}

/// Join `base` and `path` with exactly one `/` and translate `:param`
/// segments into `{param}`. An empty result mounts at `/`.
pub fn mount(base: &str, path: &str) -> String {
    let segments = base
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => s.to_owned(),
        })
        .collect::<Vec<_>>();

    if segments.is_empty() {
        "/".to_owned()
    } else {
        format!("/{}", segments.join("/"))
    }
}
