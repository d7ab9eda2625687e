//! The declarative configuration document.
//!
//! Field names are camelCase on the wire. The legacy names used by older
//! `data.json` files (`baseProxy`, `response`, `total`, `type`,
//! `interval`) are accepted as aliases; serialization always writes the
//! canonical names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::verb::HttpVerb;

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// Root configuration document, loaded once at startup.
///
/// Only the CRUD repository writes it back to storage, with the live
/// collections spliced into the owning routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Listening port and base path.
    pub server: ServerConfig,

    /// Routes in binding order.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Optional `WebSocket` endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket: Option<WebSocketConfig>,
}

/// Server section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix under which every route is mounted (e.g. `/api`).
    #[serde(default, alias = "baseProxy")]
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_path: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// A configured path and the verbs it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// Path relative to the base path. Express-style `:param` segments
    /// are allowed.
    pub path: String,

    /// Opt-in for the CRUD mutation extension. The GET method's
    /// `staticResponse` array becomes a mutable, persisted collection.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub crud: bool,

    /// Per-verb configuration.
    #[serde(default)]
    pub methods: BTreeMap<HttpVerb, MethodConfig>,
}

impl RouteConfig {
    /// Configuration for `verb`, if declared.
    pub fn method(&self, verb: HttpVerb) -> Option<&MethodConfig> {
        self.methods.get(&verb)
    }
}

/// Shape hint for a method's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// The response is a list.
    Array,
    /// The response is a single object.
    Object,
}

/// Configuration of one verb on one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodConfig {
    /// Informational shape hint.
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ResponseKind>,

    /// Literal response body, used when no mock is active or the mock
    /// fails to expand.
    #[serde(default, alias = "response", skip_serializing_if = "Option::is_none")]
    pub static_response: Option<Value>,

    /// Templated mock data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock: Option<MockSpec>,

    /// Pagination applied to list responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationSpec>,

    /// Documentation of the expected request body. Not enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<BTreeMap<String, String>>,
}

impl MethodConfig {
    /// The mock to expand, when one is enabled and carries a template.
    pub fn active_mock(&self) -> Option<&MockSpec> {
        self.mock
            .as_ref()
            .filter(|mock| mock.enabled && mock.template.is_some())
    }

    /// The pagination settings, when enabled.
    pub fn active_pagination(&self) -> Option<&PaginationSpec> {
        self.pagination.as_ref().filter(|p| p.enabled)
    }
}

/// Templated mock data for a method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockSpec {
    /// Whether the template is used.
    #[serde(default)]
    pub enabled: bool,

    /// Number of items to generate. Absent or `1` yields a single item.
    #[serde(default, alias = "total", skip_serializing_if = "Option::is_none")]
    pub repeat_count: Option<u64>,

    /// Shape description handed to the template expander.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
}

/// Page-slicing settings for list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSpec {
    /// Whether pagination applies.
    #[serde(default)]
    pub enabled: bool,

    /// Default page size when the request does not set `pageSize`.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Total reported in `X-Total-Count` when the body is not a list.
    #[serde(default)]
    pub total_count: u64,
}

impl Default for PaginationSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            page_size: default_page_size(),
            total_count: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `WebSocket` endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketConfig {
    /// Whether the endpoint is served.
    #[serde(default)]
    pub enabled: bool,

    /// Absolute path of the endpoint (not prefixed by the base path).
    #[serde(default = "default_ws_path")]
    pub path: String,

    /// Events keyed by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, WebSocketEventConfig>,
}

/// A single named `WebSocket` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketEventConfig {
    /// Data generated for this event.
    pub mock: WebSocketEventMock,
}

/// Mock settings of a `WebSocket` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketEventMock {
    /// Whether inbound requests for this event get a reply.
    #[serde(default)]
    pub enabled: bool,

    /// Shape description handed to the template expander.
    #[serde(default)]
    pub template: Value,

    /// Period of unsolicited pushes, in milliseconds.
    #[serde(default, alias = "interval", skip_serializing_if = "Option::is_none")]
    pub interval_millis: Option<u64>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_port() -> u16 {
    8080
}

const fn default_page_size() -> usize {
    10
}

fn default_ws_path() -> String {
    "/ws".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_field_names() {
        let json = r#"{
            "server": { "port": 3000, "baseProxy": "/api" },
            "routes": [{
                "path": "/users",
                "methods": {
                    "get": {
                        "type": "array",
                        "response": [],
                        "mock": { "enabled": true, "total": 5, "template": { "name": "@name" } }
                    }
                }
            }],
            "websocket": {
                "enabled": true,
                "path": "/ws",
                "events": { "tick": { "mock": { "enabled": false, "template": 1, "interval": 500 } } }
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.base_path, "/api");
        let get = config.routes[0].method(HttpVerb::Get).unwrap();
        assert_eq!(get.kind, Some(ResponseKind::Array));
        assert_eq!(get.static_response, Some(serde_json::json!([])));
        assert_eq!(get.mock.as_ref().unwrap().repeat_count, Some(5));
        let ws = config.websocket.unwrap();
        assert_eq!(ws.events["tick"].mock.interval_millis, Some(500));
    }

    #[test]
    fn serializes_canonical_names() {
        let json = r#"{
            "server": { "baseProxy": "/api" },
            "routes": [{ "path": "/a", "methods": { "GET": { "response": 1 } } }]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&config).unwrap();

        assert_eq!(out["server"]["basePath"], "/api");
        assert_eq!(out["server"]["port"], 8080);
        assert_eq!(out["routes"][0]["methods"]["get"]["staticResponse"], 1);
        assert!(out["routes"][0].get("crud").is_none());
        assert!(out.get("websocket").is_none());
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let json = r#"{
            "server": {},
            "routes": [{ "path": "/a", "methods": { "patch": {} } }]
        }"#;
        let err = serde_json::from_str::<Config>(json).unwrap_err();
        assert!(err.to_string().contains("patch"));
    }

    #[test]
    fn active_mock_requires_template() {
        let method = MethodConfig {
            mock: Some(MockSpec {
                enabled: true,
                repeat_count: None,
                template: None,
            }),
            ..MethodConfig::default()
        };
        assert!(method.active_mock().is_none());
    }
}
