//! `WebSocket` event dispatch.
//!
//! The [`EventDispatcher`] is transport-agnostic: it turns inbound text
//! into the reply [`Envelope`] (if any) and expands interval pushes. The
//! server owns the sockets and the per-connection timers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use mimic_template::{Repeat, TemplateExpander};
use mimic_types::{Envelope, InboundMessage, WebSocketConfig, WebSocketEventConfig};
use tracing::{debug, warn};

/// Resolves event names to configured mock data.
#[derive(Clone)]
pub struct EventDispatcher {
    events: BTreeMap<String, WebSocketEventConfig>,
    expander: Arc<dyn TemplateExpander>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl EventDispatcher {
    /// Create a dispatcher for the configured events. A missing section
    /// yields a dispatcher that never replies.
    pub fn new(config: Option<&WebSocketConfig>, expander: Arc<dyn TemplateExpander>) -> Self {
        Self {
            events: config.map(|ws| ws.events.clone()).unwrap_or_default(),
            expander,
        }
    }

    /// Handle one inbound text frame.
    ///
    /// Returns the reply for a known event whose mock is enabled. Malformed
    /// messages and unknown or disabled events yield `None`.
    pub fn reply(&self, text: &str) -> Option<Envelope> {
        let message = match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "ignoring malformed websocket message");
                return None;
            }
        };

        let Some(config) = self.events.get(&message.event) else {
            debug!(event = %message.event, "no such websocket event");
            return None;
        };
        if !config.mock.enabled {
            debug!(event = %message.event, "websocket event disabled");
            return None;
        }
        self.expand(&message.event, config)
    }

    /// Expand an interval push for `event`, regardless of whether its mock
    /// answers requests.
    pub fn push(&self, event: &str) -> Option<Envelope> {
        let config = self.events.get(event)?;
        self.expand(event, config)
    }

    /// Every event with a push interval, in name order.
    pub fn interval_events(&self) -> Vec<(String, Duration)> {
        self.events
            .iter()
            .filter_map(|(name, config)| {
                config
                    .mock
                    .interval_millis
                    .filter(|ms| *ms > 0)
                    .map(|ms| (name.clone(), Duration::from_millis(ms)))
            })
            .collect()
    }

    fn expand(&self, event: &str, config: &WebSocketEventConfig) -> Option<Envelope> {
        match self.expander.expand(&config.mock.template, Repeat::Once) {
            Ok(expansion) => Some(Envelope::new(event, expansion.into_value())),
            Err(e) => {
                warn!(event, error = %e, "websocket template expansion failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use mimic_template::MockEngine;
    use serde_json::json;

    use super::*;

    fn dispatcher() -> EventDispatcher {
        let config: WebSocketConfig = serde_json::from_value(json!({
            "enabled": true,
            "path": "/ws",
            "events": {
                "ping": { "mock": { "enabled": true, "template": { "pong": true, "at": "@datetime" } } },
                "tick": { "mock": { "enabled": false, "template": { "n|1-9": 1 }, "intervalMillis": 250 } },
                "broken": { "mock": { "enabled": true, "template": "@nope" } }
            }
        }))
        .unwrap();
        EventDispatcher::new(Some(&config), Arc::new(MockEngine::new()))
    }

    #[test]
    fn replies_to_enabled_event() {
        let reply = dispatcher().reply(r#"{"event":"ping","extra":1}"#).unwrap();
        assert_eq!(reply.event, "ping");
        assert_eq!(reply.data["pong"], true);
        assert!(reply.data["at"].is_string());
    }

    #[test]
    fn ignores_unknown_disabled_and_malformed() {
        let dispatcher = dispatcher();
        assert!(dispatcher.reply(r#"{"event":"nope"}"#).is_none());
        assert!(dispatcher.reply(r#"{"event":"tick"}"#).is_none());
        assert!(dispatcher.reply("not json").is_none());
        assert!(dispatcher.reply(r#"{"name":"ping"}"#).is_none());
    }

    #[test]
    fn expansion_failure_yields_no_reply() {
        assert!(dispatcher().reply(r#"{"event":"broken"}"#).is_none());
    }

    #[test]
    fn pushes_ignore_enabled_flag() {
        let push = dispatcher().push("tick").unwrap();
        assert_eq!(push.event, "tick");
        let n = push.data["n"].as_i64().unwrap();
        assert!((1..=9).contains(&n));
    }

    #[test]
    fn lists_interval_events() {
        assert_eq!(
            dispatcher().interval_events(),
            vec![("tick".to_owned(), Duration::from_millis(250))]
        );
    }

    #[test]
    fn missing_section_never_replies() {
        let dispatcher = EventDispatcher::new(None, Arc::new(MockEngine::new()));
        assert!(dispatcher.reply(r#"{"event":"ping"}"#).is_none());
        assert!(dispatcher.interval_events().is_empty());
    }
}
