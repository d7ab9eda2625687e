//! `WebSocket` connection lifecycle.
//!
//! Each connection answers `{"event": name}` requests through the
//! [`EventDispatcher`](mimic_core::events::EventDispatcher) and, for every
//! event with an interval, runs one push timer scoped to the connection.
//! Timers live in a [`PushTimers`] set owned by the connection task and
//! are shut down when the connection closes, however it closes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::Response;
use mimic_types::Envelope;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::state::AppState;

/// Pushes buffered per connection before timers wait for the socket.
const PUSH_BUFFER: usize = 32;

/// Upgrade an HTTP request to an event connection.
pub fn upgrade(ws: WebSocketUpgrade, state: Arc<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Serve one connection until the client leaves or a send fails.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let (tx, mut rx) = mpsc::channel::<Envelope>(PUSH_BUFFER);
    let timers = PushTimers::start(&state, &tx);
    drop(tx);

    loop {
        tokio::select! {
            // An interval timer produced a push.
            Some(envelope) = rx.recv() => {
                if send(&mut socket, &envelope).await.is_err() {
                    debug!("WebSocket client disconnected (push failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Some(reply) = state.events.reply(text.as_str()) else {
                            continue;
                        };
                        if send(&mut socket, &reply).await.is_err() {
                            debug!("WebSocket client disconnected (reply failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(Message::Binary(_) | Message::Pong(_))) => {}
                }
            }
        }
    }

    timers.shutdown().await;
}

async fn send(socket: &mut WebSocket, envelope: &Envelope) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(envelope) {
        Ok(j) => j,
        Err(e) => {
            warn!(event = %envelope.event, "Failed to serialize envelope: {e}");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

/// The interval push tasks of one connection.
///
/// Dropping the set aborts every task, so timers cannot outlive the
/// connection task even if it is cancelled mid-flight.
#[derive(Debug)]
pub struct PushTimers {
    tasks: JoinSet<()>,
}

impl PushTimers {
    /// Start one timer per interval event, each feeding `tx`.
    ///
    /// The first push of each timer happens one period after the
    /// connection opens.
    pub fn start(state: &Arc<AppState>, tx: &mpsc::Sender<Envelope>) -> Self {
        let mut tasks = JoinSet::new();
        for (event, period) in state.events.interval_events() {
            let tx = tx.clone();
            let dispatcher = state.events.clone();
            let guard = state.track_push_timer();
            tasks.spawn(async move {
                let _guard = guard;
                let mut ticker = interval_after(period);
                loop {
                    ticker.tick().await;
                    let Some(envelope) = dispatcher.push(&event) else {
                        continue;
                    };
                    if tx.send(envelope).await.is_err() {
                        break;
                    }
                }
            });
        }
        Self { tasks }
    }

    /// Number of timers still running.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no timer is running.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort every timer and wait until all of them have stopped.
    pub async fn shutdown(mut self) {
        self.tasks.shutdown().await;
    }
}

fn interval_after(period: Duration) -> time::Interval {
    let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mimic_types::{Config, ServerConfig};

    use super::*;

    fn state_with_intervals() -> Arc<AppState> {
        let config: Config = serde_json::from_value(serde_json::json!({
            "server": {},
            "websocket": { "enabled": true, "path": "/ws", "events": {
                "a": { "mock": { "enabled": false, "template": 1, "intervalMillis": 20 } },
                "b": { "mock": { "enabled": true, "template": 2, "intervalMillis": 30 } },
                "c": { "mock": { "enabled": true, "template": 3 } }
            } }
        }))
        .unwrap();
        Arc::new(AppState::new(config, None).unwrap())
    }

    #[tokio::test]
    async fn timers_push_and_stop_on_shutdown() {
        let state = state_with_intervals();
        let (tx, mut rx) = mpsc::channel(PUSH_BUFFER);
        let timers = PushTimers::start(&state, &tx);
        assert_eq!(timers.len(), 2);
        assert_eq!(state.active_push_timers(), 2);

        let first = time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(first.event == "a" || first.event == "b");

        timers.shutdown().await;
        assert_eq!(state.active_push_timers(), 0);
    }

    #[tokio::test]
    async fn dropping_timers_stops_them() {
        let state = state_with_intervals();
        let (tx, _rx) = mpsc::channel(PUSH_BUFFER);
        drop(PushTimers::start(&state, &tx));

        time::timeout(Duration::from_secs(2), async {
            while state.active_push_timers() > 0 {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn no_intervals_means_no_timers() {
        let config = Config {
            server: ServerConfig::default(),
            routes: Vec::new(),
            websocket: None,
        };
        let state = Arc::new(AppState::new(config, None).unwrap());
        let (tx, _rx) = mpsc::channel(PUSH_BUFFER);
        assert!(PushTimers::start(&state, &tx).is_empty());
    }
}
