//! Realtime notifications pushed to connected dashboards after a mutation.

use std::future::Future;

use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

pub const REDIS_CHANNEL: &str = "algodesk:events";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StrategyUpdate {
        user_id: i64,
        strategy_id: i64,
        action: String,
    },
    DashboardUpdate {
        user_id: i64,
        reason: String,
    },
}

impl Event {
    pub fn user_id(&self) -> i64 {
        match self {
            Event::StrategyUpdate { user_id, .. } | Event::DashboardUpdate { user_id, .. } => *user_id,
        }
    }
}

/// Fan-out of post-mutation events to every websocket subscriber,
/// optionally mirrored to a Redis channel for other instances.
#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Event>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Mirror every event to `REDIS_CHANNEL` over one shared connection
    pub async fn with_redis(self, redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tokio::spawn(forward_events(self.subscribe(), move |payload| {
            let mut conn = conn.clone();
            async move { conn.publish::<_, _, ()>(REDIS_CHANNEL, payload).await }
        }));
        Ok(self)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    pub fn emit_strategy_update(&self, user_id: i64, strategy_id: i64, action: &str) {
        self.emit(Event::StrategyUpdate {
            user_id,
            strategy_id,
            action: action.to_string(),
        });
    }

    pub fn emit_dashboard_update(&self, user_id: i64, reason: &str) {
        self.emit(Event::DashboardUpdate {
            user_id,
            reason: reason.to_string(),
        });
    }

    fn emit(&self, event: Event) {
        // No connected dashboards is the normal case, not an error
        match self.sender.send(event) {
            Ok(receivers) => debug!("Event delivered to {} subscribers", receivers),
            Err(_) => debug!("Event dropped, no subscribers"),
        }
    }
}

/// Publish each event as JSON until the notifier is dropped
async fn forward_events<F, Fut>(mut rx: broadcast::Receiver<Event>, mut publish: F)
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = redis::RedisResult<()>>,
{
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Redis mirror lagging, skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize event for Redis: {}", e);
                continue;
            }
        };
        if let Err(e) = publish(payload).await {
            warn!("Failed to publish event to Redis: {}", e);
        }
    }
    debug!("Redis mirror stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = Notifier::new(16);
        let mut rx = notifier.subscribe();

        notifier.emit_strategy_update(7, 3, "created");
        notifier.emit_dashboard_update(7, "wallet");

        assert_eq!(
            rx.recv().await.unwrap(),
            Event::StrategyUpdate { user_id: 7, strategy_id: 3, action: "created".to_string() }
        );
        let second = rx.recv().await.unwrap();
        assert_eq!(second.user_id(), 7);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let notifier = Notifier::new(4);
        notifier.emit_dashboard_update(1, "nobody listening");
    }

    #[tokio::test]
    async fn test_forward_events_publishes_json_until_closed() {
        let notifier = Notifier::new(16);
        let rx = notifier.subscribe();
        notifier.emit_dashboard_update(3, "wallet");
        notifier.emit_strategy_update(3, 9, "started");
        drop(notifier);

        let published = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = published.clone();
        forward_events(rx, move |payload| {
            sink.lock().unwrap().push(payload);
            async { Ok(()) }
        })
        .await;

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert!(published[0].contains("\"reason\":\"wallet\""));
        assert!(published[1].contains("\"action\":\"started\""));
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::DashboardUpdate { user_id: 5, reason: "subscription".to_string() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "dashboard_update");
        assert_eq!(json["user_id"], 5);
        assert_eq!(json["reason"], "subscription");
    }
}
