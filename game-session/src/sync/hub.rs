use game_types::{GameState, SyncMessage};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::error::SessionError;

/// Event name for game state payloads.
pub const STATE_EVENT: &str = "state";

const DEFAULT_TOPIC_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One message on a topic, as it travels between members.
#[derive(Debug, Clone)]
pub struct SyncEnvelope {
    pub from: MemberId,
    pub event: String,
    pub payload: Value,
}

/// Named broadcast topics shared by every session in the process.
pub struct SyncHub {
    topics: RwLock<HashMap<String, broadcast::Sender<SyncEnvelope>>>,
    capacity: usize,
}

impl SyncHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TOPIC_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub async fn join(&self, topic: &str) -> GameChannel {
        let (sender, receiver) = {
            let mut topics = self.topics.write().await;
            let sender = topics
                .entry(topic.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0)
                .clone();
            let receiver = sender.subscribe();
            (sender, receiver)
        };

        let member = MemberId::new();
        tracing::debug!("Member {} joined {}", member, topic);

        GameChannel {
            sender: ChannelSender {
                topic: topic.to_string(),
                member,
                sender,
            },
            receiver: ChannelReceiver { member, receiver },
        }
    }

    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Drop topics nobody is listening on any more.
    pub async fn prune(&self) -> usize {
        let mut topics = self.topics.write().await;
        let before = topics.len();
        topics.retain(|_, sender| sender.receiver_count() > 0);
        let removed = before - topics.len();
        if removed > 0 {
            tracing::debug!("Pruned {} idle sync topics", removed);
        }
        removed
    }
}

impl Default for SyncHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A member's subscription to one topic.
pub struct GameChannel {
    sender: ChannelSender,
    receiver: ChannelReceiver,
}

impl GameChannel {
    pub fn topic(&self) -> &str {
        &self.sender.topic
    }

    pub fn split(self) -> (ChannelSender, ChannelReceiver) {
        (self.sender, self.receiver)
    }
}

#[derive(Clone)]
pub struct ChannelSender {
    topic: String,
    member: MemberId,
    sender: broadcast::Sender<SyncEnvelope>,
}

impl ChannelSender {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish a game state to the other members. Returns how many received it.
    pub fn send_state(&self, state: &GameState) -> Result<usize, SessionError> {
        let payload = serde_json::to_value(SyncMessage {
            game_state: state.clone(),
        })
        .map_err(|e| SessionError::Channel(format!("failed to encode state: {}", e)))?;

        let envelope = SyncEnvelope {
            from: self.member,
            event: STATE_EVENT.to_string(),
            payload,
        };
        // Only our own receiver may be listening; that is not an error.
        let delivered = self
            .sender
            .send(envelope)
            .map(|n| n.saturating_sub(1))
            .unwrap_or(0);
        Ok(delivered)
    }
}

pub struct ChannelReceiver {
    member: MemberId,
    receiver: broadcast::Receiver<SyncEnvelope>,
}

impl ChannelReceiver {
    /// Next message from another member. `None` once the topic is gone.
    pub async fn recv(&mut self) -> Option<SyncEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.from == self.member => continue,
                Ok(envelope) => return Some(envelope),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Sync receiver lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// The game state carried by a `state` envelope.
pub fn state_payload(envelope: &SyncEnvelope) -> Option<&Value> {
    if envelope.event != STATE_EVENT {
        return None;
    }
    envelope.payload.get("game_state")
}
