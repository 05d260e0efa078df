use game_types::RowChange;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// Row-level change subscription shared by every store on one database.
///
/// Stores publish after each successful write; subscribers that fall behind
/// see `RecvError::Lagged` and should reload.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<RowChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RowChange> {
        self.sender.subscribe()
    }

    pub fn publish(&self, change: RowChange) {
        let table = change.table();
        match self.sender.send(change) {
            Ok(receivers) => tracing::debug!("Published {} change to {} subscribers", table, receivers),
            Err(_) => tracing::trace!("No subscribers for {} change", table),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::ChangeKind;

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let feed = ChangeFeed::default();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(RowChange::OnlinePlayers {
            kind: ChangeKind::Insert,
            username: "alice".to_string(),
        });

        assert_eq!(first.recv().await.unwrap().table(), "online_players");
        assert_eq!(second.recv().await.unwrap().kind(), ChangeKind::Insert);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let feed = ChangeFeed::new(4);
        feed.publish(RowChange::OnlinePlayers {
            kind: ChangeKind::Delete,
            username: "bob".to_string(),
        });
        assert_eq!(feed.subscriber_count(), 0);
    }
}
