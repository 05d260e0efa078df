mod changes;
mod gameplay;
mod links;
mod lobby;

use chrono::Utc;
use game_core::{ExpiryPolicy, RankingTable, SessionEvent, SessionEventBus, SessionEventHandler};
use game_persistence::Stores;
use game_types::{GameRecord, Invitation, Notification, PlayerPresence, Room};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::deep_link::DeepLink;
use crate::error::SessionError;
use crate::sync::{ChannelSender, SyncHub};

/// What asked for a reload of the session's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Subscription,
    Poll,
    Manual,
}

/// The session's local view of the lobby and its current game.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub username: Option<String>,
    pub online: bool,
    pub online_players: Vec<PlayerPresence>,
    pub pending_invitations: Vec<Invitation>,
    pub rooms: Vec<Room>,
    pub current_game: Option<GameRecord>,
    pub location: DeepLink,
    last_refresh: Option<Instant>,
}

impl SessionState {
    fn new(location: DeepLink) -> Self {
        Self {
            username: None,
            online: false,
            online_players: Vec::new(),
            pending_invitations: Vec::new(),
            rooms: Room::merge_with_defaults(&[]),
            current_game: None,
            location,
            last_refresh: None,
        }
    }
}

/// One player's multiplayer session: presence, invitations and the game they
/// are in, kept in step with the stores and the game's sync channel.
pub struct MultiplayerSession {
    me: Weak<MultiplayerSession>,
    stores: Stores,
    hub: Arc<SyncHub>,
    rankings: Arc<RankingTable>,
    expiry: ExpiryPolicy,
    heartbeat_interval: Duration,
    poll_interval: Duration,
    state: RwLock<SessionState>,
    events: Mutex<SessionEventBus>,
    channel: Mutex<Option<ChannelSender>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MultiplayerSession {
    pub fn new(
        config: &Config,
        stores: Stores,
        hub: Arc<SyncHub>,
        rankings: Arc<RankingTable>,
        location: DeepLink,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            stores,
            hub,
            rankings,
            expiry: config.expiry_policy(),
            heartbeat_interval: config.heartbeat_interval(),
            poll_interval: config.poll_interval(),
            state: RwLock::new(SessionState::new(location)),
            events: Mutex::new(SessionEventBus::new()),
            channel: Mutex::new(None),
            listener: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn add_handler(&self, handler: Box<dyn SessionEventHandler>) {
        lock(&self.events).add_handler(handler);
    }

    /// Start the heartbeat, poll and change-feed tasks. Calling it again is a no-op.
    pub fn init(&self) {
        let mut tasks = lock(&self.tasks);
        if !tasks.is_empty() {
            return;
        }

        let heartbeat = self.me.clone();
        let heartbeat_every = self.heartbeat_interval;
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(heartbeat_every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(session) = heartbeat.upgrade() else {
                    break;
                };
                if let Err(e) = session.heartbeat().await {
                    warn!("Heartbeat failed: {}", e);
                }
            }
        }));

        let poller = self.me.clone();
        let poll_every = self.poll_interval;
        tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(session) = poller.upgrade() else {
                    break;
                };
                if let Err(e) = session.refresh(RefreshTrigger::Poll).await {
                    warn!("Poll refresh failed: {}", e);
                }
            }
        }));

        // Subscribe before spawning so no change published after init is missed
        let mut changes = self.stores.feed.subscribe();
        let subscriber = self.me.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                let change = changes.recv().await;
                let Some(session) = subscriber.upgrade() else {
                    break;
                };
                match change {
                    Ok(change) => {
                        if let Err(e) = session.handle_row_change(change).await {
                            warn!("Failed to handle row change: {}", e);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Change feed lagged by {} events, reloading", skipped);
                        if let Err(e) = session.refresh(RefreshTrigger::Subscription).await {
                            warn!("Reload after lag failed: {}", e);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));

        debug!("Session background tasks started");
    }

    /// Stop background work, leave the game channel and go offline.
    pub async fn dispose(&self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
        self.leave_channel();
        if let Err(e) = self.go_offline().await {
            warn!("Failed to go offline during shutdown: {}", e);
        }
        self.hub.prune().await;
        info!("Session disposed");
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn username(&self) -> Option<String> {
        self.state.read().await.username.clone()
    }

    pub async fn current_game(&self) -> Option<GameRecord> {
        self.state.read().await.current_game.clone()
    }

    pub async fn location(&self) -> DeepLink {
        self.state.read().await.location.clone()
    }

    pub fn rankings(&self) -> &RankingTable {
        &self.rankings
    }

    /// Reload presence, invitations, rooms and the current game.
    ///
    /// Poll-triggered reloads are skipped when any reload ran within the poll
    /// interval.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<(), SessionError> {
        let (me, game_id) = {
            let state = self.state.read().await;
            if trigger == RefreshTrigger::Poll
                && state
                    .last_refresh
                    .is_some_and(|last| last.elapsed() < self.poll_interval)
            {
                debug!("Skipping poll, refreshed recently");
                return Ok(());
            }
            match (&state.username, state.online) {
                (Some(me), true) => (me.clone(), state.current_game.as_ref().map(|g| g.id)),
                _ => return Ok(()),
            }
        };

        let now = Utc::now();
        let players = self
            .stores
            .presence
            .list_active(&me, self.expiry.presence_cutoff(now))
            .await
            .map_err(|e| self.store_failure("load online players", e))?;
        let invitations = self
            .stores
            .invitations
            .list_pending_for(&me, now)
            .await
            .map_err(|e| self.store_failure("load invitations", e))?;
        let rooms = match self.stores.rooms.list().await {
            Ok(stored) => Room::merge_with_defaults(&stored),
            Err(e) => {
                // Rooms are optional; fall back to the fixed list
                debug!("Room listing unavailable: {}", e);
                Room::merge_with_defaults(&[])
            }
        };
        let game = match game_id {
            Some(id) => self
                .stores
                .games
                .find(id)
                .await
                .map_err(|e| self.store_failure("load the current game", e))?,
            None => None,
        };

        let mut events = Vec::new();
        {
            let mut state = self.state.write().await;
            state.last_refresh = Some(Instant::now());
            if state.online_players != players {
                state.online_players = players.clone();
                events.push(SessionEvent::OnlinePlayersUpdated { players });
            }
            if state.pending_invitations != invitations {
                state.pending_invitations = invitations.clone();
                events.push(SessionEvent::InvitationsUpdated { invitations });
            }
            if state.rooms != rooms {
                state.rooms = rooms.clone();
                events.push(SessionEvent::RoomsUpdated { rooms });
            }
        }
        debug!("Refreshed session view ({:?})", trigger);
        self.emit_all(events);

        if let Some(game) = game {
            self.apply_store_record(game).await;
        }
        Ok(())
    }

    fn emit(&self, event: SessionEvent) {
        lock(&self.events).publish(event);
    }

    fn emit_all(&self, events: Vec<SessionEvent>) {
        if events.is_empty() {
            return;
        }
        let mut bus = lock(&self.events);
        for event in events {
            bus.publish(event);
        }
    }

    fn notify(&self, notification: Notification) {
        self.emit(SessionEvent::Notification(notification));
    }

    fn alert(&self, message: &str) {
        self.emit(SessionEvent::Alert {
            message: message.to_string(),
        });
    }

    /// Log and surface a store failure, then hand back the error to return.
    fn store_failure(&self, action: &str, err: anyhow::Error) -> SessionError {
        error!("Failed to {}: {:#}", action, err);
        self.notify(Notification::error(format!("Failed to {}", action)));
        SessionError::Store(err)
    }

    async fn require_username(&self) -> Result<String, SessionError> {
        self.state
            .read()
            .await
            .username
            .clone()
            .ok_or(SessionError::NotOnline)
    }

    async fn set_location(&self, location: DeepLink) {
        let url = location.to_string();
        self.state.write().await.location = location;
        self.emit(SessionEvent::LocationChanged { url });
    }
}

/// Lock a std mutex, recovering the data if a handler panicked while holding it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
