use crate::display::Display;
use crate::events::{CollarStateChangedEvent, EventBus};
use crate::models::friend::Friend;
use crate::models::group::{Group, GroupType, Invitation, Member};
use crate::models::player::{Identity, Player, Profile};
use crate::models::types::Location;
use crate::models::waypoint::Waypoint;
use crate::services::ServiceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollarState {
    Disconnected,
    Connecting,
    Connected,
}

impl CollarState {
    pub fn name(&self) -> &'static str {
        match self {
            CollarState::Disconnected => "disconnected",
            CollarState::Connecting => "connecting",
            CollarState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for CollarState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// Mutating calls return nothing: the backend reports failures through the
// display itself.

pub trait Friends: Send + Sync {
    fn add_friend(&self, identity: &Identity);
    fn remove_friend(&self, identity: &Identity);
    fn list(&self) -> Vec<Friend>;
}

pub trait Groups: Send + Sync {
    fn create(&self, name: &str, group_type: GroupType, players: &[Player]);
    fn delete(&self, group: &Group);
    fn leave(&self, group: &Group);
    fn accept(&self, invitation: &Invitation);
    fn invite(&self, group: &Group, players: &[Player]);
    fn remove_member(&self, group: &Group, member: &Member);
    /// Groups of every type the local player belongs to.
    fn all(&self) -> Vec<Group>;
    fn invitations(&self) -> Vec<Invitation>;
}

pub trait Locations: Send + Sync {
    fn start_sharing_with(&self, group: &Group);
    fn stop_sharing_with(&self, group: &Group);
    fn is_sharing_with(&self, group: &Group) -> bool;
    fn add_waypoint(&self, name: &str, location: Location);
    fn add_group_waypoint(&self, group: &Group, name: &str, location: Location);
    fn remove_waypoint(&self, waypoint: &Waypoint);
    fn remove_group_waypoint(&self, group: &Group, waypoint: &Waypoint);
    fn private_waypoints(&self) -> Vec<Waypoint>;
    fn group_waypoints(&self, group: &Group) -> Vec<Waypoint>;
}

/// A live session with the collar service.
pub trait Collar: Send + Sync {
    fn state(&self) -> CollarState;
    /// Profile of the local player.
    fn me(&self) -> Profile;
    /// Looks a profile up by name, case-insensitively.
    fn lookup_profile(&self, name: &str) -> Option<Profile>;
    fn friends(&self) -> &dyn Friends;
    fn groups(&self) -> &dyn Groups;
    fn location(&self) -> &dyn Locations;
}

/// Opens collar sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Collar>, ServiceError>;
}

struct Connection {
    state: CollarState,
    collar: Option<Arc<dyn Collar>>,
    connected_at: Option<DateTime<Utc>>,
    /// Bumped on every connect/disconnect so a stale connect attempt can tell
    /// it was superseded.
    generation: u64,
}

/// Owns the connection to the collar service.
pub struct CollarService {
    connector: Arc<dyn Connector>,
    display: Arc<dyn Display>,
    events: Arc<EventBus>,
    runtime: Option<tokio::runtime::Handle>,
    conn: RwLock<Connection>,
}

impl CollarService {
    pub fn new(
        connector: Arc<dyn Connector>,
        display: Arc<dyn Display>,
        events: Arc<EventBus>,
        runtime: Option<tokio::runtime::Handle>,
    ) -> Self {
        Self {
            connector,
            display,
            events,
            runtime,
            conn: RwLock::new(Connection {
                state: CollarState::Disconnected,
                collar: None,
                connected_at: None,
                generation: 0,
            }),
        }
    }

    pub fn state(&self) -> CollarState {
        self.conn.read().state
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.conn.read().connected_at
    }

    /// Starts connecting in the background and returns immediately.
    pub fn connect(self: &Arc<Self>) {
        let Some(handle) = self.runtime.clone() else {
            let e = ServiceError::NoRuntime;
            tracing::error!(error = %e, "connect requested");
            self.display.display_message(&format!("Could not connect to collar: {e}"));
            return;
        };
        let this = self.clone();
        handle.spawn(async move {
            if let Err(e) = this.connect_now().await {
                tracing::warn!(error = %e, "collar connect failed");
            }
        });
    }

    /// Connects and waits for the outcome.
    pub async fn connect_now(&self) -> Result<(), ServiceError> {
        let generation = {
            let mut conn = self.conn.write();
            if conn.state != CollarState::Disconnected {
                tracing::debug!(state = %conn.state, "connect ignored");
                return Ok(());
            }
            conn.state = CollarState::Connecting;
            conn.generation += 1;
            conn.generation
        };
        self.transition(CollarState::Disconnected, CollarState::Connecting);

        match self.connector.connect().await {
            Ok(collar) => {
                let now = Utc::now();
                {
                    let mut conn = self.conn.write();
                    if conn.generation != generation {
                        tracing::debug!("connect superseded by disconnect");
                        return Ok(());
                    }
                    conn.state = CollarState::Connected;
                    conn.collar = Some(collar);
                    conn.connected_at = Some(now);
                }
                tracing::info!(at = %now, "collar connected");
                self.transition(CollarState::Connecting, CollarState::Connected);
                self.display.display_info_message("Collar connected");
                Ok(())
            }
            Err(e) => {
                {
                    let mut conn = self.conn.write();
                    if conn.generation != generation {
                        tracing::debug!(error = %e, "superseded connect failed");
                        return Err(e);
                    }
                    conn.state = CollarState::Disconnected;
                }
                self.transition(CollarState::Connecting, CollarState::Disconnected);
                self.display.display_message(&format!("Could not connect to collar: {e}"));
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        let previous = {
            let mut conn = self.conn.write();
            let previous = conn.state;
            conn.generation += 1;
            conn.state = CollarState::Disconnected;
            conn.collar = None;
            conn.connected_at = None;
            previous
        };
        if previous != CollarState::Disconnected {
            tracing::info!("collar disconnected");
            self.transition(previous, CollarState::Disconnected);
        }
    }

    /// Runs `f` against the connected session, if there is one.
    pub fn with<R>(&self, f: impl FnOnce(&dyn Collar) -> R) -> Option<R> {
        let collar = self.conn.read().collar.clone()?;
        Some(f(collar.as_ref()))
    }

    pub fn with_or<R>(&self, f: impl FnOnce(&dyn Collar) -> R, otherwise: impl FnOnce() -> R) -> R {
        self.with(f).unwrap_or_else(otherwise)
    }

    fn transition(&self, previous: CollarState, state: CollarState) {
        self.events.publish(CollarStateChangedEvent { previous, state });
    }
}

impl std::fmt::Debug for CollarService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let conn = self.conn.read();
        f.debug_struct("CollarService")
            .field("state", &conn.state)
            .field("connected_at", &conn.connected_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BufferDisplay;
    use crate::events::{Handlers, Preference, Subscriber};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Blocks every attempt until released, then refuses it.
    #[derive(Default)]
    struct Gate {
        calls: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl Connector for Gate {
        async fn connect(&self) -> Result<Arc<dyn Collar>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Err(ServiceError::Connect("refused".into()))
        }
    }

    #[derive(Default)]
    struct Transitions {
        seen: parking_lot::Mutex<Vec<(CollarState, CollarState)>>,
    }

    impl Subscriber for Transitions {
        fn subscriptions(&self, handlers: &mut Handlers<Self>) {
            handlers.on(Preference::Caller, |me: &Self, e: &CollarStateChangedEvent| {
                me.seen.lock().push((e.previous, e.state));
                Ok(())
            });
        }
    }

    fn service(gate: &Arc<Gate>) -> (Arc<CollarService>, Arc<BufferDisplay>, Arc<Transitions>) {
        let display = Arc::new(BufferDisplay::new());
        let events = Arc::new(EventBus::default());
        let transitions = Arc::new(Transitions::default());
        events.subscribe(&transitions);
        let connector: Arc<dyn Connector> = gate.clone();
        let svc = Arc::new(CollarService::new(
            connector,
            display.clone(),
            events,
            Some(tokio::runtime::Handle::current()),
        ));
        (svc, display, transitions)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn t_connecting_is_visible_and_a_second_connect_is_ignored() {
        let gate = Arc::new(Gate::default());
        let (svc, display, transitions) = service(&gate);

        svc.connect();
        settle().await;
        assert_eq!(svc.state(), CollarState::Connecting);
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);

        svc.connect();
        settle().await;
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);

        gate.release.notify_one();
        settle().await;
        assert_eq!(svc.state(), CollarState::Disconnected);
        assert_eq!(
            display.texts(),
            vec!["Could not connect to collar: could not connect: refused".to_string()]
        );
        assert_eq!(
            *transitions.seen.lock(),
            vec![
                (CollarState::Disconnected, CollarState::Connecting),
                (CollarState::Connecting, CollarState::Disconnected),
            ]
        );
    }

    #[tokio::test]
    async fn t_disconnect_during_connect_wins() {
        let gate = Arc::new(Gate::default());
        let (svc, display, transitions) = service(&gate);

        svc.connect();
        settle().await;
        svc.disconnect();
        assert_eq!(svc.state(), CollarState::Disconnected);

        gate.release.notify_one();
        settle().await;
        assert_eq!(svc.state(), CollarState::Disconnected);
        assert!(display.texts().is_empty());
        assert_eq!(
            *transitions.seen.lock(),
            vec![
                (CollarState::Disconnected, CollarState::Connecting),
                (CollarState::Connecting, CollarState::Disconnected),
            ]
        );
    }
}
