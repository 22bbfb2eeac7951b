use crate::models::player::{Player, PlayerSnapshot};
use crate::models::types::Dimension;
use parking_lot::RwLock;

/// Read-only view of the world the client is in.
pub trait World: Send + Sync {
    /// `None` when no world is loaded.
    fn current_player(&self) -> Option<PlayerSnapshot>;
    /// Players currently visible, including the local one.
    fn players(&self) -> Vec<Player>;

    fn find_player(&self, name: &str) -> Option<Player> {
        self.players()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// World state pushed in by the host.
#[derive(Debug, Default)]
pub struct StaticWorld {
    current: RwLock<Option<PlayerSnapshot>>,
    others: RwLock<Vec<Player>>,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, player: Player, x: f64, y: f64, z: f64, dimension: Dimension) {
        *self.current.write() = Some(PlayerSnapshot {
            player,
            x,
            y,
            z,
            dimension,
        });
    }

    pub fn leave(&self) {
        *self.current.write() = None;
        self.others.write().clear();
    }

    /// Moves the local player. Ignored when no world is loaded.
    pub fn move_to(&self, x: f64, y: f64, z: f64, dimension: Dimension) {
        if let Some(snap) = self.current.write().as_mut() {
            snap.x = x;
            snap.y = y;
            snap.z = z;
            snap.dimension = dimension;
        }
    }

    pub fn add_player(&self, player: Player) {
        let mut others = self.others.write();
        if !others.iter().any(|p| p.name.eq_ignore_ascii_case(&player.name)) {
            others.push(player);
        }
    }

    pub fn remove_player(&self, name: &str) {
        self.others.write().retain(|p| !p.name.eq_ignore_ascii_case(name));
    }
}

impl World for StaticWorld {
    fn current_player(&self) -> Option<PlayerSnapshot> {
        self.current.read().clone()
    }

    fn players(&self) -> Vec<Player> {
        let mut all: Vec<Player> = self.current.read().iter().map(|s| s.player.clone()).collect();
        all.extend(self.others.read().iter().cloned());
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_players_include_self() {
        let w = StaticWorld::new();
        assert!(w.players().is_empty());
        w.enter(Player::new("me"), 0.0, 64.0, 0.0, Dimension::Overworld);
        w.add_player(Player::new("Bob"));
        w.add_player(Player::new("bob"));
        assert_eq!(w.players().len(), 2);
        assert!(w.find_player("BOB").is_some());

        w.move_to(1.0, 2.0, 3.0, Dimension::Nether);
        let snap = w.current_player().unwrap();
        assert_eq!((snap.x, snap.dimension), (1.0, Dimension::Nether));

        w.leave();
        assert!(w.current_player().is_none());
    }
}
