//! Authoritative in-memory player state, keyed by owning connection
//!
//! One entry per connection that has spawned; an entry exists only while
//! its connection is registered. The session controller is the only
//! mutator, so no locking here either.

use log::info;
use std::collections::BTreeMap;
use std::fmt;

use shared::{players_frame, Player, Vec3};

/// A directory operation referenced a connection with no player entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateNotFound {
    pub conn_id: u32,
}

impl fmt::Display for StateNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no player entry for connection {}", self.conn_id)
    }
}

impl std::error::Error for StateNotFound {}

/// Player state for every spawned connection.
///
/// Backed by a `BTreeMap` keyed by connection id: with monotonic ids the
/// snapshot order is the spawn order, so snapshots are deterministic.
#[derive(Debug, Default)]
pub struct PlayerDirectory {
    players: BTreeMap<u32, Player>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
        }
    }

    /// Creates or replaces the player owned by `conn_id`.
    pub fn upsert(&mut self, conn_id: u32, player: Player) {
        info!(
            "Spawning player {} ({}) for client {}",
            player.id, player.name, conn_id
        );
        self.players.insert(conn_id, player);
    }

    pub fn update_transform(
        &mut self,
        conn_id: u32,
        position: Vec3,
        rotation: Vec3,
    ) -> Result<(), StateNotFound> {
        let player = self
            .players
            .get_mut(&conn_id)
            .ok_or(StateNotFound { conn_id })?;
        player.position = position;
        player.rotation = rotation;
        Ok(())
    }

    pub fn update_name(&mut self, conn_id: u32, name: String) -> Result<(), StateNotFound> {
        let player = self
            .players
            .get_mut(&conn_id)
            .ok_or(StateNotFound { conn_id })?;
        player.name = name;
        Ok(())
    }

    /// Removes and returns the player, if any. Idempotent.
    pub fn remove(&mut self, conn_id: u32) -> Option<Player> {
        let removed = self.players.remove(&conn_id);
        if let Some(player) = &removed {
            info!("Removed player {} (client {})", player.id, conn_id);
        }
        removed
    }

    pub fn get(&self, conn_id: u32) -> Option<&Player> {
        self.players.get(&conn_id)
    }

    /// Full `players|<count>|…` snapshot in spawn order.
    pub fn snapshot_frame(&self) -> String {
        players_frame(self.players.values())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_player(id: &str, name: &str) -> Player {
        Player::new(
            id.to_owned(),
            name.to_owned(),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::zero(),
        )
    }

    #[test]
    fn upsert_creates_then_replaces() {
        let mut directory = PlayerDirectory::new();

        directory.upsert(1, test_player("p1", "Alice"));
        assert_eq!(directory.len(), 1);

        directory.upsert(1, test_player("p1b", "Alice2"));
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get(1).unwrap().id, "p1b");
    }

    #[test]
    fn update_transform_mutates_only_position_and_rotation() {
        let mut directory = PlayerDirectory::new();
        directory.upsert(1, test_player("p1", "Alice"));

        directory
            .update_transform(1, Vec3::new(5.0, 2.0, 3.0), Vec3::new(0.0, 90.0, 0.0))
            .unwrap();

        let player = directory.get(1).unwrap();
        assert_eq!(player.name, "Alice");
        assert_approx_eq!(player.position.x, 5.0);
        assert_approx_eq!(player.rotation.y, 90.0);
    }

    #[test]
    fn update_transform_without_entry_fails() {
        let mut directory = PlayerDirectory::new();

        let result = directory.update_transform(7, Vec3::zero(), Vec3::zero());

        assert_eq!(result, Err(StateNotFound { conn_id: 7 }));
        assert!(directory.is_empty());
    }

    #[test]
    fn update_name_changes_only_the_name() {
        let mut directory = PlayerDirectory::new();
        directory.upsert(1, test_player("p1", "Alice"));

        directory.update_name(1, "Eve".to_owned()).unwrap();

        let player = directory.get(1).unwrap();
        assert_eq!(player.name, "Eve");
        assert_eq!(player.id, "p1");
        assert_approx_eq!(player.position.x, 1.0);
    }

    #[test]
    fn update_name_without_entry_fails() {
        let mut directory = PlayerDirectory::new();
        assert!(directory.update_name(3, "Eve".to_owned()).is_err());
    }

    #[test]
    fn remove_is_idempotent_and_returns_the_player() {
        let mut directory = PlayerDirectory::new();
        directory.upsert(1, test_player("p1", "Alice"));

        assert_eq!(directory.remove(1).unwrap().id, "p1");
        assert!(directory.remove(1).is_none());
        assert!(directory.remove(99).is_none());
    }

    #[test]
    fn snapshot_lists_players_in_spawn_order() {
        let mut directory = PlayerDirectory::new();
        directory.upsert(2, test_player("p2", "Bob"));
        directory.upsert(5, test_player("p5", "Carol"));

        assert_eq!(
            directory.snapshot_frame(),
            "players|2|p2|Bob|1|2|3|0|0|0|p5|Carol|1|2|3|0|0|0"
        );
    }

    #[test]
    fn snapshot_of_empty_directory() {
        let directory = PlayerDirectory::new();
        assert_eq!(directory.snapshot_frame(), "players|0|");
    }
}
