//! Session lifecycle and command dispatch
//!
//! Every connect, frame, and close event funnels through one unbounded
//! channel into a single consumer task. Handlers never run concurrently
//! and never await a send, so the registry and directory need no locking;
//! outbound delivery is a fire-and-forget push into each connection's
//! writer queue. A slow client buffers without bound rather than stalling
//! the loop (known limitation).

use log::{debug, info, warn};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::connection::Connection;
use crate::directory::PlayerDirectory;
use crate::registry::ConnectionRegistry;
use shared::{Command, Player, Quat, Vec3};

/// Events delivered from the transport tasks to the session loop.
#[derive(Debug)]
pub enum SessionEvent {
    Connected {
        conn_id: u32,
        addr: SocketAddr,
        handle: mpsc::UnboundedSender<Message>,
    },
    Frame {
        conn_id: u32,
        text: String,
    },
    Closed {
        conn_id: u32,
    },
}

/// Owns the connection registry and player directory and sequences every
/// mutation of them.
pub struct SessionController {
    registry: ConnectionRegistry,
    directory: PlayerDirectory,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: PlayerDirectory::new(),
        }
    }

    /// Consumes events until every transport handle is dropped.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        info!("Session loop stopped");
    }

    fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected {
                conn_id,
                addr,
                handle,
            } => self.handle_connect(conn_id, addr, handle),
            SessionEvent::Frame { conn_id, text } => self.handle_frame(conn_id, &text),
            SessionEvent::Closed { conn_id } => self.handle_close(conn_id),
        }
    }

    /// Registers the connection and sends it the initial state: its
    /// assigned id, then the current player set.
    fn handle_connect(
        &mut self,
        conn_id: u32,
        addr: SocketAddr,
        handle: mpsc::UnboundedSender<Message>,
    ) {
        self.registry
            .register(Connection::new(conn_id, addr, handle));
        self.registry.send_to(conn_id, &shared::handshake_frame(conn_id));
        self.registry.send_to(conn_id, &self.directory.snapshot_frame());
    }

    fn handle_frame(&mut self, conn_id: u32, frame: &str) {
        debug!("Received frame from client {}: {}", conn_id, frame);

        let command = match Command::parse(frame) {
            Ok(command) => command,
            Err(err) => {
                warn!("Dropping frame from client {}: {}", conn_id, err);
                return;
            }
        };

        match command {
            Command::Spawn {
                player_id,
                name,
                position,
                rotation,
            } => self.on_spawn(conn_id, frame, player_id, name, position, rotation),
            Command::Update {
                player_id,
                position,
                rotation,
            } => self.on_update(conn_id, frame, &player_id, position, rotation),
            Command::UpdateUsername {
                conn_id: target,
                name,
            } => self.on_update_username(conn_id, target, name),
            Command::Disconnect { conn_id: target } => self.on_disconnect(conn_id, target),
            Command::Shoot {
                player_id,
                position,
                rotation,
            } => self.on_shoot(conn_id, &player_id, position, rotation),
            Command::Hit {
                shooter_id,
                target_id,
            } => self
                .registry
                .broadcast(&shared::hit_frame(&shooter_id, &target_id), Some(conn_id)),
            Command::Death {
                player_id,
                killer_id,
            } => self
                .registry
                .broadcast(&shared::death_frame(&player_id, &killer_id), Some(conn_id)),
            Command::Heartbeat => {
                self.registry.send_to(conn_id, shared::HEARTBEAT_FRAME);
            }
        }
    }

    /// Removes the connection; if it had spawned, announces the departure
    /// to everyone left. Closing an unspawned connection is silent.
    fn handle_close(&mut self, conn_id: u32) {
        if self.registry.remove(conn_id).is_none() {
            // Already purged by a disconnect command.
            return;
        }

        match self.directory.remove(conn_id) {
            Some(player) => {
                self.registry
                    .broadcast(&shared::disconnect_frame(&player.id), None);
            }
            None => {
                warn!("Client {} closed without a player entry", conn_id);
            }
        }
    }

    fn on_spawn(
        &mut self,
        conn_id: u32,
        frame: &str,
        player_id: String,
        name: String,
        position: Vec3,
        rotation: Vec3,
    ) {
        self.directory
            .upsert(conn_id, Player::new(player_id, name, position, rotation));
        self.registry.broadcast(frame, Some(conn_id));
    }

    fn on_update(
        &mut self,
        conn_id: u32,
        frame: &str,
        player_id: &str,
        position: Vec3,
        rotation: Vec3,
    ) {
        // An update before spawn mutates nothing; the frame still relays.
        if self
            .directory
            .update_transform(conn_id, position, rotation)
            .is_err()
        {
            debug!(
                "Update for {} from client {} with no player entry",
                player_id, conn_id
            );
        }
        self.registry.broadcast(frame, Some(conn_id));
    }

    fn on_update_username(&mut self, sender: u32, target: u32, name: String) {
        if self.registry.get(target).is_none() {
            warn!("update_username for unknown client {}", target);
            return;
        }

        if let Err(err) = self.directory.update_name(target, name.clone()) {
            warn!("update_username: {}", err);
        } else {
            info!("Renamed player of client {} to {}", target, name);
        }

        self.registry
            .broadcast(&shared::update_username_frame(target, &name), Some(sender));
    }

    /// Force-closes the target connection and purges it from both
    /// registries, then announces the departure by connection id.
    fn on_disconnect(&mut self, sender: u32, target: u32) {
        match self.registry.remove(target) {
            Some(connection) => {
                info!("Client {} forced disconnect of client {}", sender, target);
                connection.close();
                self.directory.remove(target);
                self.registry
                    .broadcast(&shared::disconnect_frame(&target.to_string()), Some(sender));
            }
            None => warn!("disconnect for unknown client {}", target),
        }
    }

    fn on_shoot(&mut self, conn_id: u32, player_id: &str, position: Vec3, rotation: Quat) {
        debug!(
            "Player {} (client {}) fired from ({}, {}, {})",
            player_id, conn_id, position.x, position.y, position.z
        );
        self.registry
            .broadcast(&shared::shoot_frame(player_id, position, rotation), Some(conn_id));
    }
}
