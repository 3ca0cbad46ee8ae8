//! Connection bookkeeping and frame fan-out for the relay server
//!
//! This module handles the server-side management of live connections:
//! - Registration and removal over the connection lifecycle
//! - Broadcast fan-out with optional originator exclusion
//! - Monotonic connection id allocation
//!
//! All mutation happens on the single session-controller task, so the
//! registry needs no internal locking.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::connection::Connection;

/// Issues connection ids unique for the process lifetime.
///
/// A monotonic counter starting at 1. The accept loop is the only task
/// that creates connections, so plain mutable state is enough.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_id: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    pub fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Live transport connections keyed by connection id.
///
/// Backed by a `BTreeMap`: combined with the monotonic allocator this
/// iterates connections in registration order, which keeps broadcast
/// ordering and tests deterministic.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: BTreeMap<u32, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: BTreeMap::new(),
        }
    }

    /// Adds a connection under its id. Logs the connect for monitoring.
    pub fn register(&mut self, connection: Connection) {
        info!(
            "Client {} connected from {}",
            connection.id, connection.addr
        );
        self.connections.insert(connection.id, connection);
    }

    pub fn get(&self, conn_id: u32) -> Option<&Connection> {
        self.connections.get(&conn_id)
    }

    /// Removes and returns a connection. Removing an absent id is a no-op.
    pub fn remove(&mut self, conn_id: u32) -> Option<Connection> {
        let removed = self.connections.remove(&conn_id);
        if removed.is_some() {
            info!("Client {} disconnected", conn_id);
        }
        removed
    }

    /// Sends a frame to one connection. Returns false if it is unknown or
    /// its writer is gone.
    pub fn send_to(&self, conn_id: u32, frame: &str) -> bool {
        match self.connections.get(&conn_id) {
            Some(connection) => connection.send(frame),
            None => false,
        }
    }

    /// Fans a frame out to every open connection except `exclude`.
    ///
    /// Delivery is fire-and-forget: a connection whose writer has hung up
    /// is skipped, nothing is retried or acknowledged.
    pub fn broadcast(&self, frame: &str, exclude: Option<u32>) {
        for (conn_id, connection) in &self.connections {
            if Some(*conn_id) == exclude {
                continue;
            }
            if !connection.is_open() {
                continue;
            }
            if !connection.send(frame) {
                debug!("Failed to queue frame for client {}", conn_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
