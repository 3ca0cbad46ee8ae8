//! # State-Relay Server Library
//!
//! This library implements a real-time multiplayer state-relay server.
//! Clients connect over a persistent WebSocket channel, announce a
//! controlled player entity, push transform updates, and receive a
//! consistent broadcast of every other player's state. The server relays;
//! it does not simulate. Submitted positions are stored and fanned out
//! as-is.
//!
//! ## Core Responsibilities
//!
//! ### Session Lifecycle
//! Handles the complete lifecycle of client connections:
//! - Connection registration and id assignment on accept
//! - Initial handshake (assigned id plus a full player-set snapshot)
//! - Disconnection handling, both commanded and abrupt, with a departure
//!   notice to every remaining client
//!
//! ### State Relay
//! Maintains the authoritative in-memory player set (one player per
//! spawned connection) and re-emits spawn/update/event frames to all
//! other connections, never back to the originator.
//!
//! ## Architecture Design
//!
//! ### Single-Consumer Event Loop
//! Transport tasks forward accept, frame, and close events into one
//! unbounded channel consumed by a single session-controller task. No
//! two handlers run concurrently, which eliminates locking around the
//! connection registry and player directory; the absence of reentrancy
//! is the concurrency invariant.
//!
//! ### Fire-and-Forget Delivery
//! Outbound frames are pushed into per-connection writer queues and never
//! awaited. There is no acknowledgment and no backpressure, so a slow
//! client's queue can grow without bound (known limitation).
//!
//! ## Module Organization
//!
//! - [`connection`]: per-connection handle around the writer channel
//! - [`registry`]: connection registry, broadcast fan-out, id allocation
//! - [`directory`]: player state keyed by owning connection
//! - [`session`]: event loop, command dispatch, lifecycle sequencing
//! - [`network`]: TCP accept loop and WebSocket pump tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("127.0.0.1:25565").await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod directory;
pub mod network;
pub mod registry;
pub mod session;
