//! WebSocket transport: accept loop and per-connection pump tasks

use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::registry::IdAllocator;
use crate::session::{SessionController, SessionEvent};

/// Accepts WebSocket connections and feeds the session loop.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop and the session loop until the process stops.
    pub async fn run(self) -> io::Result<()> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(SessionController::new().run(event_rx));

        // The accept loop is the allocator's only user, so plain mutable
        // state upholds the monotonic-id guarantee.
        let mut ids = IdAllocator::new();

        loop {
            let (stream, addr) = self.listener.accept().await?;
            let conn_id = ids.allocate();
            let events = event_tx.clone();

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, conn_id, events).await {
                    debug!("Connection {} ({}) ended with error: {}", conn_id, addr, e);
                }
            });
        }
    }
}

/// Upgrades one TCP stream and pumps it until the peer goes away. Failures
/// here are isolated to this connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    conn_id: u32,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_writer, mut ws_reader) = ws_stream.split();

    let (handle, mut outbound) = mpsc::unbounded_channel::<Message>();
    if events
        .send(SessionEvent::Connected {
            conn_id,
            addr,
            handle,
        })
        .is_err()
    {
        // Session loop is gone; the server is shutting down.
        return Ok(());
    }

    // Writer task: drains the session's queue. Exits when the registry
    // drops the handle or after flushing a close frame (forced disconnect).
    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let closing = matches!(message, Message::Close(_));
            if ws_writer.send(message).await.is_err() {
                break;
            }
            if closing {
                break;
            }
        }
        let _ = ws_writer.close().await;
    });

    // Reader loop: inbound text frames become session events, everything
    // else is transport noise (tungstenite answers pings itself).
    while let Some(message) = ws_reader.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let frame = SessionEvent::Frame {
                    conn_id,
                    text: text.as_str().to_owned(),
                };
                if events.send(frame).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read error on client {}: {}", conn_id, e);
                break;
            }
        }
    }

    // Abrupt or clean, every exit path runs the disconnect sequence.
    let _ = events.send(SessionEvent::Closed { conn_id });
    Ok(())
}
