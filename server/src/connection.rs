use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// One registered transport connection. The sender feeds the connection's
// writer task; channel state doubles as the liveness flag.
#[derive(Debug)]
pub struct Connection {
    pub id: u32,
    pub addr: SocketAddr,
    sender: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub fn new(id: u32, addr: SocketAddr, sender: mpsc::UnboundedSender<Message>) -> Self {
        Connection { id, addr, sender }
    }

    // Open means the writer task is still draining our queue.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    // Fire-and-forget; returns false when the writer task is gone.
    pub fn send(&self, frame: &str) -> bool {
        self.sender.send(Message::Text(frame.into())).is_ok()
    }

    // Queue a close frame; the writer task shuts the socket down after it.
    pub fn close(&self) {
        let _ = self.sender.send(Message::Close(None));
    }
}
