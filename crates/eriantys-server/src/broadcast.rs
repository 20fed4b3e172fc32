//! Per-connection outbound queues.
//!
//! Every websocket connection registers an unbounded queue that its writer
//! task drains. Broadcasting enqueues the same message on each listed
//! connection; closed queues are skipped.

use dashmap::DashMap;
use eriantys_core::ModelEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::ServerMessage;

#[derive(Default)]
pub struct Broadcaster {
    queues: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection and return the receiving end of its queue.
    pub fn register(&self, conn_id: Uuid) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.queues.insert(conn_id, tx);
        rx
    }

    pub fn unregister(&self, conn_id: Uuid) {
        self.queues.remove(&conn_id);
    }

    /// Enqueue a message for one connection. Returns false when the
    /// connection is unknown or its writer is gone.
    pub fn send(&self, conn_id: Uuid, msg: ServerMessage) -> bool {
        match self.queues.get(&conn_id) {
            Some(tx) => tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Enqueue a message for every listed connection.
    pub fn broadcast(&self, conns: &[Uuid], msg: &ServerMessage) {
        for conn_id in conns {
            let _ = self.send(*conn_id, msg.clone());
        }
    }

    /// Enqueue model events in the order they were produced.
    pub fn broadcast_events(&self, conns: &[Uuid], events: Vec<ModelEvent>) {
        for event in events {
            self.broadcast(conns, &ServerMessage::Update(event));
        }
    }
}
