//! Change notifications keyed by resource address.
//!
//! Every successful mutation publishes a [`ChangeEvent`] on a tokio broadcast
//! channel. Observers hold a [`ChangeWatch`] for the address they read and
//! treat any event that affects it as "my view may be stale".

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// Monotonically increasing per notifier, starting at 1.
    pub sequence: u64,
    /// Address whose observers are notified; it and every address beneath it.
    pub scope: String,
    /// Address the mutation was issued against (the new item for inserts).
    pub target: String,
    pub kind: ChangeKind,
    /// Rows affected. Zero still notifies.
    pub affected: u64,
}

impl ChangeEvent {
    pub fn affects(&self, watched: &str) -> bool {
        match watched.strip_prefix(self.scope.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Cheap to clone (inner Arc via broadcast::Sender).
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeEvent>,
    sequence: Arc<AtomicU64>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChangeNotifier {
            tx,
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Publish and return the event's sequence number. Dropped when nobody listens.
    pub fn notify_change(&self, scope: &str, target: &str, kind: ChangeKind, affected: u64) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let event = ChangeEvent {
            sequence,
            scope: scope.to_string(),
            target: target.to_string(),
            kind,
            affected,
        };
        tracing::debug!(sequence, scope, target, ?kind, affected, "change notified");
        let _ = self.tx.send(event);
        sequence
    }

    /// Raw stream of every event.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Stream filtered to events that affect `address`.
    pub fn watch(&self, address: &str) -> ChangeWatch {
        ChangeWatch {
            address: address.to_string(),
            rx: self.tx.subscribe(),
        }
    }

    /// Sequence number the next event will carry.
    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

pub struct ChangeWatch {
    address: String,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeWatch {
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Waits for the next event affecting this address. A `Lagged` error means
    /// events were missed and the view must be considered stale.
    pub async fn changed(&mut self) -> Result<ChangeEvent, broadcast::error::RecvError> {
        loop {
            let event = self.rx.recv().await?;
            if event.affects(&self.address) {
                return Ok(event);
            }
        }
    }

    /// Drains pending events without waiting; true if any affected this address or some were missed.
    pub fn is_stale(&mut self) -> bool {
        use broadcast::error::TryRecvError;
        let mut stale = false;
        loop {
            match self.rx.try_recv() {
                Ok(event) => stale |= event.affects(&self.address),
                Err(TryRecvError::Lagged(_)) => stale = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return stale,
            }
        }
    }
}
