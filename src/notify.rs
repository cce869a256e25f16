use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// What changed, so presentation can decide what to redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A local mutation committed (create, cancel, remove).
    Bookings,
    /// The sweeper removed expired bookings.
    Expired,
    /// A pull replaced the whole snapshot.
    Replaced,
}

/// Broadcast hub for state changes. Stands in for "re-render".
pub struct NotifyHub {
    sender: broadcast::Sender<Change>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, change: Change) {
        let _ = self.sender.send(change);
    }
}
