//! Change notifications for unified-view consumers.

use tokio::sync::broadcast;

/// Which source of the unified view changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Feeds,
    LocalEvents,
    Overrides,
}

/// Fan-out of change events to any number of subscribers. Sending never
/// fails; notifications to a closed or lagging receiver are dropped.
pub struct ChangeNotifier {
    tx: broadcast::Sender<ChangeKind>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        ChangeNotifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeKind> {
        self.tx.subscribe()
    }

    pub fn notify(&self, kind: ChangeKind) {
        let _ = self.tx.send(kind);
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
