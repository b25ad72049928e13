//! Graceful shutdown fan-out.

use tokio::sync::broadcast;

/// One-shot stop signal shared by the server and background tasks.
///
/// Tests drive it directly; `main` fires it from the OS signal handler.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscriber and return how many were still listening.
    /// Firing twice, or with nobody subscribed, is harmless.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
