//! Shutdown coordination for both proxies.

use tokio::sync::broadcast;

/// One-shot stop signal fanned out to every accept loop.
///
/// Clones share the channel, so any of them can trigger.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receivers created after the trigger never fire.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Wake every current subscriber. Later calls are no-ops for them.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Trigger once `signal` completes, e.g. [`shutdown_signal`](super::shutdown_signal).
    pub fn trigger_on<F>(&self, signal: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let shutdown = self.clone();
        tokio::spawn(async move {
            signal.await;
            shutdown.trigger();
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_trigger() {
        let shutdown = Shutdown::new();
        let mut rx1 = shutdown.subscribe();
        let mut rx2 = shutdown.clone().subscribe();

        shutdown.trigger_on(async {});

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }
}
