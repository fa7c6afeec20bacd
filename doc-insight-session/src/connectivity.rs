//! Online/offline status tracking
//!
//! The platform (or front end) owns a [`ConnectivityHandle`] and pushes
//! status changes into it; the session controller holds the matching
//! [`ConnectivityMonitor`] and reads the latest known value when gating a
//! submission. The gate is a fail-fast check, not a reachability test.

use tokio::sync::watch;

/// Sender half: updated by whatever connectivity notification the
/// platform provides
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    tx: watch::Sender<bool>,
}

/// Receiver half: consulted by the session controller at call time
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    rx: watch::Receiver<bool>,
}

/// Create a connected handle/monitor pair with an initial status
pub fn channel(initially_online: bool) -> (ConnectivityHandle, ConnectivityMonitor) {
    let (tx, rx) = watch::channel(initially_online);
    (ConnectivityHandle { tx }, ConnectivityMonitor { rx })
}

impl ConnectivityHandle {
    /// Publish a status change
    pub fn set_online(&self, online: bool) {
        // send only fails when every monitor is gone; nothing to do then
        let _ = self.tx.send(online);
    }
}

impl ConnectivityMonitor {
    /// The latest known status
    pub fn is_online(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the status changes, returning the new value
    pub async fn changed(&mut self) -> bool {
        if self.rx.changed().await.is_err() {
            // Handle dropped; the last seen value stays in effect
            return *self.rx.borrow();
        }
        *self.rx.borrow()
    }
}

/// A monitor that always reports online, for contexts with no
/// connectivity source. The last value outlives the dropped handle.
pub fn always_online() -> ConnectivityMonitor {
    let (_handle, monitor) = channel(true);
    monitor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_reflects_latest_value() {
        let (handle, monitor) = channel(true);
        assert!(monitor.is_online());

        handle.set_online(false);
        assert!(!monitor.is_online());

        handle.set_online(true);
        assert!(monitor.is_online());
    }

    #[test]
    fn test_always_online() {
        let monitor = always_online();
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn test_changed_observes_transition() {
        let (handle, mut monitor) = channel(true);

        let waiter = tokio::spawn(async move { monitor.changed().await });
        handle.set_online(false);

        assert!(!waiter.await.unwrap());
    }
}
