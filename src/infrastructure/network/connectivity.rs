//! Network reachability monitoring.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{Notify, watch};
use tracing::{debug, info, trace};

use crate::domain::entities::{ConnectivityState, InterfaceKind};
use crate::domain::ports::ConnectivityProbePort;

/// Reachability probe that opens a TCP connection to a well-known address.
///
/// A desktop host cannot cheaply tell which interface carries the route, so
/// successful probes report [`InterfaceKind::Other`].
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    /// Creates a probe against `addr` with a per-attempt timeout.
    #[must_use]
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl ConnectivityProbePort for TcpProbe {
    async fn probe(&self) -> ConnectivityState {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => ConnectivityState::online(InterfaceKind::Other),
            _ => ConnectivityState::offline(),
        }
    }
}

/// Long-lived observer of network reachability.
///
/// One background task samples the probe on an interval and updates a shared
/// snapshot. Subscribers are notified only on transitions where the
/// connected flag flips; interface-kind changes while staying connected
/// update the snapshot silently.
pub struct ConnectivityMonitor {
    probe: Arc<dyn ConnectivityProbePort>,
    interval: Duration,
    state: parking_lot::RwLock<ConnectivityState>,
    tx: watch::Sender<ConnectivityState>,
    started: AtomicBool,
    stopped: AtomicBool,
    shutdown: Notify,
}

impl ConnectivityMonitor {
    /// Creates a monitor in the optimistic connected state.
    ///
    /// No observation happens until [`start`](Self::start) is called.
    #[must_use]
    pub fn new(probe: Arc<dyn ConnectivityProbePort>, interval: Duration) -> Self {
        let initial = ConnectivityState::default();
        let (tx, _rx) = watch::channel(initial);
        Self {
            probe,
            interval,
            state: parking_lot::RwLock::new(initial),
            tx,
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }

    /// Spawns the observation loop. A second call is a no-op: the monitor is
    /// a single observation session for the life of the process.
    pub fn start(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval = ?monitor.interval, "Connectivity monitor started");
            loop {
                if monitor.stopped.load(Ordering::SeqCst) {
                    break;
                }
                tokio::select! {
                    () = monitor.shutdown.notified() => break,
                    () = tokio::time::sleep(monitor.interval) => {
                        let observed = monitor.probe.probe().await;
                        monitor.apply_observation(observed);
                    }
                }
            }
            info!("Connectivity monitor stopped");
        });
    }

    /// Folds an observation into the snapshot.
    ///
    /// Returns true when the connected flag flipped, in which case
    /// subscribers have been notified.
    pub(crate) fn apply_observation(&self, observed: ConnectivityState) -> bool {
        let flipped = {
            let mut state = self.state.write();
            let flipped = state.is_connected != observed.is_connected;
            *state = observed;
            flipped
        };

        if flipped {
            debug!(state = %observed, "Connectivity changed");
            let _ = self.tx.send(observed);
        } else {
            trace!(state = %observed, "Connectivity unchanged");
        }

        flipped
    }

    /// Returns the current snapshot. Never blocks.
    #[must_use]
    pub fn current_state(&self) -> ConnectivityState {
        *self.state.read()
    }

    /// Returns true if the network is currently considered reachable.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current_state().is_connected
    }

    /// Subscribes to connected-flag transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }

    /// Stops the observation loop. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockProbe;

    fn unstarted_monitor(connected: bool) -> Arc<ConnectivityMonitor> {
        Arc::new(ConnectivityMonitor::new(
            Arc::new(MockProbe::new(connected)),
            Duration::from_secs(60),
        ))
    }

    #[test]
    fn test_initial_state_is_optimistic() {
        let monitor = unstarted_monitor(false);
        assert!(monitor.is_connected());
    }

    #[test]
    fn test_flip_notifies_subscribers() {
        let monitor = unstarted_monitor(true);
        let mut rx = monitor.subscribe();

        assert!(monitor.apply_observation(ConnectivityState::offline()));
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_connected);

        assert!(monitor.apply_observation(ConnectivityState::online(InterfaceKind::Wifi)));
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_interface_change_is_silent() {
        let monitor = unstarted_monitor(true);
        monitor.apply_observation(ConnectivityState::online(InterfaceKind::Wifi));
        let mut rx = monitor.subscribe();

        // Still connected, only the interface kind moved.
        assert!(!monitor.apply_observation(ConnectivityState::online(InterfaceKind::Cellular)));
        assert!(!rx.has_changed().unwrap());
        // The snapshot did move.
        assert_eq!(
            monitor.current_state().interface,
            InterfaceKind::Cellular
        );
    }

    #[tokio::test]
    async fn test_observation_loop_detects_disconnect() {
        let probe = Arc::new(MockProbe::new(true));
        let monitor = Arc::new(ConnectivityMonitor::new(
            probe.clone(),
            Duration::from_millis(5),
        ));
        monitor.start();

        let mut rx = monitor.subscribe();
        probe.set_connected(false);

        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("no transition observed")
            .unwrap();
        assert!(!monitor.is_connected());

        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let monitor = unstarted_monitor(true);
        monitor.start();
        monitor.shutdown();
        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_double_start_is_noop() {
        let monitor = unstarted_monitor(true);
        monitor.start();
        monitor.start();
        monitor.shutdown();
    }
}
