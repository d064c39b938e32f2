//! Host environment: the source of connectivity and visibility signals
//!
//! A browser would deliver `online`/`offline`/`visibilitychange` events; a
//! desktop shell or OS service delivers the equivalent. The monitor only
//! sees this trait, so signals can be injected synthetically.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Signal emitted by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Host reports connectivity restored
    Online,
    /// Host reports connectivity lost
    Offline,
    /// Application came back to the foreground
    Visible,
    /// Application moved to the background
    Hidden,
}

/// Receiving end of a host subscription; dropping it releases the subscription
pub type HostSubscription = mpsc::UnboundedReceiver<HostSignal>;

pub trait HostEnvironment: Send + Sync {
    /// Host's own last-known online flag
    fn is_online(&self) -> bool;

    /// Subscribe to host signals
    fn subscribe(&self) -> HostSubscription;
}

/// Host environment driven programmatically
///
/// Used by the CLI (signals typed on stdin) and by tests. `set_online`
/// updates the cached flag before delivering the signal, like a browser
/// updating `navigator.onLine` before firing the event.
#[derive(Debug)]
pub struct SignalHost {
    online: AtomicBool,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<HostSignal>>>,
}

impl SignalHost {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Change the cached flag and emit Online/Offline
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        self.emit(if online {
            HostSignal::Online
        } else {
            HostSignal::Offline
        });
    }

    /// Change the cached flag without emitting anything
    ///
    /// Models a host whose flag drifts without an event, which is what the
    /// probe fallback reads.
    pub fn set_online_silently(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_visible(&self, visible: bool) {
        self.emit(if visible {
            HostSignal::Visible
        } else {
            HostSignal::Hidden
        });
    }

    /// Deliver a signal to every live subscriber, pruning released ones
    pub fn emit(&self, signal: HostSignal) {
        self.subscribers
            .lock()
            .retain(|sender| sender.send(signal).is_ok());
    }

    /// Number of subscriptions not yet released
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sender| !sender.is_closed());
        subscribers.len()
    }
}

impl HostEnvironment for SignalHost {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> HostSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }
}
