use super::cancel::CancelToken;
use super::events::EventBridge;
use super::host::HostEnvironment;
use super::prober::{HttpProber, Prober};
use super::scheduler::Scheduler;
use super::store::{StatusStore, Subscription};
use super::types::ConnectivityState;
use crate::config::MonitorConfig;
use crate::errors::MonitorError;
use crate::logger::{self, LogTag};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// ConnectivityMonitor - wires the status store to its signal sources
///
/// Owns:
/// - The `StatusStore` (canonical state, probes, subscriptions)
/// - The event bridge task (host online/offline/visibility signals)
/// - The scheduler task (periodic silent probes while online)
///
/// Teardown (`shutdown()` or drop) releases the host subscription, stops
/// the scheduler and cancels any in-flight probe; no listener fires after it.
///
/// # Panics
/// `start` spawns tasks and must be called from within a tokio runtime.
pub struct ConnectivityMonitor {
    store: Arc<StatusStore>,
    shutdown: CancelToken,
    handles: Vec<JoinHandle<()>>,
}

impl ConnectivityMonitor {
    /// Start a monitor probing over HTTP
    pub fn start(config: &MonitorConfig, host: Arc<dyn HostEnvironment>) -> Result<Self, MonitorError> {
        let prober = Arc::new(HttpProber::new(host.clone())?);
        Self::start_with_prober(config, host, prober)
    }

    /// Start a monitor with a custom prober
    pub fn start_with_prober(
        config: &MonitorConfig,
        host: Arc<dyn HostEnvironment>,
        prober: Arc<dyn Prober>,
    ) -> Result<Self, MonitorError> {
        let probe_url = config.validate()?;

        logger::info(
            LogTag::Monitor,
            &format!(
                "Starting connectivity monitor (url={}, timeout={}ms, periodic={})",
                probe_url, config.timeout_ms, config.enable_periodic_check
            ),
        );

        let store = StatusStore::new(prober, host.clone(), probe_url, config.timeout());
        let shutdown = CancelToken::new();

        let mut handles = vec![EventBridge::spawn(
            store.clone(),
            host.as_ref(),
            shutdown.clone(),
        )];

        if config.enable_periodic_check {
            handles.push(Scheduler::spawn(
                store.clone(),
                config.check_interval(),
                shutdown.clone(),
            ));
        } else {
            logger::info(LogTag::Monitor, "Periodic checks disabled in config");
        }

        if config.check_on_start {
            if store.read().is_online {
                store.trigger_silent_probe();
            } else {
                logger::info(LogTag::Monitor, "Host reports offline, skipping initial probe");
            }
        }

        Ok(Self {
            store,
            shutdown,
            handles,
        })
    }

    /// Current state snapshot
    pub fn status(&self) -> ConnectivityState {
        self.store.read()
    }

    /// User-visible re-check; see `StatusStore::recheck`
    pub fn recheck(&self) -> impl Future<Output = ConnectivityState> + Send + 'static {
        self.store.recheck()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectivityState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn watch(&self) -> watch::Receiver<ConnectivityState> {
        self.store.watch()
    }

    /// Shared handle for collaborators that outlive a borrow of the monitor
    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Tear everything down; idempotent
    pub fn shutdown(&mut self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.store.close();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        logger::info(LogTag::Monitor, "Connectivity monitor stopped");
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
