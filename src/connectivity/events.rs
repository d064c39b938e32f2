use super::cancel::CancelToken;
use super::host::{HostEnvironment, HostSignal, HostSubscription};
use super::store::StatusStore;
use crate::logger::{self, LogTag};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Translates host signals into overrides and probe triggers
///
/// - Online: immediate override to online/unknown, then a silent probe
/// - Offline: immediate override to offline, no probe
/// - Visible: silent probe, only while online
/// - Hidden: nothing
///
/// The host subscription lives inside the spawned task and is released
/// when the task ends (shutdown or host gone).
pub struct EventBridge;

impl EventBridge {
    /// Subscribe to `host` and start forwarding signals into `store`
    pub fn spawn(
        store: Arc<StatusStore>,
        host: &dyn HostEnvironment,
        shutdown: CancelToken,
    ) -> JoinHandle<()> {
        let subscription = host.subscribe();
        tokio::spawn(Self::run(store, subscription, shutdown))
    }

    async fn run(store: Arc<StatusStore>, mut signals: HostSubscription, shutdown: CancelToken) {
        logger::debug(LogTag::Events, "Listening for host signals");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    logger::debug(LogTag::Events, "Event bridge shutting down");
                    break;
                }
                signal = signals.recv() => match signal {
                    Some(signal) => Self::handle_signal(&store, signal),
                    None => {
                        logger::debug(LogTag::Events, "Host closed its signal channel");
                        break;
                    }
                },
            }
        }
    }

    /// Apply one signal synchronously
    pub fn handle_signal(store: &Arc<StatusStore>, signal: HostSignal) {
        if store.is_closed() {
            return;
        }

        match signal {
            HostSignal::Online => {
                logger::info(LogTag::Events, "Host reports online, re-evaluating quality");
                store.apply_immediate_override(true);
                store.trigger_silent_probe();
            }
            HostSignal::Offline => {
                logger::warning(LogTag::Events, "Host reports offline");
                store.apply_immediate_override(false);
            }
            HostSignal::Visible => {
                if store.read().is_online {
                    logger::debug(LogTag::Events, "Foreground restored, refreshing quality");
                    store.trigger_silent_probe();
                } else {
                    logger::debug(LogTag::Events, "Foreground restored while offline, ignored");
                }
            }
            HostSignal::Hidden => {
                logger::verbose(LogTag::Events, "Moved to background");
            }
        }
    }
}
