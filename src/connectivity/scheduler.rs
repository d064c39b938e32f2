use super::cancel::CancelToken;
use super::store::StatusStore;
use crate::logger::{self, LogTag};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Periodic silent probing while online
///
/// Ticks every `period` while the store reports online. Going offline
/// stops the timer; it is rebuilt (first tick one full period later) when
/// the store goes online again.
pub struct Scheduler;

impl Scheduler {
    pub fn spawn(store: Arc<StatusStore>, period: Duration, shutdown: CancelToken) -> JoinHandle<()> {
        tokio::spawn(Self::run(store, period, shutdown))
    }

    async fn run(store: Arc<StatusStore>, period: Duration, shutdown: CancelToken) {
        let mut status = store.watch();

        logger::info(
            LogTag::Scheduler,
            &format!("Starting periodic checks (interval={}ms)", period.as_millis()),
        );

        loop {
            // Suspended: wait for the state to go online
            loop {
                let online = status.borrow_and_update().is_online;
                if online {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return,
                    changed = status.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            logger::debug(LogTag::Scheduler, "Online, periodic checks active");
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        logger::debug(LogTag::Scheduler, "Periodic checks shutting down");
                        return;
                    }
                    changed = status.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        let online = status.borrow_and_update().is_online;
                        if !online {
                            logger::debug(LogTag::Scheduler, "Offline, periodic checks suspended");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        Self::on_tick(&store);
                    }
                }
            }
        }
    }

    /// Handle one tick; returns whether a probe was issued
    pub fn on_tick(store: &Arc<StatusStore>) -> bool {
        if !store.read().is_online {
            logger::verbose(LogTag::Scheduler, "Tick while offline, skipped");
            return false;
        }
        logger::verbose(LogTag::Scheduler, "Tick, probing");
        store.trigger_silent_probe().is_some()
    }
}
