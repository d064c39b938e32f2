use super::cancel::CancelToken;
use super::host::HostEnvironment;
use super::prober::Prober;
use super::quality::classify;
use super::types::{ConnectivityState, ProbeOutcome, ProbeResult};
use crate::logger::{self, LogTag};
use chrono::Utc;
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

type Listener = Arc<dyn Fn(&ConnectivityState) + Send + Sync>;

/// Ticket for a dispatched probe
///
/// Carries the generation the probe was stamped with and the token that
/// cancels it when a newer probe (or an override, or teardown) supersedes it.
#[derive(Debug, Clone)]
pub struct ProbeTicket {
    pub generation: u64,
    pub silent: bool,
    cancel: CancelToken,
}

struct InFlight {
    generation: u64,
    cancel: CancelToken,
}

struct StoreInner {
    state: ConnectivityState,
    generation: u64,
    in_flight: Option<InFlight>,
    /// Bumped on every published state; orders listener delivery
    revision: u64,
}

/// Single owner of the canonical connectivity state
///
/// All writes go through `apply_probe_result` and `apply_immediate_override`
/// and happen inside one short critical section; listeners run after the
/// lock is released. Every probe is stamped with a generation, and only a
/// result carrying the latest generation is applied.
///
/// Each published state also carries a revision. Delivery to listeners is
/// serialized on `delivered`, and a revision older than the last delivered
/// one is skipped, so a listener never sees the state move backwards.
pub struct StatusStore {
    inner: Mutex<StoreInner>,
    listeners: Mutex<BTreeMap<u64, Listener>>,
    delivered: ReentrantMutex<Cell<u64>>,
    next_listener_id: AtomicU64,
    watch_tx: watch::Sender<ConnectivityState>,
    prober: Arc<dyn Prober>,
    host: Arc<dyn HostEnvironment>,
    probe_url: Url,
    timeout: Duration,
    closed: AtomicBool,
}

impl StatusStore {
    pub fn new(
        prober: Arc<dyn Prober>,
        host: Arc<dyn HostEnvironment>,
        probe_url: Url,
        timeout: Duration,
    ) -> Arc<Self> {
        let state = ConnectivityState::initial(host.is_online());
        let (watch_tx, _) = watch::channel(state.clone());

        Arc::new(Self {
            inner: Mutex::new(StoreInner {
                state,
                generation: 0,
                in_flight: None,
                revision: 0,
            }),
            listeners: Mutex::new(BTreeMap::new()),
            delivered: ReentrantMutex::new(Cell::new(0)),
            next_listener_id: AtomicU64::new(1),
            watch_tx,
            prober,
            host,
            probe_url,
            timeout,
            closed: AtomicBool::new(false),
        })
    }

    /// Synchronous snapshot of the current state
    pub fn read(&self) -> ConnectivityState {
        self.inner.lock().state.clone()
    }

    /// Latest generation handed out (probes and overrides both advance it)
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn probe_url(&self) -> &Url {
        &self.probe_url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register a listener called after every state change
    ///
    /// The listener stays registered until the returned `Subscription` is
    /// dropped or `unsubscribe()` is called.
    pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&ConnectivityState) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().insert(id, Arc::new(listener));
        Subscription {
            store: Arc::downgrade(self),
            id,
        }
    }

    /// Receiver that always holds the latest state
    pub fn watch(&self) -> watch::Receiver<ConnectivityState> {
        self.watch_tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    fn unsubscribe_id(&self, id: u64) {
        self.listeners.lock().remove(&id);
    }

    /// User-visible re-check
    ///
    /// `is_checking` is raised before this returns, not on first poll.
    /// Supersedes any in-flight probe. Resolves with the state after this
    /// probe's result is applied, or the current state if it was itself
    /// superseded.
    pub fn recheck(self: &Arc<Self>) -> impl Future<Output = ConnectivityState> + Send + 'static {
        let ticket = self.begin_probe(false);
        let store = Arc::clone(self);
        async move {
            if let Some(ticket) = ticket {
                store.finish_probe(ticket).await;
            }
            store.read()
        }
    }

    /// Dispatch a silent probe on the runtime
    ///
    /// The generation is stamped and the previous probe cancelled before
    /// this returns; only the network wait happens on the spawned task.
    pub fn trigger_silent_probe(self: &Arc<Self>) -> Option<u64> {
        let ticket = self.begin_probe(true)?;
        let generation = ticket.generation;
        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.finish_probe(ticket).await;
        });
        Some(generation)
    }

    /// Stamp a new probe and supersede whatever was in flight
    ///
    /// Returns `None` once the store is closed.
    pub fn begin_probe(&self, silent: bool) -> Option<ProbeTicket> {
        if self.is_closed() {
            return None;
        }

        let cancel = CancelToken::new();
        let (generation, changed) = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            let generation = inner.generation;

            if let Some(previous) = inner.in_flight.take() {
                previous.cancel.cancel();
                logger::verbose(
                    LogTag::Store,
                    &format!(
                        "Probe #{} superseded by #{}",
                        previous.generation, generation
                    ),
                );
            }
            inner.in_flight = Some(InFlight {
                generation,
                cancel: cancel.clone(),
            });

            // A silent probe superseding a recheck ends that recheck too
            let changed = inner.state.is_checking == silent;
            inner.state.is_checking = !silent;
            (generation, changed.then(|| self.publish(&mut inner)))
        };

        if let Some((revision, state)) = changed {
            self.notify(revision, &state);
        }

        logger::debug(
            LogTag::Store,
            &format!(
                "Probe #{} dispatched ({})",
                generation,
                if silent { "silent" } else { "recheck" }
            ),
        );

        Some(ProbeTicket {
            generation,
            silent,
            cancel,
        })
    }

    /// Await the network call for `ticket` and apply its result
    ///
    /// Returns whether the result was applied.
    pub async fn finish_probe(&self, ticket: ProbeTicket) -> bool {
        let outcome = self
            .prober
            .probe(&self.probe_url, self.timeout, &ticket.cancel)
            .await;

        match outcome {
            ProbeOutcome::Completed(result) => self.apply_probe_result(ticket.generation, result),
            ProbeOutcome::Cancelled => {
                logger::verbose(
                    LogTag::Store,
                    &format!("Probe #{} cancelled, dropped", ticket.generation),
                );
                false
            }
        }
    }

    /// Fold a probe result into the state
    ///
    /// Discarded when `generation` is not the latest or the store is closed.
    pub fn apply_probe_result(&self, generation: u64, result: ProbeResult) -> bool {
        if self.is_closed() {
            return false;
        }

        let (previous, revision, current) = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                logger::verbose(
                    LogTag::Store,
                    &format!(
                        "Discarding stale result of probe #{} (latest #{})",
                        generation, inner.generation
                    ),
                );
                return false;
            }
            inner.in_flight = None;

            let previous = inner.state.clone();
            let state = &mut inner.state;
            state.is_online = result.reachable;
            state.latency_ms = if result.reachable {
                result.latency_ms
            } else {
                None
            };
            state.quality = classify(state.is_online, state.latency_ms);
            state.last_checked_at = Some(next_checked_at(previous.last_checked_at));
            state.is_checking = false;

            let (revision, current) = self.publish(&mut inner);
            (previous, revision, current)
        };

        let cause = match &result.failure {
            Some(reason) => format!("probe #{} ({})", generation, reason),
            None => format!("probe #{}", generation),
        };
        logger::log_state_transition(&previous, &current, &cause);
        self.notify(revision, &current);
        true
    }

    /// Fast-path override from a host connectivity signal
    ///
    /// Authoritative: bumps the generation so any in-flight probe result is
    /// discarded. Going online leaves quality `Unknown` until the follow-up
    /// probe resolves.
    pub fn apply_immediate_override(&self, is_online: bool) {
        if self.is_closed() {
            return;
        }

        let (previous, revision, current) = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            if let Some(in_flight) = inner.in_flight.take() {
                in_flight.cancel.cancel();
            }

            let previous = inner.state.clone();
            let state = &mut inner.state;
            state.is_online = is_online;
            state.latency_ms = None;
            state.quality = classify(is_online, None);
            state.last_checked_at = Some(next_checked_at(previous.last_checked_at));
            state.is_checking = false;

            let (revision, current) = self.publish(&mut inner);
            (previous, revision, current)
        };

        let cause = if is_online {
            "host online signal"
        } else {
            "host offline signal"
        };
        logger::log_state_transition(&previous, &current, cause);
        self.notify(revision, &current);
    }

    /// Cancel the in-flight probe and stop all further writes and callbacks
    ///
    /// Waits for a delivery running on another thread to finish, so no
    /// listener is called once this returns.
    pub fn close(&self) {
        let _delivery = self.delivered.lock();
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            if let Some(in_flight) = inner.in_flight.take() {
                in_flight.cancel.cancel();
            }
            // A cancelled recheck will never apply a result
            if inner.state.is_checking {
                inner.state.is_checking = false;
                self.publish(&mut inner);
            }
        }
        self.listeners.lock().clear();
        logger::debug(LogTag::Store, "Status store closed");
    }

    /// Host flag used to seed the state; exposed for diagnostics
    pub fn host_reports_online(&self) -> bool {
        self.host.is_online()
    }

    /// Stamp the current state with a new revision and publish it to watchers
    ///
    /// Called with `inner` held so revisions follow write order.
    fn publish(&self, inner: &mut StoreInner) -> (u64, ConnectivityState) {
        inner.revision += 1;
        self.watch_tx.send_replace(inner.state.clone());
        (inner.revision, inner.state.clone())
    }

    fn notify(&self, revision: u64, state: &ConnectivityState) {
        let delivered = self.delivered.lock();
        if self.is_closed() || delivered.get() >= revision {
            return;
        }
        delivered.set(revision);

        let listeners: Vec<Listener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            // A listener that wrote to the store has already delivered a newer state
            if delivered.get() != revision || self.is_closed() {
                break;
            }
            listener(state);
        }
    }
}

/// Timestamp for a state update that never moves backwards
fn next_checked_at(previous: Option<chrono::DateTime<Utc>>) -> chrono::DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(previous) if previous > now => previous,
        _ => now,
    }
}

/// Handle returned by `StatusStore::subscribe`; dropping it unsubscribes
pub struct Subscription {
    store: Weak<StatusStore>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe_id(self.id);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::connectivity::host::SignalHost;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    /// Scripted prober
    ///
    /// Each call pops the next step. A step either answers immediately or
    /// waits on a gate the test releases, so supersession can be staged
    /// without timing races. An empty script answers `success(120)`.
    pub struct ScriptedProber {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicU64,
    }

    pub enum Step {
        Answer(ProbeResult),
        Gated(oneshot::Receiver<ProbeResult>),
    }

    impl ScriptedProber {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(VecDeque::new()),
                calls: AtomicU64::new(0),
            })
        }

        pub fn push(&self, result: ProbeResult) {
            self.steps.lock().push_back(Step::Answer(result));
        }

        /// Queue a probe that resolves only when the returned sender fires
        pub fn push_gated(&self) -> oneshot::Sender<ProbeResult> {
            let (tx, rx) = oneshot::channel();
            self.steps.lock().push_back(Step::Gated(rx));
            tx
        }

        pub fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, _url: &Url, _timeout: Duration, cancel: &CancelToken) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().pop_front();
            let result = match step {
                None => ProbeResult::success(120),
                Some(Step::Answer(result)) => result,
                Some(Step::Gated(gate)) => {
                    tokio::select! {
                        _ = cancel.cancelled() => return ProbeOutcome::Cancelled,
                        result = gate => match result {
                            Ok(result) => result,
                            Err(_) => return ProbeOutcome::Cancelled,
                        },
                    }
                }
            };
            ProbeOutcome::Completed(result)
        }
    }

    /// Prober that ignores cancellation, like a runtime without abort support
    pub struct StubbornProber {
        pub gate: Mutex<Option<oneshot::Receiver<ProbeResult>>>,
    }

    #[async_trait]
    impl Prober for StubbornProber {
        async fn probe(&self, _url: &Url, _timeout: Duration, _cancel: &CancelToken) -> ProbeOutcome {
            let gate = self.gate.lock().take();
            match gate {
                Some(gate) => match gate.await {
                    Ok(result) => ProbeOutcome::Completed(result),
                    Err(_) => ProbeOutcome::Cancelled,
                },
                None => ProbeOutcome::Completed(ProbeResult::success(50)),
            }
        }
    }

    pub fn test_url() -> Url {
        Url::parse("http://127.0.0.1:8080/api/health").unwrap()
    }

    pub fn store_with(prober: Arc<dyn Prober>, host: Arc<SignalHost>) -> Arc<StatusStore> {
        StatusStore::new(prober, host, test_url(), Duration::from_secs(5))
    }

    pub fn assert_invariants(state: &ConnectivityState) {
        assert_eq!(
            state.quality == crate::connectivity::QualityTier::Offline,
            !state.is_online,
            "offline tier must match reachability: {:?}",
            state
        );
        if !state.is_online {
            assert_eq!(state.latency_ms, None, "offline state carries no latency");
        }
    }

    /// Wait until `predicate` holds on the watched state (bounded)
    pub async fn wait_for<F>(store: &StatusStore, predicate: F) -> ConnectivityState
    where
        F: Fn(&ConnectivityState) -> bool,
    {
        let mut rx = store.watch();
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let state = rx.borrow_and_update().clone();
                if predicate(&state) {
                    return state;
                }
                if rx.changed().await.is_err() {
                    return store.read();
                }
            }
        })
        .await
        .expect("state did not reach the expected condition")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::connectivity::host::SignalHost;
    use crate::connectivity::types::FailureReason;
    use crate::connectivity::QualityTier;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_initial_state_follows_host() {
        let online = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let state = online.read();
        assert!(state.is_online);
        assert_eq!(state.quality, QualityTier::Unknown);
        assert_eq!(state.last_checked_at, None);

        let offline = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(false)));
        assert_eq!(offline.read().quality, QualityTier::Offline);
        assert_invariants(&offline.read());
    }

    #[tokio::test]
    async fn test_recheck_sets_and_clears_is_checking() {
        let prober = ScriptedProber::new();
        let gate = prober.push_gated();
        let store = store_with(prober.clone(), Arc::new(SignalHost::new(true)));

        let pending = store.recheck();
        assert!(store.read().is_checking, "raised before the future is polled");

        let task = tokio::spawn(pending);
        gate.send(ProbeResult::success(120)).unwrap();
        let state = task.await.unwrap();

        assert!(!state.is_checking);
        assert_eq!(state.quality, QualityTier::Excellent);
        assert_eq!(state.latency_ms, Some(120));
        assert!(state.last_checked_at.is_some());
    }

    #[tokio::test]
    async fn test_recheck_failure_clears_is_checking() {
        let prober = ScriptedProber::new();
        prober.push(ProbeResult::failure(
            FailureReason::Network {
                message: "connection refused".to_string(),
            },
            false,
        ));
        let store = store_with(prober, Arc::new(SignalHost::new(true)));

        let state = store.recheck().await;
        assert!(!state.is_checking);
        assert!(!state.is_online);
        assert_eq!(state.quality, QualityTier::Offline);
        assert_invariants(&state);
    }

    #[tokio::test]
    async fn test_timeout_with_host_online_stays_online_unknown() {
        let prober = ScriptedProber::new();
        prober.push(ProbeResult::success(300));
        prober.push(ProbeResult::failure(
            FailureReason::Timeout { timeout_ms: 5000 },
            true,
        ));
        let store = store_with(prober, Arc::new(SignalHost::new(true)));

        assert_eq!(store.recheck().await.quality, QualityTier::Good);

        let state = store.recheck().await;
        assert!(state.is_online);
        assert_eq!(state.latency_ms, None);
        assert_eq!(state.quality, QualityTier::Unknown);
    }

    #[tokio::test]
    async fn test_newer_probe_discards_older_result() {
        let prober = ScriptedProber::new();
        let first_gate = prober.push_gated();
        let second_gate = prober.push_gated();
        let store = store_with(prober.clone(), Arc::new(SignalHost::new(true)));

        let first = tokio::spawn(store.recheck());
        while prober.calls() < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn(store.recheck());

        // The first probe was cancelled, so its gate may already be gone
        let _ = first_gate.send(ProbeResult::success(900));
        second_gate.send(ProbeResult::success(150)).unwrap();

        first.await.unwrap();
        let state = second.await.unwrap();
        assert_eq!(state.latency_ms, Some(150));
        assert_eq!(store.read().quality, QualityTier::Excellent);
    }

    #[tokio::test]
    async fn test_double_recheck_applies_one_result() {
        let prober = ScriptedProber::new();
        let store = store_with(prober.clone(), Arc::new(SignalHost::new(true)));

        let applied = Arc::new(AtomicUsize::new(0));
        let _subscription = {
            let applied = applied.clone();
            store.subscribe(move |state| {
                if state.last_checked_at.is_some() && !state.is_checking {
                    applied.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let first = store.recheck();
        let second = store.recheck();
        let (_, state) = tokio::join!(first, second);

        assert_eq!(applied.load(Ordering::SeqCst), 1);
        assert_eq!(state.quality, QualityTier::Excellent);
        assert!(!state.is_checking);
    }

    #[tokio::test]
    async fn test_stale_result_discarded_even_if_prober_ignores_cancel() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let prober = Arc::new(StubbornProber {
            gate: Mutex::new(Some(rx)),
        });
        let store = store_with(prober.clone(), Arc::new(SignalHost::new(true)));

        let stale = tokio::spawn(store.recheck());
        while prober.gate.lock().is_some() {
            tokio::task::yield_now().await;
        }
        let fresh = store.recheck().await;
        assert_eq!(fresh.latency_ms, Some(50));

        tx.send(ProbeResult::success(2000)).unwrap();
        stale.await.unwrap();
        assert_eq!(store.read().latency_ms, Some(50));
        assert_eq!(store.read().quality, QualityTier::Excellent);
    }

    #[test]
    fn test_apply_rejects_unknown_generation() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let ticket = store.begin_probe(true).unwrap();

        assert!(!store.apply_probe_result(ticket.generation + 1, ProbeResult::success(10)));
        assert!(store.apply_probe_result(ticket.generation, ProbeResult::success(10)));
        assert_eq!(store.read().latency_ms, Some(10));
    }

    #[test]
    fn test_offline_override_is_immediate_and_supersedes_probe() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let ticket = store.begin_probe(false).unwrap();
        assert!(store.read().is_checking);

        store.apply_immediate_override(false);
        let state = store.read();
        assert!(!state.is_online);
        assert_eq!(state.latency_ms, None);
        assert_eq!(state.quality, QualityTier::Offline);
        assert!(!state.is_checking);
        assert!(state.last_checked_at.is_some());
        assert!(ticket.cancel.is_cancelled());

        // The probe that was in flight can no longer flip the state back
        assert!(!store.apply_probe_result(ticket.generation, ProbeResult::success(80)));
        assert_eq!(store.read().quality, QualityTier::Offline);
    }

    #[test]
    fn test_online_override_resets_quality_to_unknown() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(false)));
        store.apply_immediate_override(true);
        let state = store.read();
        assert!(state.is_online);
        assert_eq!(state.quality, QualityTier::Unknown);
        assert_eq!(state.latency_ms, None);
    }

    #[test]
    fn test_last_checked_at_never_decreases() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let mut previous = None;
        for step in 0..20 {
            if step % 3 == 0 {
                store.apply_immediate_override(step % 2 == 0);
            } else {
                let ticket = store.begin_probe(true).unwrap();
                store.apply_probe_result(ticket.generation, ProbeResult::success(step * 100));
            }
            let state = store.read();
            assert_invariants(&state);
            assert!(state.last_checked_at >= previous);
            previous = state.last_checked_at;
        }

        let future = Utc::now() + chrono::Duration::seconds(60);
        assert_eq!(next_checked_at(Some(future)), future);
    }

    #[test]
    fn test_subscription_receives_changes_until_dropped() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subscription = {
            let seen = seen.clone();
            store.subscribe(move |state| seen.lock().push(state.quality))
        };
        assert_eq!(store.listener_count(), 1);

        store.apply_immediate_override(false);
        subscription.unsubscribe();
        assert_eq!(store.listener_count(), 0);
        store.apply_immediate_override(true);

        assert_eq!(*seen.lock(), vec![QualityTier::Offline]);
    }

    #[test]
    fn test_listeners_see_writes_in_order_across_threads() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let entered = Arc::new(AtomicBool::new(false));

        let _subscription = {
            let seen = seen.clone();
            let entered = entered.clone();
            store.subscribe(move |state| {
                if state.latency_ms.is_some() {
                    entered.store(true, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(200));
                }
                seen.lock().push((state.is_online, state.quality));
            })
        };

        let ticket = store.begin_probe(true).unwrap();
        let writer = {
            let store = store.clone();
            std::thread::spawn(move || {
                store.apply_probe_result(ticket.generation, ProbeResult::success(100))
            })
        };
        while !entered.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        store.apply_immediate_override(false);
        assert!(writer.join().unwrap());

        let state = store.read();
        let seen = seen.lock().clone();
        assert_eq!(
            seen,
            vec![(true, QualityTier::Excellent), (false, QualityTier::Offline)]
        );
        assert_eq!(seen.last().copied(), Some((state.is_online, state.quality)));
    }

    #[test]
    fn test_overtaken_state_is_never_delivered() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(false)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _subscription = {
            let seen = seen.clone();
            store.subscribe(move |state| seen.lock().push(state.quality))
        };

        store.apply_immediate_override(true);
        let stale = store.read();
        let stale_revision = store.inner.lock().revision;
        store.apply_immediate_override(false);

        // A writer that lost the race to deliver arrives late
        store.notify(stale_revision, &stale);

        assert_eq!(
            *seen.lock(),
            vec![QualityTier::Unknown, QualityTier::Offline]
        );
    }

    #[test]
    fn test_close_from_listener_stops_delivery() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let calls = Arc::new(AtomicUsize::new(0));

        let _closer = {
            let weak = Arc::downgrade(&store);
            store.subscribe(move |_| {
                if let Some(store) = weak.upgrade() {
                    store.close();
                }
            })
        };
        let _counter = {
            let calls = calls.clone();
            store.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        store.apply_immediate_override(false);
        assert!(store.is_closed());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_close_cancels_in_flight_and_blocks_writes() {
        let prober = ScriptedProber::new();
        let gate = prober.push_gated();
        let store = store_with(prober.clone(), Arc::new(SignalHost::new(true)));

        let calls = Arc::new(AtomicUsize::new(0));
        let _subscription = {
            let calls = calls.clone();
            store.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        let pending = tokio::spawn(store.recheck());
        let before = calls.load(Ordering::SeqCst);
        store.close();

        let _ = gate.send(ProbeResult::success(10));
        let state = pending.await.unwrap();
        assert_eq!(state.latency_ms, None);
        assert!(!state.is_checking, "a cancelled recheck must not stay checking");
        assert!(!store.watch().borrow().is_checking);

        store.apply_immediate_override(false);
        assert!(store.read().is_online);
        assert!(store.begin_probe(true).is_none());
        assert!(store.trigger_silent_probe().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_silent_probe_leaves_is_checking_untouched() {
        let prober = ScriptedProber::new();
        let gate = prober.push_gated();
        let store = store_with(prober.clone(), Arc::new(SignalHost::new(true)));

        store.trigger_silent_probe().unwrap();
        assert!(!store.read().is_checking);

        gate.send(ProbeResult::success(700)).unwrap();
        let state = wait_for(&store, |s| s.latency_ms.is_some()).await;
        assert_eq!(state.quality, QualityTier::Fair);
        assert!(!state.is_checking);
    }

    #[tokio::test]
    async fn test_watch_sees_latest_state() {
        let store = store_with(ScriptedProber::new(), Arc::new(SignalHost::new(true)));
        let mut rx = store.watch();

        store.apply_immediate_override(false);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().quality, QualityTier::Offline);
    }
}
