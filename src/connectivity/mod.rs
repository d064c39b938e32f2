//! Connectivity monitor
//!
//! Reconciles host online/offline signals, foreground changes and active
//! health-check probes into one `ConnectivityState`.
//!
//! ```text
//!   EventBridge ──┐                    ┌─> listeners / watch
//!                 ├─> StatusStore ─────┤
//!   Scheduler ────┘     │   ▲          └─> recheck() callers
//!                       ▼   │
//!                      Prober
//! ```

pub mod cancel;
pub mod events;
pub mod host;
pub mod monitor;
pub mod prober;
pub mod quality;
pub mod scheduler;
pub mod store;
pub mod types;

pub use cancel::CancelToken;
pub use events::EventBridge;
pub use host::{HostEnvironment, HostSignal, HostSubscription, SignalHost};
pub use monitor::ConnectivityMonitor;
pub use prober::{HttpProber, Prober};
pub use quality::classify;
pub use scheduler::Scheduler;
pub use store::{ProbeTicket, StatusStore, Subscription};
pub use types::{
    ConnectivityState, FailureReason, ProbeOutcome, ProbeResult, QualityTier, StatusColor,
};
