//! netpulse - client-side connectivity monitor
//!
//! Tracks whether a backend health endpoint is reachable, classifies the
//! connection quality from probe latency, and publishes one consistent
//! `ConnectivityState` to subscribers. See [`connectivity`] for the moving
//! parts.

pub mod arguments;
pub mod config;
pub mod connectivity;
pub mod errors;
pub mod logger;

pub use connectivity::{
    ConnectivityMonitor, ConnectivityState, HostEnvironment, HostSignal, QualityTier, SignalHost,
    StatusColor,
};
pub use errors::MonitorError;
