use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete connection-quality bucket derived from probe latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Round trip under 200ms
    Excellent,
    /// Round trip under 500ms
    Good,
    /// Round trip under 1s
    Fair,
    /// Round trip of 1s or more
    Poor,
    /// No usable path to the backend
    Offline,
    /// Online, but no latency measured yet
    Unknown,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Fair => "fair",
            QualityTier::Poor => "poor",
            QualityTier::Offline => "offline",
            QualityTier::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Badge color token for UI collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Success,
    Warning,
    Danger,
    Secondary,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Success => "success",
            StatusColor::Warning => "warning",
            StatusColor::Danger => "danger",
            StatusColor::Secondary => "secondary",
        }
    }
}

/// Canonical connectivity state, owned and mutated only by `StatusStore`
///
/// Invariants kept by the store:
/// - `quality == Offline` exactly when `!is_online`
/// - `latency_ms` is `None` whenever `!is_online`
/// - `last_checked_at` never moves backwards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityState {
    pub is_online: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub latency_ms: Option<u64>,
    pub quality: QualityTier,
    /// True only while a user-initiated recheck is in flight
    pub is_checking: bool,
}

impl ConnectivityState {
    /// Initial state from the host's best guess
    pub fn initial(host_online: bool) -> Self {
        Self {
            is_online: host_online,
            last_checked_at: None,
            latency_ms: None,
            quality: if host_online {
                QualityTier::Unknown
            } else {
                QualityTier::Offline
            },
            is_checking: false,
        }
    }
}

/// Why a probe did not confirm reachability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// No response within the probe timeout
    Timeout { timeout_ms: u64 },
    /// Connection refused, DNS failure, TLS failure, ...
    Network { message: String },
    /// Response arrived with a non-2xx status
    HttpStatus { status: u16 },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Timeout { timeout_ms } => write!(f, "timeout after {}ms", timeout_ms),
            FailureReason::Network { message } => write!(f, "network error: {}", message),
            FailureReason::HttpStatus { status } => write!(f, "HTTP {}", status),
        }
    }
}

/// Result of one completed probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub reachable: bool,
    pub latency_ms: Option<u64>,
    pub failure: Option<FailureReason>,
}

impl ProbeResult {
    pub fn success(latency_ms: u64) -> Self {
        Self {
            reachable: true,
            latency_ms: Some(latency_ms),
            failure: None,
        }
    }

    /// Failed probe; reachability falls back to the host's own online flag
    pub fn failure(reason: FailureReason, host_online: bool) -> Self {
        Self {
            reachable: host_online,
            latency_ms: None,
            failure: Some(reason),
        }
    }
}

/// Outcome of a probe attempt
///
/// `Cancelled` is not a failure: the probe was superseded or the monitor
/// was torn down, and the store drops it without touching state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Completed(ProbeResult),
    Cancelled,
}
