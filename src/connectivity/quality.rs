//! Quality classification and the UI-facing derivations over it
//!
//! Everything here is a pure function of the state; nothing touches the
//! network or the clock.

use super::types::{ConnectivityState, QualityTier, StatusColor};

pub const EXCELLENT_BELOW_MS: u64 = 200;
pub const GOOD_BELOW_MS: u64 = 500;
pub const FAIR_BELOW_MS: u64 = 1000;

/// Map reachability and measured latency to a quality tier
pub fn classify(is_online: bool, latency_ms: Option<u64>) -> QualityTier {
    if !is_online {
        return QualityTier::Offline;
    }
    match latency_ms {
        None => QualityTier::Unknown,
        Some(ms) if ms < EXCELLENT_BELOW_MS => QualityTier::Excellent,
        Some(ms) if ms < GOOD_BELOW_MS => QualityTier::Good,
        Some(ms) if ms < FAIR_BELOW_MS => QualityTier::Fair,
        Some(_) => QualityTier::Poor,
    }
}

pub fn is_connection_good(quality: QualityTier) -> bool {
    matches!(quality, QualityTier::Excellent | QualityTier::Good)
}

pub fn is_connection_poor(quality: QualityTier) -> bool {
    matches!(quality, QualityTier::Fair | QualityTier::Poor)
}

pub fn quality_text(quality: QualityTier) -> &'static str {
    match quality {
        QualityTier::Excellent => "Excellent",
        QualityTier::Good => "Good",
        QualityTier::Fair => "Fair",
        QualityTier::Poor => "Poor",
        QualityTier::Offline => "Offline",
        QualityTier::Unknown => "Unknown",
    }
}

pub fn status_color(quality: QualityTier) -> StatusColor {
    match quality {
        QualityTier::Excellent | QualityTier::Good => StatusColor::Success,
        QualityTier::Fair | QualityTier::Poor => StatusColor::Warning,
        QualityTier::Offline => StatusColor::Danger,
        QualityTier::Unknown => StatusColor::Secondary,
    }
}

/// One-line status for badges and banners
pub fn status_text(state: &ConnectivityState) -> String {
    if state.is_checking {
        return "Checking connection...".to_string();
    }
    if !state.is_online {
        return "Offline".to_string();
    }
    match state.latency_ms {
        Some(ms) => format!("Online ({}, {}ms)", quality_text(state.quality), ms),
        None => "Online".to_string(),
    }
}

impl ConnectivityState {
    pub fn is_connection_good(&self) -> bool {
        is_connection_good(self.quality)
    }

    pub fn is_connection_poor(&self) -> bool {
        is_connection_poor(self.quality)
    }

    pub fn quality_text(&self) -> &'static str {
        quality_text(self.quality)
    }

    pub fn status_text(&self) -> String {
        status_text(self)
    }

    pub fn status_color(&self) -> StatusColor {
        status_color(self.quality)
    }
}
