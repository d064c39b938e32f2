//! Special logging functions for specific use cases

use super::tags::LogTag;
use crate::connectivity::{ConnectivityState, QualityTier};
use crate::logger;

/// Log a connectivity transition with the before/after summary
///
/// Reachability changes are reported at info (restored) or warning (lost);
/// a tier change while staying online is debug-level noise.
pub fn log_state_transition(previous: &ConnectivityState, current: &ConnectivityState, cause: &str) {
    let latency = current
        .latency_ms
        .map(|ms| format!("{}ms", ms))
        .unwrap_or_else(|| "n/a".to_string());

    match (previous.is_online, current.is_online) {
        (false, true) => logger::info(
            LogTag::Store,
            &format!(
                "Connection restored via {} (quality={}, latency={})",
                cause, current.quality, latency
            ),
        ),
        (true, false) => logger::warning(
            LogTag::Store,
            &format!("Connection lost via {} (was {})", cause, previous.quality),
        ),
        _ if previous.quality != current.quality => {
            let message = format!(
                "Quality {} -> {} via {} (latency={})",
                previous.quality, current.quality, cause, latency
            );
            if current.quality == QualityTier::Poor {
                logger::warning(LogTag::Store, &message);
            } else {
                logger::debug(LogTag::Store, &message);
            }
        }
        _ => logger::verbose(
            LogTag::Store,
            &format!(
                "State refreshed via {} (quality={}, latency={})",
                cause, current.quality, latency
            ),
        ),
    }
}
