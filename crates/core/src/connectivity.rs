//! Connectivity gating
//!
//! Defers transfer work until the target host is reachable. Polling uses
//! a fixed interval between tries, deliberately distinct from the
//! exponential backoff applied to transfer operations.

use std::time::Duration;

use tracing::{debug, info, warn};

use terrasync_domain::{Result, SyncError};

use crate::ports::Connectivity;

/// Poll `probe` up to `max_attempts` times, sleeping `interval` between
/// tries. Returns on the first successful probe.
///
/// # Errors
/// `SyncError::NetworkUnavailable` carrying the attempt count once all
/// attempts are exhausted.
pub async fn wait_until_reachable(
    probe: &dyn Connectivity,
    max_attempts: u32,
    interval: Duration,
) -> Result<()> {
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        debug!(attempt, max_attempts, "probing connectivity");
        if probe.is_reachable().await {
            info!(attempt, "host reachable");
            return Ok(());
        }
        if attempt < max_attempts {
            debug!(attempt, ?interval, "host unreachable, waiting before next probe");
            tokio::time::sleep(interval).await;
        }
    }

    warn!(attempts = max_attempts, "connectivity probing exhausted");
    Err(SyncError::NetworkUnavailable { attempts: max_attempts })
}
