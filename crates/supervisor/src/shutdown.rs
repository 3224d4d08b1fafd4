//! Shutdown signal helpers
//!
//! Shutdown is a `watch::Receiver<bool>`; `true` or a dropped sender both
//! mean "stop".

use std::time::Duration;

use tokio::sync::watch;

/// Whether shutdown has already been requested
pub fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Resolve once shutdown is requested
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Sleep for `duration` unless shutdown comes first
///
/// Returns `true` when the full duration elapsed.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = wait_for_shutdown(shutdown) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
