/// Refresh Token Cleanup Worker
///
/// A single recurring background task that sweeps revoked refresh tokens
/// from the store. Best-effort housekeeping: revoked tokens are already
/// unusable, so a failed sweep is logged and swallowed, never escalated.
/// Runs are strictly serial; the next sweep starts only after the previous
/// one completes.

use sqlx::PgPool;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::auth::delete_revoked_tokens;

/// Run the cleanup loop until the shutdown signal flips to `true`.
///
/// The shutdown signal is checked before every sweep; an in-flight delete is
/// never aborted, only the next scheduling is skipped once cancellation is
/// observed.
pub async fn run_cleanup_worker(
    pool: PgPool,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval fires immediately on the first tick; consume it so the first
    // sweep happens one full interval after startup
    ticker.tick().await;

    tracing::info!(interval_secs = interval.as_secs(), "Cleanup worker started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if *shutdown.borrow() {
                    break;
                }
                sweep(&pool).await;
            }
            changed = shutdown.changed() => {
                // Err means the sender is gone; treat it as shutdown rather
                // than letting this arm complete immediately forever
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Cleanup worker stopped");
}

async fn sweep(pool: &PgPool) {
    match delete_revoked_tokens(pool).await {
        Ok(removed) => {
            tracing::info!(removed = removed, "Revoked refresh tokens swept");
        }
        Err(e) => {
            // best-effort: log and wait for the next run
            tracing::error!(error = %e, "Refresh token sweep failed");
        }
    }
}
