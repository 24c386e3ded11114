/**
 * Housekeeping
 *
 * Periodic purge of revocation entries whose tokens have expired anyway and
 * of login attempts past the retention period. Failures are logged and the
 * next tick tries again.
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::backend::auth::service::AuthService;

/// Rows removed by one housekeeping pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HousekeepingReport {
    pub revoked_tokens: u64,
    pub login_attempts: u64,
}

/// Run both purges once
pub async fn run_once(auth: &AuthService) -> HousekeepingReport {
    let mut report = HousekeepingReport::default();

    match auth.cleanup_expired_tokens().await {
        Ok(removed) => report.revoked_tokens = removed,
        Err(e) => tracing::error!(error = %e, "Failed to purge expired revoked tokens"),
    }
    match auth.cleanup_old_login_attempts().await {
        Ok(removed) => report.login_attempts = removed,
        Err(e) => tracing::error!(error = %e, "Failed to purge old login attempts"),
    }

    tracing::debug!(
        revoked_tokens = report.revoked_tokens,
        login_attempts = report.login_attempts,
        "Housekeeping pass finished"
    );
    report
}

/// Run [`run_once`] every `every`, starting one interval from now
pub fn spawn(auth: Arc<AuthService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            interval.tick().await;
            run_once(&auth).await;
        }
    })
}
