//! Periodic cleanup job.
//!
//! Runs independently of request handling and is never relied on for
//! correctness: expired refresh tokens are already rejected at use, this
//! just reclaims the rows. Also prunes old notifications and submissions
//! whose storage object has vanished.

use std::time::Duration;

use tracing::{info, warn};

use crate::state::AppState;

const THIRTY_DAYS: &str = "30 days";

fn sweep_interval() -> Duration {
    let secs = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3600);
    Duration::from_secs(secs)
}

/// Spawn the cleanup loop. The first tick fires after one full interval
/// so startup is not slowed down.
pub fn spawn_cleanup_task(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        interval.tick().await;

        loop {
            interval.tick().await;
            run_cleanup(&state).await;
        }
    });
}

async fn run_cleanup(state: &AppState) {
    match sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
        .execute(&state.db)
        .await
    {
        Ok(result) if result.rows_affected() > 0 => {
            info!(deleted = result.rows_affected(), "Swept expired refresh tokens");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Failed to sweep expired refresh tokens"),
    }

    match sqlx::query(&format!(
        "DELETE FROM notifications WHERE created_at < NOW() - INTERVAL '{}'",
        THIRTY_DAYS
    ))
    .execute(&state.db)
    .await
    {
        Ok(result) if result.rows_affected() > 0 => {
            info!(deleted = result.rows_affected(), "Swept old notifications");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Failed to sweep old notifications"),
    }

    sweep_orphaned_submissions(state).await;
}

/// Remove submission rows whose uploaded file no longer exists in
/// storage. Rows without an object key came from external URLs and are
/// left alone.
async fn sweep_orphaned_submissions(state: &AppState) {
    let rows = match sqlx::query_as::<_, (uuid::Uuid, String)>(
        "SELECT id, object_key FROM submissions WHERE object_key IS NOT NULL",
    )
    .fetch_all(&state.db)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Failed to list submissions for orphan sweep");
            return;
        }
    };

    for (submission_id, object_key) in rows {
        let exists = match state.storage.exists(&object_key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(submission_id = %submission_id, error = %e, "Storage check failed");
                continue;
            }
        };

        if !exists {
            match sqlx::query("DELETE FROM submissions WHERE id = $1")
                .bind(submission_id)
                .execute(&state.db)
                .await
            {
                Ok(_) => {
                    info!(submission_id = %submission_id, "Removed submission with missing storage object");
                }
                Err(e) => {
                    warn!(submission_id = %submission_id, error = %e, "Failed to remove orphaned submission");
                }
            }
        }
    }
}
