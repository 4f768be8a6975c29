//! Scoped suspension of referential-integrity enforcement.

use tokio_postgres::Client;
use tracing::warn;

/// Guard around `session_replication_role`.
///
/// Bulk loads run with the session role set to `replica` so foreign keys
/// and triggers do not fire against tables that may not exist yet. Both
/// the suspend and the restore are best-effort: some managed Postgres
/// setups refuse the setting, which is logged as a warning and tolerated.
///
/// `restore` must be called on every exit path, including insert failure;
/// the caller holds the insert result until the restore has run.
#[must_use = "restore() must be called before the load result is returned"]
pub struct ReplicationGuard {
    suspended: bool,
}

impl ReplicationGuard {
    /// Attempt to switch the session to replica role.
    pub async fn suspend(client: &Client) -> Self {
        match client
            .simple_query("SET session_replication_role = 'replica'")
            .await
        {
            Ok(_) => Self { suspended: true },
            Err(e) => {
                warn!(
                    "Could not suspend referential integrity (insufficient privilege?): {}",
                    e
                );
                Self { suspended: false }
            }
        }
    }

    /// Restore the session to origin role, if it was switched.
    pub async fn restore(self, client: &Client) {
        if !self.suspended {
            return;
        }
        if let Err(e) = client
            .simple_query("SET session_replication_role = 'origin'")
            .await
        {
            warn!("Could not restore referential integrity setting: {}", e);
        }
    }
}
