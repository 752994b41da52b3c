use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::store::RelationshipRepository;

use super::Catalog;

/// Spawn a background task that periodically reloads the catalog snapshot.
///
/// Returns `None` when `interval_seconds` is 0. A failed reload keeps the
/// previous snapshot in place.
pub fn spawn_refresh_task(
    catalog: Arc<Catalog>,
    repo: Arc<dyn RelationshipRepository>,
    interval_seconds: u64,
) -> Option<JoinHandle<()>> {
    if interval_seconds == 0 {
        tracing::info!("Catalog refresh task disabled");
        return None;
    }

    let interval = Duration::from_secs(interval_seconds);

    Some(tokio::spawn(async move {
        tracing::info!(interval_seconds, "Catalog refresh task started");

        loop {
            tokio::time::sleep(interval).await;

            if let Err(e) = catalog.refresh(repo.as_ref()).await {
                tracing::error!(error = %e, "Catalog refresh failed, keeping previous snapshot");
            }
        }
    }))
}
