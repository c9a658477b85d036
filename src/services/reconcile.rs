//! Removal of stored images that no recipe references.
//!
//! Uploads happen before the record write, so a crash or failed compensation
//! can leave objects behind. The sweep deletes those once they are older than
//! the grace period, which keeps it clear of uploads still being written.

use crate::db::CatalogStore;
use crate::storage::ObjectStore;
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub scanned: usize,
    pub deleted: usize,
    pub errors: usize,
}

#[derive(Clone)]
pub struct OrphanSweeper {
    store: Arc<dyn CatalogStore>,
    objects: Arc<dyn ObjectStore>,
    grace: chrono::Duration,
}

impl OrphanSweeper {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        objects: Arc<dyn ObjectStore>,
        grace_minutes: u32,
    ) -> Self {
        Self {
            store,
            objects,
            grace: chrono::Duration::minutes(i64::from(grace_minutes)),
        }
    }

    pub async fn sweep(&self) -> Result<SweepStats> {
        let mut stats = SweepStats::default();

        let referenced: HashSet<String> = self
            .store
            .referenced_image_urls()
            .await?
            .iter()
            .filter_map(|url| self.objects.key_for_url(url))
            .collect();

        let cutoff = chrono::Utc::now() - self.grace;

        for object in self.objects.list().await? {
            stats.scanned += 1;

            if referenced.contains(&object.key) || object.modified >= cutoff {
                continue;
            }

            match self.objects.delete(&object.key).await {
                Ok(()) => {
                    debug!(key = %object.key, "Deleted orphaned image");
                    stats.deleted += 1;
                }
                Err(e) => {
                    warn!(key = %object.key, error = %e, "Failed to delete orphaned image");
                    stats.errors += 1;
                }
            }
        }

        if stats.deleted > 0 {
            info!(
                "Orphan sweep: scanned {} objects, deleted {}",
                stats.scanned, stats.deleted
            );
        }

        metrics::counter!("ladle_orphans_deleted_total").increment(stats.deleted as u64);

        Ok(stats)
    }
}
