//! One-shot partition layout initialization
//!
//! Seeds the bucket with the year/month prefix skeleton so the raw zone is
//! browsable before the first file lands. Run once after provisioning; safe
//! to re-run (placeholders are idempotent overwrites).

use crate::config::{Partitioning, Settings};
use crate::error::Result;
use crate::storage::Storage;
use tracing::info;

/// Create placeholder prefixes for every dataset through `through_year`.
///
/// Period-partitioned datasets get `<prefix>/<dataset>/<year>/<month:02>/`
/// for each month from the configured start year; ingestion-date datasets
/// only get their base prefix, since their partitions are created on write.
pub async fn initialize(
    settings: &Settings,
    storage: &Storage,
    through_year: i32,
) -> Result<usize> {
    let raw_prefix = &settings.storage.raw_prefix;
    let start_year = settings.layout.start_year;
    let mut created = 0;

    for dataset in &settings.datasets {
        match dataset.partitioning {
            Partitioning::Period => {
                for year in start_year..=through_year {
                    for month in 1..=12 {
                        let prefix =
                            format!("{}/{}/{}/{:02}", raw_prefix, dataset.name, year, month);
                        storage.put_placeholder(&prefix).await?;
                        created += 1;
                    }
                }
            },
            Partitioning::IngestionDate => {
                let prefix = format!("{}/{}", raw_prefix, dataset.name);
                storage.put_placeholder(&prefix).await?;
                created += 1;
            },
        }

        info!(dataset = %dataset.name, "Layout initialized");
    }

    info!(prefixes = created, "Initial structure created");
    Ok(created)
}
