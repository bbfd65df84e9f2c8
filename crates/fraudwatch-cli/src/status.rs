use std::path::Path;

use fraudwatch_warehouse::{CacheStats, Connector, ReadThroughQueryService};
use serde::Serialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

/// Connection indicator shown beside every page.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub database: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub entries: usize,
    pub stats: CacheStats,
}

/// Check the connection. A failed check is reported, not raised.
pub fn check<C: Connector>(
    service: &ReadThroughQueryService<C>,
    database: &Path,
    with_cache: bool,
) -> StatusReport {
    let error = match service.check_connection() {
        Ok(()) => None,
        Err(error) => {
            warn!(%error, "warehouse status check failed");
            Some(error.to_string())
        }
    };

    StatusReport {
        connected: error.is_none(),
        error,
        database: database.display().to_string(),
        last_updated: timestamp(OffsetDateTime::now_utc()),
        cache: with_cache.then(|| CacheSummary {
            entries: service.cache().len(),
            stats: service.cache_stats(),
        }),
    }
}

fn timestamp(now: OffsetDateTime) -> String {
    now.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second] UTC"
    ))
    .unwrap_or_else(|_| now.to_string())
}
