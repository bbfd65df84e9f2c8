//! Read-through query service: cache in front of a self-healing connection.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, trace, warn};

use crate::cache::{CacheStats, CacheStatus, QueryCache};
use crate::config::WarehouseConfig;
use crate::connection::{ConnectionHolder, Connector, WarehouseConnection};
use crate::duckdb::DuckDbConnector;
use crate::error::WarehouseError;
use crate::query::Query;
use crate::tabular::TabularResult;

/// Tunables of the read-through service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// How long a cached result stays valid.
    pub cache_ttl: Duration,
    /// Maximum number of rows materialized per query.
    pub max_rows: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(600),
            max_rows: 100_000,
        }
    }
}

impl From<&WarehouseConfig> for ServiceSettings {
    fn from(config: &WarehouseConfig) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            max_rows: config.max_rows,
        }
    }
}

/// Lifecycle of a single uncached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryPhase {
    Pending,
    Connecting,
    Executing,
    Succeeded,
    Failed,
}

impl Display for QueryPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Connecting => "connecting",
            Self::Executing => "executing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// A query that failed and was recovered to an empty result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    /// Error text suitable for display.
    pub message: String,
    /// The offending query, including bound values.
    pub query: String,
}

/// What a page handler receives for one query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    /// Rows to render. Empty (0 columns x 0 rows) after a failure.
    pub data: Arc<TabularResult>,
    /// Whether the rows came from the cache.
    pub cache: CacheStatus,
    /// Set when the query failed; `data` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<QueryFailure>,
}

impl QueryOutcome {
    fn failed(failure: QueryFailure) -> Self {
        Self {
            data: Arc::new(TabularResult::empty()),
            cache: CacheStatus::Miss,
            failure: Some(failure),
        }
    }

    /// False both for zero matching rows and for a failed query.
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

/// Cached, fail-soft query execution against the warehouse.
///
/// One instance is created per hosting process and handed to page handlers.
/// Results are cached by [`Query::cache_key`]. A failing query returns an
/// empty result and resets both the cache and the connection.
pub struct ReadThroughQueryService<C: Connector = DuckDbConnector> {
    connection: ConnectionHolder<C>,
    cache: QueryCache,
    settings: ServiceSettings,
}

impl ReadThroughQueryService<DuckDbConnector> {
    /// Build a `DuckDB`-backed service from configuration.
    ///
    /// No connection is opened until the first query.
    pub fn open(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        config.validate()?;
        let connector = DuckDbConnector::new(config.database.clone(), config.access_mode());
        Ok(Self::new(connector, ServiceSettings::from(config)))
    }
}

impl<C: Connector> ReadThroughQueryService<C> {
    pub fn new(connector: C, settings: ServiceSettings) -> Self {
        Self {
            connection: ConnectionHolder::new(connector),
            cache: QueryCache::new(),
            settings,
        }
    }

    /// Return cached rows for `query` or execute it.
    ///
    /// # Errors
    /// Only [`WarehouseError::Connection`] is returned; every other failure
    /// is reported through [`QueryOutcome::failure`].
    pub fn run(&self, query: &Query) -> Result<QueryOutcome, WarehouseError> {
        let key = query.cache_key();
        let computed = self
            .cache
            .get_or_try_compute(&key, self.settings.cache_ttl, || self.execute(query));

        match computed {
            Ok((data, cache)) => Ok(QueryOutcome {
                data,
                cache,
                failure: None,
            }),
            Err(error) if error.is_connection() => {
                warn!(%error, "warehouse connection unavailable");
                self.connection.reset();
                Err(error)
            }
            Err(error) => {
                error!(%error, query = %query, "query failed, clearing cache and connection");
                self.cache.clear_all();
                self.connection.reset();
                Ok(QueryOutcome::failed(QueryFailure {
                    message: error.to_string(),
                    query: query.to_string(),
                }))
            }
        }
    }

    fn execute(&self, query: &Query) -> Result<TabularResult, WarehouseError> {
        let mut phase = QueryPhase::Pending;
        trace!(%phase, "query lifecycle");

        phase = QueryPhase::Connecting;
        trace!(%phase, "query lifecycle");
        let connection = self.connection.get()?;

        phase = QueryPhase::Executing;
        trace!(%phase, generation = connection.generation(), "query lifecycle");
        let result = connection.query(query, self.settings.max_rows);

        phase = if result.is_ok() {
            QueryPhase::Succeeded
        } else {
            QueryPhase::Failed
        };
        trace!(%phase, "query lifecycle");
        if let Ok(result) = &result {
            debug!(rows = result.row_count(), truncated = result.truncated, "query executed");
        }
        result
    }

    /// User-triggered refresh: drop every cached result.
    pub fn refresh(&self) {
        self.cache.clear_all();
    }

    /// Establish (or re-validate) the connection without running a query.
    pub fn check_connection(&self) -> Result<(), WarehouseError> {
        self.connection.get().map(|_| ())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Drop expired cache entries.
    pub fn purge_expired(&self) -> usize {
        self.cache.purge_expired(self.settings.cache_ttl)
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Shutdown hook: release the connection.
    pub fn close(&self) {
        self.connection.close();
    }
}
