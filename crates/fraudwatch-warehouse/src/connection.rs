//! Lazily created, self-healing warehouse connection.

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::error::WarehouseError;
use crate::query::Query;
use crate::tabular::TabularResult;

/// An open handle to the warehouse.
pub trait WarehouseConnection: Send {
    /// Cheap liveness probe.
    fn probe(&self) -> Result<(), WarehouseError>;

    /// Execute a read-only query and materialize at most `max_rows` rows.
    fn query(&self, query: &Query, max_rows: usize) -> Result<TabularResult, WarehouseError>;
}

/// Creates warehouse connections from configured credentials.
pub trait Connector: Send + Sync {
    type Connection: WarehouseConnection;

    /// Open a new connection. Failures map to [`WarehouseError::Connection`].
    fn connect(&self) -> Result<Self::Connection, WarehouseError>;
}

struct Slot<T> {
    connection: Option<T>,
    generation: u64,
}

/// Owns at most one live connection, created on first use.
///
/// [`get`](ConnectionHolder::get) probes the held connection and replaces it
/// when the probe fails. The old handle is dropped before the new one is
/// opened, so two connections are never live at the same time.
pub struct ConnectionHolder<C: Connector> {
    connector: C,
    slot: Mutex<Slot<C::Connection>>,
}

impl<C: Connector> ConnectionHolder<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            slot: Mutex::new(Slot {
                connection: None,
                generation: 0,
            }),
        }
    }

    /// Return a live connection, reconnecting once if needed.
    ///
    /// The returned guard keeps the connection locked until it is dropped.
    ///
    /// # Errors
    /// Returns [`WarehouseError::Connection`] if a new connection cannot be
    /// created.
    pub fn get(&self) -> Result<HeldConnection<'_, C::Connection>, WarehouseError> {
        let mut slot = self.lock();

        let alive = match slot.connection.as_ref() {
            Some(connection) => match connection.probe() {
                Ok(()) => true,
                Err(error) => {
                    warn!(
                        generation = slot.generation,
                        %error,
                        "liveness probe failed, reconnecting"
                    );
                    false
                }
            },
            None => false,
        };

        if !alive {
            slot.connection = None;
            let connection = self.connector.connect().map_err(|error| match error {
                WarehouseError::Connection { .. } => error,
                other => WarehouseError::connection(other),
            })?;
            slot.generation += 1;
            slot.connection = Some(connection);
            info!(generation = slot.generation, "warehouse connection established");
        }

        Ok(HeldConnection { guard: slot })
    }

    /// Drop the current connection; the next [`get`](Self::get) reconnects.
    pub fn reset(&self) {
        let mut slot = self.lock();
        if slot.connection.take().is_some() {
            info!(generation = slot.generation, "warehouse connection reset");
        }
    }

    /// Release the connection at shutdown.
    pub fn close(&self) {
        let mut slot = self.lock();
        if slot.connection.take().is_some() {
            info!(generation = slot.generation, "warehouse connection closed");
        }
    }

    /// Whether a connection is currently held (not probed).
    pub fn is_connected(&self) -> bool {
        self.lock().connection.is_some()
    }

    /// Number of connections opened so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> MutexGuard<'_, Slot<C::Connection>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A connection borrowed from a [`ConnectionHolder`].
pub struct HeldConnection<'a, T> {
    guard: MutexGuard<'a, Slot<T>>,
}

impl<T> HeldConnection<'_, T> {
    /// Sequence number of the underlying connection, starting at 1.
    pub fn generation(&self) -> u64 {
        self.guard.generation
    }
}

impl<T> Deref for HeldConnection<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.guard
            .connection
            .as_ref()
            .expect("held connection unexpectedly missing")
    }
}
