//! Persistence layer: the transactional executor boundary.
//!
//! The snapshot store is written against three traits rather than a concrete
//! database driver:
//!
//! - [`SnapshotStatements`]: the parameterized statements the store issues.
//! - [`SnapshotTransaction`]: a statement scope that commits or rolls back.
//! - [`TransactionalExecutor`]: hands out scoped connections and transactions.
//!
//! Connections and transactions are released when dropped, so every exit path
//! gives them back. An unsettled transaction is rolled back on drop; use
//! [`settle`] to roll back explicitly before an error propagates.
//!
//! Two executors are provided: [`postgres::PostgresExecutor`] over
//! `sqlx::PgPool`, and [`memory::MemoryExecutor`] for tests and local runs.

pub mod memory;
pub mod models;
pub mod postgres;

use std::future::Future;

use crate::domain::{AstronautDeserialized, AstronautId, AstronautRow};
use crate::error::RegistryError;

use self::models::SnapshotRecord;

/// Statements over the identity and snapshot tables.
pub trait SnapshotStatements: Send {
    /// Inserts a new identity record and returns its key.
    fn insert_identity(&mut self)
    -> impl Future<Output = Result<AstronautId, RegistryError>> + Send;

    /// Locks the identity row for the rest of the enclosing transaction.
    ///
    /// Resolves to `false` when the identity does not exist.
    fn lock_identity(
        &mut self,
        id: AstronautId,
    ) -> impl Future<Output = Result<bool, RegistryError>> + Send;

    /// Inserts an active snapshot (`expired_at` unset) and returns its key.
    fn insert_snapshot(
        &mut self,
        id: AstronautId,
        fields: &AstronautDeserialized,
        is_deleted: bool,
    ) -> impl Future<Output = Result<i64, RegistryError>> + Send;

    /// Sets `expired_at = now` on the active snapshot(s) of `id` and returns
    /// the number of rows expired. Already expired rows are left untouched.
    fn expire_active_snapshots(
        &mut self,
        id: AstronautId,
    ) -> impl Future<Output = Result<u64, RegistryError>> + Send;

    /// Selects identities joined to their active, non-deleted snapshot,
    /// restricted to `id` when given, ordered by identity key.
    fn select_active(
        &mut self,
        id: Option<AstronautId>,
    ) -> impl Future<Output = Result<Vec<AstronautRow>, RegistryError>> + Send;

    /// Selects every snapshot of `id`, oldest first.
    fn select_snapshots(
        &mut self,
        id: AstronautId,
    ) -> impl Future<Output = Result<Vec<SnapshotRecord>, RegistryError>> + Send;
}

/// A statement scope whose effects become visible only on commit.
pub trait SnapshotTransaction: SnapshotStatements {
    /// Commits every statement issued in this transaction.
    fn commit(self) -> impl Future<Output = Result<(), RegistryError>> + Send;

    /// Discards every statement issued in this transaction.
    fn rollback(self) -> impl Future<Output = Result<(), RegistryError>> + Send;
}

/// Source of scoped connections and transactions.
///
/// Created once at startup and shared by reference; implementations hold no
/// per-request state.
pub trait TransactionalExecutor: Send + Sync + 'static {
    /// Autocommit connection, returned to the executor on drop.
    type Connection: SnapshotStatements;
    /// Transaction, rolled back on drop unless committed.
    type Transaction: SnapshotTransaction;

    /// Acquires a connection.
    fn acquire(&self) -> impl Future<Output = Result<Self::Connection, RegistryError>> + Send;

    /// Begins a transaction on a freshly acquired connection.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, RegistryError>> + Send;

    /// Releases every resource held by the executor.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Commits `tx` when `outcome` is `Ok`, rolls it back otherwise.
///
/// A failed rollback is logged and the original error is returned.
///
/// # Errors
///
/// Returns the error carried by `outcome`, or the commit failure.
pub async fn settle<T, X>(tx: X, outcome: Result<T, RegistryError>) -> Result<T, RegistryError>
where
    X: SnapshotTransaction,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
