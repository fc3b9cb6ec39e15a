//! In-process implementation of the executor boundary.
//!
//! [`MemoryExecutor`] keeps both tables behind a single
//! [`tokio::sync::Mutex`]. A transaction holds the lock from `begin` until it
//! is settled or dropped and works on a staged copy, so its statements are
//! applied all together on commit or not at all. Autocommit connections take
//! the lock per statement. Constraints mirror the SQL schema: snapshots need an
//! existing identity and at most one active snapshot per identity.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::models::{IdentityRecord, SnapshotRecord};
use super::{SnapshotStatements, SnapshotTransaction, TransactionalExecutor};
use crate::domain::temporal::{format_date, format_timestamp};
use crate::domain::{AstronautDeserialized, AstronautId, AstronautRow};
use crate::error::RegistryError;

/// Contents of the identity and snapshot tables.
#[derive(Debug, Clone, Default)]
struct Tables {
    identities: Vec<IdentityRecord>,
    snapshots: Vec<SnapshotRecord>,
    last_identity_id: i64,
    last_snapshot_id: i64,
}

impl Tables {
    fn insert_identity(&mut self) -> AstronautId {
        self.last_identity_id += 1;
        let id = AstronautId::new(self.last_identity_id);
        self.identities.push(IdentityRecord {
            id,
            created_at: Utc::now(),
        });
        id
    }

    fn has_identity(&self, id: AstronautId) -> bool {
        self.identities.iter().any(|identity| identity.id == id)
    }

    fn insert_snapshot(
        &mut self,
        id: AstronautId,
        fields: &AstronautDeserialized,
        is_deleted: bool,
    ) -> Result<i64, RegistryError> {
        if !self.has_identity(id) {
            return Err(RegistryError::PersistenceError(format!(
                "foreign key violation: astronaut {id} does not exist"
            )));
        }
        if self
            .snapshots
            .iter()
            .any(|snapshot| snapshot.astronaut_id == id && snapshot.is_active())
        {
            return Err(RegistryError::PersistenceError(format!(
                "unique violation: astronaut {id} already has an active snapshot"
            )));
        }

        self.last_snapshot_id += 1;
        self.snapshots.push(SnapshotRecord {
            id: self.last_snapshot_id,
            astronaut_id: id,
            name: fields.name.clone(),
            surname: fields.surname.clone(),
            superpower: fields.superpower.clone(),
            birthdate: fields.birthdate,
            is_deleted,
            created_at: Utc::now(),
            expired_at: None,
        });
        Ok(self.last_snapshot_id)
    }

    fn expire_active_snapshots(&mut self, id: AstronautId) -> u64 {
        let now = Utc::now();
        let mut expired = 0;
        for snapshot in &mut self.snapshots {
            if snapshot.astronaut_id == id && snapshot.is_active() {
                snapshot.expired_at = Some(now);
                expired += 1;
            }
        }
        expired
    }

    fn select_active(&self, id: Option<AstronautId>) -> Vec<AstronautRow> {
        self.identities
            .iter()
            .filter(|identity| id.is_none_or(|wanted| identity.id == wanted))
            .filter_map(|identity| {
                self.snapshots
                    .iter()
                    .find(|s| s.astronaut_id == identity.id && s.is_active() && !s.is_deleted)
                    .map(|snapshot| AstronautRow {
                        id: identity.id.get(),
                        created_at: format_timestamp(identity.created_at),
                        name: snapshot.name.clone(),
                        surname: snapshot.surname.clone(),
                        superpower: snapshot.superpower.clone(),
                        birthdate: format_date(snapshot.birthdate),
                        updated_at: format_timestamp(snapshot.created_at),
                        is_deleted: snapshot.is_deleted,
                    })
            })
            .collect()
    }

    fn select_snapshots(&self, id: AstronautId) -> Vec<SnapshotRecord> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.astronaut_id == id)
            .cloned()
            .collect()
    }
}

/// Fails the statement when snapshot insert failures are switched on.
fn check_snapshot_insert(fail: &AtomicBool) -> Result<(), RegistryError> {
    if fail.load(Ordering::SeqCst) {
        return Err(RegistryError::PersistenceError(
            "snapshot insert rejected by store".to_string(),
        ));
    }
    Ok(())
}

/// In-memory executor with serializable transactions.
///
/// Cloning yields another handle onto the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    tables: Arc<Mutex<Tables>>,
    fail_snapshot_inserts: Arc<AtomicBool>,
}

impl MemoryExecutor {
    /// Creates an executor over empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent snapshot insert fail (or succeed again).
    ///
    /// Used to exercise rollback of partially applied writes.
    pub fn fail_snapshot_inserts(&self, fail: bool) {
        self.fail_snapshot_inserts.store(fail, Ordering::SeqCst);
    }
}

impl TransactionalExecutor for MemoryExecutor {
    type Connection = MemoryConnection;
    type Transaction = MemoryTransaction;

    async fn acquire(&self) -> Result<Self::Connection, RegistryError> {
        Ok(MemoryConnection {
            tables: Arc::clone(&self.tables),
            fail_snapshot_inserts: Arc::clone(&self.fail_snapshot_inserts),
        })
    }

    async fn begin(&self) -> Result<Self::Transaction, RegistryError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction {
            guard,
            staged,
            fail_snapshot_inserts: Arc::clone(&self.fail_snapshot_inserts),
        })
    }

    async fn close(&self) {
        tracing::debug!("memory executor closed");
    }
}

/// Autocommit handle onto the in-memory tables.
#[derive(Debug)]
pub struct MemoryConnection {
    tables: Arc<Mutex<Tables>>,
    fail_snapshot_inserts: Arc<AtomicBool>,
}

impl SnapshotStatements for MemoryConnection {
    async fn insert_identity(&mut self) -> Result<AstronautId, RegistryError> {
        Ok(self.tables.lock().await.insert_identity())
    }

    async fn lock_identity(&mut self, id: AstronautId) -> Result<bool, RegistryError> {
        Ok(self.tables.lock().await.has_identity(id))
    }

    async fn insert_snapshot(
        &mut self,
        id: AstronautId,
        fields: &AstronautDeserialized,
        is_deleted: bool,
    ) -> Result<i64, RegistryError> {
        check_snapshot_insert(&self.fail_snapshot_inserts)?;
        self.tables
            .lock()
            .await
            .insert_snapshot(id, fields, is_deleted)
    }

    async fn expire_active_snapshots(&mut self, id: AstronautId) -> Result<u64, RegistryError> {
        Ok(self.tables.lock().await.expire_active_snapshots(id))
    }

    async fn select_active(
        &mut self,
        id: Option<AstronautId>,
    ) -> Result<Vec<AstronautRow>, RegistryError> {
        Ok(self.tables.lock().await.select_active(id))
    }

    async fn select_snapshots(
        &mut self,
        id: AstronautId,
    ) -> Result<Vec<SnapshotRecord>, RegistryError> {
        Ok(self.tables.lock().await.select_snapshots(id))
    }
}

/// Exclusive transaction over the in-memory tables.
///
/// Statements work on `staged`; commit copies it over the locked tables,
/// rollback or drop discards it.
#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    fail_snapshot_inserts: Arc<AtomicBool>,
}

impl SnapshotStatements for MemoryTransaction {
    async fn insert_identity(&mut self) -> Result<AstronautId, RegistryError> {
        Ok(self.staged.insert_identity())
    }

    async fn lock_identity(&mut self, id: AstronautId) -> Result<bool, RegistryError> {
        Ok(self.staged.has_identity(id))
    }

    async fn insert_snapshot(
        &mut self,
        id: AstronautId,
        fields: &AstronautDeserialized,
        is_deleted: bool,
    ) -> Result<i64, RegistryError> {
        check_snapshot_insert(&self.fail_snapshot_inserts)?;
        self.staged.insert_snapshot(id, fields, is_deleted)
    }

    async fn expire_active_snapshots(&mut self, id: AstronautId) -> Result<u64, RegistryError> {
        Ok(self.staged.expire_active_snapshots(id))
    }

    async fn select_active(
        &mut self,
        id: Option<AstronautId>,
    ) -> Result<Vec<AstronautRow>, RegistryError> {
        Ok(self.staged.select_active(id))
    }

    async fn select_snapshots(
        &mut self,
        id: AstronautId,
    ) -> Result<Vec<SnapshotRecord>, RegistryError> {
        Ok(self.staged.select_snapshots(id))
    }
}

impl SnapshotTransaction for MemoryTransaction {
    async fn commit(self) -> Result<(), RegistryError> {
        let Self {
            mut guard, staged, ..
        } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), RegistryError> {
        Ok(())
    }
}
