//! Snapshot store: versioned astronaut persistence over two tables.
//!
//! Every astronaut is one identity row plus an append-only list of snapshot
//! rows. At most one snapshot per identity is active (`expired_at` unset) and
//! the current state is the active snapshot when it is not deleted. Writes
//! never modify field data in place:
//!
//! - create inserts the identity and its first snapshot;
//! - update expires the active snapshot and inserts its replacement;
//! - delete re-submits the current fields as a new snapshot marked deleted.
//!
//! The functions here issue statements on whatever scope they are given. The
//! caller supplies a transaction for every write so that the statement pairs
//! above commit together.

use crate::domain::{AstronautDeserialized, AstronautId, AstronautInMemory};
use crate::error::RegistryError;
use crate::persistence::SnapshotStatements;
use crate::persistence::models::SnapshotRecord;

/// Creates an identity with its first, active, non-deleted snapshot.
///
/// # Errors
///
/// Propagates store failures unchanged.
pub async fn create<S>(conn: &mut S, data: &AstronautDeserialized) -> Result<AstronautId, RegistryError>
where
    S: SnapshotStatements,
{
    let id = conn.insert_identity().await?;
    let snapshot_id = conn.insert_snapshot(id, data, false).await?;
    tracing::debug!(%id, snapshot_id, "identity created");
    Ok(id)
}

/// Replaces the active snapshot of `id` with one holding `data`.
///
/// Locks the identity, expires its active snapshot, and inserts the new one
/// with the given deleted flag. Updating a soft-deleted astronaut brings it
/// back.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if the identity does not exist, and
/// propagates store failures unchanged.
pub async fn replace_active_snapshot<S>(
    conn: &mut S,
    id: AstronautId,
    data: &AstronautDeserialized,
    mark_deleted: bool,
) -> Result<(), RegistryError>
where
    S: SnapshotStatements,
{
    if !conn.lock_identity(id).await? {
        return Err(RegistryError::NotFound(id));
    }

    let expired = conn.expire_active_snapshots(id).await?;
    if expired > 1 {
        tracing::warn!(%id, expired, "identity had more than one active snapshot");
    }

    let snapshot_id = conn.insert_snapshot(id, data, mark_deleted).await?;
    tracing::debug!(%id, snapshot_id, expired, mark_deleted, "active snapshot replaced");
    Ok(())
}

/// Stores `data` as the new current state of `id`.
///
/// # Errors
///
/// See [`replace_active_snapshot`].
pub async fn update<S>(
    conn: &mut S,
    id: AstronautId,
    data: &AstronautDeserialized,
) -> Result<(), RegistryError>
where
    S: SnapshotStatements,
{
    replace_active_snapshot(conn, id, data, false).await
}

/// Returns the current state of `id`.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] when the identity is missing, has no
/// active snapshot, or its active snapshot is deleted.
pub async fn get_by_id<S>(conn: &mut S, id: AstronautId) -> Result<AstronautInMemory, RegistryError>
where
    S: SnapshotStatements,
{
    let rows = conn.select_active(Some(id)).await?;
    let row = rows.first().ok_or(RegistryError::NotFound(id))?;
    row.to_in_memory()
}

/// Returns the current state of every astronaut that is not deleted.
///
/// # Errors
///
/// Propagates store failures and unreadable temporal values.
pub async fn get_all<S>(conn: &mut S) -> Result<Vec<AstronautInMemory>, RegistryError>
where
    S: SnapshotStatements,
{
    conn.select_active(None)
        .await?
        .iter()
        .map(|row| row.to_in_memory())
        .collect()
}

/// Soft-deletes `id` by re-submitting its current fields marked deleted.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if `id` has no current state, which
/// includes an astronaut that is already deleted.
pub async fn delete_by_id<S>(conn: &mut S, id: AstronautId) -> Result<(), RegistryError>
where
    S: SnapshotStatements,
{
    if !conn.lock_identity(id).await? {
        return Err(RegistryError::NotFound(id));
    }
    let current = get_by_id(conn, id).await?;
    replace_active_snapshot(conn, id, &current.to_deserialized(), true).await
}

/// Returns every snapshot of `id`, oldest first, deleted ones included.
///
/// # Errors
///
/// Returns [`RegistryError::NotFound`] if `id` has no snapshots.
pub async fn history<S>(conn: &mut S, id: AstronautId) -> Result<Vec<SnapshotRecord>, RegistryError>
where
    S: SnapshotStatements,
{
    let snapshots = conn.select_snapshots(id).await?;
    if snapshots.is_empty() {
        return Err(RegistryError::NotFound(id));
    }
    Ok(snapshots)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::AstronautSerialized;
    use crate::persistence::memory::MemoryExecutor;
    use crate::persistence::{SnapshotTransaction, TransactionalExecutor};
    use tokio_test::assert_ok;

    fn astronaut(surname: &str) -> AstronautDeserialized {
        let input = AstronautSerialized {
            name: "Yuri".to_string(),
            surname: surname.to_string(),
            superpower: "orbit".to_string(),
            birthdate: "1934-03-09".to_string(),
        };
        let Ok(data) = input.to_deserialized() else {
            panic!("valid input rejected");
        };
        data
    }

    fn active_count(history: &[SnapshotRecord]) -> usize {
        history.iter().filter(|s| s.is_active()).count()
    }

    #[tokio::test]
    async fn create_then_get_returns_submitted_fields() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);

        let id = assert_ok!(create(&mut conn, &astronaut("Gagarin")).await);
        assert_eq!(id, AstronautId::new(1));

        let current = assert_ok!(get_by_id(&mut conn, id).await);
        assert_eq!(current.to_deserialized(), astronaut("Gagarin"));
        assert!(!current.is_deleted);
        assert_eq!(current.created_at.date_naive(), current.updated_at.date_naive());
    }

    #[tokio::test]
    async fn update_appends_snapshot_and_keeps_one_active() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        let id = assert_ok!(create(&mut conn, &astronaut("Gagarin")).await);

        assert_ok!(update(&mut conn, id, &astronaut("G.")).await);

        let current = assert_ok!(get_by_id(&mut conn, id).await);
        assert_eq!(current.surname, "G.");

        let snapshots = assert_ok!(history(&mut conn, id).await);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(active_count(&snapshots), 1);
        let Some(first) = snapshots.first() else {
            panic!("missing first snapshot");
        };
        assert_eq!(first.surname, "Gagarin");
        assert!(!first.is_active());
    }

    #[tokio::test]
    async fn update_of_unknown_identity_is_not_found() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        let result = update(&mut conn, AstronautId::new(3), &astronaut("Gagarin")).await;
        assert!(matches!(result, Err(RegistryError::NotFound(id)) if id.get() == 3));
    }

    #[tokio::test]
    async fn delete_hides_current_state_but_keeps_history() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        let id = assert_ok!(create(&mut conn, &astronaut("Gagarin")).await);

        assert_ok!(delete_by_id(&mut conn, id).await);

        let result = get_by_id(&mut conn, id).await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert!(assert_ok!(get_all(&mut conn).await).is_empty());

        let snapshots = assert_ok!(history(&mut conn, id).await);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(active_count(&snapshots), 1);
        let Some(last) = snapshots.last() else {
            panic!("missing deleted snapshot");
        };
        assert!(last.is_deleted);
        assert!(last.is_active());
        assert_eq!(last.fields(), astronaut("Gagarin"));
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        let id = assert_ok!(create(&mut conn, &astronaut("Gagarin")).await);
        assert_ok!(delete_by_id(&mut conn, id).await);

        let result = delete_by_id(&mut conn, id).await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert_eq!(assert_ok!(history(&mut conn, id).await).len(), 2);
    }

    #[tokio::test]
    async fn update_after_delete_restores_astronaut() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        let id = assert_ok!(create(&mut conn, &astronaut("Gagarin")).await);
        assert_ok!(delete_by_id(&mut conn, id).await);

        assert_ok!(update(&mut conn, id, &astronaut("Gagarina")).await);
        let current = assert_ok!(get_by_id(&mut conn, id).await);
        assert_eq!(current.surname, "Gagarina");
        assert!(!current.is_deleted);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found_and_writes_nothing() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        let result = get_by_id(&mut conn, AstronautId::new(999)).await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert!(assert_ok!(conn.select_snapshots(AstronautId::new(999)).await).is_empty());
        assert!(matches!(
            history(&mut conn, AstronautId::new(999)).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_all_is_stable_without_writes() {
        let executor = MemoryExecutor::new();
        let mut conn = assert_ok!(executor.acquire().await);
        for surname in ["Gagarin", "Tereshkova", "Leonov"] {
            assert_ok!(create(&mut conn, &astronaut(surname)).await);
        }

        let first = assert_ok!(get_all(&mut conn).await);
        let second = assert_ok!(get_all(&mut conn).await);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn one_active_snapshot_after_any_write_sequence() {
        let executor = MemoryExecutor::new();
        let mut tx = assert_ok!(executor.begin().await);
        let id = assert_ok!(create(&mut tx, &astronaut("Gagarin")).await);
        assert_ok!(update(&mut tx, id, &astronaut("G.")).await);
        assert_ok!(delete_by_id(&mut tx, id).await);
        assert_ok!(update(&mut tx, id, &astronaut("Gagarin")).await);
        assert_ok!(update(&mut tx, id, &astronaut("Y. Gagarin")).await);
        assert_ok!(tx.commit().await);

        let mut conn = assert_ok!(executor.acquire().await);
        let snapshots = assert_ok!(history(&mut conn, id).await);
        assert_eq!(snapshots.len(), 5);
        assert_eq!(active_count(&snapshots), 1);
    }
}
