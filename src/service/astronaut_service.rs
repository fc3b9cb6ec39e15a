//! Astronaut service: the operations exposed to the routing layer.

use crate::domain::{AstronautDeserialized, AstronautId, AstronautInMemory};
use crate::error::RegistryError;
use crate::persistence::models::SnapshotRecord;
use crate::persistence::{TransactionalExecutor, settle};

use super::snapshot_store;

/// Entry point for every astronaut operation.
///
/// Stateless apart from the injected executor. Each call acquires its own
/// connection (reads) or transaction (writes) and gives it back before
/// returning, on success and on failure. Writes commit as a whole or not at
/// all.
#[derive(Debug)]
pub struct AstronautService<E> {
    executor: E,
}

impl<E: TransactionalExecutor> AstronautService<E> {
    /// Creates a service over the given executor.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Returns a reference to the inner executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Creates an astronaut and returns its identity.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError::PersistenceError`] if either insert fails;
    /// nothing is stored in that case.
    pub async fn create_astronaut(
        &self,
        data: &AstronautDeserialized,
    ) -> Result<AstronautId, RegistryError> {
        let mut tx = self.executor.begin().await?;
        let outcome = snapshot_store::create(&mut tx, data).await;
        let id = settle(tx, outcome).await?;

        tracing::info!(%id, "astronaut created");
        Ok(id)
    }

    /// Replaces the current state of an astronaut.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] for an unknown identity and
    /// [`RegistryError::PersistenceError`] on store failure.
    pub async fn update_astronaut(
        &self,
        id: AstronautId,
        data: &AstronautDeserialized,
    ) -> Result<(), RegistryError> {
        let mut tx = self.executor.begin().await?;
        let outcome = snapshot_store::update(&mut tx, id, data).await;
        settle(tx, outcome).await?;

        tracing::info!(%id, "astronaut updated");
        Ok(())
    }

    /// Soft-deletes an astronaut.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the astronaut does not exist or
    /// is already deleted.
    pub async fn delete_astronaut(&self, id: AstronautId) -> Result<(), RegistryError> {
        let mut tx = self.executor.begin().await?;
        let outcome = snapshot_store::delete_by_id(&mut tx, id).await;
        settle(tx, outcome).await?;

        tracing::info!(%id, "astronaut deleted");
        Ok(())
    }

    /// Returns the current state of an astronaut.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the astronaut does not exist or
    /// is deleted.
    pub async fn get_astronaut(&self, id: AstronautId) -> Result<AstronautInMemory, RegistryError> {
        let mut conn = self.executor.acquire().await?;
        snapshot_store::get_by_id(&mut conn, id).await
    }

    /// Returns every astronaut that is not deleted, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PersistenceError`] on store failure.
    pub async fn list_astronauts(&self) -> Result<Vec<AstronautInMemory>, RegistryError> {
        let mut conn = self.executor.acquire().await?;
        snapshot_store::get_all(&mut conn).await
    }

    /// Returns the full snapshot history of an astronaut, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the identity has no snapshots.
    pub async fn astronaut_history(
        &self,
        id: AstronautId,
    ) -> Result<Vec<SnapshotRecord>, RegistryError> {
        let mut conn = self.executor.acquire().await?;
        snapshot_store::history(&mut conn, id).await
    }

    /// Returns `true` if a store connection can be acquired.
    pub async fn storage_ready(&self) -> bool {
        match self.executor.acquire().await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "storage not ready");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::AstronautSerialized;
    use crate::persistence::SnapshotStatements;
    use crate::persistence::memory::MemoryExecutor;
    use std::sync::Arc;
    use tokio_test::assert_ok;

    fn astronaut(name: &str, surname: &str) -> AstronautDeserialized {
        let input = AstronautSerialized {
            name: name.to_string(),
            surname: surname.to_string(),
            superpower: "orbit".to_string(),
            birthdate: "1934-03-09".to_string(),
        };
        let Ok(data) = input.to_deserialized() else {
            panic!("valid input rejected");
        };
        data
    }

    fn make_service() -> AstronautService<MemoryExecutor> {
        AstronautService::new(MemoryExecutor::new())
    }

    #[tokio::test]
    async fn gagarin_scenario() {
        let service = make_service();

        let id = assert_ok!(service.create_astronaut(&astronaut("Yuri", "Gagarin")).await);
        assert_eq!(id.get(), 1);
        let current = assert_ok!(service.get_astronaut(id).await);
        assert_eq!(current.surname, "Gagarin");
        assert!(!current.is_deleted);

        assert_ok!(service.update_astronaut(id, &astronaut("Yuri", "G.")).await);
        assert_eq!(assert_ok!(service.get_astronaut(id).await).surname, "G.");
        let history = assert_ok!(service.astronaut_history(id).await);
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|s| s.is_active()).count(), 1);

        assert_ok!(service.delete_astronaut(id).await);
        assert!(service.get_astronaut(id).await.is_err_and(|e| e.is_not_found()));
        assert!(assert_ok!(service.list_astronauts().await).is_empty());
    }

    #[tokio::test]
    async fn failed_create_leaves_no_identity() {
        let service = make_service();
        service.executor().fail_snapshot_inserts(true);

        let result = service.create_astronaut(&astronaut("Yuri", "Gagarin")).await;
        assert!(matches!(result, Err(RegistryError::PersistenceError(_))));

        let mut conn = assert_ok!(service.executor().acquire().await);
        assert!(!assert_ok!(conn.lock_identity(AstronautId::new(1)).await));
        assert!(assert_ok!(service.list_astronauts().await).is_empty());
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_snapshot_active() {
        let service = make_service();
        let id = assert_ok!(service.create_astronaut(&astronaut("Yuri", "Gagarin")).await);

        service.executor().fail_snapshot_inserts(true);
        let result = service.update_astronaut(id, &astronaut("Yuri", "G.")).await;
        assert!(result.is_err());
        service.executor().fail_snapshot_inserts(false);

        let current = assert_ok!(service.get_astronaut(id).await);
        assert_eq!(current.surname, "Gagarin");
        let history = assert_ok!(service.astronaut_history(id).await);
        assert_eq!(history.len(), 1);
        assert!(history.iter().all(SnapshotRecord::is_active));
    }

    #[tokio::test]
    async fn concurrent_updates_keep_one_active_snapshot() {
        let service = Arc::new(make_service());
        let id = assert_ok!(service.create_astronaut(&astronaut("Yuri", "Gagarin")).await);

        let mut handles = Vec::new();
        for n in 0..16 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .update_astronaut(id, &astronaut("Yuri", &format!("Gagarin {n}")))
                    .await
            }));
        }
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("update task panicked");
            };
            assert_ok!(result);
        }

        let history = assert_ok!(service.astronaut_history(id).await);
        assert_eq!(history.len(), 17);
        assert_eq!(history.iter().filter(|s| s.is_active()).count(), 1);
    }

    #[tokio::test]
    async fn list_returns_live_astronauts_in_id_order() {
        let service = make_service();
        let first = assert_ok!(service.create_astronaut(&astronaut("Yuri", "Gagarin")).await);
        let second =
            assert_ok!(service.create_astronaut(&astronaut("Valentina", "Tereshkova")).await);
        let third = assert_ok!(service.create_astronaut(&astronaut("Alexei", "Leonov")).await);
        assert_ok!(service.delete_astronaut(second).await);

        let ids: Vec<AstronautId> = assert_ok!(service.list_astronauts().await)
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![first, third]);
    }

    #[tokio::test]
    async fn storage_ready_with_memory_executor() {
        assert!(make_service().storage_ready().await);
    }
}
