//! PostgreSQL implementation of the executor boundary.

use std::fmt;
use std::ops::DerefMut;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::Postgres;

use super::models::SnapshotRecord;
use super::{SnapshotStatements, SnapshotTransaction, TransactionalExecutor};
use crate::config::DatabaseConfig;
use crate::domain::{AstronautDeserialized, AstronautId, AstronautRow};
use crate::error::RegistryError;

/// Current state of every astronaut, or of one when `$1` is non-null.
///
/// Temporal columns are rendered as text in a fixed UTC layout so the result
/// does not depend on the session's `DateStyle` or `TimeZone`.
const SELECT_ACTIVE: &str = r#"
    SELECT
        a.id AS id,
        to_char(a.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"') AS created_at,
        s.name AS name,
        s.surname AS surname,
        s.superpower AS superpower,
        to_char(s.birthdate, 'YYYY-MM-DD') AS birthdate,
        to_char(s.created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"') AS updated_at,
        s.is_deleted AS is_deleted
    FROM astronaut a
    JOIN astronaut_snapshot s
        ON  s.astronaut_id = a.id
        AND s.expired_at IS NULL
        AND s.is_deleted IS FALSE
    WHERE $1::BIGINT IS NULL OR a.id = $1
    ORDER BY a.id
"#;

type ActiveRow = (i64, String, String, String, String, String, String, bool);

type SnapshotRow = (
    i64,
    i64,
    String,
    String,
    String,
    NaiveDate,
    bool,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

/// PostgreSQL-backed executor using `sqlx::PgPool`.
///
/// The pool is created once at startup and closed with
/// [`TransactionalExecutor::close`] on shutdown.
#[derive(Debug, Clone)]
pub struct PostgresExecutor {
    pool: PgPool,
}

impl PostgresExecutor {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the connection pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError::PersistenceError`] if the database cannot be
    /// reached within the configured timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RegistryError> {
        tracing::info!(
            target = %describe_target(config),
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "connecting to postgres"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(connect_options(config)?)
            .await
            .map_err(|e| {
                RegistryError::PersistenceError(format!("failed to connect to database: {e}"))
            })?;

        tracing::info!("connected to postgres");
        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies every pending migration under `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError::PersistenceError`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), RegistryError> {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RegistryError::PersistenceError(format!("failed to run migrations: {e}")))?;
        tracing::info!("database migrations complete");
        Ok(())
    }
}

impl TransactionalExecutor for PostgresExecutor {
    type Connection = PgSession<PoolConnection<Postgres>>;
    type Transaction = PgSession<sqlx::Transaction<'static, Postgres>>;

    async fn acquire(&self) -> Result<Self::Connection, RegistryError> {
        Ok(PgSession(self.pool.acquire().await?))
    }

    async fn begin(&self) -> Result<Self::Transaction, RegistryError> {
        Ok(PgSession(self.pool.begin().await?))
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}

/// A pooled connection or transaction issuing the snapshot statements.
///
/// The inner handle goes back to the pool when the session is dropped; a
/// dropped, uncommitted transaction is rolled back by `sqlx`.
pub struct PgSession<C>(C);

impl<C> fmt::Debug for PgSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgSession").finish_non_exhaustive()
    }
}

impl<C> SnapshotStatements for PgSession<C>
where
    C: DerefMut<Target = PgConnection> + Send,
{
    async fn insert_identity(&mut self) -> Result<AstronautId, RegistryError> {
        let id = sqlx::query_scalar::<_, i64>("INSERT INTO astronaut DEFAULT VALUES RETURNING id")
            .fetch_one(&mut *self.0)
            .await?;
        Ok(AstronautId::new(id))
    }

    async fn lock_identity(&mut self, id: AstronautId) -> Result<bool, RegistryError> {
        let row = sqlx::query_scalar::<_, i64>("SELECT id FROM astronaut WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *self.0)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_snapshot(
        &mut self,
        id: AstronautId,
        fields: &AstronautDeserialized,
        is_deleted: bool,
    ) -> Result<i64, RegistryError> {
        let snapshot_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO astronaut_snapshot \
             (astronaut_id, name, surname, superpower, birthdate, is_deleted) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(id.get())
        .bind(&fields.name)
        .bind(&fields.surname)
        .bind(&fields.superpower)
        .bind(fields.birthdate)
        .bind(is_deleted)
        .fetch_one(&mut *self.0)
        .await?;
        Ok(snapshot_id)
    }

    async fn expire_active_snapshots(&mut self, id: AstronautId) -> Result<u64, RegistryError> {
        let result = sqlx::query(
            "UPDATE astronaut_snapshot SET expired_at = GREATEST(clock_timestamp(), created_at) \
             WHERE astronaut_id = $1 AND expired_at IS NULL",
        )
        .bind(id.get())
        .execute(&mut *self.0)
        .await?;
        Ok(result.rows_affected())
    }

    async fn select_active(
        &mut self,
        id: Option<AstronautId>,
    ) -> Result<Vec<AstronautRow>, RegistryError> {
        let rows = sqlx::query_as::<_, ActiveRow>(SELECT_ACTIVE)
            .bind(id.map(AstronautId::get))
            .fetch_all(&mut *self.0)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, created_at, name, surname, superpower, birthdate, updated_at, is_deleted)| {
                    AstronautRow {
                        id,
                        created_at,
                        name,
                        surname,
                        superpower,
                        birthdate,
                        updated_at,
                        is_deleted,
                    }
                },
            )
            .collect())
    }

    async fn select_snapshots(
        &mut self,
        id: AstronautId,
    ) -> Result<Vec<SnapshotRecord>, RegistryError> {
        let rows = sqlx::query_as::<_, SnapshotRow>(
            "SELECT id, astronaut_id, name, surname, superpower, birthdate, is_deleted, \
             created_at, expired_at FROM astronaut_snapshot \
             WHERE astronaut_id = $1 ORDER BY id ASC",
        )
        .bind(id.get())
        .fetch_all(&mut *self.0)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    astronaut_id,
                    name,
                    surname,
                    superpower,
                    birthdate,
                    is_deleted,
                    created_at,
                    expired_at,
                )| SnapshotRecord {
                    id,
                    astronaut_id: AstronautId::new(astronaut_id),
                    name,
                    surname,
                    superpower,
                    birthdate,
                    is_deleted,
                    created_at,
                    expired_at,
                },
            )
            .collect())
    }
}

impl SnapshotTransaction for PgSession<sqlx::Transaction<'static, Postgres>> {
    async fn commit(self) -> Result<(), RegistryError> {
        self.0.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), RegistryError> {
        self.0.rollback().await?;
        Ok(())
    }
}

/// Builds driver options from `DATABASE_URL`, or from the individual parts
/// when no URL is configured.
///
/// Parts are handed to the driver unparsed, so credentials may contain URL
/// delimiters such as `@`, `/` or `#`.
fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, RegistryError> {
    if let Some(url) = &config.url {
        return url.parse().map_err(|e| {
            RegistryError::PersistenceError(format!("invalid DATABASE_URL: {e}"))
        });
    }

    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);
    Ok(if config.password.is_empty() {
        options
    } else {
        options.password(&config.password)
    })
}

/// Connection target for logging, without the password.
fn describe_target(config: &DatabaseConfig) -> String {
    match &config.url {
        Some(url) => mask_password(url),
        None => format!(
            "{}@{}:{}/{}",
            config.user, config.host, config.port, config.database
        ),
    }
}

/// Masks the password portion of a database URL for logging.
fn mask_password(url: &str) -> String {
    let Some((credentials, host)) = url.rsplit_once('@') else {
        return url.to_string();
    };
    let Some((scheme, user_info)) = credentials.split_once("://") else {
        return url.to_string();
    };
    match user_info.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:****@{host}"),
        None => url.to_string(),
    }
}
