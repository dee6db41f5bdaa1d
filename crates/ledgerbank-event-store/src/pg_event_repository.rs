//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use ledgerbank_core::error::DomainError;
use ledgerbank_core::repository::{EventRepository, StoredEvent};

/// PostgreSQL-backed event repository over the `domain_events` table.
///
/// The table carries a unique constraint on `(aggregate_id, version)`; a
/// violation is surfaced as [`DomainError::ConcurrencyConflict`] so that two
/// racing creators of the same stream cannot both succeed.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infrastructure(err: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .as_deref()
        == Some("23505")
}

fn map_row(row: &PgRow) -> Result<StoredEvent, DomainError> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id").map_err(infrastructure)?,
        aggregate_id: row.try_get("aggregate_id").map_err(infrastructure)?,
        aggregate_type: row.try_get("aggregate_type").map_err(infrastructure)?,
        event_type: row.try_get("event_type").map_err(infrastructure)?,
        payload: row.try_get("payload").map_err(infrastructure)?,
        version: row.try_get("version").map_err(infrastructure)?,
        correlation_id: row.try_get("correlation_id").map_err(infrastructure)?,
        causation_id: row.try_get("causation_id").map_err(infrastructure)?,
        occurred_at: row.try_get("occurred_at").map_err(infrastructure)?,
    })
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            "SELECT event_id, aggregate_id, aggregate_type, event_type, payload, \
                    version, correlation_id, causation_id, occurred_at \
             FROM domain_events \
             WHERE aggregate_id = $1 \
             ORDER BY version ASC",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(infrastructure)?;

        rows.iter().map(map_row).collect()
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), -1) FROM domain_events WHERE aggregate_id = $1",
        )
        .bind(aggregate_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(infrastructure)?;

        if expected_version != -1 && actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            let inserted = sqlx::query(
                "INSERT INTO domain_events \
                    (event_id, aggregate_id, aggregate_type, event_type, payload, \
                     version, correlation_id, causation_id, occurred_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(event.event_id)
            .bind(event.aggregate_id)
            .bind(&event.aggregate_type)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event.version)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                // A racing writer slipped in between the max() read and the
                // insert; the unique key is the linearization point.
                if is_unique_violation(&err) {
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                return Err(infrastructure(err));
            }
        }

        tx.commit().await.map_err(infrastructure)?;
        Ok(())
    }
}
