use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use super::error::DeliveryError;
use super::store::parse_status;
use super::types::{
    CancellationRecord, CourierId, Delivery, DeliveryId, DeliveryStatus, DeliveryUpdate,
    StatusChangeRecord,
};

/// Append-only audit trail for delivery status changes.
///
/// Writes go through the caller's transaction connection so that the audit rows commit or
/// roll back together with the status update. Rows are never updated or deleted.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    pool: SqlitePool,
}

/// Rows written for one transition
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub status_change: StatusChangeRecord,
    pub cancellation: Option<CancellationRecord>,
    pub update: DeliveryUpdate,
}

impl AuditLogger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn record_transition(
        &self,
        conn: &mut SqliteConnection,
        delivery: &Delivery,
        old_status: DeliveryStatus,
        new_status: DeliveryStatus,
        actor: CourierId,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<AuditEntry, DeliveryError> {
        sqlx::query(
            r#"
            INSERT INTO delivery_status_log
                (delivery_id, old_status, new_status, courier_id, reason, changed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(delivery.id)
        .bind(old_status.as_str())
        .bind(new_status.as_str())
        .bind(actor)
        .bind(reason)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        let cancellation = if new_status == DeliveryStatus::Cancelled {
            sqlx::query(
                r#"
                INSERT INTO delivery_cancellations (delivery_id, courier_id, reason, cancelled_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(delivery.id)
            .bind(actor)
            .bind(reason)
            .bind(at)
            .execute(&mut *conn)
            .await?;

            Some(CancellationRecord {
                delivery_id: delivery.id,
                courier_id: actor,
                reason: reason.to_string(),
                cancelled_at: at,
            })
        } else {
            None
        };

        let message = timeline_message(old_status, new_status, reason);
        let update = self
            .record_update(conn, delivery.id, actor, new_status, &message, at)
            .await?;

        debug!(
            delivery_id = delivery.id,
            courier_id = actor,
            from = %old_status,
            to = %new_status,
            cancelled = cancellation.is_some(),
            "Audit trail written"
        );

        Ok(AuditEntry {
            status_change: StatusChangeRecord {
                delivery_id: delivery.id,
                old_status,
                new_status,
                courier_id: actor,
                reason: reason.to_string(),
                changed_at: at,
            },
            cancellation,
            update,
        })
    }

    /// Timeline entry only; used on its own when a delivery is first accepted
    pub async fn record_update(
        &self,
        conn: &mut SqliteConnection,
        delivery_id: DeliveryId,
        actor: CourierId,
        status: DeliveryStatus,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<DeliveryUpdate, DeliveryError> {
        sqlx::query(
            r#"
            INSERT INTO delivery_updates (delivery_id, courier_id, status, message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(delivery_id)
        .bind(actor)
        .bind(status.as_str())
        .bind(message)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        Ok(DeliveryUpdate {
            delivery_id,
            courier_id: actor,
            status,
            message: message.to_string(),
            created_at: at,
        })
    }

    pub async fn status_log(
        &self,
        delivery_id: DeliveryId,
    ) -> Result<Vec<StatusChangeRecord>, DeliveryError> {
        let rows = sqlx::query(
            r#"
            SELECT delivery_id, old_status, new_status, courier_id, reason, changed_at
            FROM delivery_status_log
            WHERE delivery_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(delivery_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<StatusChangeRecord, DeliveryError> {
                Ok(StatusChangeRecord {
                    delivery_id: row.try_get("delivery_id")?,
                    old_status: parse_status(row, "old_status")?,
                    new_status: parse_status(row, "new_status")?,
                    courier_id: row.try_get("courier_id")?,
                    reason: row.try_get("reason")?,
                    changed_at: row.try_get("changed_at")?,
                })
            })
            .collect()
    }

    pub async fn cancellation(
        &self,
        delivery_id: DeliveryId,
    ) -> Result<Option<CancellationRecord>, DeliveryError> {
        let row = sqlx::query(
            r#"
            SELECT delivery_id, courier_id, reason, cancelled_at
            FROM delivery_cancellations
            WHERE delivery_id = ?1
            "#,
        )
        .bind(delivery_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(CancellationRecord {
                delivery_id: row.try_get("delivery_id")?,
                courier_id: row.try_get("courier_id")?,
                reason: row.try_get("reason")?,
                cancelled_at: row.try_get("cancelled_at")?,
            })),
            None => Ok(None),
        }
    }

    pub async fn timeline(
        &self,
        delivery_id: DeliveryId,
    ) -> Result<Vec<DeliveryUpdate>, DeliveryError> {
        let rows = sqlx::query(
            r#"
            SELECT delivery_id, courier_id, status, message, created_at
            FROM delivery_updates
            WHERE delivery_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(delivery_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<DeliveryUpdate, DeliveryError> {
                Ok(DeliveryUpdate {
                    delivery_id: row.try_get("delivery_id")?,
                    courier_id: row.try_get("courier_id")?,
                    status: parse_status(row, "status")?,
                    message: row.try_get("message")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

fn timeline_message(old_status: DeliveryStatus, new_status: DeliveryStatus, reason: &str) -> String {
    match new_status {
        DeliveryStatus::Cancelled => format!("Delivery cancelled: {reason}"),
        _ => format!("Status changed from {old_status} to {new_status}: {reason}"),
    }
}
