use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use super::error::DeliveryError;
use super::types::{CourierId, Delivery, DeliveryId, DeliveryStatus, NewDelivery, StatusCounts};

const DELIVERY_COLUMNS: &str = "id, courier_id, customer_id, order_id, delivery_address, \
     delivery_details, status, route_order, created_at, updated_at";

/// Durable storage of deliveries, always scoped by the owning courier
#[derive(Debug, Clone)]
pub struct DeliveryStore {
    pool: SqlitePool,
}

impl DeliveryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Open a transaction; dropping it without commit rolls back
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DeliveryError> {
        Ok(self.pool.begin().await?)
    }

    /// Insert a pending delivery and return it with its assigned id
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        new: &NewDelivery,
        at: DateTime<Utc>,
    ) -> Result<Delivery, DeliveryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO deliveries (
                courier_id, customer_id, order_id, delivery_address, delivery_details,
                status, route_order, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(new.courier_id)
        .bind(new.customer_id)
        .bind(new.order_id)
        .bind(&new.delivery_address)
        .bind(&new.delivery_details)
        .bind(DeliveryStatus::Pending.as_str())
        .bind(new.route_order)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        Ok(Delivery {
            id: result.last_insert_rowid(),
            courier_id: new.courier_id,
            customer_id: new.customer_id,
            order_id: new.order_id,
            delivery_address: new.delivery_address.clone(),
            delivery_details: new.delivery_details.clone(),
            status: DeliveryStatus::Pending,
            route_order: new.route_order,
            created_at: at,
            updated_at: at,
        })
    }

    /// Fetch a delivery owned by `courier`. Deliveries of other couriers are indistinguishable
    /// from missing ones.
    pub async fn fetch_owned(
        &self,
        id: DeliveryId,
        courier: CourierId,
    ) -> Result<Option<Delivery>, DeliveryError> {
        let mut conn = self.pool.acquire().await?;
        self.fetch_owned_in(&mut conn, id, courier).await
    }

    pub async fn fetch_owned_in(
        &self,
        conn: &mut SqliteConnection,
        id: DeliveryId,
        courier: CourierId,
    ) -> Result<Option<Delivery>, DeliveryError> {
        let row = sqlx::query(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = ?1 AND courier_id = ?2"
        ))
        .bind(id)
        .bind(courier)
        .fetch_optional(&mut *conn)
        .await?;

        row.as_ref().map(delivery_from_row).transpose()
    }

    /// Compare-and-set status update keyed by id and owner.
    ///
    /// Returns `false` when no row still holds `expected`, meaning another writer got there
    /// first or the delivery is gone.
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        id: DeliveryId,
        courier: CourierId,
        expected: DeliveryStatus,
        new_status: DeliveryStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DeliveryError> {
        let result = sqlx::query(
            r#"
            UPDATE deliveries
            SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND courier_id = ?4 AND status = ?5
            "#,
        )
        .bind(new_status.as_str())
        .bind(at)
        .bind(id)
        .bind(courier)
        .bind(expected.as_str())
        .execute(&mut *conn)
        .await?;

        debug!(
            delivery_id = id,
            courier_id = courier,
            rows = result.rows_affected(),
            "Conditional status update executed"
        );

        Ok(result.rows_affected() == 1)
    }

    /// Deliveries of one courier whose status is in `statuses`, in route order
    pub async fn list_by_owner_and_statuses(
        &self,
        courier: CourierId,
        statuses: &[DeliveryStatus],
    ) -> Result<Vec<Delivery>, DeliveryError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE courier_id = "
        ));
        query.push_bind(courier);
        query.push(" AND status IN (");
        let mut separated = query.separated(", ");
        for status in statuses {
            separated.push_bind(status.as_str());
        }
        separated.push_unseparated(")");
        query.push(" ORDER BY route_order IS NULL, route_order, created_at, id");

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(delivery_from_row).collect()
    }

    pub async fn status_counts(&self, courier: CourierId) -> Result<StatusCounts, DeliveryError> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS total
            FROM deliveries
            WHERE courier_id = ?1
            GROUP BY status
            "#,
        )
        .bind(courier)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status = parse_status(&row, "status")?;
            let total: i64 = row.try_get("total")?;
            counts.add(status, total.max(0) as u64);
        }
        Ok(counts)
    }
}

pub(crate) fn parse_status(row: &SqliteRow, column: &str) -> Result<DeliveryStatus, sqlx::Error> {
    let text: String = row.try_get(column)?;
    text.parse::<DeliveryStatus>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn delivery_from_row(row: &SqliteRow) -> Result<Delivery, DeliveryError> {
    Ok(Delivery {
        id: row.try_get("id")?,
        courier_id: row.try_get("courier_id")?,
        customer_id: row.try_get("customer_id")?,
        order_id: row.try_get("order_id")?,
        delivery_address: row.try_get("delivery_address")?,
        delivery_details: row.try_get("delivery_details")?,
        status: parse_status(row, "status")?,
        route_order: row.try_get("route_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
