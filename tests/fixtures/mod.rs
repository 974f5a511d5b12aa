// Shared helpers for integration tests: an in-memory database per test and a few seeded
// deliveries.

#![allow(dead_code)]

use courier_deliveries::config::DatabaseConfig;
use courier_deliveries::deliveries::{Delivery, NewDelivery};
use courier_deliveries::{DatabaseManager, DeliveryStatus, TransitionService};
use sqlx::{Row, SqlitePool};

pub const COURIER: i64 = 7;
pub const OTHER_COURIER: i64 = 8;

pub async fn test_pool() -> SqlitePool {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        auto_migrate: true,
    };
    let manager = DatabaseManager::new(&config)
        .await
        .expect("in-memory database");
    manager.pool().clone()
}

pub async fn test_service() -> TransitionService {
    TransitionService::new(test_pool().await)
}

pub fn new_delivery(courier: i64, order: i64) -> NewDelivery {
    NewDelivery {
        courier_id: courier,
        customer_id: 100 + order,
        order_id: order,
        delivery_address: format!("{order} Harbour Street"),
        delivery_details: "Leave at reception".to_string(),
        route_order: None,
    }
}

pub async fn pending_delivery(service: &TransitionService, courier: i64) -> Delivery {
    let order = next_order(service).await;
    service
        .accept_delivery(new_delivery(courier, order))
        .await
        .expect("accept delivery")
}

pub async fn in_progress_delivery(service: &TransitionService, courier: i64) -> Delivery {
    let delivery = pending_delivery(service, courier).await;
    service
        .update_status(
            courier,
            delivery.id,
            DeliveryStatus::InProgress,
            "Picked up from warehouse",
        )
        .await
        .expect("start delivery")
}

pub async fn completed_delivery(service: &TransitionService, courier: i64) -> Delivery {
    let delivery = in_progress_delivery(service, courier).await;
    service
        .update_status(
            courier,
            delivery.id,
            DeliveryStatus::Completed,
            "Handed to the customer",
        )
        .await
        .expect("complete delivery")
}

pub async fn cancelled_delivery(service: &TransitionService, courier: i64) -> Delivery {
    let delivery = pending_delivery(service, courier).await;
    service
        .cancel_delivery(courier, delivery.id, "Customer cancelled the order", true)
        .await
        .expect("cancel delivery")
}

async fn next_order(service: &TransitionService) -> i64 {
    let row = sqlx::query("SELECT COALESCE(MAX(order_id), 1000) + 1 AS next FROM deliveries")
        .fetch_one(service.store().pool())
        .await
        .expect("next order id");
    row.get("next")
}

pub async fn count_rows(pool: &SqlitePool, table: &str, delivery_id: i64) -> i64 {
    let row = sqlx::query(&format!(
        "SELECT COUNT(*) AS total FROM {table} WHERE delivery_id = ?1"
    ))
    .bind(delivery_id)
    .fetch_one(pool)
    .await
    .expect("count rows");
    row.get("total")
}

pub async fn stored_status(service: &TransitionService, courier: i64, id: i64) -> DeliveryStatus {
    service
        .store()
        .fetch_owned(id, courier)
        .await
        .expect("fetch delivery")
        .expect("delivery exists")
        .status
}

/// Make every insert into `table` fail, simulating a storage outage mid-transaction
pub async fn break_inserts_into(pool: &SqlitePool, table: &str) {
    sqlx::query(&format!(
        "CREATE TRIGGER fail_{table}_insert BEFORE INSERT ON {table} \
         BEGIN SELECT RAISE(ABORT, '{table} unavailable'); END;"
    ))
    .execute(pool)
    .await
    .expect("install failing trigger");
}
