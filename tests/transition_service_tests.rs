//! Integration tests for the single-delivery status workflow.
//! Testing library/framework: Rust built-in test framework with Tokio async runtime (#[tokio::test]),
//! running against a fresh in-memory SQLite database per test.

mod fixtures;

use courier_deliveries::deliveries::{DeliveryError, ReasonContext, TransitionRequest};
use courier_deliveries::DeliveryStatus;
use fixtures::*;

#[tokio::test]
async fn pending_delivery_can_be_picked_up() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let updated = service
        .update_status(
            COURIER,
            delivery.id,
            DeliveryStatus::InProgress,
            "Picked up from warehouse",
        )
        .await
        .expect("transition succeeds");

    assert_eq!(updated.status, DeliveryStatus::InProgress);
    assert!(updated.updated_at >= delivery.updated_at);
    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::InProgress
    );

    let log = service.audit().status_log(delivery.id).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].old_status, DeliveryStatus::Pending);
    assert_eq!(log[0].new_status, DeliveryStatus::InProgress);
    assert_eq!(log[0].courier_id, COURIER);
    assert_eq!(log[0].reason, "Picked up from warehouse");

    let pool = service.store().pool();
    assert_eq!(count_rows(pool, "delivery_cancellations", delivery.id).await, 0);
    // acceptance entry plus the transition
    assert_eq!(count_rows(pool, "delivery_updates", delivery.id).await, 2);
}

#[tokio::test]
async fn pending_cannot_jump_straight_to_completed() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let err = service
        .update_status(COURIER, delivery.id, DeliveryStatus::Completed, "done")
        .await
        .unwrap_err();
    // "done" is also too short; the reason check runs first
    assert!(matches!(err, DeliveryError::Validation { field: "reason", .. }));

    let err = service
        .update_status(
            COURIER,
            delivery.id,
            DeliveryStatus::Completed,
            "Delivered to the front door",
        )
        .await
        .unwrap_err();
    match err {
        DeliveryError::InvalidTransition { from, to } => {
            assert_eq!(from, DeliveryStatus::Pending);
            assert_eq!(to, DeliveryStatus::Completed);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::Pending
    );
    assert_eq!(
        count_rows(service.store().pool(), "delivery_status_log", delivery.id).await,
        0
    );
}

#[tokio::test]
async fn in_progress_delivery_completes() {
    let service = test_service().await;
    let delivery = completed_delivery(&service, COURIER).await;

    assert_eq!(delivery.status, DeliveryStatus::Completed);
    let log = service.audit().status_log(delivery.id).await.unwrap();
    let steps: Vec<_> = log.iter().map(|r| (r.old_status, r.new_status)).collect();
    assert_eq!(
        steps,
        vec![
            (DeliveryStatus::Pending, DeliveryStatus::InProgress),
            (DeliveryStatus::InProgress, DeliveryStatus::Completed),
        ]
    );
    assert!(service.audit().cancellation(delivery.id).await.unwrap().is_none());
}

#[tokio::test]
async fn terminal_deliveries_reject_every_transition() {
    let service = test_service().await;
    let completed = completed_delivery(&service, COURIER).await;
    let cancelled = cancelled_delivery(&service, COURIER).await;

    for delivery in [&completed, &cancelled] {
        for target in DeliveryStatus::ALL {
            let request = TransitionRequest::new(
                delivery.id,
                COURIER,
                target,
                "Trying to reopen this delivery",
            );
            match service.transition(request).await {
                Err(DeliveryError::InvalidTransition { from, to }) => {
                    assert_eq!(from, delivery.status);
                    assert_eq!(to, target);
                }
                other => panic!("{} -> {target} gave {other:?}", delivery.status),
            }
        }
        assert_eq!(
            stored_status(&service, COURIER, delivery.id).await,
            delivery.status
        );
    }
}

#[tokio::test]
async fn cancellation_writes_one_cancellation_record() {
    let service = test_service().await;
    let delivery = in_progress_delivery(&service, COURIER).await;

    let cancelled = service
        .cancel_delivery(COURIER, delivery.id, "  Customer refused the parcel  ", true)
        .await
        .expect("cancel succeeds");
    assert_eq!(cancelled.status, DeliveryStatus::Cancelled);

    let record = service
        .audit()
        .cancellation(delivery.id)
        .await
        .unwrap()
        .expect("cancellation recorded");
    assert_eq!(record.courier_id, COURIER);
    assert_eq!(record.reason, "Customer refused the parcel");

    let log = service.audit().status_log(delivery.id).await.unwrap();
    let last = log.last().unwrap();
    assert_eq!(last.old_status, DeliveryStatus::InProgress);
    assert_eq!(last.new_status, DeliveryStatus::Cancelled);

    let timeline = service.audit().timeline(delivery.id).await.unwrap();
    assert_eq!(
        timeline.last().unwrap().message,
        "Delivery cancelled: Customer refused the parcel"
    );
}

#[tokio::test]
async fn cancelling_twice_fails_both_times_without_duplicates() {
    let service = test_service().await;
    let delivery = cancelled_delivery(&service, COURIER).await;

    for _ in 0..2 {
        let err = service
            .cancel_delivery(COURIER, delivery.id, "Customer cancelled the order", true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeliveryError::InvalidTransition {
                from: DeliveryStatus::Cancelled,
                to: DeliveryStatus::Cancelled,
            }
        ));
    }

    let pool = service.store().pool();
    assert_eq!(count_rows(pool, "delivery_cancellations", delivery.id).await, 1);
    assert_eq!(count_rows(pool, "delivery_status_log", delivery.id).await, 1);
}

#[tokio::test]
async fn short_cancellation_reason_is_rejected() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let err = service
        .cancel_delivery(COURIER, delivery.id, "too short!!", true)
        .await
        .unwrap_err();
    match err {
        DeliveryError::Validation { field, constraint } => {
            assert_eq!(field, "reason");
            assert_eq!(constraint, "must be at least 15 characters");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::Pending
    );
}

#[tokio::test]
async fn unconfirmed_cancellation_is_rejected() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let err = service
        .cancel_delivery(COURIER, delivery.id, "Customer cancelled the order", false)
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Validation { field: "confirmed", .. }));
    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::Pending
    );
}

#[tokio::test]
async fn other_couriers_deliveries_look_missing() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let err = service
        .update_status(
            OTHER_COURIER,
            delivery.id,
            DeliveryStatus::InProgress,
            "Picked up from warehouse",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::NotFoundOrUnauthorized));

    let missing = service
        .update_status(
            COURIER,
            delivery.id + 999,
            DeliveryStatus::InProgress,
            "Picked up from warehouse",
        )
        .await
        .unwrap_err();
    assert_eq!(missing.user_message(), err.user_message());

    assert!(matches!(
        service.delivery_history(OTHER_COURIER, delivery.id).await,
        Err(DeliveryError::NotFoundOrUnauthorized)
    ));
    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::Pending
    );
}

#[tokio::test]
async fn stale_expected_status_is_validated_against_storage() {
    let service = test_service().await;
    let delivery = in_progress_delivery(&service, COURIER).await;

    // The form was opened while the delivery was still pending.
    let request = TransitionRequest::new(
        delivery.id,
        COURIER,
        DeliveryStatus::InProgress,
        "Picked up from warehouse",
    )
    .expecting(DeliveryStatus::Pending);

    match service.transition(request).await {
        Err(DeliveryError::InvalidTransition { from, to }) => {
            assert_eq!(from, DeliveryStatus::InProgress);
            assert_eq!(to, DeliveryStatus::InProgress);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn failed_audit_insert_rolls_back_status_change() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;
    let pool = service.store().pool().clone();
    break_inserts_into(&pool, "delivery_cancellations").await;

    let err = service
        .cancel_delivery(COURIER, delivery.id, "Customer cancelled the order", true)
        .await
        .unwrap_err();
    assert!(err.is_storage());
    assert!(err.user_message().contains("try again later"));

    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::Pending
    );
    assert_eq!(count_rows(&pool, "delivery_status_log", delivery.id).await, 0);
    assert_eq!(count_rows(&pool, "delivery_updates", delivery.id).await, 1);
    assert_eq!(service.metrics().get_stats().storage_failures, 1);

    // Non-cancelling transitions never touch the broken table.
    let started = service
        .update_status(
            COURIER,
            delivery.id,
            DeliveryStatus::InProgress,
            "Picked up from warehouse",
        )
        .await
        .expect("start succeeds");
    assert_eq!(started.status, DeliveryStatus::InProgress);
}

#[tokio::test]
async fn concurrent_cancellations_commit_exactly_once() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let (first, second) = tokio::join!(
        service.cancel_delivery(COURIER, delivery.id, "Customer cancelled the order", true),
        service.cancel_delivery(COURIER, delivery.id, "Address could not be reached", true),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let failure = if first.is_err() { first } else { second };
    assert!(matches!(
        failure,
        Err(DeliveryError::InvalidTransition {
            from: DeliveryStatus::Cancelled,
            ..
        })
    ));

    let pool = service.store().pool();
    assert_eq!(count_rows(pool, "delivery_cancellations", delivery.id).await, 1);
    assert_eq!(count_rows(pool, "delivery_status_log", delivery.id).await, 1);
}

#[tokio::test]
async fn conditional_update_reports_lost_race() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;
    let store = service.store();

    let mut tx = store.begin().await.unwrap();
    let applied = store
        .update_status(
            &mut tx,
            delivery.id,
            COURIER,
            DeliveryStatus::InProgress,
            DeliveryStatus::Completed,
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert!(!applied);

    let wrong_owner = store
        .update_status(
            &mut tx,
            delivery.id,
            OTHER_COURIER,
            DeliveryStatus::Pending,
            DeliveryStatus::InProgress,
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert!(!wrong_owner);
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn reason_context_can_be_tightened_per_request() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    let request = TransitionRequest::new(
        delivery.id,
        COURIER,
        DeliveryStatus::Cancelled,
        "Customer not home",
    )
    .with_context(ReasonContext::BulkCancellation);

    assert!(matches!(
        service.transition(request).await,
        Err(DeliveryError::Validation { field: "reason", .. })
    ));
}

#[tokio::test]
async fn cancellation_reason_minimum_cannot_be_loosened() {
    let service = test_service().await;
    let delivery = pending_delivery(&service, COURIER).await;

    // Ten characters would pass a plain status update but not a cancellation.
    let request =
        TransitionRequest::new(delivery.id, COURIER, DeliveryStatus::Cancelled, "ten chars!")
            .with_context(ReasonContext::StatusUpdate);
    assert_eq!(request.context, ReasonContext::Cancellation);

    match service.transition(request).await {
        Err(DeliveryError::Validation { field, constraint }) => {
            assert_eq!(field, "reason");
            assert_eq!(constraint, "must be at least 15 characters");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let mut loosened =
        TransitionRequest::new(delivery.id, COURIER, DeliveryStatus::Cancelled, "ten chars!");
    loosened.context = ReasonContext::StatusUpdate;
    assert!(matches!(
        service.transition(loosened).await,
        Err(DeliveryError::Validation { field: "reason", .. })
    ));

    assert_eq!(
        stored_status(&service, COURIER, delivery.id).await,
        DeliveryStatus::Pending
    );
    assert!(service.audit().cancellation(delivery.id).await.unwrap().is_none());
}
