use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

use super::audit::{AuditEntry, AuditLogger};
use super::error::DeliveryError;
use super::store::DeliveryStore;
use super::transitions::{
    allowed_transitions, require_confirmation, validate_reason, validate_transition,
    ReasonContext,
};
use super::types::{
    CourierId, Delivery, DeliveryHistory, DeliveryId, DeliveryStatus, NewDelivery, StatusCounts,
};
use crate::observability::{OperationTimer, WorkflowMetrics};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

/// One requested status change
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub delivery_id: DeliveryId,
    pub actor: CourierId,
    /// Status the caller believes the delivery is in. Informational only.
    pub expected_status: Option<DeliveryStatus>,
    pub new_status: DeliveryStatus,
    pub reason: String,
    /// Reason rule to apply; never looser than the one implied by `new_status`
    pub context: ReasonContext,
}

impl TransitionRequest {
    pub fn new(
        delivery_id: DeliveryId,
        actor: CourierId,
        new_status: DeliveryStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            delivery_id,
            actor,
            expected_status: None,
            new_status,
            reason: reason.into(),
            context: ReasonContext::for_target(new_status),
        }
    }

    pub fn expecting(mut self, status: DeliveryStatus) -> Self {
        self.expected_status = Some(status);
        self
    }

    /// Raise the reason minimum; a looser context is ignored
    pub fn with_context(mut self, context: ReasonContext) -> Self {
        self.context = self.context.stricter(context);
        self
    }
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub delivery: Delivery,
    pub audit: AuditEntry,
}

/// Validates, persists and audits delivery status changes.
///
/// Each transition commits as one transaction or not at all.
#[derive(Debug, Clone)]
pub struct TransitionService {
    store: DeliveryStore,
    audit: AuditLogger,
    metrics: Arc<WorkflowMetrics>,
}

impl TransitionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            store: DeliveryStore::new(pool.clone()),
            audit: AuditLogger::new(pool),
            metrics: Arc::new(WorkflowMetrics::new()),
        }
    }

    pub fn store(&self) -> &DeliveryStore {
        &self.store
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn metrics(&self) -> &WorkflowMetrics {
        &self.metrics
    }

    pub async fn transition(
        &self,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome, DeliveryError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("transition", Some(request.actor), &correlation_id);

        let result = self.apply(&request).instrument(span).await;
        match &result {
            Ok(outcome) => {
                self.metrics.record_committed();
                info!(
                    delivery_id = request.delivery_id,
                    courier_id = request.actor,
                    to = %outcome.delivery.status,
                    correlation_id = %correlation_id,
                    "Delivery status changed"
                );
            }
            Err(e) if e.is_storage() => {
                self.metrics.record_storage_failure();
                error!(
                    delivery_id = request.delivery_id,
                    courier_id = request.actor,
                    to = %request.new_status,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Delivery transition rolled back"
                );
            }
            Err(e) => {
                self.metrics.record_rejected();
                info!(
                    delivery_id = request.delivery_id,
                    courier_id = request.actor,
                    to = %request.new_status,
                    correlation_id = %correlation_id,
                    error = %e,
                    "Delivery transition rejected"
                );
            }
        }
        result
    }

    async fn apply(&self, request: &TransitionRequest) -> Result<TransitionOutcome, DeliveryError> {
        let current = self
            .store
            .fetch_owned(request.delivery_id, request.actor)
            .await?
            .ok_or(DeliveryError::NotFoundOrUnauthorized)?;

        let context = request
            .context
            .stricter(ReasonContext::for_target(request.new_status));
        let reason = validate_reason(&request.reason, context)?;

        if let Some(expected) = request.expected_status {
            if expected != current.status {
                warn!(
                    delivery_id = current.id,
                    expected = %expected,
                    actual = %current.status,
                    "Caller's view of the delivery is stale; validating against stored status"
                );
            }
        }

        let old_status = current.status;
        validate_transition(old_status, request.new_status)?;

        let now = Utc::now();
        let mut tx = self.store.begin().await?;

        let updated = self
            .store
            .update_status(
                &mut tx,
                current.id,
                request.actor,
                old_status,
                request.new_status,
                now,
            )
            .await?;

        if !updated {
            // Another writer changed the row after we read it.
            let latest = self
                .store
                .fetch_owned_in(&mut tx, current.id, request.actor)
                .await?
                .ok_or(DeliveryError::NotFoundOrUnauthorized)?;
            return Err(DeliveryError::InvalidTransition {
                from: latest.status,
                to: request.new_status,
            });
        }

        let delivery = Delivery {
            status: request.new_status,
            updated_at: now,
            ..current
        };

        let audit = self
            .audit
            .record_transition(
                &mut tx,
                &delivery,
                old_status,
                request.new_status,
                request.actor,
                reason,
                now,
            )
            .await?;

        tx.commit().await?;

        Ok(TransitionOutcome { delivery, audit })
    }

    /// Status-management form entry point
    pub async fn update_status(
        &self,
        actor: CourierId,
        delivery_id: DeliveryId,
        new_status: DeliveryStatus,
        reason: &str,
    ) -> Result<Delivery, DeliveryError> {
        let request = TransitionRequest::new(delivery_id, actor, new_status, reason);
        Ok(self.transition(request).await?.delivery)
    }

    /// Cancellation form entry point; the courier must tick the confirmation box
    pub async fn cancel_delivery(
        &self,
        actor: CourierId,
        delivery_id: DeliveryId,
        reason: &str,
        confirmed: bool,
    ) -> Result<Delivery, DeliveryError> {
        require_confirmation(confirmed)?;
        let request =
            TransitionRequest::new(delivery_id, actor, DeliveryStatus::Cancelled, reason);
        Ok(self.transition(request).await?.delivery)
    }

    /// Record a newly accepted delivery for `new.courier_id`, starting in pending
    pub async fn accept_delivery(&self, new: NewDelivery) -> Result<Delivery, DeliveryError> {
        if new.delivery_address.trim().is_empty() {
            return Err(DeliveryError::validation("delivery_address", "is required"));
        }

        let now = Utc::now();
        let mut tx = self.store.begin().await?;
        let delivery = self.store.insert(&mut tx, &new, now).await?;
        self.audit
            .record_update(
                &mut tx,
                delivery.id,
                delivery.courier_id,
                delivery.status,
                "Delivery accepted by courier",
                now,
            )
            .await?;
        tx.commit().await?;

        info!(
            delivery_id = delivery.id,
            courier_id = delivery.courier_id,
            order_id = delivery.order_id,
            "Delivery accepted"
        );
        Ok(delivery)
    }

    pub async fn list_active_deliveries(
        &self,
        courier: CourierId,
    ) -> Result<Vec<Delivery>, DeliveryError> {
        let statuses: Vec<DeliveryStatus> = DeliveryStatus::ALL
            .into_iter()
            .filter(|s| !s.is_terminal())
            .collect();
        self.store.list_by_owner_and_statuses(courier, &statuses).await
    }

    /// Deliveries that may still move to cancelled
    pub async fn list_cancellable_deliveries(
        &self,
        courier: CourierId,
    ) -> Result<Vec<Delivery>, DeliveryError> {
        let statuses: Vec<DeliveryStatus> = DeliveryStatus::ALL
            .into_iter()
            .filter(|s| allowed_transitions(*s).contains(&DeliveryStatus::Cancelled))
            .collect();
        self.store.list_by_owner_and_statuses(courier, &statuses).await
    }

    pub async fn delivery_history(
        &self,
        actor: CourierId,
        delivery_id: DeliveryId,
    ) -> Result<DeliveryHistory, DeliveryError> {
        let timer = OperationTimer::new("delivery_history");
        let result = self.load_history(actor, delivery_id).await;
        timer.finish(result.is_ok());
        result
    }

    async fn load_history(
        &self,
        actor: CourierId,
        delivery_id: DeliveryId,
    ) -> Result<DeliveryHistory, DeliveryError> {
        let delivery = self
            .store
            .fetch_owned(delivery_id, actor)
            .await?
            .ok_or(DeliveryError::NotFoundOrUnauthorized)?;

        Ok(DeliveryHistory {
            status_changes: self.audit.status_log(delivery.id).await?,
            cancellation: self.audit.cancellation(delivery.id).await?,
            updates: self.audit.timeline(delivery.id).await?,
            delivery,
        })
    }

    pub async fn status_counts(&self, courier: CourierId) -> Result<StatusCounts, DeliveryError> {
        self.store.status_counts(courier).await
    }
}
