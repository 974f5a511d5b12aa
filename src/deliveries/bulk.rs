use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::DeliveryError;
use super::service::{TransitionRequest, TransitionService};
use super::transitions::{validate_reason, ReasonContext};
use super::types::{CourierId, DeliveryId, DeliveryStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    pub id: DeliveryId,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub results: Vec<BulkItemResult>,
    pub success_count: usize,
    pub error_count: usize,
}

impl BulkResult {
    fn push(&mut self, item: BulkItemResult) {
        if item.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        self.results.push(item);
    }
}

/// Cancels many deliveries with one shared reason.
///
/// Every delivery gets its own transaction; a failure on one id is reported in its result
/// row and never affects the others.
#[derive(Debug, Clone)]
pub struct BulkCancellationCoordinator {
    service: TransitionService,
    max_batch_size: usize,
}

impl BulkCancellationCoordinator {
    pub fn new(service: TransitionService, max_batch_size: usize) -> Self {
        Self {
            service,
            max_batch_size,
        }
    }

    /// Fails up front, touching nothing, when the batch itself is unusable
    pub async fn bulk_cancel(
        &self,
        actor: CourierId,
        delivery_ids: &[DeliveryId],
        reason: &str,
    ) -> Result<BulkResult, DeliveryError> {
        if delivery_ids.is_empty() {
            return Err(DeliveryError::validation(
                "delivery_ids",
                "select at least one delivery",
            ));
        }
        if delivery_ids.len() > self.max_batch_size {
            return Err(DeliveryError::validation(
                "delivery_ids",
                format!("at most {} deliveries per request", self.max_batch_size),
            ));
        }
        let reason = validate_reason(reason, ReasonContext::BulkCancellation)?;

        self.service.metrics().record_bulk_batch();
        info!(
            courier_id = actor,
            batch_size = delivery_ids.len(),
            "Starting bulk cancellation"
        );

        let mut result = BulkResult::default();
        for &id in delivery_ids {
            let request = TransitionRequest::new(id, actor, DeliveryStatus::Cancelled, reason)
                .with_context(ReasonContext::BulkCancellation);

            let item = match self.service.transition(request).await {
                Ok(_) => BulkItemResult {
                    id,
                    success: true,
                    message: format!("Delivery #{id} cancelled"),
                },
                Err(e) => {
                    warn!(delivery_id = id, courier_id = actor, error = %e, "Bulk item failed");
                    BulkItemResult {
                        id,
                        success: false,
                        message: e.user_message(),
                    }
                }
            };
            result.push(item);
        }

        info!(
            courier_id = actor,
            succeeded = result.success_count,
            failed = result.error_count,
            "Bulk cancellation finished"
        );
        Ok(result)
    }
}
