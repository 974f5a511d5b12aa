use anyhow::Result;

use super::{print_delivery, print_json, Command, WorkflowContext};
use crate::deliveries::{DeliveryStatus, TransitionRequest};

pub struct UpdateStatusCommand {
    pub courier: i64,
    pub delivery: i64,
    pub status: DeliveryStatus,
    pub reason: String,
    pub expected: Option<DeliveryStatus>,
}

impl Command for UpdateStatusCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let mut request =
            TransitionRequest::new(self.delivery, self.courier, self.status, self.reason.clone());
        if let Some(expected) = self.expected {
            request = request.expecting(expected);
        }

        let outcome = ctx.service.transition(request).await?;

        if ctx.json {
            return print_json(&outcome.delivery);
        }
        println!(
            "✅ Delivery #{} moved from {} to {}",
            outcome.delivery.id, outcome.audit.status_change.old_status, outcome.delivery.status
        );
        print_delivery(&outcome.delivery);
        Ok(())
    }
}
