use anyhow::Result;

use super::{print_delivery, print_json, Command, WorkflowContext};
use crate::deliveries::NewDelivery;

pub struct AcceptCommand {
    pub delivery: NewDelivery,
}

impl AcceptCommand {
    pub fn new(delivery: NewDelivery) -> Self {
        Self { delivery }
    }
}

impl Command for AcceptCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let delivery = ctx.service.accept_delivery(self.delivery.clone()).await?;

        if ctx.json {
            return print_json(&delivery);
        }
        println!("✅ Delivery accepted");
        print_delivery(&delivery);
        Ok(())
    }
}
