use anyhow::Result;

use super::{print_delivery, print_json, Command, WorkflowContext};

pub struct CancelCommand {
    pub courier: i64,
    pub delivery: i64,
    pub reason: String,
    pub confirmed: bool,
}

impl Command for CancelCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let delivery = ctx
            .service
            .cancel_delivery(self.courier, self.delivery, &self.reason, self.confirmed)
            .await?;

        if ctx.json {
            return print_json(&delivery);
        }
        println!("🛑 Delivery #{} cancelled", delivery.id);
        print_delivery(&delivery);
        Ok(())
    }
}

pub struct BulkCancelCommand {
    pub courier: i64,
    pub deliveries: Vec<i64>,
    pub reason: String,
}

impl Command for BulkCancelCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let result = ctx
            .bulk_coordinator()
            .bulk_cancel(self.courier, &self.deliveries, &self.reason)
            .await?;

        if ctx.json {
            print_json(&result)?;
        } else {
            println!("🛑 BULK CANCELLATION");
            println!("────────────────────");
            for item in &result.results {
                let marker = if item.success { "✅" } else { "❌" };
                println!("{marker} #{}: {}", item.id, item.message);
            }
            println!();
            println!(
                "Cancelled: {}   Failed: {}",
                result.success_count, result.error_count
            );
        }

        if result.error_count > 0 {
            anyhow::bail!(
                "{} of {} deliveries could not be cancelled",
                result.error_count,
                result.results.len()
            );
        }
        Ok(())
    }
}
