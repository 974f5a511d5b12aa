use anyhow::Result;

use super::{print_delivery, print_json, Command, WorkflowContext};

pub struct HistoryCommand {
    pub courier: i64,
    pub delivery: i64,
}

impl Command for HistoryCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let history = ctx
            .service
            .delivery_history(self.courier, self.delivery)
            .await?;

        if ctx.json {
            return print_json(&history);
        }

        print_delivery(&history.delivery);
        println!();
        println!("🔁 STATUS CHANGES:");
        if history.status_changes.is_empty() {
            println!("   (none)");
        }
        for change in &history.status_changes {
            println!(
                "   {} {} → {}: {}",
                change.changed_at.format("%Y-%m-%d %H:%M"),
                change.old_status,
                change.new_status,
                change.reason
            );
        }

        if let Some(cancellation) = &history.cancellation {
            println!();
            println!(
                "🛑 Cancelled {} by courier #{}: {}",
                cancellation.cancelled_at.format("%Y-%m-%d %H:%M"),
                cancellation.courier_id,
                cancellation.reason
            );
        }

        println!();
        println!("🕒 TIMELINE:");
        for update in &history.updates {
            println!(
                "   {} [{}] {}",
                update.created_at.format("%Y-%m-%d %H:%M"),
                update.status,
                update.message
            );
        }
        Ok(())
    }
}
