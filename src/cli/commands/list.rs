use anyhow::Result;

use super::{print_deliveries, print_json, Command, WorkflowContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Active,
    Cancellable,
}

pub struct ListCommand {
    pub courier: i64,
    pub kind: ListKind,
}

impl Command for ListCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let (title, deliveries) = match self.kind {
            ListKind::Active => (
                "🚚 ACTIVE DELIVERIES",
                ctx.service.list_active_deliveries(self.courier).await?,
            ),
            ListKind::Cancellable => (
                "🛑 CANCELLABLE DELIVERIES",
                ctx.service.list_cancellable_deliveries(self.courier).await?,
            ),
        };

        if ctx.json {
            return print_json(&deliveries);
        }
        print_deliveries(title, &deliveries);
        Ok(())
    }
}

pub struct StatsCommand {
    pub courier: i64,
}

impl Command for StatsCommand {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()> {
        let counts = ctx.service.status_counts(self.courier).await?;

        if ctx.json {
            return print_json(&counts);
        }
        println!("📊 DELIVERY OVERVIEW (courier #{})", self.courier);
        println!("────────────────────");
        println!("   ⏳ Pending: {}", counts.pending);
        println!("   🚚 In progress: {}", counts.in_progress);
        println!("   ✅ Completed: {}", counts.completed);
        println!("   🛑 Cancelled: {}", counts.cancelled);
        println!();
        println!("   🎯 Active: {} of {}", counts.active(), counts.total());
        Ok(())
    }
}
