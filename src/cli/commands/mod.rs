use anyhow::Result;
use serde::Serialize;

use crate::config::WorkflowSettings;
use crate::deliveries::{BulkCancellationCoordinator, Delivery, TransitionService};

pub mod accept;
pub mod cancel;
pub mod history;
pub mod list;
pub mod status;

/// Everything a command needs to run one request
pub struct WorkflowContext {
    pub service: TransitionService,
    pub settings: WorkflowSettings,
    pub json: bool,
}

impl WorkflowContext {
    pub fn new(service: TransitionService, settings: WorkflowSettings, json: bool) -> Self {
        Self {
            service,
            settings,
            json,
        }
    }

    pub fn bulk_coordinator(&self) -> BulkCancellationCoordinator {
        BulkCancellationCoordinator::new(
            self.service.clone(),
            self.settings.workflow.max_bulk_size,
        )
    }
}

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, ctx: &WorkflowContext) -> Result<()>;
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_delivery(delivery: &Delivery) {
    println!("  📦 Delivery #{} [{}]", delivery.id, delivery.status);
    println!("     🧾 Order #{} for customer #{}", delivery.order_id, delivery.customer_id);
    println!("     📍 {}", delivery.delivery_address);
    if !delivery.delivery_details.is_empty() {
        println!("     📝 {}", delivery.delivery_details);
    }
    if let Some(route_order) = delivery.route_order {
        println!("     🛣️  Route stop {}", route_order);
    }
    println!(
        "     🕒 Updated {}",
        delivery.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}

pub fn print_deliveries(title: &str, deliveries: &[Delivery]) {
    println!("{title}");
    println!("{}", "─".repeat(title.chars().count()));
    if deliveries.is_empty() {
        println!("📋 No deliveries found");
        return;
    }
    for delivery in deliveries {
        print_delivery(delivery);
    }
    println!();
    println!("Total: {}", deliveries.len());
}
