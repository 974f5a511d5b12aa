use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::deliveries::DeliveryStatus;

pub mod commands;

#[derive(Parser)]
#[command(name = "courier-deliveries")]
#[command(about = "Courier delivery status and cancellation workflow")]
#[command(long_about = "Moves courier deliveries through pending, in_progress, completed and \
                       cancelled, recording an audit trail for every change. Every command acts \
                       on behalf of the courier given with --courier.")]
pub struct Cli {
    /// Configuration file (defaults to ./courier-deliveries.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and apply schema migrations
    Migrate,
    /// Record a delivery accepted by a courier
    Accept {
        #[arg(long, help = "Courier accepting the delivery")]
        courier: i64,
        #[arg(long)]
        customer: i64,
        #[arg(long)]
        order: i64,
        #[arg(long, help = "Delivery address")]
        address: String,
        #[arg(long, default_value = "", help = "Free-text delivery details")]
        details: String,
        #[arg(long, help = "Position in the courier's route")]
        route_order: Option<i64>,
    },
    /// Move a delivery to a new status
    UpdateStatus {
        #[arg(long)]
        courier: i64,
        #[arg(long)]
        delivery: i64,
        #[arg(
            long,
            value_parser = parse_update_target,
            help = "in_progress or completed (use `cancel --confirm` to cancel)"
        )]
        status: DeliveryStatus,
        #[arg(long, help = "Why the status changes (at least 10 characters)")]
        reason: String,
        #[arg(long, value_parser = parse_status, help = "Status shown when the form was opened")]
        expected: Option<DeliveryStatus>,
    },
    /// Cancel a single delivery
    Cancel {
        #[arg(long)]
        courier: i64,
        #[arg(long)]
        delivery: i64,
        #[arg(long, help = "Why the delivery is cancelled (at least 15 characters)")]
        reason: String,
        #[arg(long, help = "Confirm the cancellation")]
        confirm: bool,
    },
    /// Cancel several deliveries with one shared reason
    BulkCancel {
        #[arg(long)]
        courier: i64,
        #[arg(long = "delivery", required = true, num_args = 1.., value_delimiter = ',')]
        deliveries: Vec<i64>,
        #[arg(long, help = "Why the deliveries are cancelled (at least 20 characters)")]
        reason: String,
    },
    /// List deliveries still in pending or in_progress
    Active {
        #[arg(long)]
        courier: i64,
    },
    /// List deliveries that can still be cancelled
    Cancellable {
        #[arg(long)]
        courier: i64,
    },
    /// Show the audit trail and timeline of one delivery
    History {
        #[arg(long)]
        courier: i64,
        #[arg(long)]
        delivery: i64,
    },
    /// Show delivery totals per status for a courier
    Stats {
        #[arg(long)]
        courier: i64,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn parse_status(s: &str) -> Result<DeliveryStatus, String> {
    s.parse::<DeliveryStatus>().map_err(|e| e.to_string())
}

// Cancelling goes through `cancel` so the confirmation flag is always asked for
fn parse_update_target(s: &str) -> Result<DeliveryStatus, String> {
    match parse_status(s)? {
        DeliveryStatus::Cancelled => {
            Err("use `cancel --confirm` to cancel a delivery".to_string())
        }
        status => Ok(status),
    }
}
