use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use courier_deliveries::cli::commands::accept::AcceptCommand;
use courier_deliveries::cli::commands::cancel::{BulkCancelCommand, CancelCommand};
use courier_deliveries::cli::commands::history::HistoryCommand;
use courier_deliveries::cli::commands::list::{ListCommand, ListKind, StatsCommand};
use courier_deliveries::cli::commands::status::UpdateStatusCommand;
use courier_deliveries::cli::commands::{Command, WorkflowContext};
use courier_deliveries::cli::{Cli, Commands};
use courier_deliveries::deliveries::NewDelivery;
use courier_deliveries::{
    init_telemetry, DatabaseManager, DeliveryError, TransitionService, WorkflowSettings,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DeliveryError>() {
                Some(workflow_error) => eprintln!("❌ {}", workflow_error.user_message()),
                None => eprintln!("❌ {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let env_file_loaded = WorkflowSettings::load_env_file()?;
    let settings = match &cli.config {
        Some(path) => WorkflowSettings::load_from(path)?,
        None => WorkflowSettings::load()?,
    };

    if let Commands::Config = cli.command {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    init_telemetry(&settings.observability)?;
    if env_file_loaded {
        tracing::info!("Loaded environment variables from .env file");
    }

    let database = DatabaseManager::new(&settings.database).await?;
    if let Commands::Migrate = cli.command {
        if !settings.database.auto_migrate {
            DatabaseManager::migrate(database.pool()).await?;
        }
        println!("✅ Database ready at {}", settings.database.url);
        database.shutdown().await;
        return Ok(());
    }

    let service = TransitionService::new(database.pool().clone());
    let ctx = WorkflowContext::new(service, settings, cli.json);

    let result = dispatch(cli.command, &ctx).await;

    ctx.service.metrics().log_stats();
    database.shutdown().await;
    result
}

async fn dispatch(command: Commands, ctx: &WorkflowContext) -> Result<()> {
    match command {
        Commands::Accept {
            courier,
            customer,
            order,
            address,
            details,
            route_order,
        } => {
            AcceptCommand::new(NewDelivery {
                courier_id: courier,
                customer_id: customer,
                order_id: order,
                delivery_address: address,
                delivery_details: details,
                route_order,
            })
            .execute(ctx)
            .await
        }
        Commands::UpdateStatus {
            courier,
            delivery,
            status,
            reason,
            expected,
        } => {
            UpdateStatusCommand {
                courier,
                delivery,
                status,
                reason,
                expected,
            }
            .execute(ctx)
            .await
        }
        Commands::Cancel {
            courier,
            delivery,
            reason,
            confirm,
        } => {
            CancelCommand {
                courier,
                delivery,
                reason,
                confirmed: confirm,
            }
            .execute(ctx)
            .await
        }
        Commands::BulkCancel {
            courier,
            deliveries,
            reason,
        } => {
            BulkCancelCommand {
                courier,
                deliveries,
                reason,
            }
            .execute(ctx)
            .await
        }
        Commands::Active { courier } => {
            ListCommand {
                courier,
                kind: ListKind::Active,
            }
            .execute(ctx)
            .await
        }
        Commands::Cancellable { courier } => {
            ListCommand {
                courier,
                kind: ListKind::Cancellable,
            }
            .execute(ctx)
            .await
        }
        Commands::History { courier, delivery } => {
            HistoryCommand { courier, delivery }.execute(ctx).await
        }
        Commands::Stats { courier } => StatsCommand { courier }.execute(ctx).await,
        Commands::Migrate | Commands::Config => Ok(()),
    }
}
