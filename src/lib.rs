// Courier Deliveries Library - delivery status and cancellation workflow
// This exposes the core components for the CLI, testing and integration

pub mod cli;
pub mod config;
pub mod database;
pub mod deliveries;
pub mod observability;
pub mod telemetry;

// Re-export key types for easy access
pub use config::WorkflowSettings;
pub use database::DatabaseManager;
pub use deliveries::{
    BulkCancellationCoordinator, BulkResult, Delivery, DeliveryError, DeliveryStatus,
    TransitionRequest, TransitionService,
};
pub use observability::{OperationTimer, WorkflowMetrics};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
