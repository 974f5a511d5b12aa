// Delivery lifecycle: pending -> in_progress -> completed, with cancellation from either
// non-terminal status. Every change is validated, persisted and audited atomically.

pub mod audit;
pub mod bulk;
pub mod error;
pub mod service;
pub mod store;
pub mod transitions;
pub mod types;

pub use audit::{AuditEntry, AuditLogger};
pub use bulk::{BulkCancellationCoordinator, BulkItemResult, BulkResult};
pub use error::DeliveryError;
pub use service::{TransitionOutcome, TransitionRequest, TransitionService};
pub use store::DeliveryStore;
pub use transitions::{allowed_transitions, validate_reason, validate_transition, ReasonContext};
pub use types::{
    CancellationRecord, CourierId, Delivery, DeliveryHistory, DeliveryId, DeliveryStatus,
    DeliveryUpdate, NewDelivery, StatusChangeRecord, StatusCounts, UnknownStatus,
};
