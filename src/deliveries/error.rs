use thiserror::Error;

use super::types::DeliveryStatus;

/// Failures surfaced by the delivery workflow.
///
/// Every variant except `Storage` is raised before any write happens. `Storage` is raised
/// from inside a transaction, which is rolled back when its guard drops.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid {field}: {constraint}")]
    Validation {
        field: &'static str,
        constraint: String,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    #[error("Delivery not found")]
    NotFoundOrUnauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl DeliveryError {
    pub fn validation(field: &'static str, constraint: impl Into<String>) -> Self {
        DeliveryError::Validation {
            field,
            constraint: constraint.into(),
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, DeliveryError::Storage(_))
    }

    /// Message safe to show the courier; storage details stay in the logs
    pub fn user_message(&self) -> String {
        match self {
            DeliveryError::Storage(_) => {
                "The delivery could not be updated right now. Please try again later.".to_string()
            }
            DeliveryError::NotFoundOrUnauthorized => {
                "Delivery not found or you don't have permission to modify it.".to_string()
            }
            other => other.to_string(),
        }
    }
}
