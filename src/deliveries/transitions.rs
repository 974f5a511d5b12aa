// Legal status transitions and input rules shared by the single and bulk paths.

use super::error::DeliveryError;
use super::types::DeliveryStatus;

/// Statuses reachable in one step from `from`. Terminal statuses yield an empty slice.
pub fn allowed_transitions(from: DeliveryStatus) -> &'static [DeliveryStatus] {
    match from {
        DeliveryStatus::Pending => &[DeliveryStatus::InProgress, DeliveryStatus::Cancelled],
        DeliveryStatus::InProgress => &[DeliveryStatus::Completed, DeliveryStatus::Cancelled],
        DeliveryStatus::Completed | DeliveryStatus::Cancelled => &[],
    }
}

pub fn validate_transition(from: DeliveryStatus, to: DeliveryStatus) -> Result<(), DeliveryError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(DeliveryError::InvalidTransition { from, to })
    }
}

/// Where a reason was entered; each form has its own minimum length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonContext {
    StatusUpdate,
    Cancellation,
    BulkCancellation,
}

impl ReasonContext {
    pub fn min_chars(&self) -> usize {
        match self {
            ReasonContext::StatusUpdate => 10,
            ReasonContext::Cancellation => 15,
            ReasonContext::BulkCancellation => 20,
        }
    }

    /// Context implied by a single-delivery request targeting `to`
    pub fn for_target(to: DeliveryStatus) -> Self {
        if to == DeliveryStatus::Cancelled {
            ReasonContext::Cancellation
        } else {
            ReasonContext::StatusUpdate
        }
    }

    /// Whichever of the two demands the longer reason
    pub fn stricter(self, other: Self) -> Self {
        if other.min_chars() > self.min_chars() {
            other
        } else {
            self
        }
    }
}

/// Returns the trimmed reason when it satisfies the context's length rule
pub fn validate_reason(reason: &str, context: ReasonContext) -> Result<&str, DeliveryError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(DeliveryError::validation("reason", "is required"));
    }

    let min = context.min_chars();
    if trimmed.chars().count() < min {
        return Err(DeliveryError::validation(
            "reason",
            format!("must be at least {min} characters"),
        ));
    }

    Ok(trimmed)
}

pub fn require_confirmation(confirmed: bool) -> Result<(), DeliveryError> {
    if confirmed {
        Ok(())
    } else {
        Err(DeliveryError::validation(
            "confirmed",
            "cancellation must be explicitly confirmed",
        ))
    }
}
