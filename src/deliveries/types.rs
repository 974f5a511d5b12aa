use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type DeliveryId = i64;
pub type CourierId = i64;

/// Lifecycle status of a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown delivery status '{0}'")]
pub struct UnknownStatus(pub String);

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Pending,
        DeliveryStatus::InProgress,
        DeliveryStatus::Completed,
        DeliveryStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InProgress => "in_progress",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Completed | DeliveryStatus::Cancelled)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(DeliveryStatus::Pending),
            "in_progress" => Ok(DeliveryStatus::InProgress),
            "completed" => Ok(DeliveryStatus::Completed),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub courier_id: CourierId,
    pub customer_id: i64,
    pub order_id: i64,
    pub delivery_address: String,
    pub delivery_details: String,
    pub status: DeliveryStatus,
    pub route_order: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A delivery a courier is accepting; always starts out pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelivery {
    pub courier_id: CourierId,
    pub customer_id: i64,
    pub order_id: i64,
    pub delivery_address: String,
    pub delivery_details: String,
    pub route_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeRecord {
    pub delivery_id: DeliveryId,
    pub old_status: DeliveryStatus,
    pub new_status: DeliveryStatus,
    pub courier_id: CourierId,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub delivery_id: DeliveryId,
    pub courier_id: CourierId,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

/// Timeline entry shown alongside a delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub delivery_id: DeliveryId,
    pub courier_id: CourierId,
    pub status: DeliveryStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryHistory {
    pub delivery: Delivery,
    pub status_changes: Vec<StatusChangeRecord>,
    pub cancellation: Option<CancellationRecord>,
    pub updates: Vec<DeliveryUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: DeliveryStatus, count: u64) {
        match status {
            DeliveryStatus::Pending => self.pending += count,
            DeliveryStatus::InProgress => self.in_progress += count,
            DeliveryStatus::Completed => self.completed += count,
            DeliveryStatus::Cancelled => self.cancelled += count,
        }
    }

    pub fn active(&self) -> u64 {
        self.pending + self.in_progress
    }

    pub fn total(&self) -> u64 {
        self.pending + self.in_progress + self.completed + self.cancelled
    }
}
