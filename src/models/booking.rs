use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::TimeSlot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    pub requester_id: String,
    pub slot: TimeSlot,
    pub message: String,
    pub created_at: DateTime<FixedOffset>,
}

impl BookingRecord {
    pub fn new(requester_id: &str, slot: TimeSlot, message: &str, now: DateTime<FixedOffset>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            requester_id: requester_id.to_string(),
            slot,
            message: message.to_string(),
            created_at: now,
        }
    }

    /// Column order of a booking row: requester, date, time, message, booking id.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.requester_id.clone(),
            self.slot.date_label(),
            self.slot.time_label(),
            self.message.clone(),
            self.id.clone(),
        ]
    }
}

/// Zero-based column of the message field in a booking row.
pub const MESSAGE_COLUMN: usize = 3;
