use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::TimeSlot;

/// A slot a requester has booked and whose broadcast message is still missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSelection {
    pub requester_id: String,
    pub slot: TimeSlot,
    pub booking_id: String,
    pub expires_at: NaiveDateTime,
}
