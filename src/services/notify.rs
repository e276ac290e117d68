use std::sync::Arc;

use crate::models::{BookingRecord, TimeSlot};
use crate::services::messaging::MessagingProvider;

/// Push notifications to administrators, independent of any reply token.
#[derive(Clone)]
pub struct AdminAlerts {
    messaging: Arc<dyn MessagingProvider>,
    recipients: Vec<String>,
}

impl AdminAlerts {
    pub fn new(messaging: Arc<dyn MessagingProvider>, recipients: Vec<String>) -> Self {
        Self {
            messaging,
            recipients,
        }
    }

    pub async fn booking_created(&self, record: &BookingRecord) {
        let message = if record.message.is_empty() {
            format!("New booking: {} by {}", record.slot, record.requester_id)
        } else {
            format!(
                "New booking: {} by {}\n{}",
                record.slot, record.requester_id, record.message
            )
        };
        self.notify(&message).await;
    }

    /// Follow-up for a two-step booking once its broadcast message arrives.
    pub async fn message_attached(&self, requester_id: &str, slot: TimeSlot, message: &str) {
        let text = format!("Booking message: {slot} by {requester_id}\n{message}");
        self.notify(&text).await;
    }

    pub async fn notify(&self, message: &str) {
        if self.recipients.is_empty() {
            tracing::debug!("no admin recipients configured, skipping notification");
            return;
        }

        for to in &self.recipients {
            if let Err(e) = self.messaging.push(to, message).await {
                tracing::error!(error = %e, to = %to, "failed to notify admin");
            }
        }
    }
}
