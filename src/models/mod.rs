pub mod booking;
pub mod command;
pub mod pending;
pub mod slot;
pub mod webhook;

pub use booking::BookingRecord;
pub use command::Command;
pub use pending::PendingSelection;
pub use slot::{BookedSet, TimeSlot, Window};
pub use webhook::{EventSource, WebhookEvent, WebhookPayload};
