use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::Mutex;

use crate::errors::{BookingError, CollaboratorError, ValidationError};
use crate::models::command::SELECT_USAGE;
use crate::models::slot::{slot_offset, MAX_LOOKAHEAD_DAYS, SLOTS_PER_DAY};
use crate::models::{BookingRecord, Command, PendingSelection, TimeSlot};
use crate::services::calendar::CalendarProvider;
use crate::services::notify::AdminAlerts;
use crate::services::pending::PendingStore;
use crate::services::sheets::SpreadsheetStore;
use crate::services::slots::SlotCalculator;

/// Most entries a slot list may carry. Selections past this index are rejected.
pub const MAX_LISTED_SLOTS: usize = SLOTS_PER_DAY * MAX_LOOKAHEAD_DAYS as usize;

pub type Clock = fn() -> DateTime<FixedOffset>;

fn system_clock() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&slot_offset())
}

/// Where the broadcast message of a booking comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFlow {
    /// `select <n> <message>` books and stores the message in one go.
    Inline,
    /// `select <n>` books, the requester's next free text becomes the message.
    TwoStep,
}

impl FromStr for BookingFlow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(BookingFlow::Inline),
            "two_step" | "two-step" | "twostep" => Ok(BookingFlow::TwoStep),
            other => Err(format!("unknown booking flow: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Slots(Vec<TimeSlot>),
    NoSlots,
    Booked(BookingRecord),
    AwaitingMessage { slot: TimeSlot },
    MessageSaved { slot: TimeSlot, message: String },
    Rejected(ValidationError),
    Failed,
    RequesterId(String),
    Help,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Slots(slots) => {
                writeln!(f, "Available slots:")?;
                for (idx, slot) in slots.iter().enumerate() {
                    writeln!(f, "{}. {slot}", idx + 1)?;
                }
                write!(f, "Reply \"{SELECT_USAGE}\" to book.")
            }
            Reply::NoSlots => write!(f, "No slots are available right now."),
            Reply::Booked(record) if record.message.is_empty() => {
                write!(f, "Booking confirmed for {}.", record.slot)
            }
            Reply::Booked(record) => write!(
                f,
                "Booking confirmed for {}.\nMessage: {}",
                record.slot, record.message
            ),
            Reply::AwaitingMessage { slot } => write!(
                f,
                "Slot {slot} is reserved. Send the message to broadcast as your next message."
            ),
            Reply::MessageSaved { slot, message } => {
                write!(f, "Message saved for {slot}:\n{message}")
            }
            Reply::Rejected(ValidationError::Malformed { usage }) => {
                write!(f, "Invalid command. Usage: {usage}")
            }
            Reply::Rejected(ValidationError::NoSuchSlot { .. }) => write!(
                f,
                "Invalid selection. Send \"list\" to see the available slots."
            ),
            Reply::Rejected(ValidationError::SlotTaken(slot)) => write!(
                f,
                "Slot {slot} has just been booked. Send \"list\" to see the available slots."
            ),
            Reply::Help => write!(
                f,
                "Send \"list\" to see the available slots, or \"{SELECT_USAGE}\" to book one."
            ),
            Reply::Failed => write!(
                f,
                "Sorry, your booking could not be saved right now. Please try again later."
            ),
            Reply::RequesterId(id) => write!(f, "Group ID: {id}"),
        }
    }
}

pub struct BookingDispatcher {
    slots: SlotCalculator,
    calendar: Arc<dyn CalendarProvider>,
    sheets: Arc<dyn SpreadsheetStore>,
    pending: PendingStore,
    alerts: AdminAlerts,
    flow: BookingFlow,
    clock: Clock,
    // check-then-write on the booked set is serialised within this process
    commit_lock: Mutex<()>,
}

impl BookingDispatcher {
    pub fn new(
        slots: SlotCalculator,
        calendar: Arc<dyn CalendarProvider>,
        sheets: Arc<dyn SpreadsheetStore>,
        pending: PendingStore,
        alerts: AdminAlerts,
        flow: BookingFlow,
    ) -> Self {
        Self {
            slots,
            calendar,
            sheets,
            pending,
            alerts,
            flow,
            clock: system_clock,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time in the slot offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)()
    }

    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    pub async fn handle_command(&self, text: &str, requester_id: &str) -> Reply {
        self.handle_command_at(text, requester_id, self.now()).await
    }

    pub async fn handle_command_at(
        &self,
        text: &str,
        requester_id: &str,
        now: DateTime<FixedOffset>,
    ) -> Reply {
        // While a selection is pending, whatever the requester sends is its message.
        if self.flow == BookingFlow::TwoStep && !text.trim().is_empty() {
            match self.pending.get(requester_id, now.naive_utc()) {
                Ok(Some(selection)) => {
                    return self
                        .attach_message(selection, text.trim())
                        .await
                        .unwrap_or_else(|e| self.failure_reply(requester_id, e));
                }
                Ok(None) => {}
                Err(e) => return self.failure_reply(requester_id, e.into()),
            }
        }

        let command = match Command::parse(text) {
            Ok(command) => command,
            Err(e) => return self.failure_reply(requester_id, e.into()),
        };

        tracing::info!(requester = %requester_id, command = ?command, "handling command");

        match command {
            Command::List => {
                let slots = self.listed_slots(now).await;
                if slots.is_empty() {
                    Reply::NoSlots
                } else {
                    Reply::Slots(slots)
                }
            }
            Command::GroupId => Reply::RequesterId(requester_id.to_string()),
            Command::Select { reference, message } => self
                .select(requester_id, reference, &message, now)
                .await
                .unwrap_or_else(|e| self.failure_reply(requester_id, e)),
            Command::Text(_) => Reply::Help,
        }
    }

    /// The numbered list shown to requesters, capped so it fits one chat message.
    async fn listed_slots(&self, now: DateTime<FixedOffset>) -> Vec<TimeSlot> {
        let mut slots = self.slots.available_slots(now).await;
        if slots.len() > MAX_LISTED_SLOTS {
            tracing::warn!(
                available = slots.len(),
                listed = MAX_LISTED_SLOTS,
                "slot list capped"
            );
            slots.truncate(MAX_LISTED_SLOTS);
        }
        slots
    }

    async fn select(
        &self,
        requester_id: &str,
        reference: usize,
        message: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<Reply, BookingError> {
        let _guard = self.commit_lock.lock().await;

        let available = self.listed_slots(now).await;
        let slot = reference
            .checked_sub(1)
            .and_then(|idx| available.get(idx))
            .copied()
            .ok_or(ValidationError::NoSuchSlot { reference })?;

        if self.sheets.find_slot(&slot).await? {
            return Err(ValidationError::SlotTaken(slot).into());
        }

        let record = BookingRecord::new(requester_id, slot, message, now);
        self.persist(&record).await?;
        tracing::info!(requester = %requester_id, slot = %slot, booking_id = %record.id, "booking created");

        self.alerts.booking_created(&record).await;

        if self.flow == BookingFlow::TwoStep && message.is_empty() {
            match self.pending.put(requester_id, slot, &record.id, now.naive_utc()) {
                Ok(_) => return Ok(Reply::AwaitingMessage { slot }),
                Err(e) => {
                    tracing::error!(error = %e, requester = %requester_id, "failed to remember pending selection");
                }
            }
        }

        Ok(Reply::Booked(record))
    }

    async fn attach_message(
        &self,
        pending: PendingSelection,
        message: &str,
    ) -> Result<Reply, BookingError> {
        let requester_id = pending.requester_id.as_str();
        let updated = self
            .sheets
            .update_message(requester_id, &pending.booking_id, message)
            .await?;
        self.pending.remove(requester_id)?;

        if !updated {
            return Err(CollaboratorError::Malformed {
                service: "spreadsheet",
                detail: format!("no row for booking {}", pending.booking_id),
            }
            .into());
        }

        tracing::info!(requester = %requester_id, booking_id = %pending.booking_id, "broadcast message saved");
        self.alerts
            .message_attached(requester_id, pending.slot, message)
            .await;

        Ok(Reply::MessageSaved {
            slot: pending.slot,
            message: message.to_string(),
        })
    }

    /// Calendar first, then the sheet. Nothing undoes the calendar write if the sheet fails.
    async fn persist(&self, record: &BookingRecord) -> Result<(), CollaboratorError> {
        let event_id = self.calendar.insert_event(record).await?;

        if let Err(e) = self.sheets.append_booking(record).await {
            tracing::error!(
                error = %e,
                event_id = %event_id,
                booking_id = %record.id,
                "calendar event written but sheet append failed"
            );
            return Err(e);
        }

        Ok(())
    }

    fn failure_reply(&self, requester_id: &str, err: BookingError) -> Reply {
        match err {
            BookingError::Validation(e) => {
                tracing::info!(requester = %requester_id, reason = %e, "command rejected");
                Reply::Rejected(e)
            }
            BookingError::Transport(e) => {
                tracing::error!(error = %e, requester = %requester_id, "booking failed");
                Reply::Failed
            }
        }
    }
}
