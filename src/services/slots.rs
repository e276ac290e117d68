use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::models::slot::{FIRST_SLOT_HOUR, LAST_SLOT_HOUR, SLOT_STEP_HOURS};
use crate::models::{BookedSet, TimeSlot, Window};
use crate::services::calendar::CalendarProvider;

/// Every candidate slot in the window, chronologically, minus the booked ones.
pub fn compute_available_slots(booked: &BookedSet, window: Window, today: NaiveDate) -> Vec<TimeSlot> {
    window
        .dates(today)
        .flat_map(|date| {
            (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
                .step_by(SLOT_STEP_HOURS as usize)
                .filter_map(move |hour| NaiveTime::from_hms_opt(hour, 0, 0))
                .map(move |time| TimeSlot::new(date, time))
        })
        .filter(|slot| !booked.contains(slot))
        .collect()
}

pub struct SlotCalculator {
    calendar: Arc<dyn CalendarProvider>,
    window: Window,
}

impl SlotCalculator {
    pub fn new(calendar: Arc<dyn CalendarProvider>, window: Window) -> Self {
        Self { calendar, window }
    }

    /// Available slots for the window starting on `now`'s date in the slot offset.
    /// An unreachable calendar yields no slots rather than an error.
    pub async fn available_slots(&self, now: DateTime<FixedOffset>) -> Vec<TimeSlot> {
        let today = TimeSlot::from_instant(&now).date;
        let Some((from, to)) = self.window.bounds(today) else {
            tracing::error!(%today, days = self.window.days(), "slot window runs past the calendar, offering none");
            return Vec::new();
        };

        let booked: BookedSet = match self.calendar.list_event_starts(from, to).await {
            Ok(starts) => starts.iter().map(TimeSlot::from_instant).collect(),
            Err(e) => {
                tracing::error!(error = %e, "failed to load booked slots, offering none");
                return Vec::new();
            }
        };

        compute_available_slots(&booked, self.window, today)
    }
}
