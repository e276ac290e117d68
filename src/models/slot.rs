use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Seconds east of UTC for every slot timestamp (Asia/Jakarta, no DST).
pub const SLOT_UTC_OFFSET_SECS: i32 = 7 * 3600;
pub const SLOT_TIME_ZONE: &str = "Asia/Jakarta";

pub const FIRST_SLOT_HOUR: u32 = 7;
pub const LAST_SLOT_HOUR: u32 = 22;
pub const SLOT_STEP_HOURS: u32 = 3;
pub const SLOTS_PER_DAY: usize = ((LAST_SLOT_HOUR - FIRST_SLOT_HOUR) / SLOT_STEP_HOURS + 1) as usize;

/// Longest accepted lookahead. Two weeks of slots still fit in one chat message.
pub const MAX_LOOKAHEAD_DAYS: u32 = 14;

pub fn slot_offset() -> FixedOffset {
    FixedOffset::east_opt(SLOT_UTC_OFFSET_SECS).expect("UTC+7 is a valid offset")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Normalises an arbitrary timestamp into the slot offset.
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        let local = instant.with_timezone(&slot_offset()).naive_local();
        Self {
            date: local.date(),
            time: local.time(),
        }
    }

    pub fn start_at(&self) -> DateTime<FixedOffset> {
        self.date
            .and_time(self.time)
            .and_local_timezone(slot_offset())
            .single()
            .expect("fixed offsets have no gaps")
    }

    pub fn end_at(&self) -> DateTime<FixedOffset> {
        self.start_at() + Duration::hours(i64::from(SLOT_STEP_HOURS))
    }

    pub fn time_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date_label(), self.time_label())
    }
}

/// How many days, starting today, are offered for booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    SingleDay,
    MultiDay(u32),
}

impl Window {
    /// `None` outside `1..=MAX_LOOKAHEAD_DAYS`.
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            0 => None,
            1 => Some(Window::SingleDay),
            n if n <= MAX_LOOKAHEAD_DAYS => Some(Window::MultiDay(n)),
            _ => None,
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            Window::SingleDay => 1,
            Window::MultiDay(n) => (*n).clamp(1, MAX_LOOKAHEAD_DAYS),
        }
    }

    /// Dates covered by the window, stopping early at the end of the calendar.
    pub fn dates(&self, today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        (0..self.days()).map_while(move |offset| today.checked_add_days(Days::new(u64::from(offset))))
    }

    /// `[today 00:00, today + days 00:00)` in the slot offset, `None` past the end of the calendar.
    pub fn bounds(&self, today: NaiveDate) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let end_date = today.checked_add_days(Days::new(u64::from(self.days())))?;
        Some((
            TimeSlot::new(today, NaiveTime::MIN).start_at(),
            TimeSlot::new(end_date, NaiveTime::MIN).start_at(),
        ))
    }
}

pub type BookedSet = BTreeSet<TimeSlot>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_from_instant_normalises_to_utc_plus_seven() {
        let utc = Utc.with_ymd_and_hms(2025, 6, 16, 3, 0, 0).unwrap();
        let slot = TimeSlot::from_instant(&utc);
        assert_eq!(slot.to_string(), "2025-06-16 10:00");

        let late = Utc.with_ymd_and_hms(2025, 6, 16, 21, 0, 0).unwrap();
        assert_eq!(TimeSlot::from_instant(&late).to_string(), "2025-06-17 04:00");
    }

    #[test]
    fn test_start_and_end() {
        let slot = TimeSlot::new(
            NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        );
        assert_eq!(slot.start_at().to_rfc3339(), "2025-06-16T22:00:00+07:00");
        assert_eq!(slot.end_at().to_rfc3339(), "2025-06-17T01:00:00+07:00");
    }

    #[test]
    fn test_window_from_days() {
        assert_eq!(Window::from_days(0), None);
        assert_eq!(Window::from_days(1), Some(Window::SingleDay));
        assert_eq!(Window::from_days(3), Some(Window::MultiDay(3)));
        assert_eq!(Window::MultiDay(3).days(), 3);
        assert_eq!(
            Window::from_days(MAX_LOOKAHEAD_DAYS),
            Some(Window::MultiDay(MAX_LOOKAHEAD_DAYS))
        );
        assert_eq!(Window::from_days(MAX_LOOKAHEAD_DAYS + 1), None);
        assert_eq!(Window::from_days(200_000_000), None);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        assert_eq!(Window::MultiDay(200_000_000).days(), MAX_LOOKAHEAD_DAYS);
    }

    #[test]
    fn test_window_at_end_of_calendar_does_not_overflow() {
        let last = NaiveDate::MAX;
        assert_eq!(Window::MultiDay(3).bounds(last), None);
        assert_eq!(Window::MultiDay(3).dates(last).collect::<Vec<_>>(), vec![last]);
    }

    #[test]
    fn test_slots_per_day() {
        assert_eq!(SLOTS_PER_DAY, 6);
    }

    #[test]
    fn test_window_bounds() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let (start, end) = Window::MultiDay(2).bounds(today).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-06-16T00:00:00+07:00");
        assert_eq!(end.to_rfc3339(), "2025-06-18T00:00:00+07:00");
    }
}
