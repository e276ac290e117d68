#[cfg(test)]
mod tests {
    use crate::models::slot::{MAX_LOOKAHEAD_DAYS, SLOTS_PER_DAY};
    use crate::models::{BookedSet, TimeSlot, Window};
    use crate::services::slots::compute_available_slots;
    use chrono::{Days, NaiveDate, NaiveTime, Timelike};
    use proptest::prelude::*;

    fn start_date(days_after_epoch: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .checked_add_days(Days::new(days_after_epoch))
            .unwrap()
    }

    // Bookings both on and off the slot grid, some beyond the window.
    fn booked_set(today: NaiveDate, raw: &[(u64, u32, u32)]) -> BookedSet {
        raw.iter()
            .map(|&(day, hour, minute)| {
                TimeSlot::new(
                    today.checked_add_days(Days::new(day)).unwrap(),
                    NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
                )
            })
            .collect()
    }

    fn in_window(slot: &TimeSlot, today: NaiveDate, days: u32) -> bool {
        let end = today.checked_add_days(Days::new(u64::from(days))).unwrap();
        slot.date >= today && slot.date < end
    }

    fn on_grid(slot: &TimeSlot) -> bool {
        let hour = slot.time.hour();
        slot.time.minute() == 0 && (7..=22).contains(&hour) && (hour - 7) % 3 == 0
    }

    proptest! {
        #[test]
        fn test_never_offers_a_booked_slot(
            days in 1..=MAX_LOOKAHEAD_DAYS,
            start in 0..1500u64,
            raw in prop::collection::vec((0..20u64, 0..24u32, prop::sample::select(vec![0u32, 30])), 0..40),
        ) {
            let today = start_date(start);
            let booked = booked_set(today, &raw);
            let window = Window::from_days(days).unwrap();

            let slots = compute_available_slots(&booked, window, today);
            prop_assert!(slots.iter().all(|s| !booked.contains(s)));
            prop_assert!(slots.iter().all(|s| in_window(s, today, days)));
        }

        #[test]
        fn test_strictly_ordered_without_duplicates(
            days in 1..=MAX_LOOKAHEAD_DAYS,
            start in 0..1500u64,
            raw in prop::collection::vec((0..20u64, 0..24u32, Just(0u32)), 0..40),
        ) {
            let today = start_date(start);
            let booked = booked_set(today, &raw);

            let slots = compute_available_slots(&booked, Window::from_days(days).unwrap(), today);
            prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn test_count_is_grid_minus_booked_in_window(
            days in 1..=MAX_LOOKAHEAD_DAYS,
            start in 0..1500u64,
            raw in prop::collection::vec((0..20u64, 0..24u32, prop::sample::select(vec![0u32, 30])), 0..40),
        ) {
            let today = start_date(start);
            let booked = booked_set(today, &raw);

            let taken = booked
                .iter()
                .filter(|s| in_window(s, today, days) && on_grid(s))
                .count();
            let slots = compute_available_slots(&booked, Window::from_days(days).unwrap(), today);
            prop_assert_eq!(slots.len(), SLOTS_PER_DAY * days as usize - taken);
        }
    }
}
