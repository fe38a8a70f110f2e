//! Pure calendar arithmetic used by appointment booking and recurring deliveries.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Upper bound on dates produced by one recurrence expansion
pub const MAX_RECURRING_DATES: usize = 366;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// One bookable window inside business hours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

/// Half-open overlap of `[a_start, a_end)` and `[b_start, b_end)`
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Splits `[opening, closing)` on `date` into back-to-back slots of
/// `duration_minutes`. A trailing remainder shorter than one slot is dropped.
/// A slot is unavailable when it overlaps any of `booked`.
pub fn generate_time_slots(
    date: NaiveDate,
    opening: NaiveTime,
    closing: NaiveTime,
    duration_minutes: u32,
    booked: &[(DateTime<Utc>, DateTime<Utc>)],
) -> Vec<TimeSlot> {
    if duration_minutes == 0 || opening >= closing {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(duration_minutes));
    let day_end = date.and_time(closing).and_utc();
    let mut start = date.and_time(opening).and_utc();
    let mut slots = Vec::new();

    while start + step <= day_end {
        let end = start + step;
        let available = !booked
            .iter()
            .any(|&(b_start, b_end)| intervals_overlap(start, end, b_start, b_end));
        slots.push(TimeSlot {
            start,
            end,
            available,
        });
        start = end;
    }
    slots
}

/// Whether `[start, end)` lies within business hours of a single day
pub fn within_business_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    opening: NaiveTime,
    closing: NaiveTime,
) -> bool {
    let day = start.date_naive();
    start >= day.and_time(opening).and_utc() && end <= day.and_time(closing).and_utc() && start < end
}

/// Expands `start..=end` at a fixed frequency. Monthly steps are whole calendar
/// months from `start`, clamped to the last day of shorter months, so a series
/// starting on Jan 31 continues Feb 28/29, Mar 31, Apr 30.
pub fn generate_recurring_dates(
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    if end < start {
        return dates;
    }

    for n in 0..MAX_RECURRING_DATES {
        let next = match frequency {
            Frequency::Daily => start.checked_add_signed(Duration::days(n as i64)),
            Frequency::Weekly => start.checked_add_signed(Duration::weeks(n as i64)),
            Frequency::Monthly => start.checked_add_months(Months::new(n as u32)),
        };
        match next {
            Some(date) if date <= end => dates.push(date),
            _ => break,
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slots_cover_business_hours() {
        let slots = generate_time_slots(d(2025, 6, 2), t(9, 0), t(12, 0), 30, &[]);
        assert_eq!(slots.len(), 6);
        assert!(slots.iter().all(|s| s.available));
        assert_eq!(slots[0].start, d(2025, 6, 2).and_time(t(9, 0)).and_utc());
        assert_eq!(slots[5].end, d(2025, 6, 2).and_time(t(12, 0)).and_utc());
    }

    #[test]
    fn trailing_partial_slot_is_dropped() {
        let slots = generate_time_slots(d(2025, 6, 2), t(9, 0), t(10, 40), 30, &[]);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn booked_interval_blocks_only_overlapping_slots() {
        let day = d(2025, 6, 2);
        let booked = [(
            day.and_time(t(9, 45)).and_utc(),
            day.and_time(t(10, 30)).and_utc(),
        )];
        let slots = generate_time_slots(day, t(9, 0), t(11, 0), 30, &booked);
        let available: Vec<bool> = slots.iter().map(|s| s.available).collect();
        assert_eq!(available, vec![true, false, false, true]);
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let day = d(2025, 6, 2);
        let nine = day.and_time(t(9, 0)).and_utc();
        let ten = day.and_time(t(10, 0)).and_utc();
        let eleven = day.and_time(t(11, 0)).and_utc();
        assert!(!intervals_overlap(nine, ten, ten, eleven));
        assert!(intervals_overlap(nine, eleven, ten, eleven));
    }

    #[test]
    fn zero_duration_or_inverted_hours_yield_nothing() {
        assert!(generate_time_slots(d(2025, 6, 2), t(9, 0), t(17, 0), 0, &[]).is_empty());
        assert!(generate_time_slots(d(2025, 6, 2), t(17, 0), t(9, 0), 30, &[]).is_empty());
    }

    #[test]
    fn daily_and_weekly_include_both_ends() {
        let daily = generate_recurring_dates(d(2025, 1, 1), d(2025, 1, 5), Frequency::Daily);
        assert_eq!(daily.len(), 5);
        assert_eq!(daily.last(), Some(&d(2025, 1, 5)));

        let weekly = generate_recurring_dates(d(2025, 1, 1), d(2025, 1, 29), Frequency::Weekly);
        assert_eq!(
            weekly,
            vec![
                d(2025, 1, 1),
                d(2025, 1, 8),
                d(2025, 1, 15),
                d(2025, 1, 22),
                d(2025, 1, 29)
            ]
        );
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        let dates = generate_recurring_dates(d(2024, 1, 31), d(2024, 5, 31), Frequency::Monthly);
        assert_eq!(
            dates,
            vec![
                d(2024, 1, 31),
                d(2024, 2, 29),
                d(2024, 3, 31),
                d(2024, 4, 30),
                d(2024, 5, 31)
            ]
        );
    }

    #[test]
    fn end_before_start_is_empty() {
        assert!(generate_recurring_dates(d(2025, 2, 1), d(2025, 1, 1), Frequency::Daily).is_empty());
    }

    #[test]
    fn expansion_is_capped() {
        let dates = generate_recurring_dates(d(2020, 1, 1), d(2030, 1, 1), Frequency::Daily);
        assert_eq!(dates.len(), MAX_RECURRING_DATES);
    }

    #[test]
    fn frequency_parses_from_snake_case() {
        assert_eq!(Frequency::from_str("weekly").unwrap(), Frequency::Weekly);
        assert_eq!(Frequency::Monthly.to_string(), "monthly");
        assert!(Frequency::from_str("yearly").is_err());
    }

    #[test]
    fn business_hours_containment() {
        let day = d(2025, 6, 2);
        let at = |h, m| day.and_time(t(h, m)).and_utc();
        assert!(within_business_hours(at(9, 0), at(10, 0), t(9, 0), t(17, 0)));
        assert!(within_business_hours(at(16, 0), at(17, 0), t(9, 0), t(17, 0)));
        assert!(!within_business_hours(at(8, 30), at(9, 30), t(9, 0), t(17, 0)));
        assert!(!within_business_hours(at(16, 30), at(17, 30), t(9, 0), t(17, 0)));
    }

    proptest! {
        #[test]
        fn slots_are_contiguous_and_inside_hours(
            open_h in 0u32..12,
            span_h in 1u32..12,
            minutes in 5u32..=240,
        ) {
            let day = d(2025, 3, 10);
            let opening = t(open_h, 0);
            let closing = t(open_h + span_h, 0);
            let slots = generate_time_slots(day, opening, closing, minutes, &[]);

            prop_assert_eq!(slots.len() as u32, span_h * 60 / minutes);
            for pair in slots.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
            }
            for slot in &slots {
                prop_assert_eq!((slot.end - slot.start).num_minutes(), i64::from(minutes));
                prop_assert!(slot.start >= day.and_time(opening).and_utc());
                prop_assert!(slot.end <= day.and_time(closing).and_utc());
            }
        }

        #[test]
        fn recurring_dates_are_sorted_bounded_and_capped(
            offset in 0i64..2000,
            span in 0i64..800,
            freq in prop_oneof![
                Just(Frequency::Daily),
                Just(Frequency::Weekly),
                Just(Frequency::Monthly)
            ],
        ) {
            let start = d(2020, 1, 1) + Duration::days(offset);
            let end = start + Duration::days(span);
            let dates = generate_recurring_dates(start, end, freq);

            prop_assert!(!dates.is_empty());
            prop_assert_eq!(dates[0], start);
            prop_assert!(dates.len() <= MAX_RECURRING_DATES);
            for pair in dates.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            prop_assert!(dates.iter().all(|date| *date <= end));
        }
    }
}
