use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::errors::DomainError;

/// Display labels for the two daily service windows.
pub const DEFAULT_WINDOWS: [&str; 2] = ["9:00 AM–12:00 PM", "1:00 PM–4:00 PM"];
pub const DEFAULT_DAYS_AHEAD: u32 = 7;

/// A bookable window on a concrete date. The id round-trips through the
/// conversation (`2026-03-01_1` is the second window that day).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub id: String,
    pub date: NaiveDate,
    pub window: String,
}

/// Fixed windows repeated for a rolling span of days. No availability
/// lookup yet; every listed slot is offered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingCalendar {
    windows: Vec<String>,
    days_ahead: u32,
}

impl Default for BookingCalendar {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.iter().map(|w| w.to_string()).collect(),
            days_ahead: DEFAULT_DAYS_AHEAD,
        }
    }
}

impl BookingCalendar {
    pub fn new(windows: Vec<String>, days_ahead: u32) -> Self {
        Self { windows, days_ahead }
    }

    pub fn windows(&self) -> &[String] {
        &self.windows
    }

    pub fn list_slots(&self, today: NaiveDate) -> Vec<Slot> {
        let mut slots = Vec::new();
        for offset in 0..self.days_ahead {
            let Some(date) = today.checked_add_days(Days::new(u64::from(offset))) else {
                break;
            };
            for (index, window) in self.windows.iter().enumerate() {
                slots.push(Slot {
                    id: format!("{date}_{index}"),
                    date,
                    window: window.clone(),
                });
            }
        }
        slots
    }

    /// Parses `YYYY-MM-DD_<window index>`, splitting on the last underscore.
    /// Any malformed date or out-of-range index yields `None`.
    pub fn slot_from_id(&self, slot_id: &str) -> Option<Slot> {
        let (date_part, index_part) = slot_id.rsplit_once('_')?;
        let date: NaiveDate = date_part.parse().ok()?;
        let index: usize = index_part.parse().ok()?;
        let window = self.windows.get(index)?;
        Some(Slot { id: slot_id.to_string(), date, window: window.clone() })
    }

    /// `slot_from_id` with the failure promoted to the domain error the
    /// booking flow reports.
    pub fn resolve_slot(&self, slot_id: &str) -> Result<Slot, DomainError> {
        self.slot_from_id(slot_id)
            .ok_or_else(|| DomainError::UnknownSlot { slot_id: slot_id.to_string() })
    }

    /// Short human form for SMS, e.g. `Thu 03/05, 1:00 PM–4:00 PM`.
    pub fn format_slot(&self, slot: &Slot) -> String {
        format!("{}, {}", slot.date.format("%a %m/%d"), slot.window)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::BookingCalendar;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lists_every_window_for_the_rolling_span() {
        let calendar = BookingCalendar::default();
        let slots = calendar.list_slots(day(2026, 3, 1));

        assert_eq!(slots.len(), 14);
        assert_eq!(slots[0].id, "2026-03-01_0");
        assert_eq!(slots[1].id, "2026-03-01_1");
        assert_eq!(slots[2].id, "2026-03-02_0");
        assert_eq!(slots[13].id, "2026-03-07_1");
    }

    #[test]
    fn slot_ids_round_trip() {
        let calendar = BookingCalendar::default();
        for listed in calendar.list_slots(day(2026, 3, 1)) {
            let parsed = calendar.slot_from_id(&listed.id).unwrap();
            assert_eq!(parsed, listed);
        }
    }

    #[test]
    fn malformed_slot_ids_parse_to_none() {
        let calendar = BookingCalendar::default();
        for bad in ["", "tomorrow", "2026-03-01", "2026-13-01_0", "2026-03-01_x", "2026-03-01_5"] {
            assert!(calendar.slot_from_id(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn negative_window_indexes_are_rejected() {
        let calendar = BookingCalendar::default();
        assert!(calendar.slot_from_id("2026-03-01_-1").is_none());
    }

    #[test]
    fn resolving_an_unknown_slot_names_the_id() {
        let calendar = BookingCalendar::default();
        let error = calendar.resolve_slot("2026-03-01_9").unwrap_err();

        assert_eq!(error.to_string(), "unknown booking slot: 2026-03-01_9");
    }

    #[test]
    fn formats_slots_with_weekday_and_window() {
        let calendar = BookingCalendar::default();
        let slot = calendar.slot_from_id("2026-03-05_1").unwrap();

        assert_eq!(calendar.format_slot(&slot), "Thu 03/05, 1:00 PM–4:00 PM");
    }

    #[test]
    fn custom_windows_extend_the_index_range() {
        let calendar = BookingCalendar::new(
            vec!["8:00 AM–10:00 AM".into(), "10:00 AM–12:00 PM".into(), "2:00 PM–4:00 PM".into()],
            2,
        );

        assert_eq!(calendar.list_slots(day(2026, 3, 1)).len(), 6);
        assert!(calendar.slot_from_id("2026-03-01_2").is_some());
        assert!(calendar.slot_from_id("2026-03-01_3").is_none());
    }
}
