use chrono::{DateTime, FixedOffset, Timelike, Utc};

pub const QUIET_HOURS_MESSAGE: &str =
    "We got your message. We'll respond during business hours (8 AM–9 PM).";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Run the full reply pipeline.
    Allow,
    /// Send only the canned message; skip the model for this turn.
    Throttled { message: &'static str },
}

/// Quiet-hours gate over a fixed local-time offset. Wall-clock timezone
/// databases are out of scope; the offset comes from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuietHours {
    pub start_hour: u32,
    pub end_hour: u32,
    pub utc_offset_minutes: i32,
}

impl Default for QuietHours {
    fn default() -> Self {
        // 9 PM to 8 AM, Pacific standard time.
        Self { start_hour: 21, end_hour: 8, utc_offset_minutes: -480 }
    }
}

impl QuietHours {
    pub fn check(&self, now: DateTime<Utc>) -> ThrottleDecision {
        if self.is_quiet(now) {
            ThrottleDecision::Throttled { message: QUIET_HOURS_MESSAGE }
        } else {
            ThrottleDecision::Allow
        }
    }

    /// A window that wraps midnight (end < start) covers late evening and
    /// early morning; otherwise it is the plain half-open range.
    pub fn is_quiet(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local_hour(now);
        if self.end_hour < self.start_hour {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            self.start_hour <= hour && hour < self.end_hour
        }
    }

    fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(offset) => now.with_timezone(&offset).hour(),
            None => now.hour(),
        }
    }
}
