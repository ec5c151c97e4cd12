use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::quote::QuoteSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Quoted,
    Booked,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quoted => "quoted",
            Self::Booked => "booked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quoted" => Some(Self::Quoted),
            "booked" => Some(Self::Booked),
            _ => None,
        }
    }
}

/// Everything recorded about one customer's job so far. The quote is kept in
/// its dollar-denominated snapshot form; `scheduled_at` is the human-readable
/// slot string used verbatim in provider texts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub quote: Option<QuoteSnapshot>,
    pub address: Option<String>,
    pub access_notes: Option<String>,
    pub slot_id: Option<String>,
    pub scheduled_at: Option<String>,
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

/// Booking data captured when the customer accepts a slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub slot_id: String,
    pub scheduled_at: String,
    pub address: Option<String>,
    pub access_notes: Option<String>,
}
