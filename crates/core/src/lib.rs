pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod schedule;
pub mod signature;
pub mod throttle;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::conversation::{ChatMessage, MessageRole, StoredMessage};
pub use domain::job::{BookingDetails, JobSnapshot, JobStatus};
pub use domain::quote::{Quote, QuoteItem, QuoteModifiers, QuoteSnapshot, Tier};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{
    DeterministicQuoteEngine, PricedQuote, PricingStep, PricingTable, QuoteEngine, QuoteInputError,
};
pub use schedule::{BookingCalendar, Slot};
pub use throttle::{QuietHours, ThrottleDecision};
