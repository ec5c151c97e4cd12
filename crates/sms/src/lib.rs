//! SMS Integration - gateway webhook parsing and outbound delivery
//!
//! This crate is the phone-facing edge of haulaway:
//! - **Inbound** (`inbound`) - Pulls `From`/`Body` out of gateway webhook forms
//! - **Sender** (`sender`) - `SmsSender` trait plus the HTTP gateway client
//! - **Notify** (`notify`) - Provider alert texts for quotes and bookings
//!
//! # Key Types
//!
//! - `SmsSender` - One-shot delivery trait (no internal retries)
//! - `HttpSmsSender` - Real gateway client; fails per send when unconfigured
//! - `RecordingSmsSender` - In-memory capture for tests and dry runs
//! - `ProviderNotifier` - Best-effort owner alerts; never fails the caller

pub mod inbound;
pub mod notify;
pub mod sender;

pub use inbound::parse_inbound;
pub use notify::ProviderNotifier;
pub use sender::{HttpSmsSender, MessageSid, RecordingSmsSender, SmsError, SmsSender};
