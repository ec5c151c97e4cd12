//! Provider-facing alert texts.
//!
//! Quote and booking alerts go to the business owner's phone, not the
//! customer. Delivery is best-effort: a down gateway must never fail the
//! webhook that triggered the alert, so every error path here logs and
//! reports `false` instead of propagating.

use std::sync::Arc;

use tracing::{info, warn};

use haulaway_core::domain::job::JobSnapshot;

use crate::sender::SmsSender;

pub struct ProviderNotifier {
    sender: Arc<dyn SmsSender>,
    provider_phone: Option<String>,
}

impl ProviderNotifier {
    pub fn new(sender: Arc<dyn SmsSender>, provider_phone: Option<String>) -> Self {
        let provider_phone = provider_phone
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            sender,
            provider_phone,
        }
    }

    /// Texts the provider a one-line summary of a fresh quote. Returns whether
    /// a text actually went out.
    pub async fn notify_quote(&self, customer_phone: &str, snapshot: &JobSnapshot) -> bool {
        let Some(provider_phone) = self.provider_phone.as_deref() else {
            warn!(
                event_name = "sms.notify.skipped",
                kind = "quote",
                "provider phone is not configured"
            );
            return false;
        };
        let body = quote_alert_body(customer_phone, snapshot);
        self.deliver(provider_phone, &body, "quote").await
    }

    /// Texts the provider when a customer locks in a slot. Returns whether a
    /// text actually went out.
    pub async fn notify_booking(&self, customer_phone: &str, snapshot: &JobSnapshot) -> bool {
        let Some(provider_phone) = self.provider_phone.as_deref() else {
            warn!(
                event_name = "sms.notify.skipped",
                kind = "booking",
                "provider phone is not configured"
            );
            return false;
        };
        let body = booking_alert_body(customer_phone, snapshot);
        self.deliver(provider_phone, &body, "booking").await
    }

    async fn deliver(&self, provider_phone: &str, body: &str, kind: &str) -> bool {
        match self.sender.send(provider_phone, body).await {
            Ok(sid) => {
                info!(
                    event_name = "sms.notify.sent",
                    kind,
                    sid = %sid.0,
                    "provider alert delivered"
                );
                true
            }
            Err(error) => {
                warn!(
                    event_name = "sms.notify.failed",
                    kind,
                    error = %error,
                    "provider alert failed"
                );
                false
            }
        }
    }
}

fn quote_alert_body(customer_phone: &str, snapshot: &JobSnapshot) -> String {
    let (amount_min, amount_max, tier, truck_pct) = match &snapshot.quote {
        Some(quote) => (
            quote.amount_min.to_string(),
            quote.amount_max.to_string(),
            quote.tier.to_string(),
            format!("{:.0}%", quote.est_truck_fraction * 100.0),
        ),
        None => placeholders(),
    };

    format!(
        "[Junk] QUOTED — Customer {customer_phone} | ${amount_min}–${amount_max} \
         ({tier}, ~{truck_pct} truck). Reply to this number to view thread."
    )
}

fn booking_alert_body(customer_phone: &str, snapshot: &JobSnapshot) -> String {
    let (amount_min, amount_max) = match &snapshot.quote {
        Some(quote) => (quote.amount_min.to_string(), quote.amount_max.to_string()),
        None => ("—".to_string(), "—".to_string()),
    };
    let address = snapshot
        .address
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or("No address");
    let scheduled = snapshot
        .scheduled_at
        .as_deref()
        .filter(|value| !value.is_empty())
        .unwrap_or("—");

    format!(
        "[Junk] BOOKED — {customer_phone} | {address} | {scheduled} | \
         ${amount_min}–${amount_max}. Reply to this number to view thread."
    )
}

fn placeholders() -> (String, String, String, String) {
    (
        "—".to_string(),
        "—".to_string(),
        "—".to_string(),
        "—".to_string(),
    )
}
