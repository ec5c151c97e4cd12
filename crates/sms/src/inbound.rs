//! Inbound webhook form parsing.

use std::collections::BTreeMap;

/// Pulls the sender phone and message text out of a gateway webhook form.
///
/// Both values are whitespace-trimmed. A missing field comes back as an empty
/// string, so callers can treat "absent" and "blank" the same way.
pub fn parse_inbound(form: &BTreeMap<String, String>) -> (String, String) {
    let from_phone = trimmed(form, "From");
    let body = trimmed(form, "Body");
    (from_phone, body)
}

fn trimmed(form: &BTreeMap<String, String>, key: &str) -> String {
    form.get(key)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}
