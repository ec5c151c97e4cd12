use serde_json::Value;

/// A structured request the model embedded in its reply. The payload shapes are
/// deliberately loose here; item and modifier coercion happens downstream where
/// a malformed payload can be answered with a re-prompt.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentAction {
    GenerateQuote { items: Value, modifiers: Option<Value> },
    BookSlot { slot_id: String, address: Option<String>, access_notes: Option<String> },
}

impl AgentAction {
    /// Interprets one extracted `ACTION:` object. Returns `None` for unknown
    /// action types and for booking payloads without a string `slot_id`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        match object.get("type").and_then(Value::as_str)? {
            "GENERATE_QUOTE" => Some(Self::GenerateQuote {
                items: object.get("items").cloned().unwrap_or(Value::Null),
                modifiers: object.get("modifiers").cloned(),
            }),
            "BOOK_SLOT" => Some(Self::BookSlot {
                slot_id: object.get("slot_id").and_then(Value::as_str)?.to_string(),
                address: object.get("address").and_then(Value::as_str).map(str::to_string),
                access_notes: object
                    .get("access_notes")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// Splits a raw model reply into visible SMS text and at most one action
/// payload. A line whose trimmed form is `ACTION: <json object>` is captured
/// and removed; an `ACTION:` line that is not a JSON object stays in the text,
/// as does any action line after the first capture.
pub fn extract_action(raw: &str) -> (String, Option<Value>) {
    let mut action = None;
    let mut kept_lines = Vec::new();

    for line in raw.lines() {
        let stripped = line.trim();
        if action.is_none() {
            if let Some(payload) = stripped.strip_prefix("ACTION:") {
                if let Ok(parsed) = serde_json::from_str::<Value>(payload.trim()) {
                    if parsed.is_object() {
                        action = Some(parsed);
                        continue;
                    }
                }
            }
        }
        kept_lines.push(line);
    }

    (kept_lines.join("\n").trim().to_string(), action)
}
