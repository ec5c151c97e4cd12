use haulaway_core::pricing::{items_from_value, modifiers_from_value, DeterministicQuoteEngine};
use serde_json::Value;

use crate::commands::CommandResult;

pub fn run(items_json: &str, modifiers_json: Option<&str>) -> CommandResult {
    let items_value: Value = match serde_json::from_str(items_json) {
        Ok(value) => value,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "input_parse",
                format!("--items is not valid JSON: {error}"),
                2,
            );
        }
    };

    let modifiers_value: Option<Value> = match modifiers_json {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(error) => {
                return CommandResult::failure(
                    "quote",
                    "input_parse",
                    format!("--modifiers is not valid JSON: {error}"),
                    2,
                );
            }
        },
        None => None,
    };

    let items = match items_from_value(&items_value) {
        Ok(items) => items,
        Err(error) => return CommandResult::failure("quote", "quote_input", error.to_string(), 2),
    };
    let modifiers = match modifiers_from_value(modifiers_value.as_ref()) {
        Ok(modifiers) => modifiers,
        Err(error) => return CommandResult::failure("quote", "quote_input", error.to_string(), 2),
    };

    let priced = DeterministicQuoteEngine::default().quote_detailed(&items, &modifiers);
    let quote = &priced.quote;

    let mut lines = vec![format!(
        "{} ${:.2}–${:.2} (~{:.0}% of truck, {:.1} cubic yards)",
        quote.tier,
        quote.amount_min_dollars(),
        quote.amount_max_dollars(),
        quote.est_truck_fraction * 100.0,
        priced.total_cubic_yards,
    )];
    for step in &priced.steps {
        lines.push(format!(
            "  - {}: {} -> ${:.2}–${:.2}",
            step.stage, step.detail, step.low, step.high
        ));
    }

    CommandResult::success("quote", lines.join("\n"))
}
