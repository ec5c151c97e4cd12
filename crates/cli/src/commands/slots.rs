use crate::commands::CommandResult;
use haulaway_core::config::{AppConfig, LoadOptions};

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "slots",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let calendar = config.booking_calendar();
    let today = chrono::Local::now().date_naive();

    let mut lines =
        vec![format!("bookable slots for the next {} days:", config.booking.days_ahead)];
    for slot in calendar.list_slots(today) {
        lines.push(format!("  - {}: {}", slot.id, calendar.format_slot(&slot)));
    }

    CommandResult::success("slots", lines.join("\n"))
}
