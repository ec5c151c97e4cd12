use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::quote::{Quote, QuoteItem, QuoteModifiers, Tier};
use crate::pricing::tables::PricingTable;

/// Turns an item list plus modifiers into a priced range. Implementations
/// must be pure: same inputs, same quote, no clock or randomness.
pub trait QuoteEngine: Send + Sync {
    fn quote(&self, items: &[QuoteItem], modifiers: &QuoteModifiers) -> Quote;
}

/// One applied pricing stage, recorded for operator-facing breakdowns.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricingStep {
    pub stage: String,
    pub detail: String,
    pub low: Decimal,
    pub high: Decimal,
}

/// A quote together with the intermediate totals that produced it.
#[derive(Clone, Debug, Serialize)]
pub struct PricedQuote {
    pub quote: Quote,
    pub total_cubic_yards: f64,
    pub steps: Vec<PricingStep>,
}

/// Table-driven engine. All arithmetic runs in [`Decimal`] dollars and is
/// rounded to cents exactly once, after the last modifier.
#[derive(Clone, Debug, Default)]
pub struct DeterministicQuoteEngine {
    table: PricingTable,
}

impl DeterministicQuoteEngine {
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    pub fn quote_detailed(&self, items: &[QuoteItem], modifiers: &QuoteModifiers) -> PricedQuote {
        let total: f64 = items.iter().map(QuoteItem::line_volume).sum();

        // An empty list still quotes: callers get a Small placeholder rather
        // than an error they would have to special-case.
        let (tier, fraction) = if items.is_empty() {
            (Tier::Small, 0.0)
        } else {
            (self.table.classify(total), self.table.truck_fraction(total))
        };

        let base = self.table.base_range(tier);
        let mut low = base.min_dollars;
        let mut high = base.max_dollars;
        let mut steps = vec![PricingStep {
            stage: "base".into(),
            detail: format!("{tier} tier for {total:.1} cubic yards"),
            low,
            high,
        }];

        if modifiers.stairs_flights != 0 {
            let surcharge = self.table.stairs_per_flight * Decimal::from(modifiers.stairs_flights);
            low += surcharge;
            high += surcharge;
            steps.push(step("stairs", format!("{} flights", modifiers.stairs_flights), low, high));
        }
        if modifiers.inside_carry {
            low += self.table.inside_carry_fee;
            high += self.table.inside_carry_fee;
            steps.push(step("inside_carry", "inside carry".into(), low, high));
        }
        if modifiers.hazardous_count != 0 {
            let surcharge =
                self.table.hazardous_per_item * Decimal::from(modifiers.hazardous_count);
            low += surcharge;
            high += surcharge;
            steps.push(step(
                "hazardous",
                format!("{} hazardous items", modifiers.hazardous_count),
                low,
                high,
            ));
        }
        if modifiers.same_day {
            low *= self.table.same_day_multiplier;
            high *= self.table.same_day_multiplier;
            steps.push(step("same_day", "same-day multiplier".into(), low, high));
        }
        if modifiers.curbside {
            low *= self.table.curbside_multiplier;
            high *= self.table.curbside_multiplier;
            steps.push(step("curbside", "curbside discount".into(), low, high));
        }

        PricedQuote {
            quote: Quote {
                amount_min_cents: to_cents(low),
                amount_max_cents: to_cents(high),
                tier,
                est_truck_fraction: fraction,
                currency: "USD".into(),
            },
            total_cubic_yards: total,
            steps,
        }
    }
}

impl QuoteEngine for DeterministicQuoteEngine {
    fn quote(&self, items: &[QuoteItem], modifiers: &QuoteModifiers) -> Quote {
        self.quote_detailed(items, modifiers).quote
    }
}

fn step(stage: &str, detail: String, low: Decimal, high: Decimal) -> PricingStep {
    PricingStep { stage: stage.into(), detail, low, high }
}

/// Half-cent amounts round away from zero, so $123.455 becomes 12346 cents.
fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}
