//! Deterministic quote pricing: an immutable table of constants, a pure
//! engine over canonical types, and the permissive normalization boundary
//! that converts raw action payloads into those types.

pub mod engine;
pub mod normalize;
pub mod tables;

pub use engine::{DeterministicQuoteEngine, PricedQuote, PricingStep, QuoteEngine};
pub use normalize::{
    items_from_value, items_from_values, modifiers_from_value, QuoteInputError,
};
pub use tables::{PriceRange, PricingTable, TierRange, VolumeBand};
