use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::quote::Tier;

/// Inclusive dollar bounds for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceRange {
    pub min_dollars: Decimal,
    pub max_dollars: Decimal,
}

/// Ascending volume band: totals at or below `max_cubic_yards` fall in `tier`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeBand {
    pub max_cubic_yards: f64,
    pub tier: Tier,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierRange {
    pub tier: Tier,
    pub range: PriceRange,
}

/// Immutable pricing constants owned by the engine. The default table is the
/// production one; tests swap in alternates without touching the algorithm.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingTable {
    pub truck_cubic_yards: f64,
    pub volume_bands: Vec<VolumeBand>,
    pub base_ranges: Vec<TierRange>,
    pub stairs_per_flight: Decimal,
    pub inside_carry_fee: Decimal,
    pub hazardous_per_item: Decimal,
    pub same_day_multiplier: Decimal,
    pub curbside_multiplier: Decimal,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            truck_cubic_yards: 12.0,
            volume_bands: vec![
                VolumeBand { max_cubic_yards: 2.0, tier: Tier::Small },
                VolumeBand { max_cubic_yards: 5.0, tier: Tier::Medium },
                VolumeBand { max_cubic_yards: 9.0, tier: Tier::Large },
                VolumeBand { max_cubic_yards: f64::INFINITY, tier: Tier::XL },
            ],
            base_ranges: vec![
                TierRange { tier: Tier::Small, range: range(dec!(50), dec!(100)) },
                TierRange { tier: Tier::Medium, range: range(dec!(100), dec!(250)) },
                TierRange { tier: Tier::Large, range: range(dec!(250), dec!(450)) },
                TierRange { tier: Tier::XL, range: range(dec!(450), dec!(800)) },
            ],
            stairs_per_flight: dec!(37.50),
            inside_carry_fee: dec!(25.00),
            hazardous_per_item: dec!(52.50),
            same_day_multiplier: dec!(1.20),
            curbside_multiplier: dec!(0.90),
        }
    }
}

impl PricingTable {
    /// First band whose threshold is at or above the total wins; a total
    /// exactly at a threshold belongs to the lower tier.
    pub fn classify(&self, total_cubic_yards: f64) -> Tier {
        self.volume_bands
            .iter()
            .find(|band| total_cubic_yards <= band.max_cubic_yards)
            .map(|band| band.tier)
            .unwrap_or(Tier::XL)
    }

    /// Base range for a tier, falling back to this table's Medium range and
    /// then to the stock Medium range when a custom table omits entries.
    pub fn base_range(&self, tier: Tier) -> PriceRange {
        self.range_for(tier)
            .or_else(|| self.range_for(Tier::Medium))
            .unwrap_or(range(dec!(100), dec!(250)))
    }

    pub fn truck_fraction(&self, total_cubic_yards: f64) -> f64 {
        if self.truck_cubic_yards <= 0.0 {
            return 0.0;
        }
        (total_cubic_yards / self.truck_cubic_yards).min(1.0)
    }

    fn range_for(&self, tier: Tier) -> Option<PriceRange> {
        self.base_ranges.iter().find(|entry| entry.tier == tier).map(|entry| entry.range)
    }
}

fn range(min_dollars: Decimal, max_dollars: Decimal) -> PriceRange {
    PriceRange { min_dollars, max_dollars }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{range, PricingTable, TierRange, VolumeBand};
    use crate::domain::quote::Tier;

    #[test]
    fn classifies_totals_into_ascending_bands() {
        let table = PricingTable::default();
        assert_eq!(table.classify(0.0), Tier::Small);
        assert_eq!(table.classify(1.0), Tier::Small);
        assert_eq!(table.classify(4.0), Tier::Medium);
        assert_eq!(table.classify(7.0), Tier::Large);
        assert_eq!(table.classify(10.0), Tier::XL);
        assert_eq!(table.classify(500.0), Tier::XL);
    }

    #[test]
    fn totals_exactly_at_a_threshold_stay_in_the_lower_tier() {
        let table = PricingTable::default();
        assert_eq!(table.classify(2.0), Tier::Small);
        assert_eq!(table.classify(5.0), Tier::Medium);
        assert_eq!(table.classify(9.0), Tier::Large);
    }

    #[test]
    fn base_range_falls_back_to_medium_when_tier_missing() {
        let mut table = PricingTable::default();
        table.base_ranges.retain(|entry| entry.tier != Tier::XL);

        let fallback = table.base_range(Tier::XL);
        assert_eq!(fallback.min_dollars, dec!(100));
        assert_eq!(fallback.max_dollars, dec!(250));
    }

    #[test]
    fn base_range_survives_a_table_with_no_medium_entry() {
        let table = PricingTable {
            base_ranges: vec![TierRange { tier: Tier::Small, range: range(dec!(10), dec!(20)) }],
            ..PricingTable::default()
        };

        let fallback = table.base_range(Tier::Large);
        assert_eq!(fallback.min_dollars, dec!(100));
        assert_eq!(fallback.max_dollars, dec!(250));
    }

    #[test]
    fn truck_fraction_caps_at_one_and_guards_zero_capacity() {
        let table = PricingTable::default();
        assert!((table.truck_fraction(3.0) - 0.25).abs() < f64::EPSILON);
        assert!((table.truck_fraction(20.0) - 1.0).abs() < f64::EPSILON);
        assert!((table.truck_fraction(0.0)).abs() < f64::EPSILON);

        let degenerate = PricingTable { truck_cubic_yards: 0.0, ..PricingTable::default() };
        assert!((degenerate.truck_fraction(6.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_bands_reclassify_without_touching_ranges() {
        let table = PricingTable {
            volume_bands: vec![
                VolumeBand { max_cubic_yards: 1.0, tier: Tier::Small },
                VolumeBand { max_cubic_yards: f64::INFINITY, tier: Tier::XL },
            ],
            ..PricingTable::default()
        };

        assert_eq!(table.classify(0.5), Tier::Small);
        assert_eq!(table.classify(1.5), Tier::XL);
    }
}
