use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Service-size tier driving the base price range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Small,
    Medium,
    Large,
    XL,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::XL => "XL",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line item of junk to remove.
///
/// `category` is a caller-side hint and is passed through uninterpreted;
/// pricing only reads `quantity` and `est_cubic_yards`. Negative counts are
/// not rejected here; see the normalization boundary for what is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub est_cubic_yards: f64,
}

impl QuoteItem {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: i64,
        est_cubic_yards: f64,
    ) -> Self {
        Self { name: name.into(), category: category.into(), quantity, est_cubic_yards }
    }

    /// Volume contributed by all units of this item.
    pub fn line_volume(&self) -> f64 {
        self.est_cubic_yards * self.quantity as f64
    }
}

/// Situational pricing adjustments. The default instance means "no effect".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteModifiers {
    pub stairs_flights: i64,
    pub inside_carry: bool,
    pub hazardous_count: i64,
    pub same_day: bool,
    pub curbside: bool,
}

/// Result of one pricing call. Immutable; amounts are integer cents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub amount_min_cents: i64,
    pub amount_max_cents: i64,
    pub tier: Tier,
    pub est_truck_fraction: f64,
    pub currency: String,
}

impl Quote {
    pub fn amount_min_dollars(&self) -> Decimal {
        Decimal::new(self.amount_min_cents, 2)
    }

    pub fn amount_max_dollars(&self) -> Decimal {
        Decimal::new(self.amount_max_cents, 2)
    }

    /// Dollar-denominated form for persistence and outbound messaging.
    pub fn snapshot(&self) -> QuoteSnapshot {
        QuoteSnapshot {
            amount_min: self.amount_min_dollars(),
            amount_max: self.amount_max_dollars(),
            tier: self.tier,
            est_truck_fraction: (self.est_truck_fraction * 100.0).round() / 100.0,
            currency: self.currency.clone(),
        }
    }
}

/// What gets stored per customer and texted to the provider: dollars, not
/// cents, with the truck fraction trimmed to two decimal places.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub amount_min: Decimal,
    pub amount_max: Decimal,
    pub tier: Tier,
    pub est_truck_fraction: f64,
    pub currency: String,
}
