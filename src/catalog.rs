//! Static coin catalogs.
//!
//! Weights are actual gold weight (AGW) in troy ounces. Pre-1933 values are
//! the standard "common melt" figures for circulated US gold.

use serde::Serialize;

/// A coin type with a fixed fine-gold content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoinDefinition {
    /// Display name.
    pub label: &'static str,
    /// Fine gold weight in troy ounces.
    pub agw_ounces: f64,
}

impl CoinDefinition {
    const fn new(label: &'static str, agw_ounces: f64) -> Self {
        Self { label, agw_ounces }
    }
}

/// Labeled catalog sections, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    /// Pre-1933 circulated US gold coinage.
    Pre1933,
    /// Modern American Gold Eagle bullion.
    GoldEagle,
}

impl Section {
    /// All sections in display order.
    pub const ALL: [Self; 2] = [Self::Pre1933, Self::GoldEagle];

    /// Section heading shown above its rows.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Pre1933 => "Pre-1933 US Gold",
            Self::GoldEagle => "American Gold Eagle (AGE)",
        }
    }

    /// Coins in this section, in display order.
    #[must_use]
    pub const fn coins(self) -> &'static [CoinDefinition] {
        match self {
            Self::Pre1933 => &PRE_1933,
            Self::GoldEagle => &GOLD_EAGLE,
        }
    }
}

pub const PRE_1933: [CoinDefinition; 4] = [
    CoinDefinition::new("$2.5 (Quarter Eagle)", 0.12094),
    CoinDefinition::new("$5 (Half Eagle)", 0.24187),
    CoinDefinition::new("$10 (Eagle)", 0.48375),
    CoinDefinition::new("$20 (Double Eagle)", 0.96750),
];

pub const GOLD_EAGLE: [CoinDefinition; 4] = [
    CoinDefinition::new("1 oz AGE", 1.0),
    CoinDefinition::new("1/2 oz AGE", 0.5),
    CoinDefinition::new("1/4 oz AGE", 0.25),
    CoinDefinition::new("1/10 oz AGE", 0.1),
];

/// Total number of coin rows across all sections.
#[must_use]
pub fn coin_count() -> usize {
    Section::ALL.iter().map(|s| s.coins().len()).sum()
}
