//! Melt-value pricing: input parsing, row derivation, and status text.
//!
//! Everything here is a pure function of `(spot, discount)`. Rows are rebuilt
//! from scratch on every call; nothing is cached between edits.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::catalog::{CoinDefinition, Section};
use crate::format::{format_fixed2, format_percent};

/// Shown once a positive spot price is in effect.
pub const STATUS_READY: &str = "Ready. Works offline after first load.";
/// Shown while no usable spot price has been entered.
pub const STATUS_PROMPT: &str = "Enter spot and tap Save.";
/// Shown when a save is attempted with a spot price that is not positive.
pub const STATUS_INVALID: &str = "Enter a valid spot price greater than zero.";
/// Shown after a successful save.
pub const STATUS_SAVED: &str = "Saved. (Works offline after first load.)";

/// Currency symbols, thousands separators, and whitespace.
static NOISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Sc},\s]").expect("valid regex"));

/// Leading decimal number, accepting the same prefixes as a lenient float parser.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").expect("valid regex")
});

fn parse_leading_number(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    m.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses free-text spot price input (e.g. "$2,000.50").
///
/// Currency symbols, commas, and whitespace are stripped before parsing.
/// Returns 0 for empty, unparseable, or non-finite input. The sign is kept so
/// the save action can reject negative prices.
#[must_use]
pub fn parse_spot(text: &str) -> f64 {
    let cleaned = NOISE_RE.replace_all(text, "");
    parse_leading_number(&cleaned).unwrap_or(0.0)
}

/// Parses a discount percentage. Missing or unparseable input yields 0.
#[must_use]
pub fn parse_discount(text: Option<&str>) -> f64 {
    text.and_then(|t| parse_leading_number(t.trim()))
        .unwrap_or(0.0)
}

/// Rounds to two decimal places, agreeing exactly with [`format_fixed2`].
#[must_use]
pub fn round2(n: f64) -> f64 {
    format_fixed2(n).parse().unwrap_or(0.0)
}

/// Melt value of a coin: `spot * agw * (1 - discount / 100)`.
#[must_use]
pub fn melt_value(spot: f64, discount_percent: f64, coin: &CoinDefinition) -> f64 {
    spot * coin.agw_ounces * (1.0 - discount_percent / 100.0)
}

/// Inputs the coin table is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingState {
    /// Spot price per troy ounce, never negative.
    pub spot_price_per_ounce: f64,
    /// Discount percentage in `[0, 100]`.
    pub discount_percent: f64,
}

impl Default for PricingState {
    fn default() -> Self {
        Self {
            spot_price_per_ounce: 0.0,
            discount_percent: 0.0,
        }
    }
}

impl PricingState {
    /// Creates a state, treating negative or non-finite spot as 0 and
    /// clamping the discount into `[0, 100]`.
    #[must_use]
    pub fn new(spot: f64, discount_percent: f64) -> Self {
        let spot = if spot.is_finite() && spot > 0.0 { spot } else { 0.0 };
        let discount = if discount_percent.is_finite() {
            discount_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            spot_price_per_ounce: spot,
            discount_percent: discount,
        }
    }

    /// Melt value of `coin` under this state.
    #[must_use]
    pub fn melt_value(&self, coin: &CoinDefinition) -> f64 {
        melt_value(self.spot_price_per_ounce, self.discount_percent, coin)
    }

    /// Table rows under this state.
    #[must_use]
    pub fn rows(&self) -> Vec<TableRow> {
        compute_rows(self.spot_price_per_ounce, self.discount_percent)
    }

    /// Status text for this state.
    #[must_use]
    pub fn status(&self) -> &'static str {
        status_for(self.spot_price_per_ounce)
    }

    /// Column header for the melt values.
    #[must_use]
    pub fn header(&self) -> String {
        header_label(self.discount_percent)
    }
}

/// One priced coin in the table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoinRow {
    pub section: Section,
    pub coin: CoinDefinition,
    pub melt_value: f64,
}

/// A row of the rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableRow {
    /// Section heading.
    Header { section: Section },
    /// Priced coin.
    Coin(CoinRow),
}

impl TableRow {
    /// Returns the coin row, if this is one.
    #[must_use]
    pub const fn as_coin(&self) -> Option<&CoinRow> {
        match self {
            Self::Coin(row) => Some(row),
            Self::Header { .. } => None,
        }
    }
}

/// Builds the full table: each section header followed by all of its coins.
///
/// Input is sanitized the same way as [`PricingState::new`], so the result
/// always holds exactly one row per catalog coin with a finite, non-negative
/// melt value.
#[must_use]
pub fn compute_rows(spot: f64, discount_percent: f64) -> Vec<TableRow> {
    let state = PricingState::new(spot, discount_percent);
    Section::ALL
        .iter()
        .flat_map(|&section| {
            std::iter::once(TableRow::Header { section }).chain(section.coins().iter().map(
                move |coin| {
                    TableRow::Coin(CoinRow {
                        section,
                        coin: *coin,
                        melt_value: state.melt_value(coin),
                    })
                },
            ))
        })
        .collect()
}

/// Status line for a spot price.
#[must_use]
pub fn status_for(spot: f64) -> &'static str {
    if spot > 0.0 { STATUS_READY } else { STATUS_PROMPT }
}

/// Melt column header: "Melt @ spot", or "Melt @ −10%" when discounted.
/// A discount that prints as "0" counts as spot.
#[must_use]
pub fn header_label(discount_percent: f64) -> String {
    let percent = format_percent(discount_percent);
    if percent == "0" {
        "Melt @ spot".to_string()
    } else {
        format!("Melt @ \u{2212}{percent}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{GOLD_EAGLE, PRE_1933};
    use crate::format::{format_currency, format_weight};

    fn coin_rows(rows: &[TableRow]) -> Vec<CoinRow> {
        rows.iter().filter_map(TableRow::as_coin).copied().collect()
    }

    #[test]
    fn parse_spot_plain_and_decorated() {
        assert_eq!(parse_spot("2000"), 2000.0);
        assert_eq!(parse_spot("$2,000.50"), 2000.5);
        assert_eq!(parse_spot("  2 345.10 "), 2345.1);
        assert_eq!(parse_spot("€1999"), 1999.0);
    }

    #[test]
    fn parse_spot_invalid_is_zero() {
        assert_eq!(parse_spot(""), 0.0);
        assert_eq!(parse_spot("abc"), 0.0);
        assert_eq!(parse_spot("inf"), 0.0);
        assert_eq!(parse_spot("NaN"), 0.0);
        assert_eq!(parse_spot("1e400"), 0.0);
    }

    #[test]
    fn parse_spot_keeps_leading_number() {
        assert_eq!(parse_spot("2000abc"), 2000.0);
        assert_eq!(parse_spot(".5"), 0.5);
        assert_eq!(parse_spot("-5"), -5.0);
    }

    #[test]
    fn parse_discount_defaults_to_zero() {
        assert_eq!(parse_discount(None), 0.0);
        assert_eq!(parse_discount(Some("")), 0.0);
        assert_eq!(parse_discount(Some("x")), 0.0);
        assert_eq!(parse_discount(Some(" 12.5 ")), 12.5);
    }

    #[test]
    fn rows_are_headers_then_coins_in_order() {
        let rows = compute_rows(2000.0, 0.0);
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0], TableRow::Header { section: Section::Pre1933 });
        assert_eq!(rows[5], TableRow::Header { section: Section::GoldEagle });

        let coins = coin_rows(&rows);
        assert_eq!(coins.len(), 8);
        for (row, coin) in coins.iter().zip(PRE_1933.iter().chain(GOLD_EAGLE.iter())) {
            assert_eq!(row.coin.label, coin.label);
        }
        assert!(coins[..4].iter().all(|r| r.section == Section::Pre1933));
        assert!(coins[4..].iter().all(|r| r.section == Section::GoldEagle));
    }

    #[test]
    fn quarter_eagle_at_2000() {
        let coins = coin_rows(&compute_rows(2000.0, 0.0));
        let quarter = coins[0];
        assert_eq!(format_weight(quarter.coin.agw_ounces), "0.12094");
        assert_eq!(format_currency(quarter.melt_value), "$241.88");
        assert_eq!(format_currency(coins[4].melt_value), "$2000.00");
    }

    #[test]
    fn ten_percent_discount() {
        let coins = coin_rows(&compute_rows(2000.0, 10.0));
        assert_eq!(format_currency(coins[4].melt_value), "$1800.00");
        assert_eq!(header_label(10.0), "Melt @ \u{2212}10%");
    }

    #[test]
    fn zero_spot_and_full_discount_yield_zero() {
        for (spot, discount) in [(0.0, 0.0), (2000.0, 100.0), (0.0, 100.0)] {
            let coins = coin_rows(&compute_rows(spot, discount));
            assert_eq!(coins.len(), 8);
            for row in coins {
                assert_eq!(row.melt_value, 0.0);
                assert_eq!(format_currency(row.melt_value), "$0.00");
            }
        }
    }

    #[test]
    fn bad_inputs_are_sanitized() {
        let coins = coin_rows(&compute_rows(-5.0, 250.0));
        assert!(coins.iter().all(|r| r.melt_value == 0.0));
        let coins = coin_rows(&compute_rows(f64::NAN, f64::NAN));
        assert!(coins.iter().all(|r| r.melt_value == 0.0));
        let coins = coin_rows(&compute_rows(1000.0, -20.0));
        assert_eq!(coins[4].melt_value, 1000.0);
    }

    #[test]
    fn status_depends_on_positive_spot() {
        assert_eq!(status_for(1.0), STATUS_READY);
        assert_eq!(status_for(0.0), STATUS_PROMPT);
        assert_eq!(status_for(-3.0), STATUS_PROMPT);
    }

    #[test]
    fn header_without_discount() {
        assert_eq!(header_label(0.0), "Melt @ spot");
        assert_eq!(header_label(2.5), "Melt @ \u{2212}2.5%");
        assert_eq!(header_label(0.001), "Melt @ spot");
        assert_eq!(header_label(0.004), "Melt @ spot");
        assert_eq!(header_label(0.02), "Melt @ \u{2212}0.02%");
    }

    #[test]
    fn state_accessors_agree_with_free_functions() {
        let state = PricingState::new(1850.25, 3.0);
        assert_eq!(state.rows(), compute_rows(1850.25, 3.0));
        assert_eq!(state.status(), STATUS_READY);
        assert_eq!(state.header(), "Melt @ \u{2212}3%");
        assert_eq!(PricingState::default().status(), STATUS_PROMPT);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn melt_matches_formula(spot in 0.0f64..100_000.0, discount in 0.0f64..=100.0) {
                for row in coin_rows(&compute_rows(spot, discount)) {
                    let expected = spot * row.coin.agw_ounces * (1.0 - discount / 100.0);
                    prop_assert_eq!(row.melt_value, expected);
                }
            }

            #[test]
            fn always_eight_finite_non_negative_rows(spot in any::<f64>(), discount in any::<f64>()) {
                let coins = coin_rows(&compute_rows(spot, discount));
                prop_assert_eq!(coins.len(), 8);
                for row in coins {
                    prop_assert!(row.melt_value.is_finite());
                    prop_assert!(row.melt_value >= 0.0);
                }
            }

            #[test]
            fn parse_spot_round_trips_fixed2(x in -1.0e7f64..1.0e7) {
                let text = format!("{x}");
                let parsed = parse_spot(&text);
                prop_assert_eq!(parse_spot(&format_fixed2(parsed)), round2(parsed));
            }

            #[test]
            fn parse_spot_never_panics(text in ".*") {
                let n = parse_spot(&text);
                prop_assert!(n.is_finite());
            }
        }
    }
}
