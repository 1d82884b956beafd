//! Formatting helpers for prices, weights, and percentages.

/// Placeholder shown when a value cannot be displayed.
pub const PLACEHOLDER: &str = "\u{2014}";

/// Formats a dollar amount (e.g. "$241.88", "-$5.00").
///
/// Returns the em-dash placeholder for NaN or infinite input.
#[must_use]
pub fn format_currency(n: f64) -> String {
    if !n.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let text = format_fixed2(n.abs());
    // -0.001 rounds to "0.00" and should not carry a sign
    if n.is_sign_negative() && text != "0.00" {
        format!("-${text}")
    } else {
        format!("${text}")
    }
}

/// Formats a number with exactly two fraction digits.
#[must_use]
pub fn format_fixed2(n: f64) -> String {
    format!("{n:.2}")
}

/// Formats a troy-ounce weight with five fraction digits.
#[must_use]
pub fn format_weight(ounces: f64) -> String {
    format!("{ounces:.5}")
}

/// Formats a percentage to at most two decimals without trailing zeros
/// (e.g. "10", "12.5"). Anything that rounds to zero prints as "0".
#[must_use]
pub fn format_percent(pct: f64) -> String {
    let text = if pct.fract() == 0.0 {
        format!("{pct:.0}")
    } else {
        let text = format!("{pct:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}
