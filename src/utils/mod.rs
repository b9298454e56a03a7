//! Rounding and display helpers shared by the calculator and the reports
//!
//! All money rounding goes through [`round_money`] so every component of the
//! tax stack is rounded the same way, in the same order.

use itertools::Itertools;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for monetary amounts
pub const MONEY_DP: u32 = 2;

/// Decimal places kept for the burden index
pub const INDEX_DP: u32 = 3;

/// Round a monetary amount to centavos, half away from zero.
///
/// # Examples
/// ```
/// use tributec::utils::round_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(round_money(dec!(216865.0519)), dec!(216865.05));
/// assert_eq!(round_money(dec!(0.005)), dec!(0.01));
/// assert_eq!(round_money(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a ratio/index value to three places, half away from zero.
pub fn round_index(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(INDEX_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Insert `.` thousands separators into a run of ASCII digits.
fn group_thousands(digits: &str) -> String {
    let reversed: Vec<char> = digits.chars().rev().collect();
    reversed
        .chunks(3)
        .map(|chunk| chunk.iter().rev().collect::<String>())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .join(".")
}

/// Format a value using Brazilian conventions (`1.234,56`), always two places.
///
/// # Examples
/// ```
/// use tributec::utils::format_decimal_br;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_decimal_br(dec!(1234.56)), "1.234,56");
/// assert_eq!(format_decimal_br(dec!(-500)), "-500,00");
/// ```
pub fn format_decimal_br(value: Decimal) -> String {
    let rounded = round_money(value.abs());
    let text = format!("{:.2}", rounded);
    let (integer, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let sign = if value < Decimal::ZERO && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{},{}", sign, group_thousands(integer), fraction)
}

/// Format as Brazilian Real: "R$ 1.234,56"
///
/// # Examples
/// ```
/// use tributec::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(644805.85)), "R$ 644.805,85");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format!("R$ {}", format_decimal_br(value))
}

/// Format a fractional rate as a percentage: 0.0038 -> "0,38%"
pub fn format_rate(rate: Decimal) -> String {
    let pct = (rate * Decimal::ONE_HUNDRED).normalize();
    format!("{}%", pct.to_string().replace('.', ","))
}
