// Amount parsing & currency display
// Amounts are signed: positive = income, negative = expense

use crate::error::{Result, TrackerError};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse user-entered amount text into a decimal.
///
/// Accepts an optional leading `+`/`-`, digits, and a single decimal
/// separator (`.` or `,`). Surrounding whitespace is ignored.
/// Anything else (letters, exponents, two separators, empty) is rejected
/// as a whole; there is no partial acceptance.
pub fn parse_amount(text: &str) -> Result<Decimal> {
    let invalid = || TrackerError::Parse {
        input: text.to_string(),
    };

    let trimmed = text.trim();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(stripped) => ("-", stripped),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let normalized = rest.replace(',', ".");
    let mut parts = normalized.split('.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let has_digits = !whole.is_empty() || fraction.is_some_and(|f| !f.is_empty());
    if !has_digits || !is_digits(whole) || !fraction.map_or(true, is_digits) {
        return Err(invalid());
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let canonical = match fraction {
        Some(f) if !f.is_empty() => format!("{sign}{whole}.{f}"),
        _ => format!("{sign}{whole}"),
    };
    Decimal::from_str(&canonical).map_err(|_| invalid())
}

/// Format an amount for display: two decimals, `,` thousands grouping,
/// sign before the currency symbol (`-$1,234.50`).
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}{symbol}{grouped}.{fraction}")
}
