//! Money and date display

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::forms::format_number_input;

/// Symbol for a currency code, if it has a common one
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_uppercase().as_str() {
        "PHP" => Some("₱"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}

/// Format an amount as `₱1,234.56` (two decimals, sign before the symbol)
pub fn format_currency(amount: Decimal) -> String {
    format_money(amount, "PHP")
}

/// Format an amount in the given currency
pub fn format_money(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let grouped = format_number_input(&digits);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };

    match currency_symbol(currency) {
        Some(symbol) => format!("{}{}{}", sign, symbol, grouped),
        None => format!("{}{} {}", sign, currency.to_uppercase(), grouped),
    }
}

/// Long date such as `June 5, 2024`, or `Not provided`
pub fn format_long_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => "Not provided".to_string(),
    }
}

/// Percentage rounded to a whole number, as shown on chart labels
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", value)
}
