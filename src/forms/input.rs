//! Raw numeric input handling

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Keep only digits and the first decimal point
///
/// `"₱1,234.5.6"` becomes `"1234.56"`.
pub fn sanitize_number_input(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match kept.split_once('.') {
        Some((integer, rest)) => format!("{}.{}", integer, rest.replace('.', "")),
        None => kept,
    }
}

/// Add thousands separators to the integer part of a sanitized number
pub fn format_number_input(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let (integer, decimal) = match value.split_once('.') {
        Some((integer, decimal)) => (integer, Some(decimal)),
        None => (value, None),
    };

    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match decimal {
        Some(decimal) => format!("{}.{}", grouped, decimal),
        None => grouped,
    }
}

/// Parse a raw amount after sanitizing it
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let sanitized = sanitize_number_input(raw);
    let trimmed = sanitized.trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('.') {
        return Decimal::from_str(&format!("0{}", trimmed)).ok();
    }
    Decimal::from_str(trimmed).ok()
}

/// Accept either a JSON string or a JSON number for a raw form field
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
        Raw::Missing(()) => String::new(),
    })
}
