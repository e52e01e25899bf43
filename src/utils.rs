// src/utils.rs
use rust_decimal::{Decimal, RoundingStrategy};

/// Денежный формат en-US: `$1,005.50`, `-$5.50`
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let abs = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = abs.split_once('.').unwrap_or((abs.as_str(), "00"));
    format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
}

/// Процент со знаком: `+5.50%`, `-1.25%`
pub fn format_percent(value: Decimal) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() { "" } else { "+" };
    format!("{}{:.2}%", sign, rounded)
}

// -0.00 печатаем как 0.00
fn round_cents(value: Decimal) -> Decimal {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() { Decimal::ZERO } else { rounded }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
