// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decimal amount strings to and from integer base units.
//!
//! Encrypted amounts are 64-bit, so amounts use 6 decimals by default.
//! 18 decimals would overflow above roughly 18.4 whole units.

/// Decimals used for salary caps, salaries and bonuses.
pub const DEFAULT_DECIMALS: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount `{0}`")]
    Invalid(String),

    #[error("Amount has more than {max} decimal places")]
    TooPrecise { max: u8 },

    #[error("Amount `{0}` does not fit in 64 bits")]
    Overflow(String),
}

/// Parse `"12.5"` into base units with `decimals` places.
pub fn parse_units(amount: &str, decimals: u8) -> Result<u64, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::Invalid(amount.to_string()));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(UnitsError::Invalid(amount.to_string()));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooPrecise { max: decimals });
    }

    let overflow = || UnitsError::Overflow(amount.to_string());
    let scale = 10u64.checked_pow(u32::from(decimals)).ok_or_else(overflow)?;

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let fraction_units: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole
        .checked_mul(scale)
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Render base units with trailing zeros trimmed (`1_500_000` → `"1.5"`).
pub fn format_units(units: u64, decimals: u8) -> String {
    if decimals == 0 {
        return units.to_string();
    }
    let scale = 10u128.pow(u32::from(decimals));
    let units = u128::from(units);
    let whole = units / scale;
    let remainder = units % scale;
    if remainder == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", remainder, width = decimals as usize);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
