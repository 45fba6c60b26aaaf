//! Amount handling utilities: parsing, rounding and display formatting

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::types::{BalanceSnapshot, TradeSide};

/// Decimal places kept for percentage-derived amounts
///
/// Fixed for both sides; it does not follow the token's on-chain decimals.
pub const AMOUNT_DECIMALS: u32 = 6;

/// On-chain decimals of the native currency
pub const NATIVE_DECIMALS: u8 = 9;

pub const NATIVE_SYMBOL: &str = "SOL";

/// Decimal places kept for fiat values
pub const FIAT_DECIMALS: u32 = 2;

/// Decimal places used when showing the native balance
pub const NATIVE_BALANCE_DISPLAY_DECIMALS: u32 = 3;

/// Decimal places used when showing the token balance
pub const TOKEN_BALANCE_DISPLAY_DECIMALS: u32 = 6;

/// Parse user-entered amount text
///
/// Empty or unparseable text resolves to zero. A parsed negative value is
/// returned as-is so validation can reject it.
pub fn parse_amount(text: &str) -> Decimal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Round half away from zero to `dp` places
pub fn round_to(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_amount(value: Decimal) -> Decimal {
    round_to(value, AMOUNT_DECIMALS)
}

pub fn round_fiat(value: Decimal) -> Decimal {
    round_to(value, FIAT_DECIMALS)
}

/// Render with exactly `dp` decimal places
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = round_to(value, dp);
    rounded.rescale(dp);
    rounded.to_string()
}

/// `balance * pct / 100`, rounded to [`AMOUNT_DECIMALS`]
///
/// `pct` is expected in `0..=100`. When `balance * pct` does not fit a
/// `Decimal` the balance is scaled down first, which cannot overflow for
/// that range.
pub fn percentage_of(balance: Decimal, pct: Decimal) -> Decimal {
    let raw = balance
        .checked_mul(pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .or_else(|| (balance / Decimal::ONE_HUNDRED).checked_mul(pct))
        .unwrap_or(balance);
    round_amount(raw)
}

/// Fiat value of `amount` native units; zero when the product overflows
pub fn fiat_value(amount: Decimal, rate: Decimal) -> Decimal {
    amount
        .checked_mul(rate)
        .map(round_fiat)
        .unwrap_or(Decimal::ZERO)
}

/// Balance label for the selected side
pub fn format_balance(side: TradeSide, snapshot: &BalanceSnapshot) -> String {
    match side {
        TradeSide::Buy => format_fixed(snapshot.native_balance, NATIVE_BALANCE_DISPLAY_DECIMALS),
        TradeSide::Sell => format_fixed(snapshot.token_balance, TOKEN_BALANCE_DISPLAY_DECIMALS),
    }
}

/// Convert UI amount (human readable) to raw base units
pub fn to_raw_amount(ui_amount: Decimal, decimals: u8) -> anyhow::Result<u64> {
    if ui_amount < Decimal::ZERO {
        return Err(anyhow::anyhow!("Amount cannot be negative: {}", ui_amount));
    }

    let multiplier = 10u64
        .checked_pow(decimals as u32)
        .map(Decimal::from)
        .ok_or_else(|| anyhow::anyhow!("Unsupported decimals: {}", decimals))?;
    let raw = ui_amount
        .checked_mul(multiplier)
        .map(|v| v.trunc())
        .and_then(|v| v.to_u64());

    let raw_u64 = raw.ok_or_else(|| {
        anyhow::anyhow!("Amount {} with {} decimals overflows u64", ui_amount, decimals)
    })?;

    if raw_u64 == 0 && ui_amount > Decimal::ZERO {
        return Err(anyhow::anyhow!(
            "Amount {} too small for {} decimals (rounds to 0)",
            ui_amount,
            decimals
        ));
    }

    Ok(raw_u64)
}
