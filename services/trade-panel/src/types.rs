//! Core types for the trading panel
//!
//! These types are shared by the reconciler, the validator, the submit
//! controller and the API client.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validator::ValidationError;

/// Which balance is being spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    /// Spend native currency to acquire the token
    #[default]
    Buy,
    /// Spend the token to acquire native currency
    Sell,
}

impl TradeSide {
    pub fn toggled(self) -> Self {
        match self {
            TradeSide::Buy => TradeSide::Sell,
            TradeSide::Sell => TradeSide::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spendable balances for the selected instrument
///
/// Refreshed by the query layer; the reconciler only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Native currency balance (UI amount)
    pub native_balance: Decimal,
    /// Token balance (UI amount)
    pub token_balance: Decimal,
    /// On-chain decimals of the token
    pub token_decimals: u8,
    /// Fiat price of one unit of native currency
    pub native_to_fiat_rate: Decimal,
    /// Fiat price of one token
    pub token_price: Decimal,
}

impl BalanceSnapshot {
    /// Balance that is authoritative for `side`
    pub fn balance(&self, side: TradeSide) -> Decimal {
        match side {
            TradeSide::Buy => self.native_balance,
            TradeSide::Sell => self.token_balance,
        }
    }

    /// Fiat unit price used to value an order on `side`
    pub fn unit_price(&self, side: TradeSide) -> Decimal {
        match side {
            TradeSide::Buy => self.native_to_fiat_rate,
            TradeSide::Sell => self.token_price,
        }
    }
}

/// How the current amount was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Amount derived from a fraction of the balance
    #[default]
    Percentage,
    /// Amount typed (or picked as an absolute preset) by the user
    Direct,
}

/// Amount state of one trading panel
///
/// Replaced wholesale on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountState {
    pub raw_amount_text: String,
    pub resolved_amount: Decimal,
    /// 0..=100
    pub percentage: Decimal,
    pub input_mode: InputMode,
    /// Only meaningful on the buy side
    pub fiat_equivalent: Decimal,
    pub validation_error: Option<ValidationError>,
}

impl AmountState {
    /// State used on mount, on side switch and after a submit resolves
    pub fn zero() -> Self {
        Self {
            raw_amount_text: "0.00".to_string(),
            resolved_amount: Decimal::ZERO,
            percentage: Decimal::ZERO,
            input_mode: InputMode::Percentage,
            fiat_equivalent: Decimal::ZERO,
            validation_error: None,
        }
    }

    /// Percentage to show next to the amount; suppressed in direct mode
    pub fn displayed_percentage(&self) -> Option<Decimal> {
        match self.input_mode {
            InputMode::Percentage => Some(self.percentage),
            InputMode::Direct => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.resolved_amount.is_zero()
            && self.percentage.is_zero()
            && self.fiat_equivalent.is_zero()
    }
}

impl Default for AmountState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Token being traded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_by_side() {
        let snapshot = BalanceSnapshot {
            native_balance: Decimal::from(2),
            token_balance: Decimal::from(100),
            token_decimals: 6,
            native_to_fiat_rate: Decimal::from(150),
            token_price: Decimal::from_str_exact("0.25").unwrap(),
        };

        assert_eq!(snapshot.balance(TradeSide::Buy), Decimal::from(2));
        assert_eq!(snapshot.balance(TradeSide::Sell), Decimal::from(100));
        assert_eq!(snapshot.unit_price(TradeSide::Buy), Decimal::from(150));
        assert_eq!(
            snapshot.unit_price(TradeSide::Sell),
            Decimal::from_str_exact("0.25").unwrap()
        );
    }

    #[test]
    fn test_zero_state() {
        let state = AmountState::zero();
        assert!(state.is_zero());
        assert_eq!(state.raw_amount_text, "0.00");
        assert_eq!(state.input_mode, InputMode::Percentage);
        assert_eq!(state.displayed_percentage(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_side_serde() {
        assert_eq!(serde_json::to_string(&TradeSide::Sell).unwrap(), "\"sell\"");
        assert_eq!(TradeSide::Buy.toggled(), TradeSide::Sell);
        assert_eq!(TradeSide::Sell.to_string(), "sell");
    }
}
