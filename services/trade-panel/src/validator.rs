//! Amount validation against the spendable balance

use rust_decimal::Decimal;

use crate::types::{BalanceSnapshot, TradeSide};

/// Blocking amount errors shown inline next to the amount input
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Amount exceeds available balance")]
    InsufficientBalance,

    #[error("Amount must be greater than zero")]
    InvalidAmount,
}

impl ValidationError {
    /// Localization key for the inline message
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::InsufficientBalance => "trading.panel.insufficient_balance",
            ValidationError::InvalidAmount => "trading.panel.invalid_amount",
        }
    }
}

/// Check `amount` against the balance of `side`
///
/// The balance check runs first, so an amount over the balance never
/// reports `InvalidAmount`.
pub fn validate(
    amount: Decimal,
    side: TradeSide,
    snapshot: &BalanceSnapshot,
) -> Result<(), ValidationError> {
    if amount > snapshot.balance(side) {
        return Err(ValidationError::InsufficientBalance);
    }
    if amount <= Decimal::ZERO {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(())
}
