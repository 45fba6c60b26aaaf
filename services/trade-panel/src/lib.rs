//! Trade Panel Library
//!
//! Amount/percentage reconciliation, validation and order submission for a
//! token trading panel.

pub mod amount;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod notify;
pub mod panel;
pub mod presets;
pub mod reconciler;
pub mod selector;
pub mod submit;
pub mod types;
pub mod validator;


// Re-export main types for convenience
pub use client::{ApiError, BalanceSource, TradeApi, TradeOrder, TradeResponse, TradingApiClient};
pub use config::PanelConfig;
pub use error::PanelError;
pub use panel::{PanelView, TradingPanel};
pub use reconciler::{reconcile, AmountReconciler, PanelContext, PanelEvent};
pub use submit::{NotReady, PendingSubmit, SubmitController, SubmitOutcome, SubmitPhase};
pub use types::{AmountState, BalanceSnapshot, InputMode, Instrument, TradeSide};
pub use validator::{validate, ValidationError};
