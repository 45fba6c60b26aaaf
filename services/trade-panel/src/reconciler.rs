//! Amount reconciliation - keeps the typed amount, the percentage and the
//! fiat equivalent consistent with the current balance
//!
//! [`reconcile`] is a pure transition `(state, context, event) -> (state, context)`.
//! [`AmountReconciler`] owns one state/context pair and applies events to it.

use rust_decimal::Decimal;
use tracing::debug;

use crate::amount::{fiat_value, format_fixed, parse_amount, percentage_of, AMOUNT_DECIMALS};
use crate::selector::clamp_percentage;
use crate::types::{AmountState, BalanceSnapshot, InputMode, TradeSide};
use crate::validator::{validate, ValidationError};

/// Inputs the reconciler reads but does not own
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelContext {
    pub side: TradeSide,
    pub snapshot: BalanceSnapshot,
    /// Wallet/session linked
    pub connected: bool,
}

/// Everything that can change the amount state
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    DirectAmountEdited(String),
    /// Absolute quick-amount button; behaves like a direct edit
    AmountPresetSelected(Decimal),
    PercentageSelected(Decimal),
    BalanceRefreshed(BalanceSnapshot),
    SideChanged(TradeSide),
    SubmitResolved,
}

/// Apply one event
pub fn reconcile(
    state: &AmountState,
    ctx: &PanelContext,
    event: PanelEvent,
) -> (AmountState, PanelContext) {
    match event {
        PanelEvent::DirectAmountEdited(text) => {
            let amount = parse_amount(&text);
            (direct_state(text, amount, ctx), *ctx)
        }
        PanelEvent::AmountPresetSelected(amount) => {
            (direct_state(amount.normalize().to_string(), amount, ctx), *ctx)
        }
        // Derived from the last snapshot even when disconnected; submit
        // checks connectivity
        PanelEvent::PercentageSelected(p) => (percentage_state(clamp_percentage(p), ctx), *ctx),
        PanelEvent::BalanceRefreshed(snapshot) => {
            let next_ctx = PanelContext { snapshot, ..*ctx };
            let next = match state.input_mode {
                InputMode::Percentage if state.percentage > Decimal::ZERO => {
                    percentage_state(state.percentage, &next_ctx)
                }
                InputMode::Direct => AmountState {
                    fiat_equivalent: fiat_for(state.resolved_amount, &next_ctx),
                    validation_error: validate(
                        state.resolved_amount,
                        next_ctx.side,
                        &next_ctx.snapshot,
                    )
                    .err(),
                    ..state.clone()
                },
                InputMode::Percentage => state.clone(),
            };
            (next, next_ctx)
        }
        PanelEvent::SideChanged(side) => {
            if side == ctx.side {
                return (state.clone(), *ctx);
            }
            (AmountState::zero(), PanelContext { side, ..*ctx })
        }
        PanelEvent::SubmitResolved => (AmountState::zero(), *ctx),
    }
}

fn direct_state(text: String, amount: Decimal, ctx: &PanelContext) -> AmountState {
    AmountState {
        raw_amount_text: text,
        resolved_amount: amount,
        percentage: Decimal::ZERO,
        input_mode: InputMode::Direct,
        fiat_equivalent: fiat_for(amount, ctx),
        validation_error: validate(amount, ctx.side, &ctx.snapshot).err(),
    }
}

fn percentage_state(p: Decimal, ctx: &PanelContext) -> AmountState {
    let amount = percentage_of(ctx.snapshot.balance(ctx.side), p);
    AmountState {
        raw_amount_text: format_fixed(amount, AMOUNT_DECIMALS),
        resolved_amount: amount,
        percentage: p,
        input_mode: InputMode::Percentage,
        fiat_equivalent: fiat_for(amount, ctx),
        validation_error: validate(amount, ctx.side, &ctx.snapshot).err(),
    }
}

fn fiat_for(amount: Decimal, ctx: &PanelContext) -> Decimal {
    match ctx.side {
        TradeSide::Buy => fiat_value(amount, ctx.snapshot.native_to_fiat_rate),
        TradeSide::Sell => Decimal::ZERO,
    }
}

/// Owns the amount state of one panel
#[derive(Debug, Clone)]
pub struct AmountReconciler {
    state: AmountState,
    ctx: PanelContext,
}

impl AmountReconciler {
    pub fn new(side: TradeSide, connected: bool) -> Self {
        Self {
            state: AmountState::zero(),
            ctx: PanelContext {
                side,
                snapshot: BalanceSnapshot::default(),
                connected,
            },
        }
    }

    /// Apply an event and return the new state
    pub fn apply(&mut self, event: PanelEvent) -> &AmountState {
        debug!("Reconciler event: {:?}", event);
        let (state, ctx) = reconcile(&self.state, &self.ctx, event);
        if state != self.state {
            debug!(
                "Amount state: {} ({:?}, {}%) -> {} ({:?}, {}%)",
                self.state.resolved_amount,
                self.state.input_mode,
                self.state.percentage,
                state.resolved_amount,
                state.input_mode,
                state.percentage
            );
        }
        self.state = state;
        self.ctx = ctx;
        &self.state
    }

    /// Re-run validation on the current amount, recording the result
    pub fn revalidate(&mut self) -> Result<(), ValidationError> {
        let result = validate(self.state.resolved_amount, self.ctx.side, &self.ctx.snapshot);
        self.state = AmountState {
            validation_error: result.err(),
            ..self.state.clone()
        };
        result
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.ctx.connected = connected;
    }

    pub fn state(&self) -> &AmountState {
        &self.state
    }

    pub fn context(&self) -> &PanelContext {
        &self.ctx
    }
}
