//! Submit controller - dispatches the resolved amount as a market order
//!
//! The busy indicator is driven by a guard timer, not by request
//! completion: each submit arms a fixed-duration timer that flips the phase
//! back to [`SubmitPhase::Idle`]. The timer never cancels the request.
//!
//! A submit is split in two so the request can run off the caller's task:
//! [`SubmitController::prepare`] checks preconditions, arms the guard and
//! builds the order; [`SubmitController::resolve`] resets the amount state
//! and notifies once the API answers.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::amount::{to_raw_amount, NATIVE_DECIMALS};
use crate::client::{self, TradeApi, TradeOrder, TradeResponse};
use crate::error::PanelError;
use crate::notify::{keys, Localizer, Notification, Notifier, Severity};
use crate::reconciler::{AmountReconciler, PanelContext, PanelEvent};
use crate::types::{Instrument, TradeSide};
use crate::validator::ValidationError;

/// Default guard duration
pub const DEFAULT_GUARD_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Submitting,
}

/// Why a submit was not dispatched
#[derive(Debug, Clone, PartialEq)]
pub enum NotReady {
    Disconnected,
    NoInstrument,
    Invalid(ValidationError),
    /// Quantity or order value cannot be expressed on the wire
    Unrepresentable(String),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Preconditions failed; nothing was sent and state is unchanged
    NotReady(NotReady),
    /// A previous submit is still within its guard window
    Busy,
    /// API accepted the order
    Filled,
    /// API rejected the order or the request failed
    Failed(PanelError),
}

impl SubmitOutcome {
    pub fn was_dispatched(&self) -> bool {
        matches!(self, SubmitOutcome::Filled | SubmitOutcome::Failed(_))
    }
}

/// Order that passed every submit check and is ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmit {
    pub id: Uuid,
    pub order: TradeOrder,
    /// Quantity in on-chain base units
    pub raw_quantity: u64,
}

pub struct SubmitController {
    phase: Arc<watch::Sender<SubmitPhase>>,
    guard: Option<JoinHandle<()>>,
    guard_timeout: Duration,
}

impl SubmitController {
    pub fn new(guard_timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(SubmitPhase::Idle);
        Self {
            phase: Arc::new(tx),
            guard: None,
            guard_timeout,
        }
    }

    pub fn phase(&self) -> SubmitPhase {
        *self.phase.borrow()
    }

    /// Watch phase changes (busy indicator)
    pub fn subscribe(&self) -> watch::Receiver<SubmitPhase> {
        self.phase.subscribe()
    }

    pub fn guard_timeout(&self) -> Duration {
        self.guard_timeout
    }

    /// Validate, dispatch and reset
    ///
    /// Every dispatched outcome resets the amount state and emits one
    /// notification; retries are left to the user.
    pub async fn submit(
        &mut self,
        api: &dyn TradeApi,
        reconciler: &mut AmountReconciler,
        instrument: Option<&Instrument>,
        notifier: &dyn Notifier,
        localizer: &dyn Localizer,
    ) -> SubmitOutcome {
        let pending = match self.prepare(reconciler, instrument, notifier, localizer) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = api.create_trade(&pending.order).await;
        self.resolve(&pending, result, reconciler, notifier, localizer)
    }

    /// Run the submit checks, enter `Submitting` and build the order
    ///
    /// `Err` carries the outcome of a submit that must not be sent; state is
    /// left unchanged in that case.
    pub fn prepare(
        &mut self,
        reconciler: &mut AmountReconciler,
        instrument: Option<&Instrument>,
        notifier: &dyn Notifier,
        localizer: &dyn Localizer,
    ) -> Result<PendingSubmit, SubmitOutcome> {
        if self.phase() == SubmitPhase::Submitting {
            debug!("Submit ignored: previous submit still in guard window");
            return Err(SubmitOutcome::Busy);
        }

        if !reconciler.context().connected {
            notifier.notify(Notification::new(localizer.t(keys::NOT_CONNECTED), Severity::Error));
            return Err(SubmitOutcome::NotReady(NotReady::Disconnected));
        }

        if let Err(e) = reconciler.revalidate() {
            notifier.notify(Notification::new(localizer.t(e.message_key()), Severity::Error));
            return Err(SubmitOutcome::NotReady(NotReady::Invalid(e)));
        }

        let Some(instrument) = instrument else {
            warn!("Submit ignored: instrument not loaded yet");
            return Err(SubmitOutcome::NotReady(NotReady::NoInstrument));
        };

        let ctx = *reconciler.context();
        let quantity = reconciler.state().resolved_amount;
        let (order, raw_quantity) = match build_order(&ctx, instrument, quantity) {
            Ok(built) => built,
            Err(reason) => {
                warn!("Submit ignored: {}", reason);
                notifier.notify(Notification::new(
                    localizer.t(keys::INVALID_AMOUNT),
                    Severity::Error,
                ));
                return Err(SubmitOutcome::NotReady(NotReady::Unrepresentable(reason)));
            }
        };

        self.begin();

        let pending = PendingSubmit {
            id: Uuid::new_v4(),
            order,
            raw_quantity,
        };
        info!(
            "Submitting {} {} {} (raw {}), value {} [{}]",
            pending.order.side,
            quantity,
            instrument.symbol,
            raw_quantity,
            pending.order.order_value,
            pending.id
        );
        Ok(pending)
    }

    /// Apply the API answer for `pending`: reset state and notify
    ///
    /// The phase is left to the guard timer.
    pub fn resolve(
        &self,
        pending: &PendingSubmit,
        result: client::Result<TradeResponse>,
        reconciler: &mut AmountReconciler,
        notifier: &dyn Notifier,
        localizer: &dyn Localizer,
    ) -> SubmitOutcome {
        reconciler.apply(PanelEvent::SubmitResolved);

        match result {
            Ok(resp) if resp.success => {
                info!("Order accepted [{}]", pending.id);
                notifier.notify(Notification::new(localizer.t(keys::SUCCESS), Severity::Success));
                SubmitOutcome::Filled
            }
            Ok(resp) => {
                warn!(
                    "Order rejected [{}]: {}",
                    pending.id,
                    resp.message.as_deref().unwrap_or("no reason given")
                );
                notifier.notify(Notification::new(localizer.t(keys::ERROR), Severity::Error));
                SubmitOutcome::Failed(PanelError::SubmissionFailed(
                    resp.message.unwrap_or_else(|| "rejected by API".to_string()),
                ))
            }
            Err(e) => {
                error!("Order request failed [{}]: {}", pending.id, e);
                notifier.notify(Notification::new(localizer.t(keys::ERROR), Severity::Error));
                SubmitOutcome::Failed(PanelError::SubmissionFailed(e.to_string()))
            }
        }
    }

    /// Enter `Submitting` and (re)arm the guard
    fn begin(&mut self) {
        self.phase.send_replace(SubmitPhase::Submitting);

        if let Some(previous) = self.guard.take() {
            previous.abort();
        }

        let phase = Arc::clone(&self.phase);
        let timeout = self.guard_timeout;
        self.guard = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            phase.send_replace(SubmitPhase::Idle);
            debug!("Submit guard elapsed after {:?}", timeout);
        }));
    }

    /// Cancel the guard timer and drop back to idle (panel teardown)
    pub fn shutdown(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.abort();
        }
        self.phase.send_replace(SubmitPhase::Idle);
    }
}

/// Market order for `quantity` plus its base-unit quantity
fn build_order(
    ctx: &PanelContext,
    instrument: &Instrument,
    quantity: Decimal,
) -> Result<(TradeOrder, u64), String> {
    let decimals = match ctx.side {
        TradeSide::Buy => NATIVE_DECIMALS,
        TradeSide::Sell => ctx.snapshot.token_decimals,
    };
    let order = TradeOrder::market(
        ctx.side,
        instrument.clone(),
        quantity,
        ctx.snapshot.unit_price(ctx.side),
    )
    .ok_or_else(|| format!("value of {} {} overflows", quantity, instrument.symbol))?;
    let raw = to_raw_amount(quantity, decimals).map_err(|e| e.to_string())?;
    Ok((order, raw))
}

impl Drop for SubmitController {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            guard.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{TokenInfo, TradeAmount};
    use crate::notify::{CollectingNotifier, Dictionary};
    use crate::types::BalanceSnapshot;
    use std::sync::Mutex;

    struct StubApi {
        success: bool,
        orders: Mutex<Vec<TradeOrder>>,
    }

    impl StubApi {
        fn new(success: bool) -> Self {
            Self {
                success,
                orders: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl TradeApi for StubApi {
        async fn fetch_trade_amount(&self, _address: &str) -> crate::client::Result<TradeAmount> {
            unreachable!()
        }

        async fn fetch_native_price(&self) -> crate::client::Result<Decimal> {
            unreachable!()
        }

        async fn fetch_token_info(&self, _address: &str) -> crate::client::Result<TokenInfo> {
            unreachable!()
        }

        async fn create_trade(&self, order: &TradeOrder) -> crate::client::Result<TradeResponse> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(TradeResponse {
                success: self.success,
                message: None,
            })
        }
    }

    fn instrument() -> Instrument {
        Instrument {
            symbol: "WIF".to_string(),
            address: "EKpQGSJtjMFqKZ9KQbSqL2zPQCpA5xZKN2CjeJRdQpump".to_string(),
        }
    }

    fn reconciler(side: TradeSide) -> AmountReconciler {
        let mut r = AmountReconciler::new(side, true);
        r.apply(PanelEvent::BalanceRefreshed(BalanceSnapshot {
            native_balance: Decimal::from(2),
            token_balance: Decimal::from(100),
            token_decimals: 6,
            native_to_fiat_rate: Decimal::from(150),
            token_price: Decimal::from_str_exact("0.5").unwrap(),
        }));
        r
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_returns_to_idle() {
        let api = StubApi::new(true);
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = reconciler(TradeSide::Buy);
        r.apply(PanelEvent::PercentageSelected(Decimal::from(50)));

        let outcome = controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;

        assert!(matches!(outcome, SubmitOutcome::Filled));
        assert_eq!(controller.phase(), SubmitPhase::Submitting);
        assert!(r.state().is_zero());

        tokio::time::sleep(DEFAULT_GUARD_TIMEOUT + Duration::from_millis(1)).await;
        assert_eq!(controller.phase(), SubmitPhase::Idle);

        let orders = api.orders.lock().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].quantity, Decimal::ONE);
        assert_eq!(orders[0].order_value, Decimal::from(150));
        assert_eq!(notifier.last().unwrap().severity, Severity::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_within_guard_window() {
        let api = StubApi::new(true);
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = reconciler(TradeSide::Sell);

        r.apply(PanelEvent::DirectAmountEdited("10".to_string()));
        controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;

        r.apply(PanelEvent::DirectAmountEdited("10".to_string()));
        let outcome = controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;
        assert!(matches!(outcome, SubmitOutcome::Busy));
        assert_eq!(api.orders.lock().unwrap().len(), 1);
        assert_eq!(r.state().resolved_amount, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_invalid_amount_is_not_dispatched() {
        let api = StubApi::new(true);
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = reconciler(TradeSide::Sell);
        r.apply(PanelEvent::DirectAmountEdited("150".to_string()));
        let before = r.state().clone();

        let outcome = controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;

        assert!(matches!(
            outcome,
            SubmitOutcome::NotReady(NotReady::Invalid(ValidationError::InsufficientBalance))
        ));
        assert!(!outcome.was_dispatched());
        assert_eq!(controller.phase(), SubmitPhase::Idle);
        assert_eq!(r.state(), &before);
        assert!(api.orders.lock().unwrap().is_empty());
        assert_eq!(notifier.last().unwrap().message, "Insufficient balance");
    }

    #[tokio::test]
    async fn test_rejection_resets_state() {
        let api = StubApi::new(false);
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = reconciler(TradeSide::Sell);
        r.apply(PanelEvent::DirectAmountEdited("40".to_string()));

        let outcome = controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;

        assert!(matches!(outcome, SubmitOutcome::Failed(PanelError::SubmissionFailed(_))));
        assert!(r.state().is_zero());
        assert_eq!(api.orders.lock().unwrap()[0].order_value, Decimal::from(20));
        assert_eq!(notifier.last().unwrap().severity, Severity::Error);
        controller.shutdown();
        assert_eq!(controller.phase(), SubmitPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prepare_then_resolve() {
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = reconciler(TradeSide::Buy);
        r.apply(PanelEvent::DirectAmountEdited("1".to_string()));

        let pending = controller
            .prepare(&mut r, Some(&instrument()), &notifier, &dict)
            .unwrap();
        assert_eq!(controller.phase(), SubmitPhase::Submitting);
        assert_eq!(pending.raw_quantity, 1_000_000_000);
        assert_eq!(pending.order.order_value, Decimal::from(150));
        assert_eq!(r.state().resolved_amount, Decimal::ONE);

        // User keeps editing while the request is in flight
        r.apply(PanelEvent::DirectAmountEdited("0.25".to_string()));

        let outcome = controller.resolve(
            &pending,
            Ok(TradeResponse {
                success: true,
                message: None,
            }),
            &mut r,
            &notifier,
            &dict,
        );
        assert!(matches!(outcome, SubmitOutcome::Filled));
        assert!(r.state().is_zero());
        assert_eq!(controller.phase(), SubmitPhase::Submitting);
    }

    #[tokio::test]
    async fn test_amount_below_base_unit_is_not_dispatched() {
        let api = StubApi::new(true);
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = reconciler(TradeSide::Sell);
        r.apply(PanelEvent::DirectAmountEdited("0.0000001".to_string()));
        let before = r.state().clone();

        let outcome = controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;

        assert!(matches!(
            outcome,
            SubmitOutcome::NotReady(NotReady::Unrepresentable(_))
        ));
        assert_eq!(controller.phase(), SubmitPhase::Idle);
        assert_eq!(r.state(), &before);
        assert!(api.orders.lock().unwrap().is_empty());
        assert_eq!(notifier.last().unwrap().message, "Please enter a valid amount");
    }

    #[tokio::test]
    async fn test_overflowing_order_value_is_not_dispatched() {
        let api = StubApi::new(true);
        let notifier = CollectingNotifier::new();
        let dict = Dictionary::english();
        let mut controller = SubmitController::new(DEFAULT_GUARD_TIMEOUT);
        let mut r = AmountReconciler::new(TradeSide::Sell, true);
        r.apply(PanelEvent::BalanceRefreshed(BalanceSnapshot {
            native_balance: Decimal::ONE,
            token_balance: Decimal::MAX,
            token_decimals: 6,
            native_to_fiat_rate: Decimal::from(150),
            token_price: Decimal::from(2),
        }));
        r.apply(PanelEvent::PercentageSelected(Decimal::from(100)));
        assert_eq!(r.state().validation_error, None);

        let outcome = controller
            .submit(&api, &mut r, Some(&instrument()), &notifier, &dict)
            .await;

        assert!(matches!(
            outcome,
            SubmitOutcome::NotReady(NotReady::Unrepresentable(_))
        ));
        assert!(api.orders.lock().unwrap().is_empty());
    }
}
