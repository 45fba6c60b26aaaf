//! Trading panel - binds the reconciler, presets and submit controller to a
//! trading API, a notifier and a localizer

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::amount::{format_balance, format_fixed, FIAT_DECIMALS, NATIVE_SYMBOL};
use crate::client::{self, BalanceSource, TradeApi, TradeResponse};
use crate::error::Result;
use crate::notify::{keys, Dictionary, Localizer, Notifier, TracingNotifier};
use crate::presets::{MemoryPresetStore, PresetStore, Presets};
use crate::reconciler::{AmountReconciler, PanelEvent};
use crate::selector::{active_marks, percentage_from_track, set_percentage};
use crate::submit::{PendingSubmit, SubmitController, SubmitOutcome, SubmitPhase};
use crate::types::{AmountState, BalanceSnapshot, InputMode, Instrument, TradeSide};

/// Display model of the panel
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub side: TradeSide,
    pub side_label: String,
    pub amount_text: String,
    /// `"50.00%"`; `None` in direct mode
    pub percentage_label: Option<String>,
    /// Fiat equivalent, buy side only
    pub fiat_label: Option<String>,
    pub balance_label: String,
    pub error_message: Option<String>,
    pub active_marks: Vec<u8>,
    pub show_percentage_controls: bool,
    pub submit_enabled: bool,
    pub busy: bool,
}

pub struct TradingPanel {
    api: Arc<dyn TradeApi>,
    instrument_address: String,
    instrument: Option<Instrument>,
    reconciler: AmountReconciler,
    submit: SubmitController,
    presets: Presets,
    store: Arc<dyn PresetStore>,
    notifier: Arc<dyn Notifier>,
    localizer: Arc<dyn Localizer>,
}

impl TradingPanel {
    /// Panel on the buy side, disconnected, with in-memory presets
    pub fn new(api: Arc<dyn TradeApi>, instrument_address: &str, guard_timeout: Duration) -> Self {
        let store: Arc<dyn PresetStore> = Arc::new(MemoryPresetStore::new());
        Self {
            api,
            instrument_address: instrument_address.to_string(),
            instrument: None,
            reconciler: AmountReconciler::new(TradeSide::Buy, false),
            submit: SubmitController::new(guard_timeout),
            presets: Presets::load(store.as_ref()),
            store,
            notifier: Arc::new(TracingNotifier),
            localizer: Arc::new(Dictionary::english()),
        }
    }

    pub fn with_preset_store(mut self, store: Arc<dyn PresetStore>) -> Self {
        self.presets = Presets::load(store.as_ref());
        self.store = store;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }

    pub fn with_side(mut self, side: TradeSide) -> Self {
        self.reconciler.apply(PanelEvent::SideChanged(side));
        self
    }

    pub fn connected(mut self, connected: bool) -> Self {
        self.reconciler.set_connected(connected);
        self
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.reconciler.set_connected(connected);
    }

    pub fn set_side(&mut self, side: TradeSide) -> &AmountState {
        self.reconciler.apply(PanelEvent::SideChanged(side))
    }

    pub fn edit_amount(&mut self, text: &str) -> &AmountState {
        self.reconciler
            .apply(PanelEvent::DirectAmountEdited(text.to_string()))
    }

    /// Quick-amount button `index`
    pub fn select_amount_preset(&mut self, index: usize) -> Result<&AmountState> {
        let amount = self.presets.amount(index)?;
        Ok(self.reconciler.apply(PanelEvent::AmountPresetSelected(amount)))
    }

    /// Quick-percentage button `index`
    pub fn select_percentage_preset(&mut self, index: usize) -> Result<&AmountState> {
        let p = self.presets.percentage(index)?;
        Ok(self.reconciler.apply(set_percentage(p)))
    }

    /// `setPercentage(p)`; out-of-range values are clamped
    pub fn select_percentage(&mut self, p: Decimal) -> &AmountState {
        self.reconciler.apply(set_percentage(p))
    }

    /// Slider mark click (0/25/50/75/100)
    pub fn select_mark(&mut self, mark: u8) -> &AmountState {
        self.reconciler.apply(set_percentage(Decimal::from(mark)))
    }

    /// Click on the slider track
    pub fn click_track(&mut self, click_x: f64, track_width: f64) -> &AmountState {
        let p = percentage_from_track(click_x, track_width);
        self.reconciler.apply(set_percentage(p))
    }

    pub fn edit_percentage_preset(&mut self, index: usize, text: &str) -> Result<bool> {
        Ok(self
            .presets
            .edit_percentage(self.store.as_ref(), index, text)?)
    }

    pub fn edit_amount_preset(&mut self, index: usize, text: &str) -> Result<bool> {
        Ok(self.presets.edit_amount(self.store.as_ref(), index, text)?)
    }

    /// Feed a snapshot from an external query layer
    pub fn apply_snapshot(&mut self, snapshot: BalanceSnapshot) -> &AmountState {
        self.reconciler.apply(PanelEvent::BalanceRefreshed(snapshot))
    }

    /// Query balances and prices, then reconcile
    pub async fn refresh_balances(&mut self) -> Result<()> {
        let (snapshot, instrument) =
            BalanceSource::load(self.api.as_ref(), &self.instrument_address).await?;
        debug!(
            "Balances: native={} token={} rate={}",
            snapshot.native_balance, snapshot.token_balance, snapshot.native_to_fiat_rate
        );
        if self.instrument.as_ref() != Some(&instrument) {
            info!("Trading {} ({})", instrument.symbol, instrument.address);
            self.instrument = Some(instrument);
        }
        self.reconciler.apply(PanelEvent::BalanceRefreshed(snapshot));
        Ok(())
    }

    /// Submit the current amount as a market order
    pub async fn submit(&mut self) -> SubmitOutcome {
        let pending = match self.begin_submit() {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let result = self.api.create_trade(&pending.order).await;
        let outcome = self.finish_submit(&pending, result);

        if matches!(outcome, SubmitOutcome::Filled) {
            if let Err(e) = self.refresh_balances().await {
                warn!("Balance refresh after order failed: {}", e);
            }
        }
        outcome
    }

    /// Check and arm a submit without sending it
    ///
    /// The caller sends `pending.order` through [`Self::api`], possibly on
    /// another task, and passes the answer to [`Self::finish_submit`].
    pub fn begin_submit(&mut self) -> std::result::Result<PendingSubmit, SubmitOutcome> {
        self.submit.prepare(
            &mut self.reconciler,
            self.instrument.as_ref(),
            self.notifier.as_ref(),
            self.localizer.as_ref(),
        )
    }

    /// Apply the API answer of a submit started with [`Self::begin_submit`]
    pub fn finish_submit(
        &mut self,
        pending: &PendingSubmit,
        result: client::Result<TradeResponse>,
    ) -> SubmitOutcome {
        self.submit.resolve(
            pending,
            result,
            &mut self.reconciler,
            self.notifier.as_ref(),
            self.localizer.as_ref(),
        )
    }

    pub fn api(&self) -> Arc<dyn TradeApi> {
        Arc::clone(&self.api)
    }

    /// Whether the submit button is enabled
    pub fn can_submit(&self) -> bool {
        let state = self.reconciler.state();
        state.validation_error.is_none()
            && state.resolved_amount > Decimal::ZERO
            && self.reconciler.context().connected
    }

    pub fn state(&self) -> &AmountState {
        self.reconciler.state()
    }

    pub fn side(&self) -> TradeSide {
        self.reconciler.context().side
    }

    pub fn snapshot(&self) -> &BalanceSnapshot {
        &self.reconciler.context().snapshot
    }

    pub fn instrument(&self) -> Option<&Instrument> {
        self.instrument.as_ref()
    }

    pub fn presets(&self) -> &Presets {
        &self.presets
    }

    pub fn phase(&self) -> SubmitPhase {
        self.submit.phase()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SubmitPhase> {
        self.submit.subscribe()
    }

    pub fn view(&self) -> PanelView {
        let state = self.reconciler.state();
        let side = self.side();
        let symbol = match side {
            TradeSide::Buy => NATIVE_SYMBOL,
            TradeSide::Sell => self.instrument.as_ref().map(|i| i.symbol.as_str()).unwrap_or(""),
        };

        PanelView {
            side,
            side_label: self.localizer.t(match side {
                TradeSide::Buy => keys::BUY,
                TradeSide::Sell => keys::SELL,
            }),
            amount_text: state.raw_amount_text.clone(),
            percentage_label: state
                .displayed_percentage()
                .map(|p| format!("{}%", format_fixed(p, 2))),
            fiat_label: match side {
                TradeSide::Buy => Some(format!("${}", format_fixed(state.fiat_equivalent, FIAT_DECIMALS))),
                TradeSide::Sell => None,
            },
            balance_label: format!(
                "{}: {} {}",
                self.localizer.t(keys::BALANCE),
                format_balance(side, self.snapshot()),
                symbol
            )
            .trim_end()
            .to_string(),
            error_message: state
                .validation_error
                .map(|e| self.localizer.t(e.message_key())),
            active_marks: active_marks(state.percentage),
            show_percentage_controls: state.input_mode != InputMode::Direct || side != TradeSide::Buy,
            submit_enabled: self.can_submit(),
            busy: self.phase() == SubmitPhase::Submitting,
        }
    }

    /// Teardown: cancels the guard timer
    pub fn shutdown(&mut self) {
        self.submit.shutdown();
        debug!("Panel for {} shut down", self.instrument_address);
    }
}
