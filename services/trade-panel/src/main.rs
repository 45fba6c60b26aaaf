//! Trade Panel - terminal binding of the trading panel
//!
//! 1. Loads configuration from file/environment
//! 2. Polls balances and prices from the trading API
//! 3. Applies line commands from stdin to the panel
//! 4. Submits market orders

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trade_panel::client::Result as ApiResult;
use trade_panel::command::{PanelCommand, HELP};
use trade_panel::notify::{Dictionary, Localizer, TracingNotifier};
use trade_panel::presets::{FilePresetStore, PresetStore};
use trade_panel::{
    PanelConfig, PendingSubmit, SubmitOutcome, TradeResponse, TradingApiClient, TradingPanel,
};

/// Order answers handed back to the command loop
type Resolved = (PendingSubmit, ApiResult<TradeResponse>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Trade Panel...");

    let config = PanelConfig::load()?;
    info!(
        "API: {}, instrument: {}, connected: {}",
        config.api_base_url,
        config.instrument_address,
        config.connected()
    );

    let client = TradingApiClient::new(&config.api_base_url, config.request_timeout())?
        .with_token(config.api_token.clone());
    let store: Arc<dyn PresetStore> = Arc::new(FilePresetStore::new(config.presets_dir())?);
    let localizer: Arc<dyn Localizer> = match &config.locale_file {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            Arc::new(Dictionary::from_json(&config.locale, &json)?)
        }
        None => Arc::new(Dictionary::english()),
    };

    let mut panel = TradingPanel::new(
        Arc::new(client),
        &config.instrument_address,
        config.guard_timeout(),
    )
    .with_preset_store(store)
    .with_localizer(localizer)
    .with_notifier(Arc::new(TracingNotifier))
    .connected(config.connected());

    let mut poll = interval(config.balance_poll_interval());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (resolved_tx, mut resolved_rx) = mpsc::unbounded_channel::<Resolved>();
    println!("{}", HELP);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Err(e) = panel.refresh_balances().await {
                    warn!("Balance refresh failed: {}", e);
                }
            }
            Some((pending, result)) = resolved_rx.recv() => {
                let outcome = panel.finish_submit(&pending, result);
                info!("Submit [{}]: {:?}", pending.id, outcome);
                if matches!(outcome, SubmitOutcome::Filled) {
                    if let Err(e) = panel.refresh_balances().await {
                        warn!("Balance refresh after order failed: {}", e);
                    }
                }
                print_view(&panel);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("stdin error: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<PanelCommand>() {
                    Ok(PanelCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = run_command(&mut panel, command, &resolved_tx).await {
                            warn!("{}", e);
                        }
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    panel.shutdown();
    info!("Trade Panel stopped");
    Ok(())
}

async fn run_command(
    panel: &mut TradingPanel,
    command: PanelCommand,
    resolved_tx: &mpsc::UnboundedSender<Resolved>,
) -> anyhow::Result<()> {
    match command {
        PanelCommand::Side(side) => {
            panel.set_side(side);
        }
        PanelCommand::Percentage(p) => {
            panel.select_percentage(p);
        }
        PanelCommand::Mark(mark) => {
            panel.select_mark(mark);
        }
        PanelCommand::Amount(text) => {
            panel.edit_amount(&text);
        }
        PanelCommand::AmountPreset(index) => {
            panel.select_amount_preset(index)?;
        }
        PanelCommand::PercentagePreset(index) => {
            panel.select_percentage_preset(index)?;
        }
        PanelCommand::EditAmountPreset { index, value } => {
            if !panel.edit_amount_preset(index, &value)? {
                warn!("Ignored amount preset {:?}", value);
            }
        }
        PanelCommand::EditPercentagePreset { index, value } => {
            if !panel.edit_percentage_preset(index, &value)? {
                warn!("Ignored percentage preset {:?} (must be 0 < p <= 100)", value);
            }
        }
        PanelCommand::Refresh => panel.refresh_balances().await?,
        // The request runs on its own task so the loop keeps serving input
        PanelCommand::Submit => match panel.begin_submit() {
            Ok(pending) => {
                let api = panel.api();
                let tx = resolved_tx.clone();
                tokio::spawn(async move {
                    let result = api.create_trade(&pending.order).await;
                    if tx.send((pending, result)).is_err() {
                        warn!("Order answer dropped: panel already stopped");
                    }
                });
            }
            Err(outcome) => info!("Submit: {:?}", outcome),
        },
        PanelCommand::Help => println!("{}", HELP),
        PanelCommand::Show | PanelCommand::Quit => {}
    }

    print_view(panel);
    Ok(())
}

fn print_view(panel: &TradingPanel) {
    let view = panel.view();
    println!(
        "[{}] {} {}{}{}",
        view.side_label,
        view.amount_text,
        view.percentage_label
            .map(|p| format!("({}) ", p))
            .unwrap_or_default(),
        view.fiat_label.map(|f| format!("≈ {} ", f)).unwrap_or_default(),
        if view.busy { "…" } else { "" }
    );
    println!("  {}", view.balance_label);
    if let Some(err) = view.error_message {
        println!("  ! {}", err);
    }
    let presets = panel.presets();
    println!(
        "  presets: {:?}  %: {:?}  submit: {}",
        presets.amounts.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
        presets.percentages.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
        if view.submit_enabled { "enabled" } else { "disabled" }
    );
}
