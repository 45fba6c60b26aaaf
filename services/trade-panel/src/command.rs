//! Line commands for the terminal binding of the panel

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::TradeSide;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelCommand {
    Side(TradeSide),
    Percentage(Decimal),
    Mark(u8),
    Amount(String),
    AmountPreset(usize),
    PercentagePreset(usize),
    EditAmountPreset { index: usize, value: String },
    EditPercentagePreset { index: usize, value: String },
    Refresh,
    Submit,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  buy | sell                 switch side
  pct <0-100>                select percentage of balance
  mark <0|25|50|75|100>      click a slider mark
  amount <value>             type an amount
  preset <i>                 quick amount button i
  ppreset <i>                quick percentage button i
  set-preset <i> <value>     edit quick amount i
  set-ppreset <i> <value>    edit quick percentage i
  refresh | submit | show | help | quit";

impl FromStr for PanelCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let cmd = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("empty command"))?
            .to_ascii_lowercase();
        let arg = parts.next();
        let rest = parts.next();

        let required = |name: &str| {
            arg.ok_or_else(|| anyhow::anyhow!("`{}` needs an argument", name))
        };

        let command = match cmd.as_str() {
            "buy" => PanelCommand::Side(TradeSide::Buy),
            "sell" => PanelCommand::Side(TradeSide::Sell),
            "pct" | "percent" => PanelCommand::Percentage(Decimal::from_str(required("pct")?)?),
            "mark" => PanelCommand::Mark(required("mark")?.parse()?),
            "amount" => PanelCommand::Amount(required("amount")?.to_string()),
            "preset" => PanelCommand::AmountPreset(required("preset")?.parse()?),
            "ppreset" => PanelCommand::PercentagePreset(required("ppreset")?.parse()?),
            "set-preset" | "set-ppreset" => {
                let index = required(cmd.as_str())?.parse()?;
                let value = rest
                    .ok_or_else(|| anyhow::anyhow!("`{}` needs <index> <value>", cmd))?
                    .to_string();
                if cmd == "set-preset" {
                    PanelCommand::EditAmountPreset { index, value }
                } else {
                    PanelCommand::EditPercentagePreset { index, value }
                }
            }
            "refresh" => PanelCommand::Refresh,
            "submit" => PanelCommand::Submit,
            "show" => PanelCommand::Show,
            "help" | "?" => PanelCommand::Help,
            "quit" | "exit" => PanelCommand::Quit,
            other => return Err(anyhow::anyhow!("unknown command: {}", other)),
        };
        Ok(command)
    }
}
