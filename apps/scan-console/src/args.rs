//! Command-line parsing.

use std::path::PathBuf;

use titan_scan_core::{Consumer, ConsumerMode};
use titan_scan_runtime::{RuntimeResult, ScanPipeline};

pub const USAGE: &str = "\
Titan Scan Console

Usage: titan-scan-console [OPTIONS] <SCREEN>

Screens:
  pos                   Scan products into the POS cart
  stock-in <BARCODE>    Count received units of one product
  inventory             Scan into the inventory filter box
  create                Scan into the new-product barcode field

Options:
  -c, --config <PATH>   Scan config file (default: platform config dir)
      --catalog <PATH>  JSON array of products (default: seeded demo data)
  -r, --reason <TEXT>   Reason code for stock-in commits
  -q, --qty <N>         Manual quantity for stock-in commits
  -h, --help            Show this help message

Keys:
  F2  commit stock-in     F5  reset stock-in     Esc / Ctrl-C  quit";

/// The screen the console emulates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Pos,
    StockIn { barcode: String },
    Inventory,
    Create,
}

impl Screen {
    /// Puts the screen's consumers into keyboard-scanner mode.
    pub async fn configure(&self, pipeline: &mut ScanPipeline) -> RuntimeResult<()> {
        match self {
            Screen::Pos => {
                pipeline.set_mode(Consumer::PosCart, ConsumerMode::Usb);
            }
            Screen::StockIn { barcode } => {
                pipeline.set_mode(Consumer::StockIn, ConsumerMode::Usb);
                pipeline.set_mode(Consumer::ProductSearch, ConsumerMode::Usb);
                pipeline.select_for_stock_in_by_code(barcode).await?;
            }
            Screen::Inventory => {
                pipeline.set_mode(Consumer::InventoryFilter, ConsumerMode::Usb);
            }
            Screen::Create => {
                pipeline.set_mode(Consumer::CreateBarcode, ConsumerMode::Usb);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleArgs {
    pub screen: Screen,
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub reason: Option<String>,
    pub quantity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Run(ConsoleArgs),
}

/// Parses arguments (without the program name).
pub fn parse<I>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut positional = Vec::new();
    let mut config = None;
    let mut catalog = None;
    let mut reason = None;
    let mut quantity = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            "-c" | "--config" => config = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "--catalog" => catalog = Some(PathBuf::from(value_for(&arg, args.next())?)),
            "-r" | "--reason" => reason = Some(value_for(&arg, args.next())?),
            "-q" | "--qty" => quantity = Some(value_for(&arg, args.next())?),
            other if other.starts_with('-') => return Err(format!("unknown option '{}'", other)),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let screen = match positional.next().as_deref() {
        Some("pos") => Screen::Pos,
        Some("stock-in") => Screen::StockIn {
            barcode: positional
                .next()
                .ok_or_else(|| "stock-in needs the product barcode".to_string())?,
        },
        Some("inventory") => Screen::Inventory,
        Some("create") => Screen::Create,
        Some(other) => return Err(format!("unknown screen '{}'", other)),
        None => return Err("missing screen".to_string()),
    };

    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument '{}'", extra));
    }

    Ok(Command::Run(ConsoleArgs {
        screen,
        config,
        catalog,
        reason,
        quantity,
    }))
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{} needs a value", flag))
}
