//! # Titan Scan Console
//!
//! Terminal harness for the scan pipeline. Plug in a keyboard-wedge scanner,
//! pick a screen, and scan.
//!
//! ## Usage
//! ```bash
//! # POS: every scan adds to the cart
//! titan-scan-console pos
//!
//! # Stock-in: count units of one product, F2 commits
//! titan-scan-console stock-in 5900000000001 --reason delivery
//!
//! # Verbose routing decisions
//! RUST_LOG=titan_scan=debug titan-scan-console inventory
//! ```
//!
//! Without `--catalog`, a small demo catalog is seeded with barcodes
//! `5900000000001` through `5900000000008`.

mod args;
mod input;
mod logging;

use std::env;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use titan_scan_core::{normalize, Product};
use titan_scan_runtime::{InMemoryCatalog, MemoryCart, ScanConfig, ScanOutcome, ScanPipeline};

use crate::args::{Command, ConsoleArgs, Screen};
use crate::input::{ConsoleInput, InputThread, RawModeGuard};
use crate::logging::init_tracing;

/// Demo products: (SKU, name, price in cents).
const DEMO_PRODUCTS: &[(&str, &str, i64)] = &[
    ("BEV-COC-001", "Coca-Cola 330ml", 199),
    ("BEV-SPR-002", "Sprite 330ml", 199),
    ("BEV-RED-003", "Red Bull 250ml", 349),
    ("SNK-LAY-004", "Lays Classic", 299),
    ("SNK-KIT-005", "Kit Kat", 149),
    ("DAI-MIL-006", "Whole Milk 1L", 259),
    ("GRO-PAS-007", "Spaghetti 500g", 189),
    ("FRZ-ICE-008", "Vanilla Ice Cream", 549),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = match args::parse(env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            println!("{}", args::USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!();
            eprintln!("{}", args::USAGE);
            std::process::exit(2);
        }
    };

    let config = ScanConfig::load_or_default(args.config.clone());
    let catalog = Arc::new(load_catalog(args.catalog.as_deref()).await?);
    let cart = Arc::new(MemoryCart::new());

    let mut pipeline = ScanPipeline::new(&config, catalog.clone(), cart.clone());
    args.screen.configure(&mut pipeline).await?;
    if let Some(qty) = &args.quantity {
        pipeline.set_manual_quantity(qty.clone());
    }

    println!("Titan Scan Console");
    println!("==================");
    println!("Screen:   {:?}", args.screen);
    println!("Products: {}", catalog.len().await);
    println!("Burst:    {:?}", config.burst_threshold());
    if let Some(product) = pipeline.selected_product() {
        println!("Receiving: {} ({})", product.name, product.sku);
    }
    println!();
    println!("Scan away. F2 commit, F5 reset, Esc quits.");

    run(&mut pipeline, &cart, &args).await?;

    info!("Console closed");
    Ok(())
}

async fn run(
    pipeline: &mut ScanPipeline,
    cart: &MemoryCart,
    args: &ConsoleArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let _raw = RawModeGuard::enable()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut input = InputThread::spawn(tx)?;

    while let Some((event, at)) = rx.recv().await {
        match event {
            ConsoleInput::Quit => break,
            ConsoleInput::Key(key) => match pipeline.on_key(key, at).await {
                Ok(Some(outcome)) => report(&outcome, cart).await,
                Ok(None) => {}
                Err(e) => say(format!("error: {}", e)),
            },
            ConsoleInput::Commit => {
                if !matches!(args.screen, Screen::StockIn { .. }) {
                    continue;
                }
                match pipeline.commit_stock_in(args.reason.as_deref()).await {
                    Ok(product) => say(format!(
                        "committed: {} now has {} in stock",
                        product.name, product.current_stock
                    )),
                    Err(e) => say(format!("commit rejected: {}", e)),
                }
            }
            ConsoleInput::Reset => {
                pipeline.reset_stock_in();
                say("stock-in count reset");
            }
        }
    }

    input.stop();
    Ok(())
}

async fn report(outcome: &ScanOutcome, cart: &MemoryCart) {
    match outcome {
        ScanOutcome::Discarded { code } => say(format!("{}: no consumer, discarded", code)),
        ScanOutcome::FieldPopulated { consumer, code } => say(format!("{} <- {}", consumer, code)),
        ScanOutcome::ProductFound { product, .. } => {
            say(format!("found: {} ({}) stock {}", product.name, product.sku, product.current_stock))
        }
        ScanOutcome::ProductNotFound { code, .. } => say(format!("{}: product not found", code)),
        ScanOutcome::StockMatched { pending } => say(format!("pending: {}", pending)),
        ScanOutcome::StockMismatch { expected, scanned } => say(format!(
            "invalid barcode: scanned {}, expected {}",
            scanned,
            expected.as_deref().unwrap_or("<none>")
        )),
        ScanOutcome::AddedToCart { product } => {
            let total = cart.total_cents().await;
            say(format!(
                "cart + {}  total {}.{:02}",
                product.name,
                total / 100,
                total % 100
            ))
        }
    }
}

/// Prints one line; raw mode needs an explicit carriage return.
fn say(line: impl Display) {
    let mut out = io::stdout();
    let _ = write!(out, "{}\r\n", line);
    let _ = out.flush();
}

/// Loads products from a JSON file, or seeds the demo catalog.
async fn load_catalog(path: Option<&Path>) -> Result<InMemoryCatalog, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            let products: Vec<Product> = serde_json::from_str(&contents)?;
            info!(?path, count = products.len(), "Catalog loaded from file");
            Ok(InMemoryCatalog::with_products(products))
        }
        None => Ok(seed_demo_catalog().await),
    }
}

async fn seed_demo_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    for (i, (sku, name, price_cents)) in DEMO_PRODUCTS.iter().enumerate() {
        let barcode = normalize(&format!("590{:010}", i + 1));
        catalog.seed(sku, name, Some(&barcode), *price_cents).await;
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_scan_core::NormalizedCode;
    use titan_scan_runtime::Catalog;

    #[tokio::test]
    async fn test_demo_catalog_barcodes_match_scans() {
        let catalog = seed_demo_catalog().await;
        assert_eq!(catalog.len().await, DEMO_PRODUCTS.len());

        let found = catalog
            .lookup_product_by_code(&NormalizedCode::from_raw("5900000000001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.sku, "BEV-COC-001");
        assert_eq!(found.barcode.as_deref(), Some("590-000-0000001"));
    }

    #[tokio::test]
    async fn test_load_catalog_from_json() {
        let path = env::temp_dir().join(format!("titan-scan-catalog-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"id":"p-1","sku":"SKU-1","barcode":"ABC-def-1234","name":"Cola",
                "priceCents":199,"currentStock":4,"isActive":true,
                "updatedAt":"2026-01-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let catalog = load_catalog(Some(&path)).await.unwrap();
        assert_eq!(catalog.get("p-1").await.unwrap().current_stock, 4);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_stock_in_screen_selects_product() {
        let catalog = Arc::new(seed_demo_catalog().await);
        let cart = Arc::new(MemoryCart::new());
        let mut pipeline = ScanPipeline::new(&ScanConfig::default(), catalog, cart);

        let screen = Screen::StockIn {
            barcode: "5900000000003".into(),
        };
        screen.configure(&mut pipeline).await.unwrap();

        assert!(pipeline.is_listening());
        assert_eq!(
            pipeline.selected_product().map(|p| p.sku.as_str()),
            Some("BEV-RED-003")
        );
    }
}
