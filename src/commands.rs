use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::candles::{CandleWriter, lookback_query};
use crate::config::{self, RunConfig};
use crate::delta_client::{DeltaClient, ExchangeApi};
use crate::processor::{StrikeWindow, select_for_day};
use crate::storage::OptionStore;
use crate::utility::timing::{Timer, format_duration};

/// Per-day outcome of the selection stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummary {
    pub date_key: String,
    pub expiry_code: String,
    pub rows: usize,
}

/// What a harvest run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub spot_price: f64,
    pub window: StrikeWindow,
    pub days: Vec<DaySummary>,
    pub symbols: BTreeSet<String>,
    /// Per-day tables present in the database after the run, including earlier runs' days.
    pub day_tables: usize,
    pub candle_rows: usize,
    pub skipped_symbols: Vec<String>,
    pub elapsed: Duration,
}

/// Run the whole harvest against `api`: spot price, catalog, per-day
/// selection and storage, then candles for every selected symbol.
///
/// Any error aborts the run; candle responses without data are skipped.
pub async fn run_harvest<A: ExchangeApi>(
    api: &A,
    cfg: &RunConfig,
    now: DateTime<Utc>,
    show_progress: bool,
) -> Result<RunSummary> {
    cfg.validate()?;
    let started = Instant::now();

    // Step 1: spot price
    let timer = Timer::start("fetch spot price");
    let spot_price = api.fetch_spot_price(config::SPOT_TICKER).await?;
    timer.stop();
    info!(ticker = config::SPOT_TICKER, spot_price, "spot price");

    // Step 2: product catalog
    let timer = Timer::start("fetch products");
    let products = api.fetch_products().await.context("Failed to fetch product catalog")?;
    timer.stop();
    info!(products = products.len(), "product catalog");

    // Step 3: per-day selection and storage
    let window = StrikeWindow::around(spot_price, cfg.strike_spread, cfg.strike_step)?;
    info!(lower = window.lower, upper = window.upper, step = window.step, "strike window");

    let timer = Timer::start("select and store options");
    let mut store = OptionStore::open(&cfg.db_path)?;
    let pb = progress_bar(cfg.days_ahead as u64, "Processing days", show_progress)?;

    let (days, symbols) = (0..cfg.days_ahead).try_fold(
        (Vec::new(), BTreeSet::new()),
        |(mut days, mut symbols), day_index| -> Result<_> {
            let day = select_for_day(&products, &window, cfg.base_date, day_index)?;
            store
                .save_day(&day.date_key, &day.rows)
                .with_context(|| format!("Failed to store options for {}", day.date_key))?;
            info!(
                date = %day.date_key,
                expiry = %day.expiry_code,
                rows = day.rows.len(),
                "stored day selection"
            );

            symbols.extend(day.symbols());
            days.push(DaySummary {
                date_key: day.date_key,
                expiry_code: day.expiry_code,
                rows: day.rows.len(),
            });
            pb.inc(1);
            Ok((days, symbols))
        },
    )?;
    pb.finish_and_clear();
    let day_tables = store.day_keys()?.len();
    drop(store);
    timer.stop();

    // Step 4: candles
    let timer = Timer::start("fetch candles");
    let query = lookback_query(now, cfg.days_back, &cfg.resolution);
    let mut writer = CandleWriter::create(&cfg.candles_csv)?;
    let pb = progress_bar(symbols.len() as u64, "Fetching candles", show_progress)?;

    let mut skipped_symbols = Vec::new();
    for symbol in &symbols {
        let response = api.fetch_candles(symbol, &query).await?;
        match response.usable_candles() {
            Some(candles) => {
                writer.write_candles(symbol, candles)?;
            }
            None => {
                debug!(symbol = %symbol, success = response.success, "no candle data, skipping");
                skipped_symbols.push(symbol.clone());
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let candle_rows = writer.rows_written();
    writer.finish()?;
    timer.stop();
    info!(
        path = %cfg.candles_csv.display(),
        rows = candle_rows,
        skipped = skipped_symbols.len(),
        "wrote candles"
    );

    Ok(RunSummary {
        spot_price,
        window,
        days,
        symbols,
        day_tables,
        candle_rows,
        skipped_symbols,
        elapsed: started.elapsed(),
    })
}

fn progress_bar(len: u64, message: &'static str, visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed})")?
            .progress_chars("=>-"),
    );
    pb.set_message(message);
    Ok(pb)
}

/// Harvest command handler for the binary.
pub struct HarvestCommands;

impl HarvestCommands {
    pub async fn run(cfg: &RunConfig) -> Result<RunSummary> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Delta Exchange BTC Options Harvester".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!("{} Base date: {}", "ℹ".blue(), cfg.base_date);
        println!("{} Days ahead: {}, lookback: {} days", "ℹ".blue(), cfg.days_ahead, cfg.days_back);
        println!();

        let client = DeltaClient::new(cfg.base_url.clone())?;
        let summary = run_harvest(&client, cfg, Utc::now(), true).await?;

        Self::display_summary(cfg, &summary);
        Ok(summary)
    }

    fn display_summary(cfg: &RunConfig, summary: &RunSummary) {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Summary".cyan().bold());
        println!("{}", "=".repeat(60).blue());
        println!("{} Spot price: {:.2}", "✓".green(), summary.spot_price);
        println!(
            "{} Strike window: {} - {} (step {})",
            "✓".green(),
            summary.window.lower,
            summary.window.upper,
            summary.window.step
        );
        for day in &summary.days {
            println!(
                "  {} options_{} (expiry {}) → {} rows",
                "•".cyan(),
                day.date_key,
                day.expiry_code.yellow(),
                day.rows
            );
        }
        println!("{} Day tables in database: {}", "✓".green(), summary.day_tables);
        println!("{} Distinct symbols: {}", "✓".green(), summary.symbols.len());
        println!("{} Candle rows: {}", "✓".green(), summary.candle_rows);
        if !summary.skipped_symbols.is_empty() {
            println!("{} Symbols without candles: {}", "⚠".yellow(), summary.skipped_symbols.len());
        }
        println!("{} Database: {}", "→".cyan(), cfg.db_path.display());
        println!("{} Candles CSV: {}", "→".cyan(), cfg.candles_csv.display());
        println!("{} Time taken: {}", "⏱".yellow(), format_duration(summary.elapsed));
        println!("{}", "=".repeat(60).blue());
    }
}
