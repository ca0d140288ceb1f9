pub mod candles;
pub mod commands;
pub mod config;
pub mod delta_client;
pub mod error;
pub mod logging;
pub mod models;
pub mod processor;
pub mod storage;
pub mod utility;

// Re-exports for convenience
pub use config::RunConfig;
pub use delta_client::{CandleQuery, DeltaClient, ExchangeApi};
pub use error::DeltaError;
pub use models::{Candle, CandleResponse, OptionSelectionRow, OptionType, Product, Ticker};
pub use processor::{DaySelection, StrikeWindow, select_for_day};
pub use storage::OptionStore;
