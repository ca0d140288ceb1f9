use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config;
use crate::error::DeltaError;
use crate::models::{OptionSelectionRow, OptionType, Product};

/// Stepped set of strikes `{lower, lower + step, ..., upper}` around a spot price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrikeWindow {
    pub lower: i64,
    pub upper: i64,
    pub step: i64,
}

impl StrikeWindow {
    /// Bounds are `floor((spot ± spread) / step) * step`. `step` must be positive.
    ///
    /// A spot that is not finite, or whose bounds do not fit in `i64`, is an error.
    pub fn around(spot: f64, spread: i64, step: i64) -> Result<Self, DeltaError> {
        let invalid = || DeltaError::InvalidNumber {
            field: "spot_price",
            value: spot.to_string(),
        };
        let snap = |value: f64| {
            let buckets = (value / step as f64).floor();
            if !buckets.is_finite() || buckets < i64::MIN as f64 || buckets >= i64::MAX as f64 {
                return Err(invalid());
            }
            (buckets as i64).checked_mul(step).ok_or_else(invalid)
        };

        Ok(Self {
            lower: snap(spot - spread as f64)?,
            upper: snap(spot + spread as f64)?,
            step,
        })
    }

    /// Membership in the stepped set, not a continuous range check.
    pub fn contains(&self, strike: i64) -> bool {
        strike >= self.lower && strike <= self.upper && (strike - self.lower).rem_euclid(self.step) == 0
    }

    pub fn strikes(&self) -> impl Iterator<Item = i64> + '_ {
        (self.lower..=self.upper).step_by(self.step as usize)
    }

    pub fn len(&self) -> usize {
        if self.upper < self.lower {
            0
        } else {
            ((self.upper - self.lower) / self.step) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calendar date for a forward day index.
pub fn calendar_date(base_date: NaiveDate, day_index: u32) -> NaiveDate {
    base_date + Days::new(day_index as u64)
}

/// `YYYYMMDD` key used to name the per-day table.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Exchange expiry code (`DDMMYY`) of contracts expiring a fixed offset after `date`.
pub fn expiry_code(date: NaiveDate) -> String {
    let expiry = date + Days::new(config::EXPIRY_OFFSET_DAYS as u64);
    expiry.format("%d%m%y").to_string()
}

/// Options selected for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySelection {
    pub date: NaiveDate,
    pub date_key: String,
    pub expiry_code: String,
    pub rows: Vec<OptionSelectionRow>,
}

impl DaySelection {
    pub fn symbols(&self) -> BTreeSet<String> {
        self.rows.iter().map(|row| row.symbol.clone()).collect()
    }
}

/// Select BTC call/put contracts expiring on the day's expiry code with a
/// strike inside `window`.
///
/// Filters run cheapest first; numeric coercion only happens for products
/// that already match underlying, contract type and expiry, and a malformed
/// strike or volume on such a product is an error.
pub fn select_for_day(
    products: &[Product],
    window: &StrikeWindow,
    base_date: NaiveDate,
    day_index: u32,
) -> Result<DaySelection> {
    let date = calendar_date(base_date, day_index);
    let expiry = expiry_code(date);

    let mut rows = Vec::new();
    for product in products {
        if product.underlying_asset.symbol != config::UNDERLYING_SYMBOL {
            continue;
        }
        let Some(option_type) = OptionType::from_contract_type(&product.contract_type) else {
            continue;
        };
        if !product.symbol.ends_with(&expiry) {
            continue;
        }
        let Some(raw_strike) = &product.strike_price else {
            continue;
        };
        let strike = raw_strike.as_i64("strike_price")?;
        if !window.contains(strike) {
            continue;
        }
        let volume = match &product.volume {
            Some(v) => v.as_f64("volume")?,
            None => 0.0,
        };

        rows.push(OptionSelectionRow {
            symbol: product.symbol.clone(),
            strike_price: strike,
            expiry: expiry.clone(),
            option_type,
            volume,
        });
    }

    Ok(DaySelection {
        date,
        date_key: date_key(date),
        expiry_code: expiry,
        rows,
    })
}
