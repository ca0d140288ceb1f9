use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DeltaError;

/// Numeric field that the exchange sends either as a JSON number or as a
/// numeric string (`"85000"`). Converted only when a value is actually needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    /// Finite float view. `NaN` and infinities are rejected even when sent as text.
    pub fn as_f64(&self, field: &'static str) -> Result<f64, DeltaError> {
        let invalid = || DeltaError::InvalidNumber {
            field,
            value: self.to_string(),
        };
        let value = match self {
            RawNumber::Int(v) => *v as f64,
            RawNumber::Float(v) => *v,
            RawNumber::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        };
        if value.is_finite() { Ok(value) } else { Err(invalid()) }
    }

    /// Integer view. Floats truncate toward zero; strings must be integral.
    pub fn as_i64(&self, field: &'static str) -> Result<i64, DeltaError> {
        match self {
            RawNumber::Int(v) => Ok(*v),
            RawNumber::Float(v) if v.is_finite() => Ok(v.trunc() as i64),
            RawNumber::Float(v) => Err(DeltaError::InvalidNumber {
                field,
                value: v.to_string(),
            }),
            RawNumber::Text(s) => s.trim().parse::<i64>().map_err(|_| DeltaError::InvalidNumber {
                field,
                value: s.clone(),
            }),
        }
    }
}

impl fmt::Display for RawNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RawNumber::Int(v) => write!(f, "{}", v),
            RawNumber::Float(v) => write!(f, "{}", v),
            RawNumber::Text(s) => f.write_str(s),
        }
    }
}

// -----------------------------------------------
// API ENVELOPES
// -----------------------------------------------

/// `{ "result": [...] }` wrapper used by the listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    pub result: Vec<T>,
}

/// History endpoint response. Both fields may be missing on failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandleResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub result: Option<Vec<Candle>>,
}

impl CandleResponse {
    /// Candles to persist, or `None` when the response should be skipped.
    pub fn usable_candles(&self) -> Option<&[Candle]> {
        if !self.success {
            return None;
        }
        match self.result.as_deref() {
            Some(candles) if !candles.is_empty() => Some(candles),
            _ => None,
        }
    }
}

// -----------------------------------------------
// TICKERS AND PRODUCTS
// -----------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    pub symbol: String,

    #[serde(default)]
    pub spot_price: Option<RawNumber>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingAsset {
    pub symbol: String,
}

/// Entry of the product catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub symbol: String,

    pub underlying_asset: UnderlyingAsset,

    pub contract_type: String,

    #[serde(default)]
    pub strike_price: Option<RawNumber>,

    #[serde(default)]
    pub volume: Option<RawNumber>,
}

/// Historical OHLCV bucket; `time` is Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: RawNumber,
    pub high: RawNumber,
    pub low: RawNumber,
    pub close: RawNumber,

    #[serde(default)]
    pub volume: Option<RawNumber>,
}

// -----------------------------------------------
// DERIVED ROWS
// -----------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn from_contract_type(contract_type: &str) -> Option<Self> {
        match contract_type {
            crate::config::CALL_CONTRACT_TYPE => Some(OptionType::Call),
            crate::config::PUT_CONTRACT_TYPE => Some(OptionType::Put),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selected option contract for a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSelectionRow {
    pub symbol: String,
    pub strike_price: i64,
    pub expiry: String,
    pub option_type: OptionType,
    pub volume: f64,
}

/// Row of the candle CSV; field order is the column order. Prices are
/// written exactly as the exchange sent them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleRow {
    pub symbol: String,
    pub time: String,
    pub open: RawNumber,
    pub high: RawNumber,
    pub low: RawNumber,
    pub close: RawNumber,
    pub volume: Option<RawNumber>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_number_accepts_numbers_and_strings() {
        let values: Vec<RawNumber> = serde_json::from_str(r#"[85000, 85000.7, "85000", " 12.5 "]"#).unwrap();
        assert_eq!(values[0].as_i64("strike_price").unwrap(), 85000);
        assert_eq!(values[1].as_i64("strike_price").unwrap(), 85000);
        assert_eq!(values[2].as_i64("strike_price").unwrap(), 85000);
        assert_eq!(values[3].as_f64("volume").unwrap(), 12.5);
    }

    #[test]
    fn test_raw_number_rejects_garbage() {
        let v = RawNumber::Text("abc".to_string());
        assert!(matches!(
            v.as_f64("spot_price"),
            Err(DeltaError::InvalidNumber { field: "spot_price", .. })
        ));
        assert!(RawNumber::Text("85000.5".to_string()).as_i64("strike_price").is_err());
    }

    #[test]
    fn test_raw_number_rejects_non_finite() {
        for text in ["NaN", "nan", "inf", "-inf", "infinity", " Infinity "] {
            let v = RawNumber::Text(text.to_string());
            assert!(
                matches!(v.as_f64("spot_price"), Err(DeltaError::InvalidNumber { field: "spot_price", .. })),
                "{text:?} should be rejected"
            );
        }
        assert!(RawNumber::Float(f64::INFINITY).as_f64("open").is_err());
        assert!(RawNumber::Float(f64::NAN).as_i64("strike_price").is_err());
    }

    #[test]
    fn test_product_deserializes_with_missing_optionals() {
        let json = r#"{
            "symbol": "BTCUSD",
            "underlying_asset": {"symbol": "BTC"},
            "contract_type": "perpetual_futures",
            "strike_price": null
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert!(product.strike_price.is_none());
        assert!(product.volume.is_none());
    }

    #[test]
    fn test_candle_response_usable_candles() {
        let ok: CandleResponse = serde_json::from_str(
            r#"{"success": true, "result": [{"time": 1748131200, "open": 1, "high": 2, "low": 0.5, "close": "1.5", "volume": 10}]}"#,
        )
        .unwrap();
        assert_eq!(ok.usable_candles().map(|c| c.len()), Some(1));

        let empty: CandleResponse = serde_json::from_str(r#"{"success": true, "result": []}"#).unwrap();
        assert!(empty.usable_candles().is_none());

        let failed: CandleResponse =
            serde_json::from_str(r#"{"success": false, "error": {"code": "invalid_contract"}}"#).unwrap();
        assert!(failed.usable_candles().is_none());
    }

    #[test]
    fn test_option_type_mapping() {
        assert_eq!(OptionType::from_contract_type("call_options"), Some(OptionType::Call));
        assert_eq!(OptionType::from_contract_type("put_options"), Some(OptionType::Put));
        assert_eq!(OptionType::from_contract_type("futures"), None);
        assert_eq!(OptionType::Put.to_string(), "put");
    }
}
