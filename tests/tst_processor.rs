use delta_options::models::{Product, RawNumber, UnderlyingAsset};
use delta_options::processor::{calendar_date, expiry_code};
use delta_options::{OptionType, StrikeWindow, select_for_day};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 25).unwrap()
    }

    fn btc_option(symbol: &str, contract_type: &str, strike: i64) -> Product {
        Product {
            symbol: symbol.to_string(),
            underlying_asset: UnderlyingAsset { symbol: "BTC".to_string() },
            contract_type: contract_type.to_string(),
            strike_price: Some(RawNumber::Text(strike.to_string())),
            volume: Some(RawNumber::Int(12)),
        }
    }

    /// Catalog with a call and a put for every 50 between 50000 and 90000,
    /// for each of the seven expiry codes of the base week.
    fn catalog() -> Vec<Product> {
        let mut products = Vec::new();
        for day in 0..7 {
            let code = expiry_code(calendar_date(base_date(), day));
            for strike in (50_000..=90_000).step_by(50) {
                products.push(btc_option(&format!("C-BTC-{}-{}", strike, code), "call_options", strike));
                products.push(btc_option(&format!("P-BTC-{}-{}", strike, code), "put_options", strike));
            }
        }
        products
    }

    #[test]
    fn test_window_bounds_are_step_multiples() {
        for spot in [0.0, 99.99, 12_345.67, 70_000.0, 70_050.0, 104_999.99, 250_001.5] {
            for step in [1, 50, 100, 500, 1000] {
                let w = StrikeWindow::around(spot, 15_000, step).unwrap();
                assert_eq!(w.lower.rem_euclid(step), 0, "lower for spot {spot} step {step}");
                assert_eq!(w.upper.rem_euclid(step), 0, "upper for spot {spot} step {step}");
                assert!(w.strikes().all(|s| s.rem_euclid(step) == 0));
            }
        }
    }

    #[test]
    fn test_window_scenario_floor_division() {
        let w = StrikeWindow::around(70_000.0, 15_000, 100).unwrap();
        assert_eq!(w.lower, 55_000);
        assert_eq!(w.upper, 85_000);

        let products = vec![
            btc_option("C-BTC-85000-280525", "call_options", 85_000),
            btc_option("C-BTC-85050-280525", "call_options", 85_050),
            btc_option("C-BTC-85100-280525", "call_options", 85_100),
        ];
        let day = select_for_day(&products, &w, base_date(), 0).unwrap();
        let strikes: Vec<i64> = day.rows.iter().map(|r| r.strike_price).collect();
        assert_eq!(strikes, vec![85_000]);
    }

    #[test]
    fn test_out_of_window_strikes_never_selected() {
        let w = StrikeWindow::around(70_000.0, 15_000, 100).unwrap();
        let products = catalog();
        for day_index in 0..7 {
            let day = select_for_day(&products, &w, base_date(), day_index).unwrap();
            assert!(!day.rows.is_empty());
            assert!(day.rows.iter().all(|r| w.contains(r.strike_price)));
            // Off-step strikes (…50) are excluded even inside the bounds.
            assert!(day.rows.iter().all(|r| r.strike_price % 100 == 0));
            // 301 strikes, call + put each.
            assert_eq!(day.rows.len(), 602);
        }
    }

    #[test]
    fn test_expiry_code_matches_day_index() {
        let w = StrikeWindow::around(70_000.0, 15_000, 100).unwrap();
        let products = catalog();
        for day_index in 0..7 {
            let day = select_for_day(&products, &w, base_date(), day_index).unwrap();
            let expected = (base_date() + chrono::Days::new(day_index as u64 + 3))
                .format("%d%m%y")
                .to_string();
            assert_eq!(day.expiry_code, expected);
            assert!(day.rows.iter().all(|r| r.expiry == expected && r.symbol.ends_with(&expected)));
        }
    }

    #[test]
    fn test_selection_is_pure() {
        let w = StrikeWindow::around(68_123.4, 15_000, 100).unwrap();
        let products = catalog();
        let first = select_for_day(&products, &w, base_date(), 3).unwrap();
        let second = select_for_day(&products, &w, base_date(), 3).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.symbols(), second.symbols());
    }

    #[test]
    fn test_call_selected_by_expiry_suffix() {
        let w = StrikeWindow::around(70_000.0, 15_000, 100).unwrap();
        let products = vec![btc_option("C-BTC-280525", "call_options", 70_000)];

        let day = select_for_day(&products, &w, base_date(), 0).unwrap();
        assert_eq!(day.date_key, "20250525");
        assert_eq!(day.expiry_code, "280525");
        assert_eq!(day.rows.len(), 1);
        assert_eq!(day.rows[0].symbol, "C-BTC-280525");
        assert_eq!(day.rows[0].option_type, OptionType::Call);
        assert_eq!(day.rows[0].volume, 12.0);
    }
}
