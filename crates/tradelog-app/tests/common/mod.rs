//! Shared fixtures for application tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tradelog_app::AppConfig;
use tradelog_core::{Market, Pnl, Side, TradeRecord};

const SYMBOLS: [(&str, Market); 3] = [
    ("BTC", Market::Crypto),
    ("ETH", Market::Crypto),
    ("AAPL", Market::Stocks),
];

/// Twelve trades on consecutive days, cycling BTC, ETH and AAPL.
///
/// Even trades are buys; P&L runs from -50 up by 10; every third trade is
/// tagged `fear`, the rest `calm`.
pub fn journal() -> Vec<TradeRecord> {
    (0..12u32)
        .map(|i| {
            let (symbol, market) = SYMBOLS[(i % 3) as usize];
            TradeRecord::new(
                NaiveDate::from_ymd_opt(2024, 3, i + 1).unwrap(),
                symbol,
                market,
                if i % 2 == 0 { Side::Buy } else { Side::Sell },
                Pnl::new(Decimal::from(i64::from(i) * 10 - 50)),
            )
            .with_emotions([if i % 3 == 0 { "fear" } else { "calm" }])
        })
        .collect()
}

/// Default config with storage under `dir`.
pub fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.dir = dir.join("state").to_string_lossy().into_owned();
    config
}

pub fn write_json(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
