//! Summary statistics over a filtered record list.

use crate::spread::apply_spread;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tradelog_core::{Pnl, Side, TradeRecord};

/// Decimal places kept for the average P&L.
const AVERAGE_SCALE: u32 = 8;

/// One category of the emotion distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub label: String,
    /// Records carrying the tag.
    pub count: usize,
    /// Exact fraction of all tag occurrences.
    pub share: f64,
    /// Chart value on a 0-100 scale, after the spread policy.
    pub display: f64,
    pub buy: usize,
    pub sell: usize,
}

/// P&L summary of one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolTotal {
    pub symbol: String,
    pub count: usize,
    pub total_pnl: Pnl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub count: usize,
    pub total_pnl: Pnl,
    pub wins: usize,
    pub losses: usize,
    pub break_even: usize,
    /// `wins / count`, 0 when empty.
    pub win_rate: f64,
    pub average_pnl: Pnl,
    pub best: Option<Pnl>,
    pub worst: Option<Pnl>,
    pub buy_count: usize,
    pub sell_count: usize,
    /// Sorted by count descending, then label.
    pub emotions: Vec<DistributionEntry>,
    /// Sorted by symbol.
    pub symbols: Vec<SymbolTotal>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::from_records(std::iter::empty())
    }
}

#[derive(Default)]
struct Tally {
    count: usize,
    buy: usize,
    sell: usize,
}

impl Statistics {
    /// Aggregate `records` in a single pass.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        let mut count = 0usize;
        let mut total = Pnl::ZERO;
        let (mut wins, mut losses, mut break_even) = (0usize, 0usize, 0usize);
        let (mut buy_count, mut sell_count) = (0usize, 0usize);
        let mut best: Option<Pnl> = None;
        let mut worst: Option<Pnl> = None;
        let mut emotions: BTreeMap<String, Tally> = BTreeMap::new();
        let mut symbols: BTreeMap<String, (usize, Pnl)> = BTreeMap::new();

        for record in records {
            count += 1;
            total = total.saturating_add(record.pnl);
            if record.pnl.is_win() {
                wins += 1;
            } else if record.pnl.is_loss() {
                losses += 1;
            } else {
                break_even += 1;
            }
            match record.side {
                Side::Buy => buy_count += 1,
                Side::Sell => sell_count += 1,
            }
            best = Some(best.map_or(record.pnl, |b| b.max(record.pnl)));
            worst = Some(worst.map_or(record.pnl, |w| w.min(record.pnl)));

            let tags: BTreeSet<String> = record.normalized_emotions().collect();
            for tag in tags {
                let tally = emotions.entry(tag).or_default();
                tally.count += 1;
                match record.side {
                    Side::Buy => tally.buy += 1,
                    Side::Sell => tally.sell += 1,
                }
            }

            let symbol = symbols
                .entry(record.symbol.trim().to_uppercase())
                .or_insert((0, Pnl::ZERO));
            symbol.0 += 1;
            symbol.1 = symbol.1.saturating_add(record.pnl);
        }

        let win_rate = if count == 0 {
            0.0
        } else {
            wins as f64 / count as f64
        };
        let average_pnl = if count == 0 {
            Pnl::ZERO
        } else {
            Pnl::new((total.inner() / Decimal::from(count)).round_dp(AVERAGE_SCALE))
        };

        Self {
            count,
            total_pnl: total,
            wins,
            losses,
            break_even,
            win_rate,
            average_pnl,
            best,
            worst,
            buy_count,
            sell_count,
            emotions: distribution(emotions),
            symbols: symbols
                .into_iter()
                .map(|(symbol, (count, total_pnl))| SymbolTotal {
                    symbol,
                    count,
                    total_pnl,
                })
                .collect(),
        }
    }
}

fn distribution(tallies: BTreeMap<String, Tally>) -> Vec<DistributionEntry> {
    let occurrences: usize = tallies.values().map(|t| t.count).sum();
    let mut entries: Vec<DistributionEntry> = tallies
        .into_iter()
        .map(|(label, t)| {
            let share = if occurrences == 0 {
                0.0
            } else {
                t.count as f64 / occurrences as f64
            };
            DistributionEntry {
                label,
                count: t.count,
                share,
                display: share * 100.0,
                buy: t.buy,
                sell: t.sell,
            }
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    apply_spread(&mut entries);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tradelog_core::Market;

    fn trade(symbol: &str, side: Side, pnl: Decimal, emotions: &[&str]) -> TradeRecord {
        TradeRecord::new(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            symbol,
            Market::Crypto,
            side,
            Pnl::new(pnl),
        )
        .with_emotions(emotions.iter().copied())
    }

    #[test]
    fn test_empty() {
        let stats = Statistics::from_records(&Vec::<TradeRecord>::new());
        assert_eq!(stats.count, 0);
        assert_eq!(stats.total_pnl, Pnl::ZERO);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.average_pnl, Pnl::ZERO);
        assert!(stats.best.is_none());
        assert!(stats.emotions.is_empty());
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn test_total_saturates_at_decimal_bounds() {
        let records = vec![
            trade("BTC", Side::Buy, Decimal::MAX, &[]),
            trade("BTC", Side::Buy, Decimal::MAX, &[]),
            trade("ETH", Side::Sell, Decimal::MIN, &[]),
            trade("ETH", Side::Sell, Decimal::MIN, &[]),
        ];
        let stats = Statistics::from_records(&records[..2]);
        assert_eq!(stats.total_pnl, Pnl::new(Decimal::MAX));
        assert_eq!(stats.symbols[0].total_pnl, Pnl::new(Decimal::MAX));
        assert_eq!(stats.wins, 2);

        let stats = Statistics::from_records(&records[2..]);
        assert_eq!(stats.total_pnl, Pnl::new(Decimal::MIN));
        assert_eq!(stats.losses, 2);
    }

    #[test]
    fn test_totals_and_counts() {
        let records = vec![
            trade("btc", Side::Buy, dec!(100), &["Confident"]),
            trade("ETH", Side::Sell, dec!(-40), &["fear", "FEAR"]),
            trade("BTC", Side::Buy, dec!(0), &[]),
            trade("SOL", Side::Sell, dec!(25.5), &["fear", "greed"]),
        ];
        let stats = Statistics::from_records(&records);

        assert_eq!(stats.count, 4);
        assert_eq!(stats.total_pnl, Pnl::new(dec!(85.5)));
        assert_eq!((stats.wins, stats.losses, stats.break_even), (2, 1, 1));
        assert_eq!(stats.win_rate, 0.5);
        assert_eq!(stats.average_pnl, Pnl::new(dec!(21.375)));
        assert_eq!(stats.best, Some(Pnl::new(dec!(100))));
        assert_eq!(stats.worst, Some(Pnl::new(dec!(-40))));
        assert_eq!((stats.buy_count, stats.sell_count), (2, 2));

        let btc = &stats.symbols[0];
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.count, 2);
        assert_eq!(btc.total_pnl, Pnl::new(dec!(100)));
    }

    #[test]
    fn test_emotion_distribution_order_and_shares() {
        let records = vec![
            trade("BTC", Side::Buy, dec!(1), &["fear"]),
            trade("BTC", Side::Sell, dec!(1), &["fear", "greed"]),
            trade("BTC", Side::Sell, dec!(1), &["fear"]),
            trade("BTC", Side::Buy, dec!(1), &["calm"]),
        ];
        let stats = Statistics::from_records(&records);
        let labels: Vec<_> = stats.emotions.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["fear", "calm", "greed"]);

        let fear = &stats.emotions[0];
        assert_eq!((fear.count, fear.buy, fear.sell), (3, 1, 2));
        assert_eq!(fear.share, 0.6);
        let total_share: f64 = stats.emotions.iter().map(|e| e.share).sum();
        assert!((total_share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = Statistics::from_records(&[trade("BTC", Side::Buy, dec!(5), &["calm"])]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalPnl"], "5");
        assert_eq!(json["winRate"], 1.0);
        assert_eq!(json["emotions"][0]["label"], "calm");
    }
}
