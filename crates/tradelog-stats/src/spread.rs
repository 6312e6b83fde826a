//! Spread policy for near-equal distribution values.
//!
//! Categories whose chart values lie within [`SPREAD_EPSILON`] of a
//! neighbour are drawn on top of each other. Each clustered entry is
//! shifted by
//!
//! ```text
//! (hash01(label) - 0.5) * SPREAD_WIDTH + bias * SPREAD_WIDTH / 2
//! bias = (buy - sell) / count
//! ```
//!
//! then rounded to 2 decimals and clamped to `[0, 100]`. The offset depends
//! only on the entry itself, so the same input always renders the same
//! chart. `share` keeps the exact value; only `display` moves.

use crate::statistics::DistributionEntry;
use sha2::{Digest, Sha256};

/// Neighbours closer than this (display points) form a cluster.
pub const SPREAD_EPSILON: f64 = 0.5;

/// Width of the offset band.
pub const SPREAD_WIDTH: f64 = 1.5;

/// Stable pseudo-random value in `[0, 1)` derived from `label`.
pub fn hash01(label: &str) -> f64 {
    let digest = Sha256::digest(label.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    // Top 53 bits fill the f64 mantissa exactly.
    (u64::from_be_bytes(head) >> 11) as f64 / (1u64 << 53) as f64
}

fn offset(entry: &DistributionEntry) -> f64 {
    let bias = if entry.count == 0 {
        0.0
    } else {
        (entry.buy as f64 - entry.sell as f64) / entry.count as f64
    };
    (hash01(&entry.label) - 0.5) * SPREAD_WIDTH + bias * SPREAD_WIDTH / 2.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Set `display` for every entry from its `share`.
pub fn apply_spread(entries: &mut [DistributionEntry]) {
    let raw: Vec<f64> = entries.iter().map(|e| e.share * 100.0).collect();

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        raw[b]
            .total_cmp(&raw[a])
            .then_with(|| entries[a].label.cmp(&entries[b].label))
    });

    let mut clustered = vec![false; entries.len()];
    for pair in order.windows(2) {
        if (raw[pair[0]] - raw[pair[1]]).abs() <= SPREAD_EPSILON {
            clustered[pair[0]] = true;
            clustered[pair[1]] = true;
        }
    }

    for (i, entry) in entries.iter_mut().enumerate() {
        let value = if clustered[i] {
            raw[i] + offset(entry)
        } else {
            raw[i]
        };
        entry.display = round2(value).clamp(0.0, 100.0);
    }
}
