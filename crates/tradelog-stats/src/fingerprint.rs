//! Cache keys for aggregated views.
//!
//! The digest covers a framed, canonical encoding of the criteria and sort.
//! Record-set identity is kept next to the digest rather than folded into
//! it, so every entry of one set (or one version) can be found and purged.

use crate::record_set::{RecordSet, RecordSetId};
use sha2::{Digest, Sha256};
use std::fmt;
use tradelog_core::params::{
    DATE_FORMAT, EMOTIONS, FROM, MARKETS, PNL_MAX, PNL_MIN, SIDE, SORT, STRATEGY, SYMBOLS, TO,
};
use tradelog_core::{FilterCriteria, SortSpec};

const DOMAIN_TAG: &[u8] = b"tradelog.view.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub set_id: RecordSetId,
    pub version: u64,
    digest: [u8; 32],
}

impl Fingerprint {
    pub fn new(set: &RecordSet, criteria: &FilterCriteria, sort: &SortSpec) -> Self {
        Self {
            set_id: set.id(),
            version: set.version(),
            digest: digest(criteria, sort),
        }
    }

    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Full digest in lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.set_id, self.version, &self.to_hex()[..12])
    }
}

fn digest(criteria: &FilterCriteria, sort: &SortSpec) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);

    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.format(DATE_FORMAT).to_string());
    write_field(&mut hasher, FROM, date(criteria.date_from()).as_deref());
    write_field(&mut hasher, TO, date(criteria.date_to()).as_deref());
    write_list(&mut hasher, SYMBOLS, criteria.symbols().iter().map(String::as_str));
    write_list(&mut hasher, MARKETS, criteria.markets().iter().map(|m| m.as_str()));
    write_list(&mut hasher, SIDE, criteria.sides().iter().map(|s| s.as_str()));
    write_list(&mut hasher, EMOTIONS, criteria.emotions().iter().map(String::as_str));
    write_field(&mut hasher, STRATEGY, criteria.strategy());
    // Canonical form so 10.50 and 10.5 share an entry.
    write_field(&mut hasher, PNL_MIN, criteria.pnl_min().map(|p| p.canonical()).as_deref());
    write_field(&mut hasher, PNL_MAX, criteria.pnl_max().map(|p| p.canonical()).as_deref());
    write_field(&mut hasher, SORT, Some(sort.encode().as_str()));

    hasher.finalize().into()
}

fn write_framed(hasher: &mut Sha256, bytes: &[u8]) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
    hasher.update(bytes);
}

fn write_field(hasher: &mut Sha256, name: &str, value: Option<&str>) {
    write_framed(hasher, name.as_bytes());
    match value {
        Some(v) => {
            hasher.update([1u8]);
            write_framed(hasher, v.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

fn write_list<'a>(hasher: &mut Sha256, name: &str, items: impl ExactSizeIterator<Item = &'a str>) {
    write_framed(hasher, name.as_bytes());
    let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
    hasher.update(count.to_be_bytes());
    for item in items {
        write_framed(hasher, item.as_bytes());
    }
}
