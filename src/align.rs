//! Key-based row alignment between the two samples of one job
//!
//! Each side is grouped by its extracted row key; the groups are then
//! partitioned into matched pairs, origin-only rows, destination-only rows,
//! and duplicate keys. A repeated key is never silently collapsed - the
//! duplication is itself a discrepancy signal.

use crate::value::{Row, RowKey};
use indexmap::IndexMap;

/// One aligned key and its rows.
#[derive(Debug, Clone)]
pub enum AlignedPair {
    Matched {
        key: RowKey,
        origin: Row,
        dest: Row,
    },
    OriginOnly {
        key: RowKey,
        origin: Row,
    },
    DestOnly {
        key: RowKey,
        dest: Row,
    },
    DuplicateKey {
        key: RowKey,
        origin_count: usize,
        dest_count: usize,
    },
}

impl AlignedPair {
    pub fn key(&self) -> &RowKey {
        match self {
            AlignedPair::Matched { key, .. }
            | AlignedPair::OriginOnly { key, .. }
            | AlignedPair::DestOnly { key, .. }
            | AlignedPair::DuplicateKey { key, .. } => key,
        }
    }
}

/// Alignment result: one entry per distinct key, ordered by first encounter
/// in the origin sample, then destination-only keys in destination order.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    pub pairs: Vec<AlignedPair>,
}

impl Alignment {
    pub fn matched_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p, AlignedPair::Matched { .. }))
            .count()
    }

    pub fn origin_only_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p, AlignedPair::OriginOnly { .. }))
            .count()
    }

    pub fn dest_only_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p, AlignedPair::DestOnly { .. }))
            .count()
    }

    pub fn duplicate_key_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| matches!(p, AlignedPair::DuplicateKey { .. }))
            .count()
    }
}

/// Matches rows between two samples by their declared key columns.
pub struct Aligner;

impl Aligner {
    pub fn align(origin: &[Row], dest: &[Row], key_columns: &[String]) -> Alignment {
        let origin_by_key = Self::group_by_key(origin, key_columns);
        let dest_by_key = Self::group_by_key(dest, key_columns);

        let mut pairs = Vec::with_capacity(origin_by_key.len() + dest_by_key.len());

        for (key, origin_rows) in &origin_by_key {
            match dest_by_key.get(key) {
                Some(dest_rows) => {
                    if origin_rows.len() > 1 || dest_rows.len() > 1 {
                        log::warn!(
                            "duplicate key {} ({} in origin, {} in destination)",
                            key,
                            origin_rows.len(),
                            dest_rows.len()
                        );
                        pairs.push(AlignedPair::DuplicateKey {
                            key: key.clone(),
                            origin_count: origin_rows.len(),
                            dest_count: dest_rows.len(),
                        });
                    } else {
                        pairs.push(AlignedPair::Matched {
                            key: key.clone(),
                            origin: origin_rows[0].clone(),
                            dest: dest_rows[0].clone(),
                        });
                    }
                }
                None => {
                    if origin_rows.len() > 1 {
                        log::warn!(
                            "duplicate key {} ({} in origin, absent in destination)",
                            key,
                            origin_rows.len()
                        );
                        pairs.push(AlignedPair::DuplicateKey {
                            key: key.clone(),
                            origin_count: origin_rows.len(),
                            dest_count: 0,
                        });
                    } else {
                        pairs.push(AlignedPair::OriginOnly {
                            key: key.clone(),
                            origin: origin_rows[0].clone(),
                        });
                    }
                }
            }
        }

        for (key, dest_rows) in &dest_by_key {
            if origin_by_key.contains_key(key) {
                continue;
            }
            if dest_rows.len() > 1 {
                log::warn!(
                    "duplicate key {} (absent in origin, {} in destination)",
                    key,
                    dest_rows.len()
                );
                pairs.push(AlignedPair::DuplicateKey {
                    key: key.clone(),
                    origin_count: 0,
                    dest_count: dest_rows.len(),
                });
            } else {
                pairs.push(AlignedPair::DestOnly {
                    key: key.clone(),
                    dest: dest_rows[0].clone(),
                });
            }
        }

        Alignment { pairs }
    }

    /// Group rows by key, preserving first-encounter order.
    fn group_by_key(rows: &[Row], key_columns: &[String]) -> IndexMap<RowKey, Vec<Row>> {
        let mut grouped: IndexMap<RowKey, Vec<Row>> = IndexMap::new();
        for row in rows {
            let key = RowKey::extract(row, key_columns);
            grouped.entry(key).or_default().push(row.clone());
        }
        grouped
    }
}
