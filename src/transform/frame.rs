//! Grouping, joining and broadcasting over entity identifiers
//!
//! Subsidiary survey tables hold many rows per person or household. These
//! helpers fold them onto an [`EntityIndex`] with left-join semantics: rows
//! whose key is not in the index are counted and dropped, and index entries
//! without rows get zero.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::{FrsError, Result};

/// Ascending, unique identifiers of one entity with their positions
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    ids: Vec<i64>,
    positions: FxHashMap<i64, usize>,
}

impl EntityIndex {
    /// Build an index; identifiers must be unique
    pub fn new(ids: Vec<i64>) -> Result<Self> {
        let mut positions = FxHashMap::default();
        positions.reserve(ids.len());
        for (pos, &id) in ids.iter().enumerate() {
            if positions.insert(id, pos).is_some() {
                return Err(FrsError::Identifier(format!("Duplicate identifier {id}")));
            }
        }
        Ok(Self { ids, positions })
    }

    /// Identifiers in index order
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of an identifier
    #[must_use]
    pub fn position(&self, id: i64) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Positions of many identifiers; any absent identifier is an error
    pub fn positions_of(&self, keys: &[i64], what: &str) -> Result<Vec<usize>> {
        keys.iter()
            .map(|&key| {
                self.position(key).ok_or_else(|| {
                    FrsError::Identifier(format!("{what} {key} is not in the index"))
                })
            })
            .collect()
    }
}

/// Sum of values per index entry over the rows selected by `keep`
///
/// NaN values are skipped. Returns the sums and the number of selected rows
/// whose key was not in the index.
pub fn group_sum<F>(index: &EntityIndex, keys: &[i64], values: &[f64], keep: F) -> (Vec<f64>, usize)
where
    F: Fn(usize) -> bool,
{
    let mut sums = vec![0.0; index.len()];
    let mut orphans = 0;
    for (row, (&key, &value)) in keys.iter().zip(values).enumerate() {
        if !keep(row) {
            continue;
        }
        match index.position(key) {
            Some(pos) => {
                if !value.is_nan() {
                    sums[pos] += value;
                }
            }
            None => orphans += 1,
        }
    }
    (sums, orphans)
}

/// Sum of values per index entry and category, one column per category
///
/// Categories come out in ascending order. Each column is zero where the
/// entry has no rows of that category.
pub fn pivot_sum<K: Ord + Copy>(
    index: &EntityIndex,
    keys: &[i64],
    categories: &[K],
    values: &[f64],
) -> (BTreeMap<K, Vec<f64>>, usize) {
    let mut columns: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    let mut orphans = 0;
    for ((&key, &category), &value) in keys.iter().zip(categories).zip(values) {
        let Some(pos) = index.position(key) else {
            orphans += 1;
            continue;
        };
        let column = columns
            .entry(category)
            .or_insert_with(|| vec![0.0; index.len()]);
        if !value.is_nan() {
            column[pos] += value;
        }
    }
    (columns, orphans)
}

/// Look up a parent value for every child row
pub fn broadcast(
    parent: &EntityIndex,
    parent_values: &[f64],
    child_keys: &[i64],
    what: &str,
) -> Result<Vec<f64>> {
    Ok(parent
        .positions_of(child_keys, what)?
        .into_iter()
        .map(|pos| parent_values[pos])
        .collect())
}

/// Fail unless every key is present in the parent index
pub fn ensure_contained(parent: &EntityIndex, keys: &[i64], what: &str) -> Result<()> {
    match keys.iter().find(|&&key| parent.position(key).is_none()) {
        Some(key) => Err(FrsError::Identifier(format!(
            "{what} {key} has no matching record"
        ))),
        None => Ok(()),
    }
}

/// Sorted unique values
#[must_use]
pub fn unique_sorted(values: &[i64]) -> Vec<i64> {
    let mut unique = values.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
}

/// Quantile with linear interpolation between order statistics
///
/// NaN values are ignored; an empty input gives NaN.
#[must_use]
pub fn quantile_linear(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    sorted[lower] + (h - lower as f64) * (sorted[upper] - sorted[lower])
}

/// Multiply every value by a constant
#[must_use]
pub fn scale(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|v| v * factor).collect()
}

/// Log subsidiary rows that matched no index entry
pub fn log_orphans(table: &str, orphans: usize) {
    if orphans > 0 {
        log::warn!("{orphans} rows of {table} reference no known record and were ignored");
    }
}
