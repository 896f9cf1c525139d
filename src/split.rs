//! Stratified train/test splitting of dataset identifiers.

use crate::error::{DatasetError, Result};
use crate::jsonl;
use crate::materialize::{self, DataFolder};
use crate::types::{EmptyMediaPolicy, SplitAssignment, TruthRecord};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Read `(id, truthClass)` pairs from a truth file, in file order.
pub fn read_truth_classes(path: &Path) -> Result<Vec<TruthRecord>> {
    let lines = jsonl::read_records::<TruthRecord>(path)?;
    Ok(lines.into_iter().map(|l| l.record).collect())
}

/// Truth records that take part in the split under `policy`.
///
/// With [`EmptyMediaPolicy::Exclude`] identifiers whose instance has no media
/// are removed; every other policy keeps the records as they are.
pub fn select_truths(
    truths: Vec<TruthRecord>,
    instances_path: &Path,
    policy: EmptyMediaPolicy,
) -> Result<Vec<TruthRecord>> {
    if !policy.filters_before_split() {
        return Ok(truths);
    }
    let without_media = materialize::ids_without_media(instances_path)?;
    let before = truths.len();
    let selected: Vec<TruthRecord> = truths
        .into_iter()
        .filter(|t| !without_media.contains(&t.id))
        .collect();
    info!(
        "Excluded {} identifiers without media from the split",
        before - selected.len()
    );
    Ok(selected)
}

/// Read the truth file of `data`, apply `policy` and draw the stratified split.
pub fn split_dataset(
    data: &DataFolder,
    test_fraction: f64,
    seed: u64,
    policy: EmptyMediaPolicy,
) -> Result<SplitAssignment> {
    let truths = read_truth_classes(&data.truth())?;
    let truths = select_truths(truths, &data.instances(), policy)?;
    stratified_split(&truths, test_fraction, seed)
}

/// Number of test items for `n` records, rounding up like the usual
/// `test_size` convention and always leaving both sides non-empty.
pub fn test_count(n: usize, test_fraction: f64) -> usize {
    // The epsilon keeps products such as 0.3 * 10 from rounding up to 4
    let raw = (test_fraction * n as f64 - 1e-9).ceil();
    let raw = if raw < 0.0 { 0 } else { raw as usize };
    raw.clamp(1, n.saturating_sub(1).max(1))
}

/// Split identifiers into train and test sets, preserving the class
/// proportions of `records` in both.
///
/// Classes are visited in name order and each class's identifiers are shuffled
/// with a ChaCha8 generator seeded by `seed`, so the same input and seed always
/// give the same partition.
pub fn stratified_split(
    records: &[TruthRecord],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitAssignment> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DatasetError::InvalidSplit(format!(
            "test fraction must be between 0 and 1, got {}",
            test_fraction
        )));
    }
    let n = records.len();
    if n < 2 {
        return Err(DatasetError::InvalidSplit(format!(
            "need at least two records to split, got {}",
            n
        )));
    }

    let mut seen = HashSet::with_capacity(n);
    let mut by_class: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in records {
        if !seen.insert(record.id.as_str()) {
            return Err(DatasetError::InvalidSplit(format!(
                "duplicate identifier '{}' in truth records",
                record.id
            )));
        }
        by_class
            .entry(record.truth_class.as_str())
            .or_default()
            .push(record.id.as_str());
    }

    let n_test = test_count(n, test_fraction);
    let quotas = class_quotas(&by_class, n, n_test);
    debug!(n, n_test, classes = by_class.len(), "Computed stratified quotas");

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut assignment = SplitAssignment::default();
    for (class, mut ids) in by_class {
        ids.shuffle(&mut rng);
        let quota = quotas.get(class).copied().unwrap_or(0);
        let (test, train) = ids.split_at(quota);
        assignment.test.extend(test.iter().map(|s| s.to_string()));
        assignment.train.extend(train.iter().map(|s| s.to_string()));
    }

    info!(
        train = assignment.train.len(),
        test = assignment.test.len(),
        seed,
        "Stratified split complete"
    );
    Ok(assignment)
}

/// Per-class test counts: the floor of each class's proportional share, with
/// leftover slots going to the largest remainders (ties broken by class name).
fn class_quotas<'a>(
    by_class: &BTreeMap<&'a str, Vec<&str>>,
    n: usize,
    n_test: usize,
) -> BTreeMap<&'a str, usize> {
    let mut quotas = BTreeMap::new();
    let mut remainders = Vec::with_capacity(by_class.len());
    let mut allotted = 0usize;

    for (class, ids) in by_class {
        let share = ids.len() * n_test;
        let floor = share / n;
        allotted += floor;
        quotas.insert(*class, floor);
        remainders.push((*class, share % n, ids.len()));
    }

    // Stable sort keeps name order among equal remainders
    remainders.sort_by(|a, b| b.1.cmp(&a.1));
    let mut leftover = n_test.saturating_sub(allotted);
    for (class, _, size) in remainders {
        if leftover == 0 {
            break;
        }
        if let Some(q) = quotas.get_mut(class) {
            if *q < size {
                *q += 1;
                leftover -= 1;
            }
        }
    }
    quotas
}

/// Record of how a split was produced, written alongside the outputs on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitManifest {
    pub generated_at: DateTime<Utc>,
    pub seed: u64,
    pub test_fraction: f64,
    pub empty_media: EmptyMediaPolicy,
    pub train_ids: Vec<String>,
    pub test_ids: Vec<String>,
}

impl SplitManifest {
    pub fn new(
        assignment: &SplitAssignment,
        seed: u64,
        test_fraction: f64,
        empty_media: EmptyMediaPolicy,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            seed,
            test_fraction,
            empty_media,
            train_ids: assignment.train.clone(),
            test_ids: assignment.test.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DatasetError::file(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| DatasetError::file(path, e))?;
        Ok(())
    }
}
