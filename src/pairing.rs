//! Checks that an instance file and a truth file describe the same identifiers.

use crate::error::Result;
use crate::jsonl;
use crate::metrics::SamplingMetrics;
use crate::types::{IdOnly, Identified};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PairingReport {
    pub only_in_instances: BTreeSet<String>,
    pub only_in_truth: BTreeSet<String>,
}

impl PairingReport {
    pub fn is_consistent(&self) -> bool {
        self.only_in_instances.is_empty() && self.only_in_truth.is_empty()
    }

    pub fn mismatches(&self) -> usize {
        self.only_in_instances.len() + self.only_in_truth.len()
    }
}

fn read_ids(path: &Path) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    jsonl::for_each_record::<IdOnly, _>(path, |line| {
        ids.insert(line.record.id().to_string());
        Ok(())
    })?;
    Ok(ids)
}

pub fn check_pairing(instances: &Path, truth: &Path) -> Result<PairingReport> {
    let instance_ids = read_ids(instances)?;
    let truth_ids = read_ids(truth)?;
    Ok(PairingReport {
        only_in_instances: instance_ids.difference(&truth_ids).cloned().collect(),
        only_in_truth: truth_ids.difference(&instance_ids).cloned().collect(),
    })
}

/// Run [`check_pairing`] and log any divergence. Never fails the caller on a mismatch.
pub fn warn_on_divergence(instances: &Path, truth: &Path) -> Result<PairingReport> {
    let report = check_pairing(instances, truth)?;
    SamplingMetrics::record_pairing_mismatches(report.mismatches());
    if !report.only_in_instances.is_empty() {
        warn!(
            "{} identifiers in {} have no truth line",
            report.only_in_instances.len(),
            instances.display()
        );
    }
    if !report.only_in_truth.is_empty() {
        warn!(
            "{} identifiers in {} have no instance line",
            report.only_in_truth.len(),
            truth.display()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detects_divergence() {
        let dir = tempfile::tempdir().unwrap();
        let instances = dir.path().join("instances.jsonl");
        let truth = dir.path().join("truth.jsonl");
        fs::write(&instances, "{\"id\":\"1\"}\n{\"id\":\"2\"}\n").unwrap();
        fs::write(&truth, "{\"id\":\"2\"}\n{\"id\":\"3\"}\n").unwrap();

        let report = check_pairing(&instances, &truth).unwrap();
        assert!(!report.is_consistent());
        assert!(report.only_in_instances.contains("1"));
        assert!(report.only_in_truth.contains("3"));
        assert_eq!(report.mismatches(), 2);
    }

    #[test]
    fn test_consistent_files() {
        let dir = tempfile::tempdir().unwrap();
        let instances = dir.path().join("instances.jsonl");
        let truth = dir.path().join("truth.jsonl");
        fs::write(&instances, "{\"id\":\"1\"}\n").unwrap();
        fs::write(&truth, "{\"id\":\"1\",\"truthClass\":\"a\"}\n").unwrap();
        assert!(check_pairing(&instances, &truth).unwrap().is_consistent());
    }
}
