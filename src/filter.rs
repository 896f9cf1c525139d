//! Restricts a dataset to instances that carry media, for captioning.

use crate::error::Result;
use crate::jsonl;
use crate::materialize::{self, DataFolder};
use crate::metrics::SamplingMetrics;
use crate::types::{IdOnly, Identified, InstanceRecord, TruthPolicy};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default)]
pub struct FilterOptions {
    pub truth: TruthPolicy,
    pub copy_media: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct FilterReport {
    pub kept: usize,
    pub dropped: usize,
    pub truths: usize,
    pub images: usize,
}

/// Write the instances of `data` that have a non-empty `postMedia` into `output`.
#[instrument(skip(options))]
pub fn filter_instances_on_images(
    data: &DataFolder,
    output: &DataFolder,
    options: FilterOptions,
) -> Result<FilterReport> {
    output.create()?;

    let mut kept_ids = HashSet::new();
    let mut media_names = HashSet::new();
    let mut dropped = 0usize;
    let kept = jsonl::copy_matching_lines::<InstanceRecord, _>(
        &data.instances(),
        &output.instances(),
        |record| {
            if record.has_media() {
                kept_ids.insert(record.id.clone());
                media_names.extend(record.media_file_names().map(str::to_string));
                true
            } else {
                dropped += 1;
                false
            }
        },
    )?;

    let truths = match options.truth {
        TruthPolicy::Paired => jsonl::copy_matching_lines::<IdOnly, _>(
            &data.truth(),
            &output.truth(),
            |record| kept_ids.contains(record.id()),
        )?,
        TruthPolicy::All => {
            jsonl::copy_matching_lines::<IdOnly, _>(&data.truth(), &output.truth(), |_| true)?
        }
    };

    let images = if options.copy_media {
        materialize::store_sampled_images(&media_names, &data.media(), &output.media())?
    } else {
        0
    };

    SamplingMetrics::record_filtered(kept, dropped);
    info!(kept, dropped, truths, images, "Filtered instances on images");

    Ok(FilterReport {
        kept,
        dropped,
        truths,
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dataset(root: &std::path::Path) -> DataFolder {
        let data = DataFolder::new(root);
        fs::create_dir_all(data.media()).unwrap();
        fs::write(
            data.instances(),
            concat!(
                "{\"id\":\"1\",\"postMedia\":[\"media/photo_1.jpg\"]}\n",
                "{\"id\":\"2\",\"postMedia\":[]}\n",
                "{\"id\":\"3\",\"postMedia\":null}\n",
            ),
        )
        .unwrap();
        fs::write(
            data.truth(),
            concat!(
                "{\"id\":\"1\",\"truthClass\":\"a\"}\n",
                "{\"id\":\"2\",\"truthClass\":\"b\"}\n",
                "{\"id\":\"3\",\"truthClass\":\"b\"}\n",
            ),
        )
        .unwrap();
        fs::write(data.media().join("photo_1.jpg"), b"jpg").unwrap();
        data
    }

    #[test]
    fn test_drops_records_without_media() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset(&dir.path().join("data"));
        let out = DataFolder::new(dir.path().join("out"));

        let report = filter_instances_on_images(&data, &out, FilterOptions::default()).unwrap();
        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped, 2);
        assert_eq!(report.truths, 1);
        assert_eq!(report.images, 0);

        for line in fs::read_to_string(out.instances()).unwrap().lines() {
            let rec: InstanceRecord = serde_json::from_str(line).unwrap();
            assert!(rec.has_media());
        }
    }

    #[test]
    fn test_all_truth_policy_and_media_copy() {
        let dir = tempfile::tempdir().unwrap();
        let data = dataset(&dir.path().join("data"));
        let out = DataFolder::new(dir.path().join("out"));

        let options = FilterOptions {
            truth: TruthPolicy::All,
            copy_media: true,
        };
        let report = filter_instances_on_images(&data, &out, options).unwrap();
        assert_eq!(report.truths, 3);
        assert_eq!(report.images, 1);
        assert!(out.media().join("photo_1.jpg").exists());
    }
}
