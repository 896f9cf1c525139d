//! Writes a split to disk: instance and truth lines plus the media files they reference.

use crate::constants::{INSTANCES_FILE, MEDIA_DIR, TRUTH_FILE};
use crate::error::{DatasetError, Result};
use crate::jsonl;
use crate::metrics::SamplingMetrics;
use crate::types::{EmptyMediaPolicy, IdOnly, Identified, InstanceRecord, Split, SplitAssignment};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Media file names selected for each split, plus the identifiers left out
/// because their instance has no media.
#[derive(Debug, Clone, Default)]
pub struct MediaSelection {
    pub train: HashSet<String>,
    pub test: HashSet<String>,
    pub ignored: HashSet<String>,
}

/// Counts for one written split
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SplitCounts {
    pub instances: usize,
    pub truths: usize,
    pub images: usize,
    pub missing_images: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitReport {
    pub train: SplitCounts,
    pub test: SplitCounts,
    pub ignored: usize,
}

/// Identifiers of instance records whose `postMedia` is empty.
pub fn ids_without_media(instances_path: &Path) -> Result<HashSet<String>> {
    let mut ids = HashSet::new();
    jsonl::for_each_record::<InstanceRecord, _>(instances_path, |line| {
        if !line.record.has_media() {
            ids.insert(line.record.id);
        }
        Ok(())
    })?;
    Ok(ids)
}

/// Walk the instance file once and collect the media file names each split needs.
pub fn collect_media_names(
    instances_path: &Path,
    assignment: &SplitAssignment,
) -> Result<MediaSelection> {
    let train_ids = assignment.id_set(Split::Train);
    let test_ids = assignment.id_set(Split::Test);
    let mut selection = MediaSelection::default();

    jsonl::for_each_record::<InstanceRecord, _>(instances_path, |line| {
        let record = line.record;
        if !record.has_media() {
            selection.ignored.insert(record.id);
            return Ok(());
        }
        let target = if train_ids.contains(&record.id) {
            &mut selection.train
        } else if test_ids.contains(&record.id) {
            &mut selection.test
        } else {
            return Ok(());
        };
        target.extend(record.media_file_names().map(str::to_string));
        Ok(())
    })?;

    Ok(selection)
}

/// Copy lines of `input` whose id is in `ids` and not in `ignore` to `output`.
pub fn store_sampled_records(
    ids: &HashSet<String>,
    input: &Path,
    output: &Path,
    ignore: &HashSet<String>,
) -> Result<usize> {
    let written = jsonl::copy_matching_lines::<IdOnly, _>(input, output, |r| {
        ids.contains(r.id()) && !ignore.contains(r.id())
    })?;
    debug!("Wrote {} records to {}", written, output.display());
    Ok(written)
}

/// Regular files directly inside `dir`, sorted by path. Unreadable entries are errors.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| DatasetError::file(dir, e))? {
        let path = entry.map_err(|e| DatasetError::file(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy every file of `input_dir` whose name is in `names` into `output_dir`.
/// Existing files at the destination are overwritten. Returns the number copied.
pub fn store_sampled_images(
    names: &HashSet<String>,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<usize> {
    fs::create_dir_all(output_dir).map_err(|e| DatasetError::file(output_dir, e))?;

    let entries = list_files(input_dir)?;

    let bar = ProgressBar::new(entries.len() as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] Storing images: {wide_bar:.cyan} {human_pos}/{human_len}",
    ) {
        bar.set_style(style);
    }

    let mut copied = 0usize;
    for src in entries {
        bar.inc(1);
        let Some(name) = src.file_name().and_then(|n| n.to_str()) else {
            debug!("Skipping non UTF-8 file name {}", src.display());
            continue;
        };
        if !names.contains(name) {
            continue;
        }
        let dest = output_dir.join(name);
        fs::copy(&src, &dest).map_err(|e| DatasetError::file(&src, e))?;
        copied += 1;
    }
    bar.finish_and_clear();
    Ok(copied)
}

/// Layout of a data folder
#[derive(Debug, Clone)]
pub struct DataFolder {
    root: PathBuf,
}

impl DataFolder {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn instances(&self) -> PathBuf {
        self.root.join(INSTANCES_FILE)
    }

    pub fn truth(&self) -> PathBuf {
        self.root.join(TRUTH_FILE)
    }

    pub fn media(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    pub fn create(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| DatasetError::file(&self.root, e))
    }
}

/// Write both splits of `assignment` from `data` into `train_out` and `test_out`.
///
/// Identifiers without media are dropped from both output files unless the
/// policy is [`EmptyMediaPolicy::Keep`].
#[instrument(
    skip(assignment),
    fields(train = assignment.train.len(), test = assignment.test.len())
)]
pub fn split_and_store(
    data: &DataFolder,
    train_out: &DataFolder,
    test_out: &DataFolder,
    assignment: &SplitAssignment,
    policy: EmptyMediaPolicy,
) -> Result<SplitReport> {
    train_out.create()?;
    test_out.create()?;

    let selection = collect_media_names(&data.instances(), assignment)?;
    info!("Number of training images: {}", selection.train.len());
    info!("Number of testing images: {}", selection.test.len());

    let ignore = if policy.drops_from_output() {
        selection.ignored.clone()
    } else {
        HashSet::new()
    };

    let mut report = SplitReport {
        ignored: ignore.len(),
        ..Default::default()
    };

    for (split, out, names) in [
        (Split::Train, train_out, &selection.train),
        (Split::Test, test_out, &selection.test),
    ] {
        let ids = assignment.id_set(split);
        let images = store_sampled_images(names, &data.media(), &out.media())?;
        let counts = SplitCounts {
            instances: store_sampled_records(
                &ids,
                &data.instances(),
                &out.instances(),
                &ignore,
            )?,
            truths: store_sampled_records(&ids, &data.truth(), &out.truth(), &ignore)?,
            images,
            missing_images: names.len().saturating_sub(images),
        };
        if counts.missing_images > 0 {
            debug!(
                split = split.as_str(),
                "{} referenced images were not found in {}",
                counts.missing_images,
                data.media().display()
            );
        }
        SamplingMetrics::record_split_written(
            split,
            counts.instances,
            counts.images,
            counts.missing_images,
        );
        info!(
            split = split.as_str(),
            instances = counts.instances,
            truths = counts.truths,
            images = counts.images,
            "Stored split"
        );
        match split {
            Split::Train => report.train = counts,
            Split::Test => report.test = counts,
        }
    }

    SamplingMetrics::record_ignored(report.ignored);
    Ok(report)
}
