use super::{matches_image, CaptionGenerator, CaptionModel, MatchStrategy};
use crate::error::{DatasetError, Result};
use crate::jsonl;
use crate::materialize;
use crate::metrics::CaptionMetrics;
use crate::types::InstanceRecord;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Identifier -> caption
pub type CaptionMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CaptionReport {
    pub images: usize,
    /// Images skipped because their file name is not valid UTF-8
    pub skipped: usize,
    pub captioned: usize,
    pub failed: usize,
    pub matched_records: usize,
    pub overwritten: usize,
    pub captions_written: usize,
}

/// Regular files in `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    materialize::list_files(dir)
}

/// Assign `caption` to every record whose media matches `file_name`.
/// Returns `(matched, overwritten)`.
pub fn join_caption(
    map: &mut CaptionMap,
    records: &[InstanceRecord],
    file_name: &str,
    caption: &str,
    strategy: MatchStrategy,
) -> (usize, usize) {
    let mut matched = 0;
    let mut overwritten = 0;
    for record in records {
        if !matches_image(&record.post_media, file_name, strategy) {
            continue;
        }
        matched += 1;
        if let Some(previous) = map.insert(record.id.clone(), caption.to_string()) {
            overwritten += 1;
            warn!(
                id = %record.id,
                image = file_name,
                "Replacing caption '{}' with a later match",
                previous
            );
        }
    }
    (matched, overwritten)
}

pub fn write_caption_map(path: &Path, map: &CaptionMap) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::file(parent, e))?;
    }
    let json = serde_json::to_string_pretty(map)?;
    fs::write(path, json).map_err(|e| DatasetError::file(path, e))
}

/// Caption every image in `images_dir` and join the captions to the records of
/// `instances_path`, writing the identifier -> caption map to `output_path` once
/// all images are done.
///
/// Images are processed in file name order, so when two images match the same
/// record the later name wins. A failed model call is logged and skipped.
#[instrument(skip(generator))]
pub fn caption_images<M: CaptionModel>(
    images_dir: &Path,
    instances_path: &Path,
    output_path: &Path,
    generator: &CaptionGenerator<M>,
    strategy: MatchStrategy,
) -> Result<CaptionReport> {
    let records: Vec<InstanceRecord> = jsonl::read_records::<InstanceRecord>(instances_path)?
        .into_iter()
        .map(|line| line.record)
        .collect();
    let images = list_images(images_dir)?;
    info!("Captioning {} images against {} records", images.len(), records.len());

    let mut map = CaptionMap::new();
    let mut report = CaptionReport {
        images: images.len(),
        ..Default::default()
    };

    for path in &images {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping image with non UTF-8 name: {}", path.display());
            report.skipped += 1;
            continue;
        };
        let bytes = fs::read(path).map_err(|e| DatasetError::file(path, e))?;

        let started = Instant::now();
        let caption = match generator.caption(&bytes) {
            Ok(caption) => caption,
            Err(e) => {
                error!(image = file_name, "Captioning failed: {}", e);
                CaptionMetrics::record_failure();
                report.failed += 1;
                continue;
            }
        };
        CaptionMetrics::record_captioned(started.elapsed().as_secs_f64());
        report.captioned += 1;
        info!(image = file_name, "{}", caption);

        let (matched, overwritten) =
            join_caption(&mut map, &records, file_name, &caption, strategy);
        CaptionMetrics::record_matches(matched);
        for _ in 0..overwritten {
            CaptionMetrics::record_overwrite();
        }
        report.matched_records += matched;
        report.overwritten += overwritten;
    }

    write_caption_map(output_path, &map)?;
    report.captions_written = map.len();
    info!(
        "Wrote {} captions to {}",
        report.captions_written,
        output_path.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, media: &[&str]) -> InstanceRecord {
        InstanceRecord {
            id: id.to_string(),
            post_media: media.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_join_caption_overwrites_later_match() {
        let records = vec![
            record("a", &["media/photo_1.jpg", "media/photo_2.jpg"]),
            record("b", &["media/photo_2.jpg"]),
            record("c", &[]),
        ];
        let mut map = CaptionMap::new();

        let strategy = MatchStrategy::Positional;
        let (m1, o1) = join_caption(&mut map, &records, "1.jpg", "first", strategy);
        assert_eq!((m1, o1), (1, 0));

        let (m2, o2) = join_caption(&mut map, &records, "2.jpg", "second", strategy);
        assert_eq!((m2, o2), (2, 1));

        assert_eq!(map.get("a").map(String::as_str), Some("second"));
        assert_eq!(map.get("b").map(String::as_str), Some("second"));
        assert!(!map.contains_key("c"));
    }

    #[test]
    fn test_write_caption_map_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/captions.json");
        let mut map = CaptionMap::new();
        map.insert("1".into(), "a dog".into());
        write_caption_map(&out, &map).unwrap();

        let back: CaptionMap = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_list_images_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.jpg", "c.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("subdir")).unwrap();
        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }
}
