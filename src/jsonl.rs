//! Line-delimited JSON helpers.
//!
//! Records are parsed only to read their keys; anything written back out is the
//! original line, so record content passes through untouched.

use crate::error::{DatasetError, Result};
use crate::types::Identified;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A parsed record together with the exact line it came from
#[derive(Debug, Clone)]
pub struct JsonlLine<T> {
    /// 1-based line number in the source file
    pub line_number: usize,
    pub raw: String,
    pub record: T,
}

/// Visit every non-blank line of `path`, parsed as `T`.
pub fn for_each_record<T, F>(path: &Path, mut visit: F) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(JsonlLine<T>) -> Result<()>,
{
    let file = File::open(path).map_err(|e| DatasetError::file(path, e))?;
    let reader = BufReader::new(file);

    for (idx, line) in reader.lines().enumerate() {
        let raw = line.map_err(|e| DatasetError::file(path, e))?;
        if raw.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str::<T>(&raw).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            line: idx + 1,
            source,
        })?;
        visit(JsonlLine {
            line_number: idx + 1,
            raw,
            record,
        })?;
    }
    Ok(())
}

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<JsonlLine<T>>> {
    let mut out = Vec::new();
    for_each_record(path, |line| {
        out.push(line);
        Ok(())
    })?;
    Ok(out)
}

/// Copy the lines of `input` for which `keep` returns true into `output`,
/// replacing `output` if it already exists. Returns the number of lines written.
pub fn copy_matching_lines<T, F>(input: &Path, output: &Path, mut keep: F) -> Result<usize>
where
    T: DeserializeOwned + Identified,
    F: FnMut(&T) -> bool,
{
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| DatasetError::file(parent, e))?;
    }
    let file = File::create(output).map_err(|e| DatasetError::file(output, e))?;
    let mut writer = BufWriter::new(file);
    let mut written = 0usize;

    for_each_record::<T, _>(input, |line| {
        if keep(&line.record) {
            writeln!(writer, "{}", line.raw).map_err(|e| DatasetError::file(output, e))?;
            written += 1;
        }
        Ok(())
    })?;

    writer.flush().map_err(|e| DatasetError::file(output, e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IdOnly, InstanceRecord};

    #[test]
    fn test_reads_records_and_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instances.jsonl");
        fs::write(
            &path,
            "{\"id\":\"1\",\"postMedia\":[]}\n\n{\"id\":\"2\",\"postMedia\":[\"media/photo_2.jpg\"]}\n",
        )
        .unwrap();

        let lines: Vec<JsonlLine<InstanceRecord>> = read_records(&path).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_number, 1);
        assert_eq!(lines[1].line_number, 3);
        assert_eq!(lines[1].record.id, "2");
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truth.jsonl");
        fs::write(&path, "{\"id\":\"1\"}\n{not json\n").unwrap();

        let err = read_records::<IdOnly>(&path).unwrap_err();
        match err {
            DatasetError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_copy_matching_lines_keeps_raw_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.jsonl");
        let output = dir.path().join("out/out.jsonl");
        fs::write(
            &input,
            "{\"id\": \"a\",  \"extra\": 1}\n{\"id\":\"b\"}\n{\"id\":\"c\"}\n",
        )
        .unwrap();

        let written = copy_matching_lines::<IdOnly, _>(&input, &output, |r| r.id != "b").unwrap();
        assert_eq!(written, 2);
        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(text, "{\"id\": \"a\",  \"extra\": 1}\n{\"id\":\"c\"}\n");
    }
}
