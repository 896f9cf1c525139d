//! Matching image file names against an instance's `postMedia` field.
//!
//! The field is rendered as a quoted list (`['media/photo_608.jpg']`) and cut
//! on `_` and `'`. For the usual one- and two-photo records that yields 4 and
//! 7 segments, with the photo file names at positions 2 and 5.

use crate::types::media_file_name;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Compare fixed segment positions: index 2 of 4 segments, index 2 or 5 of 7.
    #[default]
    Positional,
    /// Compare the text after the last `_` of every media entry's file name,
    /// or the whole file name. Works for any number of entries.
    Suffix,
}

/// Render `post_media` as a single-quoted list, e.g. `['a', 'b']`.
pub fn render_media_field(post_media: &[String]) -> String {
    let items: Vec<String> = post_media.iter().map(|m| format!("'{}'", m)).collect();
    format!("[{}]", items.join(", "))
}

/// Segments of the rendered media field, split on `_` and `'`.
pub fn media_segments(post_media: &[String]) -> Vec<String> {
    render_media_field(post_media)
        .split(['_', '\''])
        .map(str::to_string)
        .collect()
}

pub fn matches_image(post_media: &[String], file_name: &str, strategy: MatchStrategy) -> bool {
    match strategy {
        MatchStrategy::Positional => {
            let segments = media_segments(post_media);
            match segments.len() {
                4 => segments[2] == file_name,
                7 => segments[2] == file_name || segments[5] == file_name,
                _ => false,
            }
        }
        MatchStrategy::Suffix => post_media.iter().any(|entry| {
            let name = media_file_name(entry);
            let suffix = name.rsplit('_').next().unwrap_or(name);
            name == file_name || suffix == file_name
        }),
    }
}
