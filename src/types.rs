use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// One line of `instances.jsonl`. Only the fields the tools look at are
/// modelled; lines are always re-emitted verbatim so nothing else is lost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceRecord {
    pub id: String,
    #[serde(rename = "postMedia", default, deserialize_with = "null_as_empty")]
    pub post_media: Vec<String>,
}

impl InstanceRecord {
    pub fn has_media(&self) -> bool {
        !self.post_media.is_empty()
    }

    /// File names referenced by `postMedia`, e.g. `media/photo_42.jpg` -> `photo_42.jpg`
    pub fn media_file_names(&self) -> impl Iterator<Item = &str> {
        self.post_media.iter().map(|m| media_file_name(m))
    }
}

/// One line of `truth.jsonl`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TruthRecord {
    pub id: String,
    #[serde(rename = "truthClass")]
    pub truth_class: String,
}

/// Anything keyed by the shared dataset identifier
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for InstanceRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for TruthRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Generic record used when only the identifier matters
#[derive(Debug, Clone, Deserialize)]
pub struct IdOnly {
    pub id: String,
}

impl Identified for IdOnly {
    fn id(&self) -> &str {
        &self.id
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Last `/`-separated segment of a media reference
pub fn media_file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

/// Partition of identifiers into train and test subsets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitAssignment {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

impl SplitAssignment {
    pub fn split_of(&self, id: &str) -> Option<Split> {
        if self.train.iter().any(|t| t == id) {
            Some(Split::Train)
        } else if self.test.iter().any(|t| t == id) {
            Some(Split::Test)
        } else {
            None
        }
    }

    pub fn ids(&self, split: Split) -> &[String] {
        match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
        }
    }

    pub fn id_set(&self, split: Split) -> HashSet<String> {
        self.ids(split).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.test.is_empty()
    }
}

/// What to do with identifiers whose instance record carries no media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyMediaPolicy {
    /// Drop them before splitting; they appear in neither instance nor truth output.
    #[default]
    Exclude,
    /// Split and write them like any other record; they contribute no images.
    Keep,
    /// Split over every identifier, then drop them from both output splits.
    /// Split sizes follow the full identifier count.
    DropAfterSplit,
}

impl EmptyMediaPolicy {
    /// Whether media-free identifiers are removed before the split is drawn.
    pub fn filters_before_split(self) -> bool {
        self == EmptyMediaPolicy::Exclude
    }

    /// Whether media-free identifiers are left out of the written splits.
    pub fn drops_from_output(self) -> bool {
        self != EmptyMediaPolicy::Keep
    }
}

/// How the image-backed filter treats `truth.jsonl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TruthPolicy {
    /// Only truth lines whose instance survived the filter.
    #[default]
    Paired,
    /// Every truth line, whether or not its instance has media.
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_record_parsing() {
        let rec: InstanceRecord = serde_json::from_str(
            r#"{"id":"608","postText":["hi"],"postMedia":["media/photo_608.jpg"]}"#,
        )
        .unwrap();
        assert_eq!(rec.id, "608");
        assert!(rec.has_media());
        assert_eq!(rec.media_file_names().collect::<Vec<_>>(), vec!["photo_608.jpg"]);

        let empty: InstanceRecord = serde_json::from_str(r#"{"id":"1","postMedia":[]}"#).unwrap();
        assert!(!empty.has_media());

        let null: InstanceRecord = serde_json::from_str(r#"{"id":"2","postMedia":null}"#).unwrap();
        assert!(!null.has_media());

        let missing: InstanceRecord = serde_json::from_str(r#"{"id":"3"}"#).unwrap();
        assert!(!missing.has_media());
    }

    #[test]
    fn test_media_file_name() {
        assert_eq!(media_file_name("media/photo_1.jpg"), "photo_1.jpg");
        assert_eq!(media_file_name("photo_1.jpg"), "photo_1.jpg");
        assert_eq!(media_file_name("a/b/c.png"), "c.png");
    }

    #[test]
    fn test_split_assignment_membership() {
        let assignment = SplitAssignment {
            train: vec!["a".into(), "b".into()],
            test: vec!["c".into()],
        };
        assert_eq!(assignment.split_of("a"), Some(Split::Train));
        assert_eq!(assignment.split_of("c"), Some(Split::Test));
        assert_eq!(assignment.split_of("z"), None);
        assert_eq!(assignment.len(), 3);
        assert!(assignment.id_set(Split::Test).contains("c"));
    }

    #[test]
    fn test_identified_reads_id_of_any_record() {
        let instance: InstanceRecord = serde_json::from_str("{\"id\":\"7\"}").unwrap();
        let truth: IdOnly = serde_json::from_str("{\"id\":\"7\",\"truthClass\":\"a\"}").unwrap();
        assert_eq!(instance.id(), truth.id());
    }

    #[test]
    fn test_policy_names() {
        let p: EmptyMediaPolicy = serde_json::from_str("\"keep\"").unwrap();
        assert_eq!(p, EmptyMediaPolicy::Keep);
        let p: EmptyMediaPolicy = serde_json::from_str("\"drop-after-split\"").unwrap();
        assert_eq!(p, EmptyMediaPolicy::DropAfterSplit);
        assert!(!p.filters_before_split());
        assert!(p.drops_from_output());
        assert!(EmptyMediaPolicy::Exclude.filters_before_split());
        assert!(!EmptyMediaPolicy::Keep.drops_from_output());
        let t: TruthPolicy = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(t, TruthPolicy::All);
    }
}
