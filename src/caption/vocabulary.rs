use crate::constants::{END_WORD, START_WORD, UNKNOWN_WORD};
use crate::error::{DatasetError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Word list of the captioning model.
///
/// Loaded from a `word_counts.txt` file with one `<word> <count>` pair per
/// line; a word's id is its line index. Words may also appear as byte-string
/// literals (`b'dog'`), which are unwrapped.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, u32>,
    unk_id: u32,
}

impl Vocabulary {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DatasetError::file(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut words: Vec<String> = content
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(unwrap_literal)
            .collect();

        for required in [START_WORD, END_WORD] {
            if !words.iter().any(|w| w == required) {
                return Err(DatasetError::Config(format!(
                    "vocabulary is missing the '{}' marker",
                    required
                )));
            }
        }
        if !words.iter().any(|w| w == UNKNOWN_WORD) {
            words.push(UNKNOWN_WORD.to_string());
        }

        let ids: HashMap<String, u32> = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u32))
            .collect();
        let unk_id = ids.get(UNKNOWN_WORD).copied().unwrap_or_default();

        Ok(Self { words, ids, unk_id })
    }

    pub fn id_to_word(&self, id: u32) -> &str {
        self.words
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_WORD)
    }

    pub fn word_to_id(&self, word: &str) -> u32 {
        self.ids.get(word).copied().unwrap_or(self.unk_id)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn unwrap_literal(word: &str) -> String {
    word.strip_prefix("b'")
        .and_then(|w| w.strip_suffix('\''))
        .unwrap_or(word)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: &str = "a 969108\n</S> 586368\n<S> 586368\n. 440479\nb'dog' 1200\n";

    #[test]
    fn test_parse_assigns_line_ids_and_appends_unknown() {
        let vocab = Vocabulary::parse(WORDS).unwrap();
        assert_eq!(vocab.len(), 6);
        assert_eq!(vocab.id_to_word(0), "a");
        assert_eq!(vocab.id_to_word(4), "dog");
        assert_eq!(vocab.word_to_id("<S>"), 2);
        assert_eq!(vocab.word_to_id("zebra"), 5);
        assert_eq!(vocab.id_to_word(999), "<UNK>");
    }

    #[test]
    fn test_requires_markers() {
        assert!(Vocabulary::parse("a 1\n<S> 1\n").is_err());
    }
}
