//! Image captioning and caption-to-record joining.
//!
//! The pretrained model itself is an external collaborator behind
//! [`CaptionModel`]; this module owns decoding its output and joining the
//! resulting captions to dataset identifiers.

pub mod http_model;
pub mod joiner;
pub mod matcher;
pub mod vocabulary;

pub use http_model::HttpCaptionModel;
pub use joiner::{caption_images, CaptionMap, CaptionReport};
pub use matcher::{matches_image, media_segments, MatchStrategy};
pub use vocabulary::Vocabulary;

use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};

/// One candidate produced by beam search: token ids including the start and
/// end markers, with its log probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub sentence: Vec<u32>,
    pub logprob: f64,
}

/// A pretrained captioning model.
pub trait CaptionModel {
    /// Candidate captions for the raw bytes of one image, best first.
    fn beam_search(&self, image: &[u8]) -> Result<Vec<Caption>>;
}

/// Turns model output into text using the model's vocabulary
pub struct CaptionGenerator<M> {
    model: M,
    vocab: Vocabulary,
}

impl<M: CaptionModel> CaptionGenerator<M> {
    pub fn new(model: M, vocab: Vocabulary) -> Self {
        Self { model, vocab }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// The top-ranked caption for `image` as a space-joined sentence.
    pub fn caption(&self, image: &[u8]) -> Result<String> {
        let candidates = self.model.beam_search(image)?;
        let best = candidates.first().ok_or_else(|| DatasetError::Model {
            message: "model returned no caption candidates".to_string(),
        })?;
        Ok(self.decode(best))
    }

    /// Drop the start and end markers and join the remaining words.
    pub fn decode(&self, caption: &Caption) -> String {
        let tokens = &caption.sentence;
        let inner = if tokens.len() >= 2 {
            &tokens[1..tokens.len() - 1]
        } else {
            &[][..]
        };
        inner
            .iter()
            .map(|&id| self.vocab.id_to_word(id))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel(Vec<Caption>);

    impl CaptionModel for FixedModel {
        fn beam_search(&self, _image: &[u8]) -> Result<Vec<Caption>> {
            Ok(self.0.clone())
        }
    }

    fn vocab() -> Vocabulary {
        Vocabulary::parse("<S> 1\n</S> 1\na 1\ndog 1\nruns 1\n").unwrap()
    }

    #[test]
    fn test_takes_top_candidate() {
        let model = FixedModel(vec![
            Caption {
                sentence: vec![0, 2, 3, 4, 1],
                logprob: -1.0,
            },
            Caption {
                sentence: vec![0, 3, 1],
                logprob: -3.0,
            },
        ]);
        let generator = CaptionGenerator::new(model, vocab());
        assert_eq!(generator.caption(b"img").unwrap(), "a dog runs");
    }

    #[test]
    fn test_no_candidates_is_an_error() {
        let generator = CaptionGenerator::new(FixedModel(vec![]), vocab());
        assert!(matches!(
            generator.caption(b"img"),
            Err(DatasetError::Model { .. })
        ));
    }

    #[test]
    fn test_decode_short_sentences() {
        let generator = CaptionGenerator::new(FixedModel(vec![]), vocab());
        let caption = Caption {
            sentence: vec![0],
            logprob: 0.0,
        };
        assert_eq!(generator.decode(&caption), "");
    }
}
