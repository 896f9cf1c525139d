use crate::constants;
use crate::error::{DatasetError, Result};
use crate::types::EmptyMediaPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub captioning: CaptioningConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub empty_media: EmptyMediaPolicy,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            seed: constants::DEFAULT_SEED,
            test_fraction: constants::DEFAULT_TEST_FRACTION,
            empty_media: EmptyMediaPolicy::default(),
        }
    }
}

impl SamplingConfig {
    /// Replace configured values with the ones given on the command line.
    pub fn with_overrides(
        mut self,
        seed: Option<u64>,
        test_fraction: Option<f64>,
        empty_media: Option<EmptyMediaPolicy>,
    ) -> Result<Self> {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        if let Some(f) = test_fraction {
            if !(f > 0.0 && f < 1.0) {
                return Err(DatasetError::Config(format!(
                    "test fraction must be between 0 and 1, got {}",
                    f
                )));
            }
            self.test_fraction = f;
        }
        if let Some(policy) = empty_media {
            self.empty_media = policy;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptioningConfig {
    pub endpoint: String,
    pub checkpoint_path: PathBuf,
    pub vocab_file: PathBuf,
    pub timeout_seconds: u64,
}

impl Default for CaptioningConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_CAPTION_ENDPOINT.to_string(),
            checkpoint_path: PathBuf::from(constants::DEFAULT_CHECKPOINT_PATH),
            vocab_file: PathBuf::from(constants::DEFAULT_VOCAB_FILE),
            timeout_seconds: constants::DEFAULT_CAPTION_TIMEOUT_SECONDS,
        }
    }
}

impl CaptioningConfig {
    /// Replace configured values with the ones given on the command line.
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        checkpoint_path: Option<PathBuf>,
        vocab_file: Option<PathBuf>,
    ) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(checkpoint_path) = checkpoint_path {
            self.checkpoint_path = checkpoint_path;
        }
        if let Some(vocab_file) = vocab_file {
            self.vocab_file = vocab_file;
        }
        self
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `$DATASET_TOOLS_CONFIG` and then
    /// `config.toml` are tried, falling back to defaults when neither is present.
    /// `$CAPTION_ENDPOINT` overrides the file's endpoint.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidate = std::env::var(constants::CONFIG_PATH_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(constants::DEFAULT_CONFIG_FILE));
                if candidate.exists() {
                    Self::from_file(&candidate)?
                } else {
                    debug!("No config file at {}, using defaults", candidate.display());
                    Self::default()
                }
            }
        };

        if let Ok(endpoint) = std::env::var(constants::CAPTION_ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.captioning.endpoint = endpoint;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatasetError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let f = self.sampling.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(DatasetError::Config(format!(
                "sampling.test_fraction must be between 0 and 1, got {}",
                f
            )));
        }
        if self.captioning.timeout_seconds == 0 {
            return Err(DatasetError::Config(
                "captioning.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.sampling.seed, 42);
        assert!((config.sampling.test_fraction - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.sampling.empty_media, EmptyMediaPolicy::Exclude);
        assert_eq!(
            config.captioning.vocab_file,
            PathBuf::from("Pretrained-Show-and-Tell-model/word_counts.txt")
        );
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            [sampling]
            seed = 7
            empty_media = "keep"

            [captioning]
            endpoint = "http://model:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.sampling.seed, 7);
        assert_eq!(config.sampling.empty_media, EmptyMediaPolicy::Keep);
        assert!((config.sampling.test_fraction - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.captioning.endpoint, "http://model:9000");
        assert_eq!(config.captioning.timeout_seconds, 60);
    }

    #[test]
    fn test_rejects_bad_fraction() {
        let err = Config::from_toml("[sampling]\ntest_fraction = 1.5\n").unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let config = Config::from_toml(
            r#"
            [sampling]
            seed = 7
            empty_media = "keep"

            [captioning]
            endpoint = "http://model:9000"
            vocab_file = "vocab.txt"
            "#,
        )
        .unwrap();

        let sampling = config
            .sampling
            .clone()
            .with_overrides(Some(1), None, Some(EmptyMediaPolicy::DropAfterSplit))
            .unwrap();
        assert_eq!(sampling.seed, 1);
        assert!((sampling.test_fraction - 0.3).abs() < f64::EPSILON);
        assert_eq!(sampling.empty_media, EmptyMediaPolicy::DropAfterSplit);

        let unchanged = config.sampling.clone().with_overrides(None, None, None).unwrap();
        assert_eq!(unchanged.seed, 7);
        assert_eq!(unchanged.empty_media, EmptyMediaPolicy::Keep);

        let captioning = config.captioning.with_overrides(
            None,
            Some(PathBuf::from("other.ckpt")),
            None,
        );
        assert_eq!(captioning.endpoint, "http://model:9000");
        assert_eq!(captioning.checkpoint_path, PathBuf::from("other.ckpt"));
        assert_eq!(captioning.vocab_file, PathBuf::from("vocab.txt"));
    }

    #[test]
    fn test_rejects_bad_fraction_override() {
        let err = SamplingConfig::default()
            .with_overrides(None, Some(0.0), None)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
