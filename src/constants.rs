/// File and folder names shared by every tool in the pipeline.
/// A data folder always looks like `instances.jsonl`, `truth.jsonl` and a `media/` directory.
pub const INSTANCES_FILE: &str = "instances.jsonl";
pub const TRUTH_FILE: &str = "truth.jsonl";
pub const MEDIA_DIR: &str = "media";

// Sampling defaults
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

// Pretrained Show-and-Tell model layout
pub const DEFAULT_CHECKPOINT_PATH: &str = "Pretrained-Show-and-Tell-model/model.ckpt-2000000";
pub const DEFAULT_VOCAB_FILE: &str = "Pretrained-Show-and-Tell-model/word_counts.txt";
pub const DEFAULT_CAPTION_ENDPOINT: &str = "http://127.0.0.1:8501";
pub const DEFAULT_CAPTION_TIMEOUT_SECONDS: u64 = 60;

// Vocabulary markers used by the captioning model
pub const START_WORD: &str = "<S>";
pub const END_WORD: &str = "</S>";
pub const UNKNOWN_WORD: &str = "<UNK>";

// Environment variables
pub const CONFIG_PATH_ENV: &str = "DATASET_TOOLS_CONFIG";
pub const CAPTION_ENDPOINT_ENV: &str = "CAPTION_ENDPOINT";
pub const PUSHGATEWAY_URL_ENV: &str = "DATASET_TOOLS_PUSHGATEWAY_URL";

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
