use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub slots: SlotsConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub bucket: BucketConfig,
    #[serde(default)]
    pub photos: PhotosConfig,
}

impl Config {
    // Matches the paths in the starter config, so `init` can create them
    // before a config file exists.
    pub fn minimal() -> Self {
        Config {
            paths: PathsConfig {
                raw_log: PathBuf::from("data/raw_texts.txt"),
                store: PathBuf::from("data/extracted_texts.txt"),
                photos_dir: None,
            },
            chunking: ChunkingConfig::default(),
            slots: SlotsConfig::default(),
            extraction: ExtractionConfig::default(),
            bucket: BucketConfig::default(),
            photos: PhotosConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub raw_log: PathBuf,
    pub store: PathBuf,
    #[serde(default)]
    pub photos_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlotsConfig {
    #[serde(default = "default_capacity")]
    pub capacity: u32,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> u32 {
    128
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4-turbo".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_secs() -> u64 {
    2
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct BucketConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_bucket_name")]
    pub name: String,
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
    #[serde(default = "default_store_object")]
    pub store_object: String,
    #[serde(default = "default_reorder_object")]
    pub reorder_object: String,
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_bucket_name(),
            local_dir: None,
            store_object: default_store_object(),
            reorder_object: default_reorder_object(),
            token_env: None,
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

fn default_bucket_name() -> String {
    "aharonilabinventory.appspot.com".to_string()
}
fn default_store_object() -> String {
    "extracted_texts.txt".to_string()
}
fn default_reorder_object() -> String {
    "to_be_ordered.txt".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhotosConfig {
    #[serde(default = "default_photo_globs")]
    pub include_globs: Vec<String>,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            include_globs: default_photo_globs(),
        }
    }
}

fn default_photo_globs() -> Vec<String> {
    [
        "**/*.heic", "**/*.jpg", "**/*.jpeg", "**/*.png", "**/*.gif", "**/*.bmp", "**/*.tiff",
    ]
    .iter()
    .map(|g| g.to_string())
    .collect()
}

impl ExtractionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl BucketConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }

    // Validate slots
    if config.slots.capacity == 0 {
        anyhow::bail!("slots.capacity must be > 0");
    }

    // Validate extraction
    match config.extraction.provider.as_str() {
        "disabled" | "openai" | "rules" => {}
        other => anyhow::bail!(
            "Unknown extraction provider: '{}'. Must be disabled, openai, or rules.",
            other
        ),
    }

    // Validate bucket
    match config.bucket.provider.as_str() {
        "disabled" => {}
        "firebase" => {
            if config.bucket.name.trim().is_empty() {
                anyhow::bail!("bucket.name must be set when provider is 'firebase'");
            }
        }
        "local" => {
            if config.bucket.local_dir.is_none() {
                anyhow::bail!("bucket.local_dir must be set when provider is 'local'");
            }
        }
        other => anyhow::bail!(
            "Unknown bucket provider: '{}'. Must be disabled, firebase, or local.",
            other
        ),
    }

    Ok(config)
}

pub fn example_config() -> &'static str {
    r#"# stockroom configuration

[paths]
# Append-only OCR text log, one blank-line separated block per photo.
raw_log = "data/raw_texts.txt"
# Structured inventory store maintained by `stock reconcile`.
store = "data/extracted_texts.txt"
# Directory of labeled component photos, used by `stock check`.
# photos_dir = "photos"

[chunking]
# Maximum characters handed to the extraction provider per request.
max_chars = 5000

[slots]
# Highest slot number per prefix; assignment falls back to hole-filling
# once a prefix reaches this bound.
capacity = 128

[extraction]
# One of: disabled, openai, rules.
# The openai provider reads the OPENAI_API_KEY environment variable.
provider = "disabled"
model = "gpt-4-turbo"
max_retries = 3
base_delay_secs = 2
timeout_secs = 60

[bucket]
# One of: disabled, firebase, local.
provider = "disabled"
name = "aharonilabinventory.appspot.com"
store_object = "extracted_texts.txt"
reorder_object = "to_be_ordered.txt"
max_retries = 3
base_delay_secs = 2
# local_dir = "bucket"
# token_env = "FIREBASE_TOKEN"

[photos]
include_globs = [
    "**/*.heic", "**/*.jpg", "**/*.jpeg", "**/*.png",
    "**/*.gif", "**/*.bmp", "**/*.tiff",
]
"#
}
