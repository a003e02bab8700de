//! Configuration file support
//!
//! Settings are read from TOML. Lookup order:
//!
//! 1. Path given with `--config`
//! 2. `./pii-redactor.toml`
//! 3. `<config_dir>/pii-redactor/config.toml`
//! 4. Built-in defaults
//!
//! Command-line values are layered on top with [`Config::merge_with_cli`].
//!
//! # Example
//!
//! ```toml
//! threads = 4
//!
//! [text]
//! labels = ["NAME", "EMAIL"]
//! style = "block"
//!
//! [location]
//! top_fraction = 0.1
//! mode = "pixels:7"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::blur::{BlurMethod, BlurOptions, DEFAULT_BLUR_STRENGTH};
use crate::mask::{MaskMode, MaskOptions, DEFAULT_DILATE, DEFAULT_TOP_FRACTION};
use crate::pipeline::{
    LocationPipelineOptions, OcrPipelineOptions, DEFAULT_LOCATION_BLUR_STRENGTH,
    DEFAULT_MIN_OCR_CONFIDENCE, DEFAULT_MIN_PII_SCORE, DEFAULT_TOP_K,
};
use crate::saliency::{FillStrategy, OcclusionOptions, DEFAULT_STRIDE, DEFAULT_WINDOW};
use crate::text::{
    LabelSet, NumberingMode, PlaceholderStyle, TextRedactionOptions, DEFAULT_ALWAYS_KEEP_LABELS,
    DEFAULT_EXTEND_LABELS, DEFAULT_MAX_GAP_CHARS,
};

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "pii-redactor.toml";

/// Config file path under the user config directory
pub const USER_CONFIG_FILE: &str = "pii-redactor/config.toml";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

// ============================================================
// Sections
// ============================================================

/// `[text]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Labels to redact; absent means all
    pub labels: Option<Vec<String>>,
    pub style: PlaceholderStyle,
    pub unique_ids: bool,
    pub max_gap_chars: usize,
    pub extend_labels: Vec<String>,
    pub always_keep_labels: Vec<String>,
    pub min_score: f32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            labels: None,
            style: PlaceholderStyle::Tags,
            unique_ids: false,
            max_gap_chars: DEFAULT_MAX_GAP_CHARS,
            extend_labels: DEFAULT_EXTEND_LABELS.iter().map(|s| s.to_string()).collect(),
            always_keep_labels: DEFAULT_ALWAYS_KEEP_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_score: 0.0,
        }
    }
}

/// `[ocr]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub min_ocr_confidence: f32,
    pub min_pii_score: f32,
    pub target_entities: Option<Vec<String>>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_ocr_confidence: DEFAULT_MIN_OCR_CONFIDENCE,
            min_pii_score: DEFAULT_MIN_PII_SCORE,
            target_entities: None,
        }
    }
}

/// `[location]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub top_k: usize,
    pub window: u32,
    pub stride: u32,
    pub fill: FillStrategy,
    pub parallel: bool,
    pub top_fraction: f32,
    pub dilate: u32,
    /// `regions`, `pixels` or `pixels:<size>`
    pub mode: String,
    /// Mosaic block size used on the extracted regions
    pub blur_strength: u32,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            window: DEFAULT_WINDOW,
            stride: DEFAULT_STRIDE,
            fill: FillStrategy::Blur,
            parallel: false,
            top_fraction: DEFAULT_TOP_FRACTION,
            dilate: DEFAULT_DILATE,
            mode: "regions".to_string(),
            blur_strength: DEFAULT_LOCATION_BLUR_STRENGTH,
        }
    }
}

/// `[blur]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    pub method: BlurMethod,
    pub strength: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            method: BlurMethod::Gaussian,
            strength: DEFAULT_BLUR_STRENGTH,
        }
    }
}

// ============================================================
// Config
// ============================================================

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rayon worker threads; absent uses every CPU
    pub threads: Option<usize>,
    pub text: TextConfig,
    pub ocr: OcrConfig,
    pub location: LocationConfig,
    pub blur: BlurConfig,
}

impl Config {
    /// Load from the first config file found in the lookup order
    ///
    /// Returns the defaults when no file exists.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.is_file() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Candidate config files, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(USER_CONFIG_FILE));
        }
        paths
    }

    /// Reject values no engine can honour
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(invalid("threads", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.text.min_score) {
            return Err(invalid("text.min_score", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.ocr.min_ocr_confidence) {
            return Err(invalid("ocr.min_ocr_confidence", "must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.ocr.min_pii_score) {
            return Err(invalid("ocr.min_pii_score", "must be within [0, 1]"));
        }
        if self.location.window == 0 {
            return Err(invalid("location.window", "must be positive"));
        }
        if self.location.stride == 0 {
            return Err(invalid("location.stride", "must be positive"));
        }
        if !(self.location.top_fraction > 0.0 && self.location.top_fraction <= 1.0) {
            return Err(invalid("location.top_fraction", "must be within (0, 1]"));
        }
        if self.location.blur_strength == 0 {
            return Err(invalid("location.blur_strength", "must be positive"));
        }
        self.mask_mode()?;
        if self.blur.strength == 0 {
            return Err(invalid("blur.strength", "must be positive"));
        }
        Ok(())
    }

    /// Apply command-line overrides; CLI values win
    #[must_use]
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Self {
        let mut merged = self.clone();

        if let Some(threads) = cli.threads {
            merged.threads = Some(threads);
        }
        if let Some(labels) = &cli.labels {
            merged.text.labels = Some(labels.iter().map(str::to_string).collect());
        }
        if let Some(style) = cli.style {
            merged.text.style = style;
        }
        if let Some(unique) = cli.unique_ids {
            merged.text.unique_ids = unique;
        }
        if let Some(p) = cli.top_fraction {
            merged.location.top_fraction = p;
        }
        if let Some(dilate) = cli.dilate {
            merged.location.dilate = dilate;
        }
        if let Some(mode) = &cli.mode {
            merged.location.mode = mode.clone();
        }
        if let Some(method) = cli.blur_method {
            merged.blur.method = method;
        }
        if let Some(strength) = cli.blur_strength {
            merged.blur.strength = strength;
        }

        merged
    }

    /// Parsed `[location].mode`
    pub fn mask_mode(&self) -> Result<MaskMode> {
        self.location
            .mode
            .parse()
            .map_err(|e: String| invalid("location.mode", e))
    }

    // ============ Conversions ============

    pub fn text_options(&self) -> TextRedactionOptions {
        let text = &self.text;
        TextRedactionOptions {
            labels: text.labels.as_ref().map(|l| l.iter().collect()),
            min_score: text.min_score,
            max_gap_chars: text.max_gap_chars,
            extend_labels: text.extend_labels.iter().collect(),
            always_keep_labels: text.always_keep_labels.iter().collect(),
            numbering: if text.unique_ids {
                NumberingMode::UniqueText
            } else {
                NumberingMode::Sequential
            },
            style: text.style,
        }
    }

    pub fn blur_options(&self) -> BlurOptions {
        BlurOptions::builder()
            .method(self.blur.method)
            .strength(self.blur.strength)
            .build()
    }

    pub fn ocr_options(&self) -> OcrPipelineOptions {
        let mut builder = OcrPipelineOptions::builder()
            .min_ocr_confidence(self.ocr.min_ocr_confidence)
            .min_pii_score(self.ocr.min_pii_score)
            .blur(self.blur_options());
        if let Some(entities) = &self.ocr.target_entities {
            builder = builder.target_entities(entities.iter().collect::<LabelSet>());
        }
        builder.build()
    }

    pub fn mask_options(&self) -> Result<MaskOptions> {
        Ok(MaskOptions::builder()
            .top_fraction(self.location.top_fraction)
            .dilate(self.location.dilate)
            .mode(self.mask_mode()?)
            .build())
    }

    pub fn location_options(&self) -> Result<LocationPipelineOptions> {
        let location = &self.location;
        Ok(LocationPipelineOptions::builder()
            .top_k(location.top_k)
            .occlusion(
                OcclusionOptions::builder()
                    .window(location.window)
                    .stride(location.stride)
                    .fill(location.fill)
                    .parallel(location.parallel)
                    .build(),
            )
            .mask(self.mask_options()?)
            .blur(BlurOptions::mosaic(location.blur_strength))
            .build())
    }
}

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub threads: Option<usize>,
    pub labels: Option<LabelSet>,
    pub style: Option<PlaceholderStyle>,
    pub unique_ids: Option<bool>,
    pub top_fraction: Option<f32>,
    pub dilate: Option<u32>,
    pub mode: Option<String>,
    pub blur_method: Option<BlurMethod>,
    pub blur_strength: Option<u32>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}
