//! Configuration file support for blurgate.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/blurgate/config.toml` (lowest priority)
//! - Project-local: `.blurgate.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use blurgate_core::SquareMode;
use serde::Deserialize;
use tracing::{debug, info};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Classifier artifact settings.
    pub model: ModelConfig,
    /// Probability rule settings.
    pub decision: DecisionConfig,
    /// Laplacian fallback settings.
    pub fallback: FallbackConfig,
    /// Preprocessing settings.
    pub preprocess: PreprocessConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
}

/// Classifier artifact configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Use the classifier at all. `false` forces the Laplacian fallback.
    pub enabled: Option<bool>,
    /// Explicit artifact path.
    pub path: Option<PathBuf>,
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
}

/// Probability rule configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Blurry when the blur probability reaches this value.
    pub blur_probability: Option<f32>,
    /// Blurry when the sharp probability falls below this value.
    pub sharp_probability: Option<f32>,
}

/// Laplacian fallback configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Threshold used after a failed classification.
    pub inference_failure_threshold: Option<f64>,
    /// Threshold used when no classifier is loaded.
    pub model_unavailable_threshold: Option<f64>,
}

/// Preprocessing configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Square step: "crop_or_pad" or "center_crop".
    pub square: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/blurgate/config.toml`
    /// 2. Project-local: `.blurgate.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and dropped.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.sanitize() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Drops out-of-range values and returns a description of each.
    fn sanitize(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        check_field(&mut self.decision.blur_probability, &mut problems, |p| {
            check_probability("decision.blur_probability", p)
        });
        check_field(&mut self.decision.sharp_probability, &mut problems, |p| {
            check_probability("decision.sharp_probability", p)
        });
        check_field(
            &mut self.fallback.inference_failure_threshold,
            &mut problems,
            |t| check_score_threshold("fallback.inference_failure_threshold", t),
        );
        check_field(
            &mut self.fallback.model_unavailable_threshold,
            &mut problems,
            |t| check_score_threshold("fallback.model_unavailable_threshold", t),
        );

        if let Some(ref s) = self.preprocess.square {
            if parse_square_mode(s).is_none() {
                problems.push(format!(
                    "preprocess.square must be 'crop_or_pad' or 'center_crop', got '{s}'"
                ));
                self.preprocess.square = None;
            }
        }

        if let Some(ref f) = self.output.format {
            if f != "json" && f != "jsonl" {
                problems.push(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
                self.output.format = None;
            }
        }

        problems
    }

    /// The configured square mode, if valid.
    pub fn square_mode(&self) -> Option<SquareMode> {
        self.preprocess.square.as_deref().and_then(parse_square_mode)
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.general.recursive = other.general.recursive.or(self.general.recursive);

        self.model.enabled = other.model.enabled.or(self.model.enabled);
        self.model.path = other.model.path.or_else(|| self.model.path.take());
        self.model.dir = other.model.dir.or_else(|| self.model.dir.take());

        self.decision.blur_probability = other
            .decision
            .blur_probability
            .or(self.decision.blur_probability);
        self.decision.sharp_probability = other
            .decision
            .sharp_probability
            .or(self.decision.sharp_probability);

        self.fallback.inference_failure_threshold = other
            .fallback
            .inference_failure_threshold
            .or(self.fallback.inference_failure_threshold);
        self.fallback.model_unavailable_threshold = other
            .fallback
            .model_unavailable_threshold
            .or(self.fallback.model_unavailable_threshold);

        self.preprocess.square = other
            .preprocess
            .square
            .or_else(|| self.preprocess.square.take());

        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

/// Clears `field` when `check` rejects its value.
fn check_field<T: Copy>(
    field: &mut Option<T>,
    problems: &mut Vec<String>,
    check: impl Fn(T) -> Result<(), String>,
) {
    if let Some(value) = *field {
        if let Err(problem) = check(value) {
            problems.push(problem);
            *field = None;
        }
    }
}

fn check_probability(name: &str, value: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{name} must be 0.0-1.0, got {value}"))
    }
}

fn check_score_threshold(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be a non-negative number, got {value}"))
    }
}

fn parse_square_mode(s: &str) -> Option<SquareMode> {
    match s {
        "crop_or_pad" => Some(SquareMode::CropOrPad),
        "center_crop" => Some(SquareMode::CenterCrop),
        _ => None,
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("blurgate").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.blurgate.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".blurgate.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
