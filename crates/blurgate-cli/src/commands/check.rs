//! Check command - decide whether images are blurry.

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use blurgate_adapters::{FsImageSource, ModelStore};
use blurgate_core::{
    check_images, BlurDetector, CheckSummary, DetectorConfig, FallbackThresholds, ImageSource,
    ProbabilityThresholds,
};
use clap::Args;
use tracing::{debug, info};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, OutputFormat, ProgressBar};

/// Parse and validate a probability value (0.0-1.0).
fn parse_probability(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Shared arguments for checking images.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckArgs {
    /// Files or directories to check
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Classifier artifact (.safetensors) to load
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Skip the classifier and use the Laplacian fallback only
    #[arg(long, conflicts_with = "model")]
    pub no_model: bool,

    /// Blurry when the blur probability reaches this value (0.0-1.0)
    #[arg(long, value_parser = parse_probability)]
    pub blur_probability: Option<f32>,

    /// Blurry when the sharp probability falls below this value (0.0-1.0)
    #[arg(long, value_parser = parse_probability)]
    pub sharp_probability: Option<f32>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl CheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (`DetectorConfig::default()`)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }

        // An explicit --model beats `model.enabled = false`.
        if !args.no_model && args.model.is_none() {
            args.no_model = config.model.enabled == Some(false);
            if !args.no_model {
                args.model.clone_from(&config.model.path);
            }
        }

        args.blur_probability = args
            .blur_probability
            .or(config.decision.blur_probability);
        args.sharp_probability = args
            .sharp_probability
            .or(config.decision.sharp_probability);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_deref()
                .and_then(OutputFormat::from_config);
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        if args.models_dir.is_none() {
            args.models_dir.clone_from(&config.model.dir);
        }

        args.config = Some(config.clone());

        args
    }

    /// Detector settings from CLI, config and defaults.
    fn detector_config(&self) -> DetectorConfig {
        let defaults = DetectorConfig::default();
        let config = self.config.as_ref();

        DetectorConfig {
            probabilities: ProbabilityThresholds {
                blur: self
                    .blur_probability
                    .unwrap_or(defaults.probabilities.blur),
                sharp: self
                    .sharp_probability
                    .unwrap_or(defaults.probabilities.sharp),
            },
            fallback: FallbackThresholds {
                inference_failure: config
                    .and_then(|c| c.fallback.inference_failure_threshold)
                    .unwrap_or(defaults.fallback.inference_failure),
                model_unavailable: config
                    .and_then(|c| c.fallback.model_unavailable_threshold)
                    .unwrap_or(defaults.fallback.model_unavailable),
            },
            square_mode: config
                .and_then(AppConfig::square_mode)
                .unwrap_or(defaults.square_mode),
        }
    }

    /// Resolves the classifier artifact: `--no-model`, `--model`,
    /// `model.path`, then the installed classifier in the models directory.
    fn model_path(&self) -> Option<PathBuf> {
        if self.no_model {
            debug!("Classifier disabled");
            return None;
        }
        if let Some(path) = &self.model {
            return Some(path.clone());
        }

        let store = self
            .models_dir
            .clone()
            .map_or_else(ModelStore::default, ModelStore::new);
        let installed = store.installed_classifier();
        if installed.is_none() {
            info!(
                "No classifier at {}, using Laplacian fallback. Run `blurgate models install <FILE>`.",
                store.classifier_path().display()
            );
        }
        installed
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Result of running the check command.
#[allow(dead_code)] // Summary exposed for programmatic use
pub struct CheckResult {
    /// Batch counts.
    pub summary: CheckSummary,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the check command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &CheckArgs) -> Result<CheckResult> {
    info!("Running check command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let output = JsonOutput::stdout(args.format(), args.pretty);

    let model_path = args.model_path();
    let detector = BlurDetector::initialize(model_path.as_deref(), args.detector_config());
    info!("Detector state: {:?}", detector.state());

    let summary = check_images(&source, &detector, &output, &progress_bar, iso_timestamp)?;

    let exit_code = if summary.any_blurry() {
        ExitCode::BlurryFound
    } else {
        ExitCode::Success
    };

    Ok(CheckResult { summary, exit_code })
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
