//! Blur verdict orchestration.
//!
//! [`BlurDetector`] owns at most one classifier session. With a session it
//! runs preprocess, normalize, infer and decide; without one, or when any of
//! those steps fails, it answers with the Laplacian fallback. Verdict
//! computation never fails.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::decision::{self, FallbackThresholds, ProbabilityThresholds};
use crate::domain::{EngineState, FallbackReason, Frame, InputSpec, Probabilities, Verdict};
use crate::error::InferenceError;
use crate::fallback::laplacian_score;
use crate::inference::{get_device, CandleClassifier, Classifier};
use crate::normalize::{Normalization, PixelBuffer};
use crate::preprocess::{Preprocessor, SquareMode};

/// Tunables for a [`BlurDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectorConfig {
    /// Thresholds applied to classifier output.
    pub probabilities: ProbabilityThresholds,
    /// Laplacian thresholds for the two fallback paths.
    pub fallback: FallbackThresholds,
    /// How frames are squared before resizing.
    pub square_mode: SquareMode,
}

/// Reusable buffers for one classification.
#[derive(Debug, Default)]
struct Scratch {
    pixels: Vec<u8>,
    normalized: Vec<f32>,
}

struct ModelSession {
    classifier: Box<dyn Classifier>,
    preprocessor: Preprocessor,
    normalization: Normalization,
    scratch: Scratch,
}

impl ModelSession {
    fn new(classifier: Box<dyn Classifier>, mode: SquareMode) -> Self {
        let spec = classifier.input_spec();
        Self {
            preprocessor: Preprocessor::new(spec.size, mode),
            normalization: Normalization::for_dtype(spec.dtype),
            classifier,
            scratch: Scratch::default(),
        }
    }

    fn classify(&mut self, frame: &Frame<'_>) -> Result<Probabilities, InferenceError> {
        let spec = self.classifier.input_spec();
        if spec.size != self.preprocessor.target_size() {
            self.preprocessor.reconfigure(spec.size);
            self.normalization = Normalization::for_dtype(spec.dtype);
        }

        self.preprocessor.run(frame, &mut self.scratch.pixels)?;
        self.normalization.apply(
            PixelBuffer::U8(&self.scratch.pixels),
            spec.element_count(),
            &mut self.scratch.normalized,
        )?;

        let probabilities = self.classifier.infer(&self.scratch.normalized)?;
        if probabilities.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }
        Ok(probabilities)
    }
}

/// Decides whether frames are blurry.
///
/// `Send + Sync`; share it behind an `Arc`. Calls on one detector are
/// serialized, so at most one classification is in flight.
pub struct BlurDetector {
    config: DetectorConfig,
    session: Option<Mutex<ModelSession>>,
    input_spec: Option<InputSpec>,
}

impl BlurDetector {
    /// A detector with no classifier. Every verdict uses the fallback.
    #[must_use]
    pub const fn unavailable(config: DetectorConfig) -> Self {
        Self {
            config,
            session: None,
            input_spec: None,
        }
    }

    /// A detector driving an already loaded classifier.
    #[must_use]
    pub fn with_classifier(classifier: Box<dyn Classifier>, config: DetectorConfig) -> Self {
        let spec = classifier.input_spec();
        Self {
            config,
            session: Some(Mutex::new(ModelSession::new(classifier, config.square_mode))),
            input_spec: Some(spec),
        }
    }

    /// Loads the classifier at `model_path` once.
    ///
    /// A missing path or any load failure is logged and yields a detector in
    /// [`EngineState::ModelUnavailable`] for its whole lifetime.
    #[must_use]
    pub fn initialize(model_path: Option<&Path>, config: DetectorConfig) -> Self {
        let Some(path) = model_path else {
            info!("No blur classifier configured, using Laplacian fallback");
            return Self::unavailable(config);
        };

        match CandleClassifier::load(path, &get_device()) {
            Ok(classifier) => Self::with_classifier(Box::new(classifier), config),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to load blur classifier, using Laplacian fallback"
                );
                Self::unavailable(config)
            }
        }
    }

    /// Runs [`BlurDetector::initialize`] on a background thread.
    ///
    /// The detector only exists once loading has finished, so no verdict can
    /// observe a half-loaded model.
    #[must_use]
    pub fn spawn_initialize(
        model_path: Option<PathBuf>,
        config: DetectorConfig,
    ) -> JoinHandle<Self> {
        std::thread::spawn(move || Self::initialize(model_path.as_deref(), config))
    }

    /// Current engine state. Fixed after construction.
    #[must_use]
    pub const fn state(&self) -> EngineState {
        if self.session.is_some() {
            EngineState::ModelReady
        } else {
            EngineState::ModelUnavailable
        }
    }

    /// Input spec of the loaded classifier, if any.
    #[must_use]
    pub const fn input_spec(&self) -> Option<InputSpec> {
        self.input_spec
    }

    /// Detector configuration.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Decides whether `frame` is blurry. Never fails.
    #[must_use]
    pub fn compute_verdict(&self, frame: &Frame<'_>) -> Verdict {
        let Some(session) = &self.session else {
            return fallback_verdict(
                frame,
                self.config.fallback.model_unavailable,
                FallbackReason::ModelUnavailable,
            );
        };

        // Scratch buffers hold nothing across calls, so a poisoned lock is safe to reuse.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            session
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .classify(frame)
        }))
        .unwrap_or_else(|payload| {
            Err(InferenceError::Panicked(panic_message(payload.as_ref())))
        });

        match outcome {
            Ok(probabilities) => {
                let is_blurry = decision::is_blurry(&probabilities, &self.config.probabilities);
                debug!(
                    blur = probabilities.blur(),
                    sharp = probabilities.sharp(),
                    is_blurry,
                    "Classifier verdict"
                );
                Verdict::from_model(is_blurry, &probabilities)
            }
            Err(err) => {
                warn!(error = %err, "Blur classification failed, using Laplacian fallback");
                fallback_verdict(
                    frame,
                    self.config.fallback.inference_failure,
                    FallbackReason::InferenceFailed,
                )
            }
        }
    }
}

fn fallback_verdict(frame: &Frame<'_>, threshold: f64, reason: FallbackReason) -> Verdict {
    let score = laplacian_score(frame);
    let is_blurry = decision::is_blurry_score(score, threshold);
    debug!(score, threshold, ?reason, is_blurry, "Fallback verdict");
    Verdict::from_fallback(is_blurry, score, threshold, reason)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl std::fmt::Debug for BlurDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlurDetector")
            .field("state", &self.state())
            .field("input_spec", &self.input_spec)
            .field("config", &self.config)
            .finish()
    }
}
