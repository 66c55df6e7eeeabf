//! Mock implementations of core port traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use blurgate_core::domain::{
    CheckRecord, ImageInfo, InputDType, InputSpec, OutputSpec, Probabilities,
};
use blurgate_core::error::InferenceError;
use blurgate_core::inference::Classifier;
use blurgate_core::ports::{ImageSource, ProgressEvent, ProgressSink, ResultOutput};

/// Summary of one buffer handed to [`MockClassifier::infer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferCall {
    /// Number of values supplied.
    pub len: usize,
    /// Smallest value supplied.
    pub min: f32,
    /// Largest value supplied.
    pub max: f32,
}

/// Shared view of the calls a [`MockClassifier`] received.
///
/// Stays valid after the classifier has been moved into a detector.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<InferCall>>>);

impl CallLog {
    /// Number of `infer` calls so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// All recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<InferCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, input: &[f32]) {
        let call = InferCall {
            len: input.len(),
            min: input.iter().copied().fold(f32::INFINITY, f32::min),
            max: input.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        };
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

/// Mock implementation of `Classifier` for testing.
///
/// Replays scripted responses in order, then repeats a steady output.
/// Scripted failures surface as [`InferenceError::Preprocess`].
pub struct MockClassifier {
    spec: InputSpec,
    classes: usize,
    script: VecDeque<Result<Vec<f32>, String>>,
    steady: Vec<f32>,
    log: CallLog,
}

impl MockClassifier {
    /// Creates a float-input classifier that answers `[0.5, 0.5]`.
    #[must_use]
    pub fn new(input_size: u32) -> Self {
        Self {
            spec: InputSpec {
                size: input_size,
                channels: 3,
                dtype: InputDType::F32,
            },
            classes: 2,
            script: VecDeque::new(),
            steady: vec![0.5, 0.5],
            log: CallLog::default(),
        }
    }

    /// Sets the output returned once the script is exhausted.
    #[must_use]
    pub fn with_output(mut self, probabilities: &[f32]) -> Self {
        self.steady = probabilities.to_vec();
        self
    }

    /// Sets the declared input dtype.
    #[must_use]
    pub const fn with_dtype(mut self, dtype: InputDType) -> Self {
        self.spec.dtype = dtype;
        self
    }

    /// Queues one failing call.
    #[must_use]
    pub fn then_fail(mut self, message: &str) -> Self {
        self.script.push_back(Err(message.to_string()));
        self
    }

    /// Queues one call answering `probabilities`.
    #[must_use]
    pub fn then_output(mut self, probabilities: &[f32]) -> Self {
        self.script.push_back(Ok(probabilities.to_vec()));
        self
    }

    /// Handle for inspecting calls after the mock has been moved.
    #[must_use]
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Classifier for MockClassifier {
    fn input_spec(&self) -> InputSpec {
        self.spec
    }

    fn output_spec(&self) -> OutputSpec {
        OutputSpec {
            classes: self.classes,
        }
    }

    fn infer(&mut self, input: &[f32]) -> Result<Probabilities, InferenceError> {
        self.log.record(input);

        let expected = self.spec.element_count();
        if input.len() != expected {
            return Err(InferenceError::InputLength {
                expected,
                actual: input.len(),
            });
        }

        match self.script.pop_front() {
            Some(Ok(values)) => Ok(Probabilities::new(values)),
            Some(Err(message)) => Err(InferenceError::Preprocess(message)),
            None => Ok(Probabilities::new(self.steady.clone())),
        }
    }
}

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built images, plus optional load failures, and tracks
/// iteration for assertions.
pub struct MockImageSource {
    images: Vec<ImageInfo>,
    failures: Vec<String>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockImageSource {
    /// Creates a new mock source with the given images.
    #[must_use]
    pub fn new(images: Vec<ImageInfo>) -> Self {
        Self {
            images,
            failures: Vec::new(),
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Appends an item that fails to load with `message`.
    #[must_use]
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failures.push(message.to_string());
        self
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSource for MockImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInfo>> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;

        let ok = self.images.iter().cloned().map(Ok);
        let failed = self
            .failures
            .iter()
            .map(|message| Err(anyhow::anyhow!("{message}")));
        Box::new(ok.chain(failed))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.images.len() + self.failures.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures check records for later assertions.
#[derive(Default)]
pub struct MockVerdictSink {
    records: Arc<Mutex<Vec<CheckRecord>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockVerdictSink {
    /// Creates a new mock sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured records.
    #[must_use]
    pub fn records(&self) -> Vec<CheckRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many captured records are blurry.
    #[must_use]
    pub fn blurry_count(&self) -> usize {
        self.records().iter().filter(|r| r.is_blurry).count()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResultOutput for MockVerdictSink {
    fn write(&self, record: &CheckRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns `(processed, blurry, skipped)` from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished {
                processed,
                blurry,
                skipped,
            } => Some((*processed, *blurry, *skipped)),
            _ => None,
        })
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
