//! Convolutional blur classifier running on candle.
//!
//! The architecture is read from the artifact rather than hard-coded: zero or
//! more `features.{i}` stride-2 convolutions with ReLU, global average
//! pooling, then a `classifier` linear head followed by softmax.
//!
//! Required header metadata:
//! - `input_size`: square side `S` of the input tensor
//!
//! Optional header metadata:
//! - `input_channels`: must be `3` when present
//! - `input_dtype`: `f32` (default) or `u8`

use candle_core::{Device, Module, Tensor};
use candle_nn::{
    conv2d, conv2d_no_bias, linear, linear_no_bias, Conv2d, Conv2dConfig, Linear, VarBuilder,
};
use std::path::Path;
use tracing::{debug, info};

use super::loader::WeightFile;
use super::Classifier;
use crate::domain::{InputDType, InputSpec, OutputSpec, Probabilities};
use crate::error::{InferenceError, ModelLoadError};

const CONV_STRIDE: usize = 2;
const SUPPORTED_CHANNELS: usize = 3;
const MIN_CLASSES: usize = 2;

#[derive(Debug, Clone, Copy)]
struct ConvPlan {
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    bias: bool,
}

#[derive(Debug, Clone, Copy)]
struct HeadPlan {
    features: usize,
    classes: usize,
    bias: bool,
}

/// Blur classifier backed by candle tensors.
pub struct CandleClassifier {
    input: InputSpec,
    output: OutputSpec,
    features: Vec<Conv2d>,
    head: Linear,
    device: Device,
}

impl CandleClassifier {
    /// Loads a classifier artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, the metadata is
    /// incomplete, or the tensor shapes do not chain into a classifier.
    pub fn load(path: impl AsRef<Path>, device: &Device) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let weights = WeightFile::open(path, device)?;
        let classifier = Self::from_weights(weights, device)?;
        info!(
            path = %path.display(),
            input_size = classifier.input.size,
            input_dtype = %classifier.input.dtype,
            classes = classifier.output.classes,
            layers = classifier.features.len(),
            "Loaded blur classifier"
        );
        Ok(classifier)
    }

    /// Builds a classifier from already parsed weights.
    ///
    /// # Errors
    ///
    /// Same conditions as [`CandleClassifier::load`], minus file access.
    pub fn from_weights(weights: WeightFile, device: &Device) -> Result<Self, ModelLoadError> {
        let input = read_input_spec(&weights)?;
        let (convs, head_plan) = plan_layers(&weights)?;
        let vb = weights.into_var_builder();

        let features = convs
            .iter()
            .enumerate()
            .map(|(i, plan)| build_conv(plan, vb.pp(format!("features.{i}"))))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let head = if head_plan.bias {
            linear(head_plan.features, head_plan.classes, vb.pp("classifier"))?
        } else {
            linear_no_bias(head_plan.features, head_plan.classes, vb.pp("classifier"))?
        };

        Ok(Self {
            input,
            output: OutputSpec {
                classes: head_plan.classes,
            },
            features,
            head,
            device: device.clone(),
        })
    }

    fn forward(&self, input: &[f32]) -> candle_core::Result<Vec<f32>> {
        let size = self.input.size as usize;
        let mut x = Tensor::from_slice(input, (1, size, size, self.input.channels), &self.device)?
            .permute((0, 3, 1, 2))?
            .contiguous()?;

        for conv in &self.features {
            x = conv.forward(&x)?.relu()?;
        }

        let pooled = x.mean(3)?.mean(2)?;
        let logits = self.head.forward(&pooled)?;
        candle_nn::ops::softmax(&logits, 1)?
            .squeeze(0)?
            .to_vec1::<f32>()
    }
}

impl Classifier for CandleClassifier {
    fn input_spec(&self) -> InputSpec {
        self.input
    }

    fn output_spec(&self) -> OutputSpec {
        self.output
    }

    fn infer(&mut self, input: &[f32]) -> Result<Probabilities, InferenceError> {
        let expected = self.input.element_count();
        if input.len() != expected {
            return Err(InferenceError::InputLength {
                expected,
                actual: input.len(),
            });
        }

        let values = self.forward(input)?;
        if values.is_empty() {
            return Err(InferenceError::EmptyOutput);
        }

        debug!(probabilities = ?values, "Classifier output");
        Ok(Probabilities::new(values))
    }
}

fn read_input_spec(weights: &WeightFile) -> Result<InputSpec, ModelLoadError> {
    let size = weights
        .metadata("input_size")
        .ok_or_else(|| ModelLoadError::Metadata("missing 'input_size'".to_string()))?
        .parse::<u32>()
        .ok()
        .filter(|&s| s > 0)
        .ok_or_else(|| ModelLoadError::Metadata("'input_size' must be a positive integer".to_string()))?;

    let channels = match weights.metadata("input_channels") {
        None => SUPPORTED_CHANNELS,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| ModelLoadError::Metadata(format!("invalid 'input_channels' value '{raw}'")))?,
    };
    if channels != SUPPORTED_CHANNELS {
        return Err(ModelLoadError::Metadata(format!(
            "unsupported channel count {channels}, expected {SUPPORTED_CHANNELS}"
        )));
    }

    let dtype = weights
        .metadata("input_dtype")
        .map_or(Ok(InputDType::F32), str::parse::<InputDType>)
        .map_err(ModelLoadError::Metadata)?;

    Ok(InputSpec {
        size,
        channels,
        dtype,
    })
}

/// Walks `features.{i}` until the first gap and checks that every layer's
/// input width matches the previous layer's output.
fn plan_layers(weights: &WeightFile) -> Result<(Vec<ConvPlan>, HeadPlan), ModelLoadError> {
    let mut convs = Vec::new();
    let mut channels = SUPPORTED_CHANNELS;

    while let Some(dims) = weights.shape(&format!("features.{}.weight", convs.len())) {
        let i = convs.len();
        let &[out_channels, in_channels, kh, kw] = dims else {
            return Err(ModelLoadError::Shape(format!(
                "features.{i}.weight must be 4-D, got {dims:?}"
            )));
        };
        if kh != kw || kh == 0 {
            return Err(ModelLoadError::Shape(format!(
                "features.{i}.weight has non-square kernel {kh}x{kw}"
            )));
        }
        if in_channels != channels {
            return Err(ModelLoadError::Shape(format!(
                "features.{i}.weight expects {in_channels} input channels, previous layer gives {channels}"
            )));
        }

        let bias_name = format!("features.{i}.bias");
        if let Some(bias) = weights.shape(&bias_name) {
            if bias != [out_channels] {
                return Err(ModelLoadError::Shape(format!(
                    "{bias_name} must be [{out_channels}], got {bias:?}"
                )));
            }
        }

        convs.push(ConvPlan {
            in_channels,
            out_channels,
            kernel: kh,
            bias: weights.contains(&bias_name),
        });
        channels = out_channels;
    }

    let dims = weights
        .shape("classifier.weight")
        .ok_or_else(|| ModelLoadError::Shape("missing classifier.weight".to_string()))?;
    let &[classes, features] = dims else {
        return Err(ModelLoadError::Shape(format!(
            "classifier.weight must be 2-D, got {dims:?}"
        )));
    };
    if features != channels {
        return Err(ModelLoadError::Shape(format!(
            "classifier expects {features} features, backbone gives {channels}"
        )));
    }
    if classes < MIN_CLASSES {
        return Err(ModelLoadError::Shape(format!(
            "classifier has {classes} classes, need at least {MIN_CLASSES}"
        )));
    }
    if let Some(bias) = weights.shape("classifier.bias") {
        if bias != [classes] {
            return Err(ModelLoadError::Shape(format!(
                "classifier.bias must be [{classes}], got {bias:?}"
            )));
        }
    }

    Ok((
        convs,
        HeadPlan {
            features,
            classes,
            bias: weights.contains("classifier.bias"),
        },
    ))
}

fn build_conv(plan: &ConvPlan, vb: VarBuilder) -> candle_core::Result<Conv2d> {
    let cfg = Conv2dConfig {
        padding: plan.kernel / 2,
        stride: CONV_STRIDE,
        ..Conv2dConfig::default()
    };
    if plan.bias {
        conv2d(plan.in_channels, plan.out_channels, plan.kernel, cfg, vb)
    } else {
        conv2d_no_bias(plan.in_channels, plan.out_channels, plan.kernel, cfg, vb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::tensor::TensorView;
    use std::collections::HashMap;

    /// Serializes zero weights plus the given head bias.
    fn artifact(
        metadata: &[(&str, &str)],
        convs: &[(usize, usize, usize)],
        head_bias: &[f32],
    ) -> Vec<u8> {
        let mut owned: Vec<(String, Vec<usize>, Vec<f32>)> = Vec::new();
        let mut channels = 3;
        for (i, &(out, inp, k)) in convs.iter().enumerate() {
            owned.push((
                format!("features.{i}.weight"),
                vec![out, inp, k, k],
                vec![0.0; out * inp * k * k],
            ));
            owned.push((format!("features.{i}.bias"), vec![out], vec![0.0; out]));
            channels = out;
        }
        let classes = head_bias.len();
        owned.push((
            "classifier.weight".to_string(),
            vec![classes, channels],
            vec![0.0; classes * channels],
        ));
        owned.push(("classifier.bias".to_string(), vec![classes], head_bias.to_vec()));

        let views: HashMap<String, TensorView<'_>> = owned
            .iter()
            .map(|(name, shape, data)| {
                let view = TensorView::new(
                    safetensors::Dtype::F32,
                    shape.clone(),
                    bytemuck::cast_slice(data),
                )
                .expect("view");
                (name.clone(), view)
            })
            .collect();
        let metadata: HashMap<String, String> = metadata
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        safetensors::serialize(&views, &Some(metadata)).expect("serialize")
    }

    fn build(bytes: &[u8]) -> Result<CandleClassifier, ModelLoadError> {
        let weights = WeightFile::from_bytes(bytes, &Device::Cpu)?;
        CandleClassifier::from_weights(weights, &Device::Cpu)
    }

    #[test]
    fn test_specs_from_metadata() {
        let bytes = artifact(&[("input_size", "16"), ("input_dtype", "u8")], &[], &[0.0, 0.0]);
        let model = build(&bytes).expect("load");
        assert_eq!(model.input_spec().size, 16);
        assert_eq!(model.input_spec().channels, 3);
        assert_eq!(model.input_spec().dtype, InputDType::U8);
        assert_eq!(model.output_spec().classes, 2);
    }

    #[test]
    fn test_head_bias_drives_softmax() {
        let bytes = artifact(&[("input_size", "8")], &[(4, 3, 3), (6, 4, 3)], &[8.0, 0.0]);
        let mut model = build(&bytes).expect("load");
        let probs = model.infer(&vec![0.5; 8 * 8 * 3]).expect("infer");
        assert_eq!(probs.len(), 2);
        assert!(probs.blur() > 0.999, "blur = {}", probs.blur());
        assert!((probs.blur() + probs.sharp() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_wrong_input_length() {
        let bytes = artifact(&[("input_size", "8")], &[], &[0.0, 0.0]);
        let mut model = build(&bytes).expect("load");
        let err = model.infer(&[0.0; 10]).expect_err("length");
        assert!(matches!(
            err,
            InferenceError::InputLength {
                expected: 192,
                actual: 10
            }
        ));
        // Still usable afterwards.
        assert!(model.infer(&[0.0; 192]).is_ok());
    }

    #[test]
    fn test_missing_input_size() {
        let bytes = artifact(&[], &[], &[0.0, 0.0]);
        assert!(matches!(build(&bytes), Err(ModelLoadError::Metadata(_))));
    }

    #[test]
    fn test_unsupported_channels() {
        let bytes = artifact(&[("input_size", "8"), ("input_channels", "1")], &[], &[0.0, 0.0]);
        assert!(matches!(build(&bytes), Err(ModelLoadError::Metadata(_))));
    }

    #[test]
    fn test_chain_mismatch() {
        let bytes = artifact(&[("input_size", "8")], &[(4, 5, 3)], &[0.0, 0.0]);
        assert!(matches!(build(&bytes), Err(ModelLoadError::Shape(_))));
    }

    #[test]
    fn test_single_class_rejected() {
        let bytes = artifact(&[("input_size", "8")], &[], &[1.0]);
        assert!(matches!(build(&bytes), Err(ModelLoadError::Shape(_))));
    }
}
