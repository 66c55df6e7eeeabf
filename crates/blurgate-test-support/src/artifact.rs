//! Builder for small safetensors classifier artifacts.
//!
//! All weights are zero, so the head bias alone decides the softmax output
//! regardless of the frame. That makes verdicts through the real candle path
//! predictable in tests.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use safetensors::tensor::TensorView;
use safetensors::Dtype;

/// Head bias giving a blur probability of about 0.9997.
pub const BLURRY_BIAS: [f32; 2] = [8.0, 0.0];
/// Head bias giving a sharp probability of about 0.9997.
pub const SHARP_BIAS: [f32; 2] = [0.0, 8.0];

#[derive(Debug, Clone, Copy)]
struct ConvLayer {
    out_channels: usize,
    kernel: usize,
}

/// Builds classifier artifacts in the layout `CandleClassifier` loads.
#[derive(Debug, Clone)]
pub struct ClassifierArtifactBuilder {
    input_size: Option<u32>,
    input_dtype: Option<String>,
    input_channels: Option<String>,
    convs: Vec<ConvLayer>,
    head_bias: Vec<f32>,
}

impl ClassifierArtifactBuilder {
    /// Starts an artifact for an `input_size` square input with a neutral head.
    #[must_use]
    pub fn new(input_size: u32) -> Self {
        Self {
            input_size: Some(input_size),
            input_dtype: None,
            input_channels: None,
            convs: Vec::new(),
            head_bias: vec![0.0, 0.0],
        }
    }

    /// A classifier that calls every frame blurry.
    #[must_use]
    pub fn blurry(input_size: u32) -> Self {
        Self::new(input_size).with_head_bias(&BLURRY_BIAS)
    }

    /// A classifier that calls every frame sharp.
    #[must_use]
    pub fn sharp(input_size: u32) -> Self {
        Self::new(input_size).with_head_bias(&SHARP_BIAS)
    }

    /// Sets the head bias; its length is the class count.
    #[must_use]
    pub fn with_head_bias(mut self, bias: &[f32]) -> Self {
        self.head_bias = bias.to_vec();
        self
    }

    /// Appends a zero-weight convolution layer.
    #[must_use]
    pub fn with_conv_layer(mut self, out_channels: usize, kernel: usize) -> Self {
        self.convs.push(ConvLayer {
            out_channels,
            kernel,
        });
        self
    }

    /// Sets the `input_dtype` metadata value.
    #[must_use]
    pub fn with_input_dtype(mut self, dtype: &str) -> Self {
        self.input_dtype = Some(dtype.to_string());
        self
    }

    /// Sets the `input_channels` metadata value.
    #[must_use]
    pub fn with_input_channels(mut self, channels: &str) -> Self {
        self.input_channels = Some(channels.to_string());
        self
    }

    /// Omits the required `input_size` metadata.
    #[must_use]
    pub fn without_input_size(mut self) -> Self {
        self.input_size = None;
        self
    }

    /// Serializes the artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if safetensors serialization fails.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut tensors: Vec<(String, Vec<usize>, Vec<f32>)> = Vec::new();
        let mut channels = 3;

        for (i, layer) in self.convs.iter().enumerate() {
            let k = layer.kernel;
            let out = layer.out_channels;
            tensors.push((
                format!("features.{i}.weight"),
                vec![out, channels, k, k],
                vec![0.0; out * channels * k * k],
            ));
            tensors.push((format!("features.{i}.bias"), vec![out], vec![0.0; out]));
            channels = out;
        }

        let classes = self.head_bias.len();
        tensors.push((
            "classifier.weight".to_string(),
            vec![classes, channels],
            vec![0.0; classes * channels],
        ));
        tensors.push((
            "classifier.bias".to_string(),
            vec![classes],
            self.head_bias.clone(),
        ));

        let views = tensors
            .iter()
            .map(|(name, shape, data)| {
                TensorView::new(Dtype::F32, shape.clone(), bytemuck::cast_slice(data))
                    .map(|view| (name.clone(), view))
                    .with_context(|| format!("Failed to build tensor view '{name}'"))
            })
            .collect::<Result<HashMap<_, _>>>()?;

        safetensors::serialize(&views, &Some(self.metadata()))
            .context("Failed to serialize classifier artifact")
    }

    /// Serializes the artifact to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.build()?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write artifact: {}", path.display()))
    }

    fn metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        if let Some(size) = self.input_size {
            metadata.insert("input_size".to_string(), size.to_string());
        }
        if let Some(dtype) = &self.input_dtype {
            metadata.insert("input_dtype".to_string(), dtype.clone());
        }
        if let Some(channels) = &self.input_channels {
            metadata.insert("input_channels".to_string(), channels.clone());
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::SafeTensors;

    #[test]
    fn test_build_contains_expected_tensors() {
        let bytes = ClassifierArtifactBuilder::blurry(32)
            .with_conv_layer(4, 3)
            .build()
            .expect("build");
        let tensors = SafeTensors::deserialize(&bytes).expect("parse");

        assert_eq!(
            tensors.tensor("features.0.weight").expect("conv").shape(),
            &[4, 3, 3, 3]
        );
        assert_eq!(
            tensors.tensor("classifier.weight").expect("head").shape(),
            &[2, 4]
        );
    }

    #[test]
    fn test_metadata_written() {
        let bytes = ClassifierArtifactBuilder::new(16)
            .with_input_dtype("u8")
            .build()
            .expect("build");
        let (_, header) = SafeTensors::read_metadata(&bytes).expect("header");
        let metadata = header.metadata().clone().unwrap_or_default();

        assert_eq!(metadata.get("input_size").map(String::as_str), Some("16"));
        assert_eq!(metadata.get("input_dtype").map(String::as_str), Some("u8"));
    }

    #[test]
    fn test_without_input_size() {
        let bytes = ClassifierArtifactBuilder::new(16)
            .without_input_size()
            .build()
            .expect("build");
        let (_, header) = SafeTensors::read_metadata(&bytes).expect("header");
        let metadata = header.metadata().clone().unwrap_or_default();
        assert!(!metadata.contains_key("input_size"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blur_classifier.safetensors");
        ClassifierArtifactBuilder::sharp(8)
            .write_to(&path)
            .expect("write");
        assert!(path.exists());
    }
}
