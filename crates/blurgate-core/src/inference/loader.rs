//! Weight loading for safetensors classifier artifacts.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::ModelLoadError;

/// Tensors and header metadata read from one safetensors file.
pub struct WeightFile {
    tensors: HashMap<String, Tensor>,
    metadata: HashMap<String, String>,
    device: Device,
}

impl WeightFile {
    /// Reads and parses an artifact from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid
    /// safetensors.
    pub fn open(path: impl AsRef<Path>, device: &Device) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        debug!("Loading safetensors from {}", path.display());

        let data = std::fs::read(path).map_err(|source| ModelLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_bytes(&data, device)
    }

    /// Parses an artifact already held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid safetensors or hold a
    /// tensor dtype the backend cannot represent.
    pub fn from_bytes(data: &[u8], device: &Device) -> Result<Self, ModelLoadError> {
        let (_, header) = SafeTensors::read_metadata(data)?;
        let metadata = header.metadata().clone().unwrap_or_default();

        let tensors = SafeTensors::deserialize(data)?;
        let mut tensor_map = HashMap::new();

        for (name, view) in tensors.tensors() {
            let dtype = safetensors_dtype_to_candle(view.dtype())?;
            let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)?;
            tensor_map.insert(name, tensor);
        }

        debug!(
            tensors = tensor_map.len(),
            metadata_keys = metadata.len(),
            "Parsed safetensors artifact"
        );

        Ok(Self {
            tensors: tensor_map,
            metadata,
            device: device.clone(),
        })
    }

    /// Header metadata value for `key`.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Shape of tensor `name`, if present.
    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.tensors.get(name).map(Tensor::dims)
    }

    /// Returns true if tensor `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Hands the tensors to a `VarBuilder` that yields `f32` weights.
    #[must_use]
    pub fn into_var_builder(self) -> VarBuilder<'static> {
        VarBuilder::from_tensors(self.tensors, DType::F32, &self.device)
    }
}

/// Converts safetensors dtype to candle dtype.
fn safetensors_dtype_to_candle(dtype: safetensors::Dtype) -> Result<DType, ModelLoadError> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        S::I64 => Ok(DType::I64),
        S::U8 => Ok(DType::U8),
        S::U32 => Ok(DType::U32),
        other => Err(ModelLoadError::Shape(format!(
            "unsupported tensor dtype {other:?}"
        ))),
    }
}
