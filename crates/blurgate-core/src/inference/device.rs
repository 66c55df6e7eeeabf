//! Device selection for inference.

use candle_core::Device;
use tracing::info;

/// Returns the best available device for inference.
///
/// Uses Metal or CUDA when the matching feature is compiled in and a device
/// is present, otherwise the CPU. The choice never changes tensor shapes or
/// verdicts.
#[must_use]
pub fn get_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device for inference");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device for inference");
            return device;
        }
    }

    info!(
        threads = candle_core::utils::get_num_threads(),
        "Using CPU for inference"
    );
    Device::Cpu
}
