//! Loading the classifier artifact and picking a compute device.

use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use tracing::info;

use crate::error::{Result, VisionError};
use crate::model::MiniXception;

/// Parses a device spec: `cpu`, `cuda` or `cuda:<ordinal>`.
pub fn select_device(spec: &str) -> Result<Device> {
    let spec = spec.trim().to_ascii_lowercase();
    let ordinal = match spec.as_str() {
        "cpu" => return Ok(Device::Cpu),
        "cuda" => 0,
        other => other
            .strip_prefix("cuda:")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| VisionError::Device(spec.clone()))?,
    };

    #[cfg(feature = "cuda")]
    {
        Device::new_cuda(ordinal).map_err(|e| VisionError::Device(format!("{}: {}", spec, e)))
    }
    #[cfg(not(feature = "cuda"))]
    {
        tracing::warn!(ordinal, "CUDA requested but not compiled in, falling back to CPU");
        Ok(Device::Cpu)
    }
}

/// Loads mini-Xception weights from a safetensors file.
///
/// A missing file is reported as [`VisionError::ModelNotFound`] so startup
/// can tell it apart from a corrupt or mismatched artifact.
pub fn load_mini_xception(path: &Path, device: &Device) -> Result<MiniXception> {
    if !path.exists() {
        return Err(VisionError::ModelNotFound(path.to_path_buf()));
    }

    let load_error = |message: String| VisionError::Load {
        path: path.to_path_buf(),
        message,
    };

    let data = std::fs::read(path).map_err(|e| load_error(e.to_string()))?;
    let size = data.len();
    let vb = VarBuilder::from_buffered_safetensors(data, DType::F32, device)
        .map_err(|e| load_error(e.to_string()))?;
    let model = MiniXception::load(vb).map_err(|e| load_error(e.to_string()))?;

    info!(path = %path.display(), bytes = size, device = ?device, "Loaded emotion classifier");
    Ok(model)
}
