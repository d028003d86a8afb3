//! Int8 quantization at per-tensor and per-channel granularity.
//!
//! Values are stored as signed 8-bit integers in both schemes; the
//! asymmetric scheme carries a zero-point in `[-128, 127]`.

mod calibrate;
mod metrics;
mod params;
mod quantize;
mod types;

pub use calibrate::{calibrate_per_channel, calibrate_per_tensor, params_from_range};
pub use metrics::{quantization_mse, relative_error};
pub use params::{QuantParams, QuantizedTensor};
pub use quantize::{dequantize_with_params, fake_quantize, quantize_tensor, quantize_with_params};
pub use types::{QuantGranularity, QuantScheme};
