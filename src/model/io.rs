//! SafeTensors persistence for [`Weight`] lists.
//!
//! Int8 weights are written as an `I8` tensor under their own name plus
//! `<name>.qscale` (`F32`) and `<name>.qzero_point` (`I32`). Scheme and
//! granularity go into the header metadata, as does the original weight order.

use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::Weight;
use crate::error::{Error, Result};
use crate::quant::int8::{QuantGranularity, QuantParams, QuantScheme, QuantizedTensor};

const SCALE_SUFFIX: &str = ".qscale";
const ZERO_POINT_SUFFIX: &str = ".qzero_point";
const ORDER_KEY: &str = "weight_order";
const QUANT_KEY: &str = "quantization";

#[derive(Debug, Serialize, Deserialize)]
struct QuantLayout {
    scheme: QuantScheme,
    granularity: QuantGranularity,
    /// Channel axis of per-channel parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    axis: Option<usize>,
}

fn ser_err(e: impl std::fmt::Display) -> Error {
    Error::Serialization { message: format!("safetensors: {e}") }
}

fn read_f32(bytes: &[u8]) -> Vec<f32> {
    bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

fn read_i32(bytes: &[u8]) -> Vec<i32> {
    bytes.chunks_exact(4).map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

/// Serialize weights to `path`.
pub(crate) fn write_weights(weights: &[(String, Weight)], path: &Path) -> Result<()> {
    let mut buffers: Vec<(String, Dtype, Vec<usize>, Vec<u8>)> = Vec::with_capacity(weights.len());
    let mut layouts = BTreeMap::new();

    for (name, weight) in weights {
        match weight {
            Weight::Float(array) => {
                let data: Vec<f32> = array.iter().copied().collect();
                let bytes = bytemuck::cast_slice(&data).to_vec();
                buffers.push((name.clone(), Dtype::F32, array.shape().to_vec(), bytes));
            }
            Weight::Int8(q) => {
                let p = &q.params;
                buffers.push((
                    name.clone(),
                    Dtype::I8,
                    q.shape.clone(),
                    bytemuck::cast_slice(&q.data).to_vec(),
                ));
                buffers.push((
                    format!("{name}{SCALE_SUFFIX}"),
                    Dtype::F32,
                    vec![p.scales.len()],
                    bytemuck::cast_slice(&p.scales).to_vec(),
                ));
                buffers.push((
                    format!("{name}{ZERO_POINT_SUFFIX}"),
                    Dtype::I32,
                    vec![p.zero_points.len()],
                    bytemuck::cast_slice(&p.zero_points).to_vec(),
                ));
                layouts.insert(
                    name.clone(),
                    QuantLayout {
                        scheme: p.scheme,
                        granularity: p.granularity,
                        axis: (p.granularity == QuantGranularity::PerChannel).then_some(0),
                    },
                );
            }
        }
    }

    let views = buffers
        .iter()
        .map(|(name, dtype, shape, bytes)| {
            TensorView::new(*dtype, shape.clone(), bytes).map(|view| (name.clone(), view))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(ser_err)?;

    let order: Vec<&str> = weights.iter().map(|(name, _)| name.as_str()).collect();
    let mut metadata = HashMap::new();
    metadata.insert("format".to_string(), "pt".to_string());
    metadata.insert(ORDER_KEY.to_string(), serde_json::to_string(&order).map_err(ser_err)?);
    if !layouts.is_empty() {
        metadata.insert(QUANT_KEY.to_string(), serde_json::to_string(&layouts).map_err(ser_err)?);
    }

    let bytes = safetensors::serialize(views, Some(metadata)).map_err(ser_err)?;
    std::fs::write(path, bytes).map_err(|e| Error::io(format!("writing {}", path.display()), e))
}

/// Deserialize weights from `path`, restoring the saved order.
pub(crate) fn read_weights(path: &Path) -> Result<Vec<(String, Weight)>> {
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found("model weights", path.display().to_string())
        } else {
            Error::io(format!("reading {}", path.display()), e)
        }
    })?;

    let tensors = SafeTensors::deserialize(&data).map_err(ser_err)?;
    let (_, header) = SafeTensors::read_metadata(&data).map_err(ser_err)?;
    let metadata = header.metadata().clone().unwrap_or_default();

    let layouts: BTreeMap<String, QuantLayout> = match metadata.get(QUANT_KEY) {
        Some(json) => serde_json::from_str(json).map_err(ser_err)?,
        None => BTreeMap::new(),
    };

    let order: Vec<String> = match metadata.get(ORDER_KEY) {
        Some(json) => serde_json::from_str(json).map_err(ser_err)?,
        None => {
            let is_param = |name: &str| {
                [SCALE_SUFFIX, ZERO_POINT_SUFFIX].iter().any(|suffix| {
                    name.strip_suffix(suffix).is_some_and(|base| layouts.contains_key(base))
                })
            };
            let mut names: Vec<String> =
                tensors.names().into_iter().filter(|n| !is_param(n)).map(|n| n.to_string()).collect();
            names.sort();
            names
        }
    };

    order
        .into_iter()
        .map(|name| {
            let view = tensors.tensor(&name).map_err(ser_err)?;
            let weight = match layouts.get(&name) {
                Some(layout) => {
                    if view.dtype() != Dtype::I8 {
                        return Err(ser_err(format!("{name}: expected I8, found {:?}", view.dtype())));
                    }
                    let scales = tensors.tensor(&format!("{name}{SCALE_SUFFIX}")).map_err(ser_err)?;
                    let zeros =
                        tensors.tensor(&format!("{name}{ZERO_POINT_SUFFIX}")).map_err(ser_err)?;
                    Weight::Int8(QuantizedTensor {
                        data: view.data().iter().map(|b| *b as i8).collect(),
                        shape: view.shape().to_vec(),
                        params: QuantParams {
                            scales: read_f32(scales.data()),
                            zero_points: read_i32(zeros.data()),
                            scheme: layout.scheme,
                            granularity: layout.granularity,
                        },
                    })
                }
                None => {
                    if view.dtype() != Dtype::F32 {
                        return Err(ser_err(format!(
                            "{name}: unsupported dtype {:?} (only F32 weights can be loaded)",
                            view.dtype()
                        )));
                    }
                    Weight::from_vec(view.shape(), read_f32(view.data()))?
                }
            };
            Ok((name, weight))
        })
        .collect()
}
