//! Occupancy-grid descriptor parsing.
//!
//! A map upload carries a YAML sidecar next to the PGM raster, in the format
//! written by ROS `map_server`:
//!
//! ```yaml
//! image: map.pgm
//! resolution: 0.05
//! origin: [-10.0, -10.0, 0.0]
//! occupied_thresh: 0.65
//! free_thresh: 0.196
//! negate: 0
//! ```
//!
//! Only the geometry and threshold keys are extracted; anything else in the
//! document is ignored.

use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("descriptor is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("descriptor must be a key-value mapping")]
    NotAMapping,

    #[error("descriptor is missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("descriptor key `{0}` must be a finite number")]
    NotANumber(&'static str),

    #[error("descriptor key `origin` must be a sequence of numbers")]
    OriginNotASequence,

    #[error("descriptor key `origin` needs 3 elements (x, y, theta), found {len}")]
    OriginTooShort { len: usize },

    #[error("descriptor key `origin` element {index} must be a finite number")]
    OriginElementNotANumber { index: usize },
}

/// Geometry and threshold fields parsed from a map descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapMetaInfo {
    /// Meters per pixel.
    pub resolution: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    /// Yaw of the lower-left pixel, radians.
    pub origin_theta: f64,
    pub occupied_thresh: f64,
    pub free_thresh: f64,
    /// Whether white/black semantics are inverted. `None` when the
    /// descriptor omits the key or gives it a non-boolean, non-numeric value.
    pub negate: Option<bool>,
}

impl MapMetaInfo {
    /// Parse raw descriptor bytes.
    pub fn from_yaml_bytes(bytes: &[u8]) -> Result<Self, DescriptorError> {
        let doc: Value = serde_yaml_ng::from_slice(bytes)?;
        Self::from_value(&doc)
    }

    fn from_value(doc: &Value) -> Result<Self, DescriptorError> {
        if !doc.is_mapping() {
            return Err(DescriptorError::NotAMapping);
        }

        let resolution = required_number(doc, "resolution")?;
        let (origin_x, origin_y, origin_theta) = origin(doc)?;
        let occupied_thresh = required_number(doc, "occupied_thresh")?;
        let free_thresh = required_number(doc, "free_thresh")?;
        let negate = doc.get("negate").and_then(negate_flag);

        Ok(Self {
            resolution,
            origin_x,
            origin_y,
            origin_theta,
            occupied_thresh,
            free_thresh,
            negate,
        })
    }
}

fn required_number(doc: &Value, key: &'static str) -> Result<f64, DescriptorError> {
    doc.get(key)
        .ok_or(DescriptorError::MissingKey(key))?
        .as_f64()
        .filter(|n| n.is_finite())
        .ok_or(DescriptorError::NotANumber(key))
}

fn origin(doc: &Value) -> Result<(f64, f64, f64), DescriptorError> {
    let seq = doc
        .get("origin")
        .ok_or(DescriptorError::MissingKey("origin"))?
        .as_sequence()
        .ok_or(DescriptorError::OriginNotASequence)?;

    if seq.len() < 3 {
        return Err(DescriptorError::OriginTooShort { len: seq.len() });
    }

    let mut xyz = [0.0; 3];
    for (index, slot) in xyz.iter_mut().enumerate() {
        *slot = seq[index]
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or(DescriptorError::OriginElementNotANumber { index })?;
    }
    Ok((xyz[0], xyz[1], xyz[2]))
}

/// Booleans pass through; numbers are truncated toward zero and compared
/// against zero. Anything else leaves the flag unset.
fn negate_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i != 0)
            } else if let Some(u) = n.as_u64() {
                Some(u != 0)
            } else {
                n.as_f64().map(|f| f.trunc() != 0.0)
            }
        }
        _ => None,
    }
}
