//! Mode shape post-processing
//!
//! Raw eigenvectors come back from the solver as one displacement vector per
//! node `(u1, u2, u3)` with `u1` along the pipe, `u2` vertical and `u3`
//! lateral. Each mode is classified by its dominant component, rotated so
//! its peak transverse deflection lies on a single axis, and paired with its
//! frequency.

use std::collections::BTreeMap;

use nalgebra::{Rotation2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::results::ModalResultSource;

/// Dominant displacement direction of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Axial,
    CrossFlow,
    Inline,
}

impl Direction {
    /// Direction for a displacement component index (0 = axial)
    pub fn from_component(component: usize) -> Self {
        match component {
            0 => Self::Axial,
            1 => Self::CrossFlow,
            _ => Self::Inline,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Axial => "axial",
            Self::CrossFlow => "cross-flow",
            Self::Inline => "inline",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrotated eigenvector, one `(axial, vertical, lateral)` row per node
#[derive(Debug, Clone, PartialEq)]
pub struct RawModeShape {
    rows: Vec<Vector3<f64>>,
}

impl RawModeShape {
    pub fn new(rows: Vec<Vector3<f64>>) -> Self {
        Self { rows }
    }

    pub fn from_rows(rows: &[[f64; 3]]) -> Self {
        Self::new(rows.iter().map(|r| Vector3::new(r[0], r[1], r[2])).collect())
    }

    pub fn rows(&self) -> &[Vector3<f64>] {
        &self.rows
    }

    pub fn node_count(&self) -> usize {
        self.rows.len()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.rows.iter().map(|r| r * factor).collect())
    }
}

/// Rotate the transverse displacements so the node with the largest
/// transverse amplitude ends up on the first output axis.
///
/// Output rows are `(primary, secondary)`. The first node reaching the
/// largest amplitude defines the angle.
pub fn rotate_mode(shape: &RawModeShape) -> Vec<Vector2<f64>> {
    let mut peak = 0;
    let mut peak_amplitude = f64::NEG_INFINITY;
    for (i, r) in shape.rows().iter().enumerate() {
        let amplitude = (r.y.powi(2) + r.z.powi(2)).sqrt();
        if amplitude > peak_amplitude {
            peak_amplitude = amplitude;
            peak = i;
        }
    }

    let Some(p) = shape.rows().get(peak) else {
        return Vec::new();
    };
    let rotation = Rotation2::new(-p.y.atan2(p.z));

    shape
        .rows()
        .iter()
        .map(|r| rotation * Vector2::new(r.z, r.y))
        .collect()
}

/// Classify a mode by the component holding the largest absolute
/// displacement anywhere in the shape.
///
/// The table is scanned node by node, component by component, and the first
/// occurrence of the maximum wins.
pub fn classify_direction(shape: &RawModeShape) -> Direction {
    let mut component = 0;
    let mut largest = f64::NEG_INFINITY;
    for r in shape.rows() {
        for (c, value) in r.iter().enumerate() {
            if value.abs() > largest {
                largest = value.abs();
                component = c;
            }
        }
    }
    Direction::from_component(component)
}

/// One natural mode of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mode {
    /// 1-based frequency rank
    pub number: usize,
    /// Natural frequency in Hz
    pub frequency: f64,
    pub direction: Direction,
    /// Rotated transverse shape, one `(primary, secondary)` row per node
    pub shape: Vec<Vector2<f64>>,
}

impl Mode {
    /// Along-pipe position of each shape row
    pub fn kp(&self, element_length: f64) -> Vec<f64> {
        (0..self.shape.len())
            .map(|i| i as f64 * element_length)
            .collect()
    }
}

/// Pair raw shapes with frequencies by mode number.
///
/// Mode `n` takes frequency `n - 1` of the list. The frequency list is
/// trusted to be in mode order and is not re-sorted.
pub fn assemble_modes(
    frequencies: &[f64],
    shapes: Vec<(usize, RawModeShape)>,
) -> PipelineResult<BTreeMap<usize, Mode>> {
    if frequencies.len() != shapes.len() {
        return Err(PipelineError::inconsistent(format!(
            "{} frequencies but {} mode shapes",
            frequencies.len(),
            shapes.len()
        )));
    }

    if frequencies.windows(2).any(|w| w[1] < w[0]) {
        tracing::warn!("Solver frequencies are not ascending; pairing by mode number regardless");
    }

    let mut modes = BTreeMap::new();
    for (number, raw) in shapes {
        let frequency = number
            .checked_sub(1)
            .and_then(|i| frequencies.get(i))
            .copied()
            .ok_or_else(|| {
                PipelineError::inconsistent(format!(
                    "mode {} has no matching frequency among {}",
                    number,
                    frequencies.len()
                ))
            })?;

        let mode = Mode {
            number,
            frequency,
            direction: classify_direction(&raw),
            shape: rotate_mode(&raw),
        };
        if modes.insert(number, mode).is_some() {
            return Err(PipelineError::inconsistent(format!("mode {} appears twice", number)));
        }
    }

    Ok(modes)
}

/// Read, classify and rotate every mode available from `source`
pub fn get_modes(source: &dyn ModalResultSource) -> PipelineResult<BTreeMap<usize, Mode>> {
    let frequencies = source.frequencies()?;
    let shapes = source.mode_shapes()?;
    let modes = assemble_modes(&frequencies, shapes)?;
    tracing::info!("Assembled {} modes", modes.len());
    Ok(modes)
}
