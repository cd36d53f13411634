//! Discretization, environment and seabed geometry

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Seabed geometry under the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Geometry {
    /// Surveyed profile as (KP, elevation) pairs in ascending KP order
    Bathymetry { bathymetry: Vec<[f64; 2]> },
    /// Single rectangular depression centred in an otherwise flat seabed
    Span {
        span_length: f64,
        span_height: f64,
        total_length: f64,
    },
}

/// Model discretization and environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Beam element length in m
    pub element_length: f64,
    /// Gravitational acceleration in m/s²
    pub g: f64,
    /// Water depth in m
    pub water_depth: f64,
    /// Seawater density in kg/m³
    pub rho_sw: f64,
    #[serde(flatten)]
    pub geometry: Geometry,
}

impl Model {
    /// Seabed profile as ordered (KP, elevation) points
    pub fn seabed_profile(&self) -> Vec<[f64; 2]> {
        match &self.geometry {
            Geometry::Bathymetry { bathymetry } => bathymetry.clone(),
            Geometry::Span {
                span_length,
                span_height,
                total_length,
            } => {
                let start = (total_length - span_length) / 2.0;
                let end = (total_length + span_length) / 2.0;
                vec![
                    [0.0, 0.0],
                    [start, 0.0],
                    [start, -span_height],
                    [end, -span_height],
                    [end, 0.0],
                    [*total_length, 0.0],
                ]
            }
        }
    }

    /// Check that the geometry describes a discretizable pipeline
    pub fn validate(&self) -> PipelineResult<()> {
        if !self.element_length.is_finite() || self.element_length <= 0.0 {
            return Err(PipelineError::InvalidInput(format!(
                "element length must be positive, got {}",
                self.element_length
            )));
        }

        if let Geometry::Span {
            span_length,
            span_height,
            total_length,
        } = &self.geometry
        {
            if *span_length < 0.0 || *span_height < 0.0 || span_length > total_length {
                return Err(PipelineError::InvalidInput(format!(
                    "span of {} m x {} m does not fit a {} m model",
                    span_length, span_height, total_length
                )));
            }
        }

        let profile = self.seabed_profile();
        if profile.len() < 2 {
            return Err(PipelineError::InvalidInput(
                "seabed profile needs at least two points".to_string(),
            ));
        }
        if profile.windows(2).any(|w| w[1][0] < w[0][0]) {
            return Err(PipelineError::InvalidInput(
                "seabed profile KPs must be ascending".to_string(),
            ));
        }
        if self.element_count() == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "model length is shorter than one {} m element",
                self.element_length
            )));
        }
        Ok(())
    }

    /// First and last KP of the pipeline
    pub fn extent(&self) -> (f64, f64) {
        let profile = self.seabed_profile();
        let first = profile.first().map_or(0.0, |p| p[0]);
        let last = profile.last().map_or(0.0, |p| p[0]);
        (first, last)
    }

    /// Number of beam elements; a trailing partial element is dropped
    pub fn element_count(&self) -> usize {
        let (first, last) = self.extent();
        let n = ((last - first) / self.element_length).floor();
        if n.is_finite() && n > 0.0 {
            n as usize
        } else {
            0
        }
    }

    pub fn node_count(&self) -> usize {
        self.element_count().saturating_add(1)
    }

    /// Seabed elevation at `x`, linear between profile points and held
    /// constant beyond either end.
    pub fn seabed_elevation(&self, x: f64) -> f64 {
        interpolate(&self.seabed_profile(), x)
    }
}

fn interpolate(profile: &[[f64; 2]], x: f64) -> f64 {
    let (Some(first), Some(last)) = (profile.first(), profile.last()) else {
        return 0.0;
    };
    if x <= first[0] {
        return first[1];
    }
    if x >= last[0] {
        return last[1];
    }
    for w in profile.windows(2) {
        let [x0, y0] = w[0];
        let [x1, y1] = w[1];
        if x < x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }
    last[1]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    pub(crate) fn test_model() -> Model {
        Model {
            element_length: 1.0,
            g: 9.81,
            water_depth: 100.0,
            rho_sw: 1025.0,
            geometry: Geometry::Span {
                span_length: 40.0,
                span_height: 1.0,
                total_length: 200.0,
            },
        }
    }

    #[test]
    fn test_span_profile() {
        let profile = test_model().seabed_profile();
        assert_eq!(profile.len(), 6);
        assert_eq!(profile[1], [80.0, 0.0]);
        assert_eq!(profile[2], [80.0, -1.0]);
        assert_eq!(profile[4], [120.0, 0.0]);
        assert_eq!(profile[5], [200.0, 0.0]);
    }

    #[test]
    fn test_node_count() {
        let model = test_model();
        assert_eq!(model.element_count(), 200);
        assert_eq!(model.node_count(), 201);

        let coarse = Model {
            element_length: 3.0,
            ..test_model()
        };
        assert_eq!(coarse.element_count(), 66);
    }

    #[test]
    fn test_seabed_elevation() {
        let model = Model {
            geometry: Geometry::Bathymetry {
                bathymetry: vec![[0.0, 0.0], [10.0, -2.0], [20.0, -2.0]],
            },
            ..test_model()
        };
        assert_relative_eq!(model.seabed_elevation(-5.0), 0.0);
        assert_relative_eq!(model.seabed_elevation(5.0), -1.0);
        assert_relative_eq!(model.seabed_elevation(15.0), -2.0);
        assert_relative_eq!(model.seabed_elevation(25.0), -2.0);
        assert_relative_eq!(test_model().seabed_elevation(100.0), -1.0);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let short = Model {
            geometry: Geometry::Bathymetry {
                bathymetry: vec![[0.0, 0.0]],
            },
            ..test_model()
        };
        assert!(matches!(short.validate(), Err(PipelineError::InvalidInput(_))));

        let reversed = Model {
            geometry: Geometry::Bathymetry {
                bathymetry: vec![[10.0, 0.0], [0.0, 0.0]],
            },
            ..test_model()
        };
        assert!(reversed.validate().is_err());

        let zero_length = Model {
            element_length: 0.0,
            ..test_model()
        };
        assert!(zero_length.validate().is_err());
        assert_eq!(zero_length.element_count(), 0);
        assert_eq!(zero_length.node_count(), 1);

        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let model = Model {
                element_length: bad,
                ..test_model()
            };
            assert!(matches!(model.validate(), Err(PipelineError::InvalidInput(_))));
        }

        assert!(test_model().validate().is_ok());
    }

    #[test]
    fn test_deserialize_both_geometries() {
        let span: Model = serde_json::from_str(
            r#"{"element_length": 1.0, "g": 9.81, "water_depth": 100.0, "rho_sw": 1025.0,
                "span_length": 40.0, "span_height": 1.0, "total_length": 200.0}"#,
        )
        .unwrap();
        assert_eq!(span, test_model());

        let bathy: Model = serde_json::from_str(
            r#"{"element_length": 1.0, "g": 9.81, "water_depth": 100.0, "rho_sw": 1025.0,
                "bathymetry": [[0.0, 0.0], [50.0, -0.5]]}"#,
        )
        .unwrap();
        assert_eq!(bathy.node_count(), 51);
    }
}
