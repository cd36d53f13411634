//! Seabed contact and soil-pipe interaction
//!
//! Static gaps from the in-place run decide which nodes rest on the seabed.
//! Contacting nodes receive uncoupled axial, vertical and lateral springs and
//! every element receives a hydrodynamic added-mass coefficient that depends
//! on its clearance above the seabed.

use serde::{Deserialize, Serialize};

use crate::geometry::Model;
use crate::section::Pipe;

/// Added-mass coefficient of a pipe resting on the seabed
pub const ADDED_MASS_ON_SEABED: f64 = 2.28;
/// Added-mass coefficient of a cylinder far from any boundary
pub const ADDED_MASS_FREE_FIELD: f64 = 1.0;
/// Clearance ratio e/D from which the free-field coefficient applies
pub const FREE_FIELD_CLEARANCE_RATIO: f64 = 0.8;

/// Dynamic vertical and lateral soil stiffness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicStiffness {
    /// Stiffnesses per unit length given directly, in N/m/m
    Direct {
        #[serde(rename = "K_vert_dyn")]
        k_vert_dyn: f64,
        #[serde(rename = "K_lat_dyn")]
        k_lat_dyn: f64,
    },
    /// Stiffnesses derived from soil coefficients and pipe submergence
    Correlated {
        #[serde(rename = "C_V")]
        c_v: f64,
        #[serde(rename = "C_L")]
        c_l: f64,
        /// Poisson's ratio of the soil
        nu: f64,
    },
}

/// Seabed soil parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seabed {
    /// Static vertical contact stiffness used by the in-place run
    #[serde(rename = "K_vert_sta")]
    pub k_vert_sta: f64,
    /// Dynamic axial stiffness per unit length
    #[serde(rename = "K_ax_dyn")]
    pub k_ax_dyn: f64,
    /// Axial friction coefficient
    pub mu_ax: f64,
    #[serde(flatten)]
    pub dynamic: DynamicStiffness,
}

impl Seabed {
    /// Axial spring stiffness of one contact node
    pub fn axial_stiffness(&self, model: &Model) -> f64 {
        self.k_ax_dyn * model.element_length
    }

    /// Vertical spring stiffness of one contact node
    pub fn vertical_stiffness(&self, pipe: &Pipe, model: &Model) -> f64 {
        let per_length = match &self.dynamic {
            DynamicStiffness::Direct { k_vert_dyn, .. } => *k_vert_dyn,
            DynamicStiffness::Correlated { c_v, nu, .. } => {
                c_v / (1.0 - nu) * submergence_factor(pipe, model) * pipe.od.sqrt()
            }
        };
        per_length * model.element_length
    }

    /// Lateral spring stiffness of one contact node
    pub fn lateral_stiffness(&self, pipe: &Pipe, model: &Model) -> f64 {
        let per_length = match &self.dynamic {
            DynamicStiffness::Direct { k_lat_dyn, .. } => *k_lat_dyn,
            DynamicStiffness::Correlated { c_l, nu, .. } => {
                c_l * (1.0 + nu) * submergence_factor(pipe, model) * pipe.od.sqrt()
            }
        };
        per_length * model.element_length
    }

    pub fn contact_springs(&self, pipe: &Pipe, model: &Model) -> ContactSprings {
        ContactSprings {
            axial: self.axial_stiffness(model),
            vertical: self.vertical_stiffness(pipe, model),
            lateral: self.lateral_stiffness(pipe, model),
        }
    }
}

fn submergence_factor(pipe: &Pipe, model: &Model) -> f64 {
    2.0 / 3.0 * pipe.submerged_density_ratio(model.rho_sw) + 1.0 / 3.0
}

/// Spring stiffnesses instantiated at every contact node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContactSprings {
    pub axial: f64,
    pub vertical: f64,
    pub lateral: f64,
}

/// Vertical clearance of one node above the seabed after the static run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// 1-based node number
    pub node: usize,
    /// Signed clearance in m, negative when penetrating
    pub gap: f64,
}

impl Gap {
    pub fn new(node: usize, gap: f64) -> Self {
        Self { node, gap }
    }

    pub fn in_contact(&self) -> bool {
        self.gap <= 0.0
    }
}

/// Nodes resting on or penetrating the seabed, in node order
pub fn contact_nodes(gaps: &[Gap]) -> Vec<usize> {
    gaps.iter().filter(|g| g.in_contact()).map(|g| g.node).collect()
}

/// Added-mass coefficient for clearance `e` above the seabed and diameter `d`.
///
/// The proximity curve tends to 0.68 + 1.6 / 5 as e/D approaches 0.8 from
/// below; from 0.8 on the free-field value is returned as a separate regime.
pub fn added_mass_coefficient(e: f64, d: f64) -> f64 {
    if e <= 0.0 {
        return ADDED_MASS_ON_SEABED;
    }
    let ratio = e / d;
    if ratio < FREE_FIELD_CLEARANCE_RATIO {
        return 0.68 + 1.6 / (1.0 + 5.0 * ratio);
    }
    ADDED_MASS_FREE_FIELD
}

/// One added-mass coefficient per element, from the mean gap of its end nodes
/// floored at zero.
pub fn segment_added_mass(gaps: &[Gap], od: f64) -> Vec<f64> {
    gaps.windows(2)
        .map(|w| {
            let mean = ((w[0].gap + w[1].gap) / 2.0).max(0.0);
            added_mass_coefficient(mean, od)
        })
        .collect()
}
