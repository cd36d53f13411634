//! Pipe cross-section and material properties

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Area of an annulus with the given outer and inner diameters.
///
/// Pass `0.0` as `inner_diameter` for a solid circle. The inner diameter must
/// not exceed the outer one.
pub fn area(outer_diameter: f64, inner_diameter: f64) -> f64 {
    PI * (outer_diameter.powi(2) - inner_diameter.powi(2)) / 4.0
}

/// Steel pipe with contents, pressure and temperature loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Outer diameter in m
    pub od: f64,
    /// Wall thickness in m
    pub wt: f64,
    /// Young's modulus in Pa
    #[serde(rename = "E")]
    pub e: f64,
    /// Poisson's ratio of steel
    pub nu: f64,
    /// Thermal expansion coefficient in 1/°C
    pub alpha: f64,
    /// Steel density in kg/m³
    pub rho_steel: f64,
    /// Contents density in kg/m³
    pub rho_contents: f64,
    /// Internal pressure in Pa
    #[serde(rename = "Pi")]
    pub pi: f64,
    /// Temperature differential in °C
    #[serde(rename = "T")]
    pub t: f64,
}

impl Pipe {
    pub fn inner_diameter(&self) -> f64 {
        self.od - 2.0 * self.wt
    }

    /// Steel cross-section area in m²
    pub fn steel_area(&self) -> f64 {
        area(self.od, self.inner_diameter())
    }

    /// Bore (contents) area in m²
    pub fn bore_area(&self) -> f64 {
        area(self.inner_diameter(), 0.0)
    }

    /// Steel plus contents mass in kg/m
    pub fn mass_per_length(&self) -> f64 {
        self.steel_area() * self.rho_steel + self.bore_area() * self.rho_contents
    }

    /// Density that carries the contents mass on the steel section, in kg/m³
    pub fn effective_density(&self) -> f64 {
        self.mass_per_length() / self.steel_area()
    }

    /// Axial stress of a fully restrained pipe under pressure and temperature.
    ///
    /// Tension positive.
    pub fn effective_axial_stress(&self) -> f64 {
        let a_steel = self.steel_area();
        let eaf = self.pi * self.bore_area() * (1.0 - 2.0 * self.nu)
            + self.e * a_steel * self.alpha * self.t;
        eaf / a_steel
    }

    /// Pipe density over the full outer-diameter area, relative to seawater
    pub fn submerged_density_ratio(&self, seawater_density: f64) -> f64 {
        let rho_pipe = self.mass_per_length() / area(self.od, 0.0);
        rho_pipe / seawater_density
    }
}
