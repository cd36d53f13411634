//! Freespan Modes - natural modes of subsea pipeline free spans
//!
//! The pipeline is analysed in two solver runs driven from here:
//! - an in-place static run that settles the pipe onto the seabed under
//!   self-weight, then internal pressure and temperature
//! - a modal run on the settled shape with soil springs at every contact node
//!   and gap-dependent hydrodynamic added mass
//!
//! The natural modes are then classified (axial, cross-flow or inline) and
//! rotated so that each mode's peak lies along one axis.
//!
//! ## Example
//! ```no_run
//! use freespan_modes::prelude::*;
//!
//! let config = RunConfig::from_file(std::path::Path::new("run.json")).unwrap();
//! let solver = AbaqusExecutor::new(config.solver.clone());
//! let mut pipeline = Pipeline::new("work", config, solver).unwrap();
//!
//! let report = pipeline.run().unwrap();
//! for mode in report.modes.values() {
//!     println!("{} {:.3} Hz {}", mode.number, mode.frequency, mode.direction);
//! }
//! ```

pub mod assembly;
pub mod config;
pub mod deck;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod postprocess;
pub mod results;
pub mod scripts;
pub mod seabed;
pub mod section;
pub mod solver;

// Re-export common types
pub mod prelude {
    pub use crate::assembly::{modal_deck, static_deck};
    pub use crate::config::{ModalSettings, RunConfig, SolverConfig};
    pub use crate::deck::{Card, Deck};
    pub use crate::error::{PipelineError, PipelineResult};
    pub use crate::geometry::{Geometry, Model};
    pub use crate::pipeline::{ModalReport, Pipeline, Stage};
    pub use crate::postprocess::{
        classify_direction, get_modes, rotate_mode, Direction, Mode, RawModeShape,
    };
    pub use crate::results::{ModalResultSource, WorkDirResults};
    pub use crate::scripts::ExtractionScript;
    pub use crate::seabed::{added_mass_coefficient, contact_nodes, Gap, Seabed};
    pub use crate::section::{area, Pipe};
    pub use crate::solver::{AbaqusExecutor, Solver};
}
