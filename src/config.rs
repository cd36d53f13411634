//! Run configuration loaded from a JSON document

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::geometry::Model;
use crate::seabed::Seabed;
use crate::section::Pipe;

/// How the external solver is launched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Solver launcher, e.g. `abaqus` or a full path to `abaqus.bat`
    pub executable: PathBuf,
    /// Worker count passed to each job
    #[serde(default = "default_cpus")]
    pub cpus: usize,
}

fn default_cpus() -> usize {
    1
}

/// Eigenvalue extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalSettings {
    /// Number of lowest modes requested from the solver
    pub num_modes: usize,
}

impl Default for ModalSettings {
    fn default() -> Self {
        Self { num_modes: 20 }
    }
}

/// Everything one analysis run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "Pipe")]
    pub pipe: Pipe,
    #[serde(rename = "Seabed")]
    pub seabed: Seabed,
    #[serde(rename = "Model")]
    pub model: Model,
    #[serde(rename = "Solver")]
    pub solver: SolverConfig,
    #[serde(rename = "Modal", default)]
    pub modal: ModalSettings,
}

impl RunConfig {
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.model.validate()?;
        if config.modal.num_modes == 0 {
            return Err(PipelineError::InvalidInput(
                "at least one mode must be requested".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        if !path.exists() {
            return Err(PipelineError::MissingFile(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
