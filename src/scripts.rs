//! Result extraction scripts run inside the solver's scripting environment
//!
//! The solver database can only be queried from the solver's own Python
//! interpreter. These scripts read the final displaced configuration or the
//! extracted eigenpairs and dump them as plain text files that the rest of
//! the pipeline parses.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::results::{FREQUENCY_FILE, GAP_FILE, MODE_FILE_PREFIX, NODE_FILE};

/// Step holding both static load stages' final state or the eigenpairs
pub const RESULT_STEP: &str = "Step-2";
/// Part instance carrying the pipeline nodes
pub const PIPE_INSTANCE: &str = "PART-1-1";
/// Rigid instance carrying the analytic seabed surface
pub const SEABED_INSTANCE: &str = "SEABED";

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Displaced node positions and seabed gaps from the last static frame
    StaticGaps {
        nodes_file: String,
        gaps_file: String,
    },
    /// One displacement table per eigenmode plus the frequency list
    ModeShapes {
        mode_prefix: String,
        frequency_file: String,
    },
}

/// What to pull out of one solver results database
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionScript {
    /// Script file name, relative to the work directory
    pub name: String,
    /// Results database written by the job
    pub database: String,
    pub step: String,
    pub instance: String,
    pub extraction: Extraction,
}

impl ExtractionScript {
    /// Gap and node seed extraction for the in-place job
    pub fn static_gaps(job: &str) -> Self {
        Self {
            name: format!("{}_pp.py", job),
            database: format!("{}.odb", job),
            step: RESULT_STEP.to_string(),
            instance: PIPE_INSTANCE.to_string(),
            extraction: Extraction::StaticGaps {
                nodes_file: NODE_FILE.to_string(),
                gaps_file: GAP_FILE.to_string(),
            },
        }
    }

    /// Mode shape and frequency extraction for the modal job
    pub fn modal_shapes(job: &str) -> Self {
        Self {
            name: format!("{}_pp.py", job),
            database: format!("{}.odb", job),
            step: RESULT_STEP.to_string(),
            instance: PIPE_INSTANCE.to_string(),
            extraction: Extraction::ModeShapes {
                mode_prefix: MODE_FILE_PREFIX.to_string(),
                frequency_file: FREQUENCY_FILE.to_string(),
            },
        }
    }

    /// Files the script must leave behind in the work directory.
    ///
    /// Mode files are not listed since their number depends on the run.
    pub fn outputs(&self) -> Vec<PathBuf> {
        match &self.extraction {
            Extraction::StaticGaps {
                nodes_file,
                gaps_file,
            } => vec![PathBuf::from(nodes_file), PathBuf::from(gaps_file)],
            Extraction::ModeShapes { frequency_file, .. } => vec![PathBuf::from(frequency_file)],
        }
    }

    pub fn render(&self) -> String {
        let mut py = String::new();
        py.push_str("import numpy as np\n\n");
        py.push_str("import odbAccess\n\n");
        py.push_str(&format!("odb = odbAccess.openOdb(\"{}\")\n", self.database));

        match &self.extraction {
            Extraction::StaticGaps {
                nodes_file,
                gaps_file,
            } => {
                py.push_str(&format!("u = odb.steps[\"{}\"].frames[-1].fieldOutputs[\"U\"]\n", self.step));
                py.push_str(&format!("n = odb.rootAssembly.instances[\"{}\"].nodes\n", self.instance));
                py.push_str(&format!(
                    "seabed_segments = odb.rootAssembly.instances[\"{}\"].analyticSurface.segments\n\n",
                    SEABED_INSTANCE
                ));
                py.push_str("seabed_surface = np.zeros((len(seabed_segments), 2))\n");
                py.push_str("for i in range(len(seabed_segments)):\n");
                py.push_str("    coords = seabed_segments[i].data[0]\n");
                py.push_str("    seabed_surface[i, 0] = coords[0]\n");
                py.push_str("    seabed_surface[i, 1] = coords[1]\n\n");
                py.push_str(&format!("with open(\"{}\", \"w\") as f:\n", nodes_file));
                py.push_str("    f.write(\"*NODE, NSET=PIPE\\n\")\n\n");
                py.push_str(&format!("    with open(\"{}\", \"w\") as c:\n", gaps_file));
                // last instance node is the seabed reference node
                py.push_str("        for i in range(len(n) - 1):\n");
                py.push_str("            x = n[i].coordinates[0] + u.values[i].data[0]\n");
                py.push_str("            y = n[i].coordinates[1] + u.values[i].data[1]\n");
                py.push_str("            node = i + 1\n");
                py.push_str("            sb_elevation = np.interp(x, seabed_surface[:, 0], seabed_surface[:, 1])\n");
                py.push_str("            f.write(\"{0:4d}, {1:9.3e}, {2:9.3e}, 0\\n\".format(node, x, y))\n");
                py.push_str("            c.write(\"{0:4d}, {1:9.3e}\\n\".format(node, y - sb_elevation))\n");
            }
            Extraction::ModeShapes {
                mode_prefix,
                frequency_file,
            } => {
                py.push('\n');
                py.push_str(&format!("s = odb.steps[\"{}\"]\n", self.step));
                py.push_str(&format!("nodes = odb.rootAssembly.instances[\"{}\"].nodes\n\n", self.instance));
                py.push_str("freqs = []\n\n");
                // frame 0 is the base state, eigenmodes start at frame 1
                py.push_str("for m in range(1, len(s.frames)):\n");
                py.push_str("    f = s.frames[m]\n");
                py.push_str("    freqs.append(f.frequency)\n");
                py.push_str("    ms = np.zeros((len(nodes), 3))\n");
                py.push_str("    for n in range(len(nodes)):\n");
                py.push_str("        ms[n, :] = f.fieldOutputs[\"U\"].values[n].data\n");
                py.push_str(&format!(
                    "    np.savetxt(\"{}{{0}}.dat\".format(m), ms, delimiter=\",\")\n\n",
                    mode_prefix
                ));
                py.push_str(&format!("np.savetxt(\"{}\", freqs, delimiter=\",\")\n", frequency_file));
            }
        }
        py
    }

    /// Write the script into `work_dir` and return its path
    pub fn write_to(&self, work_dir: &Path) -> PipelineResult<PathBuf> {
        let path = work_dir.join(&self.name);
        fs::write(&path, self.render())?;
        Ok(path)
    }
}
