//! Sequential static-then-modal analysis run

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::assembly::{modal_deck, static_deck};
use crate::config::RunConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::postprocess::{get_modes, Mode};
use crate::results::{read_gaps, read_nodes, WorkDirResults, GAP_FILE, NODE_FILE};
use crate::scripts::ExtractionScript;
use crate::seabed::{contact_nodes, Gap};
use crate::solver::Solver;

pub const STATIC_JOB: &str = "in_place";
pub const MODAL_JOB: &str = "modal";
pub const REPORT_FILE: &str = "modes.json";

/// Progress of one run. Each stage names the results the run waits for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    AwaitingStaticResults,
    AwaitingGaps,
    AwaitingModalResults,
    ModesReady,
}

/// Final modes of a run, as written to `modes.json`
#[derive(Debug, Clone, Serialize)]
pub struct ModalReport {
    pub run_id: Uuid,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub modes: BTreeMap<usize, Mode>,
}

pub struct Pipeline<S: Solver> {
    run_id: Uuid,
    work_dir: PathBuf,
    config: RunConfig,
    solver: S,
    stage: Stage,
    gaps: Vec<Gap>,
    modes: BTreeMap<usize, Mode>,
}

impl<S: Solver> Pipeline<S> {
    pub fn new(work_dir: impl Into<PathBuf>, config: RunConfig, solver: S) -> PipelineResult<Self> {
        let work_dir = work_dir.into();
        config.model.validate()?;
        fs::create_dir_all(&work_dir)?;

        let run_id = Uuid::new_v4();
        tracing::info!("Run {} in {:?}", run_id, work_dir);

        Ok(Self {
            run_id,
            work_dir,
            config,
            solver,
            stage: Stage::AwaitingStaticResults,
            gaps: Vec::new(),
            modes: BTreeMap::new(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    pub fn modes(&self) -> &BTreeMap<usize, Mode> {
        &self.modes
    }

    fn expect_stage(&self, expected: Stage) -> PipelineResult<()> {
        if self.stage != expected {
            return Err(PipelineError::StageOrder {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    /// Delete files an earlier run left where this run's outputs will appear
    fn remove_stale<I>(&self, files: I) -> PipelineResult<()>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for file in files {
            let path = self.work_dir.join(file);
            if path.is_file() {
                tracing::debug!("Removing stale {:?}", path);
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn database(job: &str) -> PathBuf {
        PathBuf::from(format!("{}.odb", job))
    }

    /// Write and run the in-place job
    pub fn run_static(&mut self) -> PipelineResult<()> {
        self.expect_stage(Stage::AwaitingStaticResults)?;
        self.remove_stale([PathBuf::from(REPORT_FILE), Self::database(STATIC_JOB)])?;

        let deck = static_deck(&self.config.model, &self.config.pipe, &self.config.seabed)?;
        deck.write_to(&self.work_dir.join(format!("{}.inp", STATIC_JOB)))?;
        self.solver.run_job(&self.work_dir, STATIC_JOB)?;

        self.stage = Stage::AwaitingGaps;
        Ok(())
    }

    /// Extract final node positions and seabed gaps from the in-place job
    pub fn extract_gaps(&mut self) -> PipelineResult<()> {
        self.expect_stage(Stage::AwaitingGaps)?;

        let script = ExtractionScript::static_gaps(STATIC_JOB);
        self.remove_stale(script.outputs())?;
        script.write_to(&self.work_dir)?;
        self.solver.run_script(&self.work_dir, &script)?;

        let expected = self.config.model.node_count();
        let gaps = read_gaps(&self.work_dir.join(GAP_FILE))?;
        if gaps.len() != expected {
            return Err(PipelineError::inconsistent(format!(
                "{} lists {} nodes, static model has {}",
                GAP_FILE,
                gaps.len(),
                expected
            )));
        }
        let nodes = read_nodes(&self.work_dir.join(NODE_FILE))?;
        if nodes.len() != expected {
            return Err(PipelineError::inconsistent(format!(
                "{} lists {} nodes, static model has {}",
                NODE_FILE,
                nodes.len(),
                expected
            )));
        }

        tracing::info!(
            "Static run settled with {} of {} nodes on the seabed",
            contact_nodes(&gaps).len(),
            gaps.len()
        );
        self.gaps = gaps;
        self.stage = Stage::AwaitingModalResults;
        Ok(())
    }

    /// Write and run the modal job on the settled configuration
    pub fn run_modal(&mut self) -> PipelineResult<()> {
        self.expect_stage(Stage::AwaitingModalResults)?;
        self.remove_stale([Self::database(MODAL_JOB)])?;

        let deck = modal_deck(
            &self.config.model,
            &self.config.pipe,
            &self.config.seabed,
            &self.gaps,
            &self.config.modal,
        )?;
        deck.write_to(&self.work_dir.join(format!("{}.inp", MODAL_JOB)))?;
        self.solver.run_job(&self.work_dir, MODAL_JOB)
    }

    /// Extract, classify and rotate the modal job's eigenpairs
    pub fn extract_modes(&mut self) -> PipelineResult<&BTreeMap<usize, Mode>> {
        self.expect_stage(Stage::AwaitingModalResults)?;

        let script = ExtractionScript::modal_shapes(MODAL_JOB);
        let results = WorkDirResults::new(&self.work_dir);
        self.remove_stale(script.outputs())?;
        self.remove_stale(results.mode_files()?.into_iter().map(|(_, path)| path))?;
        script.write_to(&self.work_dir)?;
        self.solver.run_script(&self.work_dir, &script)?;

        self.modes = get_modes(&results)?;
        self.stage = Stage::ModesReady;
        Ok(&self.modes)
    }

    pub fn report(&self) -> PipelineResult<ModalReport> {
        self.expect_stage(Stage::ModesReady)?;
        Ok(ModalReport {
            run_id: self.run_id,
            generated_at: Utc::now().to_rfc3339(),
            modes: self.modes.clone(),
        })
    }

    /// Run every stage in order and write `modes.json`
    pub fn run(&mut self) -> PipelineResult<ModalReport> {
        self.run_static()?;
        self.extract_gaps()?;
        self.run_modal()?;
        self.extract_modes()?;

        let report = self.report()?;
        let path = self.work_dir.join(REPORT_FILE);
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        tracing::info!("Wrote {} modes to {:?}", report.modes.len(), path);
        Ok(report)
    }
}
