use std::cell::RefCell;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use tempfile::TempDir;

use freespan_modes::prelude::*;
use freespan_modes::results::{
    write_frequencies, write_gaps, write_mode_table, write_nodes, NodePosition, GAP_FILE,
    FREQUENCY_FILE, MODE_FILE_PREFIX, NODE_FILE,
};
use freespan_modes::scripts::Extraction;

const CONFIG: &str = r#"{
    "Pipe": {
        "od": 0.1683, "wt": 0.0127, "E": 2.07e11, "nu": 0.3, "alpha": 1.17e-5,
        "rho_steel": 7850.0, "rho_contents": 500.0, "Pi": 1.0e7, "T": 30.0
    },
    "Seabed": {
        "K_vert_sta": 1.0e5, "K_ax_dyn": 2.0e5, "mu_ax": 0.5,
        "K_vert_dyn": 3.0e6, "K_lat_dyn": 1.5e6
    },
    "Model": {
        "element_length": 1.0, "g": 9.81, "water_depth": 80.0, "rho_sw": 1025.0,
        "span_length": 20.0, "span_height": 1.0, "total_length": 60.0
    },
    "Solver": { "executable": "abaqus", "cpus": 2 },
    "Modal": { "num_modes": 4 }
}"#;

const NODES: usize = 61;
const SAG: f64 = -0.3;
const PENETRATION: f64 = -0.005;

/// Stands in for the solver by writing the files each call would produce
struct FakeSolver {
    model: Model,
    frequencies: Vec<f64>,
    shapes: Vec<RawModeShape>,
    gap_nodes: usize,
    /// Number given to the first node of the node seed file
    first_node: usize,
    write_gap_file: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeSolver {
    fn new(model: Model) -> Self {
        Self {
            model,
            frequencies: vec![0.52, 0.81, 1.47, 2.10],
            shapes: vec![
                half_sine([0.0, 1.0, 0.1]),
                half_sine([0.0, 0.3, 0.9]),
                half_sine([1.0, 0.05, 0.0]),
                half_sine([0.0, -1.0, 0.0]),
            ],
            gap_nodes: NODES,
            first_node: 1,
            write_gap_file: true,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn write_static_results(&self, work_dir: &Path) -> PipelineResult<()> {
        let mut gaps = Vec::new();
        let mut nodes = Vec::new();
        for n in 1..=self.gap_nodes {
            let x = (n - 1) as f64 * self.model.element_length;
            let seabed = self.model.seabed_elevation(x);
            let y = (seabed + PENETRATION).max(SAG);
            gaps.push(Gap::new(n, y - seabed));
            nodes.push(NodePosition {
                node: n - 1 + self.first_node,
                x,
                y,
            });
        }
        write_nodes(&work_dir.join(NODE_FILE), &nodes)?;
        if self.write_gap_file {
            write_gaps(&work_dir.join(GAP_FILE), &gaps)?;
        }
        Ok(())
    }

    fn write_modal_results(&self, work_dir: &Path) -> PipelineResult<()> {
        write_frequencies(&work_dir.join(FREQUENCY_FILE), &self.frequencies)?;
        for (i, shape) in self.shapes.iter().enumerate() {
            let name = format!("{}{}.dat", MODE_FILE_PREFIX, i + 1);
            write_mode_table(&work_dir.join(name), shape)?;
        }
        Ok(())
    }
}

impl Solver for FakeSolver {
    fn run_job(&self, work_dir: &Path, job: &str) -> PipelineResult<()> {
        self.calls.borrow_mut().push(job.to_string());
        let input = work_dir.join(format!("{}.inp", job));
        if !input.exists() {
            return Err(PipelineError::MissingFile(input));
        }
        fs::write(work_dir.join(format!("{}.odb", job)), b"")?;
        Ok(())
    }

    fn run_script(&self, work_dir: &Path, script: &ExtractionScript) -> PipelineResult<()> {
        self.calls.borrow_mut().push(script.name.clone());
        assert!(work_dir.join(&script.name).exists());
        match script.extraction {
            Extraction::StaticGaps { .. } => self.write_static_results(work_dir),
            Extraction::ModeShapes { .. } => self.write_modal_results(work_dir),
        }
    }
}

fn half_sine(direction: [f64; 3]) -> RawModeShape {
    let rows: Vec<[f64; 3]> = (0..NODES)
        .map(|i| {
            let s = (PI * i as f64 / (NODES - 1) as f64).sin();
            [direction[0] * s, direction[1] * s, direction[2] * s]
        })
        .collect();
    RawModeShape::from_rows(&rows)
}

fn config() -> RunConfig {
    RunConfig::from_json(CONFIG).unwrap()
}

fn pipeline(dir: &TempDir, solver: FakeSolver) -> Pipeline<FakeSolver> {
    Pipeline::new(dir.path(), config(), solver).unwrap()
}

#[test]
fn test_full_run() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut pipeline = pipeline(&dir, FakeSolver::new(config.model.clone()));
    assert_eq!(pipeline.stage(), Stage::AwaitingStaticResults);

    let report = pipeline.run().unwrap();
    assert_eq!(pipeline.stage(), Stage::ModesReady);

    assert_eq!(report.modes.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_relative_eq!(report.modes[&1].frequency, 0.52);
    assert_relative_eq!(report.modes[&4].frequency, 2.10);
    assert_eq!(report.modes[&1].direction, Direction::CrossFlow);
    assert_eq!(report.modes[&2].direction, Direction::Inline);
    assert_eq!(report.modes[&3].direction, Direction::Axial);
    assert_eq!(report.modes[&4].direction, Direction::CrossFlow);

    // peak of the oblique mode is rotated onto the primary axis
    let oblique = &report.modes[&2].shape;
    assert_eq!(oblique.len(), NODES);
    let peak = oblique[NODES / 2];
    assert_relative_eq!(peak.x, (0.3f64.powi(2) + 0.9f64.powi(2)).sqrt(), epsilon = 1e-12);
    assert_relative_eq!(peak.y, 0.0, epsilon = 1e-12);

    // one solver call per stage, in order
    assert_eq!(
        pipeline.solver().calls.borrow().clone(),
        vec!["in_place", "in_place_pp.py", "modal", "modal_pp.py"]
    );

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("modes.json")).unwrap()).unwrap();
    assert_eq!(json["modes"].as_object().unwrap().len(), 4);
    assert_eq!(json["modes"]["2"]["direction"], "inline");
    assert!(json["run_id"].is_string());
}

#[test]
fn test_job_files_written() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut pipeline = pipeline(&dir, FakeSolver::new(config.model.clone()));
    pipeline.run().unwrap();

    let static_inp = fs::read_to_string(dir.path().join("in_place.inp")).unwrap();
    assert!(static_inp.contains("*ELEMENT, TYPE=PIPE21H, ELSET=PIPELINE\n"));
    assert!(static_inp.contains("*ELGEN, ELSET=PIPELINE\n1, 60\n"));

    let modal_inp = fs::read_to_string(dir.path().join("modal.inp")).unwrap();
    assert!(modal_inp.contains("*FREQUENCY, EIGENSOLVER=LANCZOS\n4\n"));
    assert!(modal_inp.contains("*AQUA\n-80, 0., 9.81, 1025\n"));
    assert!(modal_inp.contains("*SPRING, ELSET=SPR_VERT\n2\n3.000e+06\n"));

    // nodes inside the span hang free, the rest rest on the seabed
    let free = pipeline.gaps().iter().filter(|g| !g.in_contact()).count();
    assert_eq!(free, 20);
    assert_eq!(contact_nodes(pipeline.gaps()).len(), NODES - 20);

    assert!(dir.path().join("in_place_pp.py").exists());
    assert!(dir.path().join("modal_pp.py").exists());
}

#[test]
fn test_stage_order_enforced() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut pipeline = pipeline(&dir, FakeSolver::new(config.model.clone()));

    let err = pipeline.extract_gaps().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::StageOrder {
            expected: Stage::AwaitingGaps,
            actual: Stage::AwaitingStaticResults
        }
    ));
    assert!(pipeline.report().is_err());

    pipeline.run_static().unwrap();
    assert_eq!(pipeline.stage(), Stage::AwaitingGaps);
    assert!(matches!(pipeline.run_static(), Err(PipelineError::StageOrder { .. })));
    assert!(matches!(pipeline.run_modal(), Err(PipelineError::StageOrder { .. })));

    pipeline.extract_gaps().unwrap();
    assert_eq!(pipeline.stage(), Stage::AwaitingModalResults);
    pipeline.run_modal().unwrap();
    pipeline.extract_modes().unwrap();
    assert_eq!(pipeline.stage(), Stage::ModesReady);
}

#[test]
fn test_frequency_count_mismatch_aborts() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut solver = FakeSolver::new(config.model.clone());
    solver.frequencies.pop();
    let mut pipeline = pipeline(&dir, solver);

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::InconsistentResultData(_)));
    assert_eq!(pipeline.stage(), Stage::AwaitingModalResults);
    assert!(pipeline.modes().is_empty());
    assert!(!dir.path().join("modes.json").exists());
}

#[test]
fn test_missing_gap_file_aborts() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut solver = FakeSolver::new(config.model.clone());
    solver.write_gap_file = false;
    let mut pipeline = pipeline(&dir, solver);

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, PipelineError::MissingFile(ref p) if p.ends_with(GAP_FILE)));
    assert_eq!(pipeline.stage(), Stage::AwaitingGaps);
    assert!(!dir.path().join("modal.inp").exists());
}

#[test]
fn test_gap_count_mismatch_aborts() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut solver = FakeSolver::new(config.model.clone());
    solver.gap_nodes = NODES - 1;
    let mut pipeline = pipeline(&dir, solver);

    pipeline.run_static().unwrap();
    let err = pipeline.extract_gaps().unwrap_err();
    assert!(matches!(err, PipelineError::InconsistentResultData(_)));
    assert_eq!(pipeline.stage(), Stage::AwaitingGaps);
}

#[test]
fn test_node_file_numbering_checked() {
    let dir = TempDir::new().unwrap();
    let config = config();
    let mut solver = FakeSolver::new(config.model.clone());
    solver.first_node = 0;
    let mut pipeline = pipeline(&dir, solver);

    pipeline.run_static().unwrap();
    let err = pipeline.extract_gaps().unwrap_err();
    assert!(matches!(err, PipelineError::InconsistentResultData(_)));
    assert_eq!(pipeline.stage(), Stage::AwaitingGaps);
}

#[test]
fn test_rerun_does_not_read_previous_gaps() {
    let dir = TempDir::new().unwrap();
    let config = config();
    pipeline(&dir, FakeSolver::new(config.model.clone())).run().unwrap();
    assert!(dir.path().join(GAP_FILE).exists());
    assert!(dir.path().join("modes.json").exists());

    let mut solver = FakeSolver::new(config.model.clone());
    solver.write_gap_file = false;
    let mut rerun = pipeline(&dir, solver);

    let err = rerun.run().unwrap_err();
    assert!(matches!(err, PipelineError::MissingFile(ref p) if p.ends_with(GAP_FILE)));
    assert_eq!(rerun.stage(), Stage::AwaitingGaps);
    assert!(!dir.path().join("modes.json").exists());
}

#[test]
fn test_rerun_with_fewer_modes() {
    let dir = TempDir::new().unwrap();
    let config = config();
    pipeline(&dir, FakeSolver::new(config.model.clone())).run().unwrap();
    assert!(dir.path().join(format!("{}4.dat", MODE_FILE_PREFIX)).exists());

    let mut solver = FakeSolver::new(config.model.clone());
    solver.frequencies.truncate(2);
    solver.shapes.truncate(2);
    let mut rerun = pipeline(&dir, solver);

    let report = rerun.run().unwrap();
    assert_eq!(report.modes.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    assert!(!dir.path().join(format!("{}3.dat", MODE_FILE_PREFIX)).exists());
    assert!(!dir.path().join(format!("{}4.dat", MODE_FILE_PREFIX)).exists());
}
