//! External solver invocation
//!
//! Every call blocks until the solver process exits. Success is judged by the
//! exit status and by the presence of the files the call is expected to leave
//! in the work directory.

use std::path::Path;
use std::process::{Command, Output};

use crate::config::SolverConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::scripts::ExtractionScript;

/// Runs analysis jobs and result extraction scripts in a work directory
pub trait Solver {
    /// Run the job described by `<job>.inp` and leave `<job>.odb` behind
    fn run_job(&self, work_dir: &Path, job: &str) -> PipelineResult<()>;

    /// Run an extraction script already written to `work_dir`
    fn run_script(&self, work_dir: &Path, script: &ExtractionScript) -> PipelineResult<()>;
}

/// Command-line launcher for the Abaqus solver
pub struct AbaqusExecutor {
    config: SolverConfig,
}

impl AbaqusExecutor {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Arguments for a non-interactive analysis run of `job`
    pub fn job_args(&self, job: &str) -> Vec<String> {
        vec![
            format!("j={}", job),
            "ask_delete=no".to_string(),
            format!("cpus={}", self.config.cpus),
            "-int".to_string(),
        ]
    }

    pub fn script_args(&self, script: &ExtractionScript) -> Vec<String> {
        vec!["python".to_string(), script.name.clone()]
    }

    fn execute(&self, work_dir: &Path, label: &str, args: &[String]) -> PipelineResult<()> {
        tracing::info!(
            "Running command: {} {} (in {:?})",
            self.config.executable.display(),
            args.join(" "),
            work_dir
        );

        let output = Command::new(&self.config.executable)
            .args(args)
            .current_dir(work_dir)
            .output()
            .map_err(|e| {
                PipelineError::SolverLaunch(format!(
                    "{}: {}",
                    self.config.executable.display(),
                    e
                ))
            })?;

        check_status(label, &output)
    }
}

fn check_status(label: &str, output: &Output) -> PipelineResult<()> {
    if output.status.success() {
        tracing::debug!("{} finished: {}", label, output.status);
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    tracing::error!("{} failed. Stderr: {}\nStdout: {}", label, stderr, stdout);
    Err(PipelineError::SolverFailed {
        job: label.to_string(),
        status: output.status.to_string(),
    })
}

fn require_output(work_dir: &Path, label: &str, file: &Path) -> PipelineResult<()> {
    if work_dir.join(file).exists() {
        return Ok(());
    }
    Err(PipelineError::MissingOutput {
        job: label.to_string(),
        file: file.to_path_buf(),
    })
}

impl Solver for AbaqusExecutor {
    fn run_job(&self, work_dir: &Path, job: &str) -> PipelineResult<()> {
        self.execute(work_dir, job, &self.job_args(job))?;
        require_output(work_dir, job, Path::new(&format!("{}.odb", job)))
    }

    fn run_script(&self, work_dir: &Path, script: &ExtractionScript) -> PipelineResult<()> {
        self.execute(work_dir, &script.name, &self.script_args(script))?;
        for file in script.outputs() {
            require_output(work_dir, &script.name, &file)?;
        }
        Ok(())
    }
}
