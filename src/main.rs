use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freespan_modes::config::RunConfig;
use freespan_modes::pipeline::Pipeline;
use freespan_modes::solver::AbaqusExecutor;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freespan_modes=info,freespan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(config_path) = args.get(1).map(PathBuf::from) else {
        anyhow::bail!("usage: freespan <config.json> [work_dir]");
    };
    let work_dir = args.get(2).map_or_else(|| PathBuf::from("."), PathBuf::from);

    let config = RunConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    tracing::info!(
        "Using solver: {} ({} cpus)",
        config.solver.executable.display(),
        config.solver.cpus
    );

    let solver = AbaqusExecutor::new(config.solver.clone());
    let mut pipeline = Pipeline::new(&work_dir, config, solver)?;
    let report = pipeline
        .run()
        .with_context(|| format!("run {:?} stopped at {:?}", work_dir, pipeline.stage()))?;

    for mode in report.modes.values() {
        println!("{:3}  {:10.4} Hz  {}", mode.number, mode.frequency, mode.direction);
    }
    Ok(())
}
