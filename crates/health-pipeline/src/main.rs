mod bootstrap;

use std::process::ExitCode;

use anyhow::Result;
use health_core::error::HealthError;
use health_core::settings::Settings;
use health_core::time_utils::TimezoneHandler;
use health_runtime::data::store::HealthStore;
use health_runtime::orchestrator::PipelineRunner;

/// Exit code for a run that left the store without its cleaned tables.
const EXIT_CRITICAL: u8 = 2;

fn main() -> ExitCode {
    let settings = Settings::load();

    if let Err(e) = bootstrap::ensure_directories()
        .and_then(|_| bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref()))
    {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("Health pipeline v{} starting", env!("CARGO_PKG_VERSION"));
    for warning in &settings.warnings {
        tracing::warn!("{}", warning);
    }

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<HealthError>() {
            Some(health) if health.is_critical() => {
                tracing::error!("{}", health);
                eprintln!(
                    "CRITICAL: {}. The store is incomplete; fix the cause and re-run the full pipeline.",
                    health
                );
                ExitCode::from(EXIT_CRITICAL)
            }
            _ => {
                tracing::error!("{:#}", e);
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn run(settings: &Settings) -> Result<()> {
    let stage = settings.stage()?;
    let now = TimezoneHandler::new(&settings.timezone).now();
    let db_path = settings.db_path();

    tracing::info!(
        "Stage: {:?}, data: {}, store: {}, timezone: {}",
        stage,
        settings.data_dir.display(),
        db_path.display(),
        settings.timezone
    );

    let report = {
        let mut store = HealthStore::open(&db_path)?;
        let runner = PipelineRunner::new(settings.pipeline_config());
        runner.run(&mut store, stage, now)?
    };

    report.log();
    if let Some(path) = &settings.report {
        report.write_to(path)?;
        tracing::info!("Run report written to {}", path.display());
    }

    tracing::info!("Tables successfully stored in {}", db_path.display());
    Ok(())
}
