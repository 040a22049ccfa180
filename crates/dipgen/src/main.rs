use std::ffi::OsStr;
use std::process::ExitCode;
use std::sync::Arc;

use dipgen::pipeline::PipelineReport;
use dipgen::telemetry::{init_tracing, LogFormat};
use dipgen::{load_config, Pipeline, PipelineConfig};

const LOG_FORMAT_ENV: &str = "DIPGEN_LOG_FORMAT";

fn main() -> ExitCode {
    let Some(config_path) = std::env::args_os().nth(1) else {
        eprintln!("usage: dipgen <package-config.json>");
        return ExitCode::from(2);
    };

    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|f| f.parse::<LogFormat>().ok())
        .unwrap_or_default();
    if let Err(e) = init_tracing(format) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    match run(&config_path) {
        Ok(report) => {
            tracing::info!(
                sections = report.sections.len(),
                jobs = report.job_count(),
                metadata = %report.structural_metadata_output.display(),
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Package build failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &OsStr) -> dipgen::Result<PipelineReport> {
    let config = load_config(config_path)?;
    let pipeline_config = PipelineConfig::from_config(&config)?;
    Ok(Pipeline::from_config(Arc::new(pipeline_config)).run()?)
}
