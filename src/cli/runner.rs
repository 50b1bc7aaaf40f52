use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use smapstack::api::{self, StackOptions};
use smapstack::core::params::PipelineConfig;
use smapstack::types::LogLevel;

use super::args::{CliArgs, Command};
use super::errors::AppError;

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("smapstack={}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, AppError> {
    let path = path.ok_or(AppError::MissingArgument {
        arg: "--config".to_string(),
    })?;
    let mut config = PipelineConfig::from_file(path).map_err(smapstack::Error::from)?;
    config.apply_env();
    Ok(config)
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        init_logging(args.log_level);
    }

    match args.command {
        Command::Token => {
            let config = load_config(args.config.as_deref())?;
            api::authenticate(&config).map_err(AppError::from)?;
            println!("Credentials accepted");
        }
        Command::Fetch => {
            let config = load_config(args.config.as_deref())?;
            let report = api::fetch(&config).map_err(AppError::from)?;
            info!(
                "Fetched {:?} ({} bytes), extracted {} files",
                report.archive, report.bytes, report.extracted.files
            );
            println!("{}", report.extract_dir.display());
        }
        Command::Stack {
            input_dir,
            output,
            overwrite,
        } => {
            let report = api::stack_directory(&input_dir, &output, &StackOptions { overwrite })
                .map_err(AppError::from)?;
            println!(
                "Stacked {} bands ({}x{}) into {}",
                report.bands.len(),
                report.width,
                report.height,
                report.output.display()
            );
        }
        Command::Run { output, overwrite } => {
            let mut config = load_config(args.config.as_deref())?;
            if let Some(output) = output {
                config.output = output;
            }
            config.overwrite |= overwrite;
            let report = api::run_pipeline(&config).map_err(AppError::from)?;
            println!(
                "Stacked {} bands ({}x{}) from {} into {}",
                report.stack.bands.len(),
                report.stack.width,
                report.stack.height,
                report.fetch.archive.display(),
                report.stack.output.display()
            );
        }
    }

    Ok(())
}
