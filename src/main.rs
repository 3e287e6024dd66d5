use clap::Parser;
use log::{error, info};

use crate::core::{
    cli::{Cli, Command},
    configuration::get_configuration,
    logger,
};

mod core;

const DEFAULT_CONFIGURATION_FILE: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let file_path = cli
        .configuration_file
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIGURATION_FILE.to_string());

    let conf = get_configuration(file_path).await?;

    conf.validate()?;

    let level = match cli.verbosity {
        Some(v) => v.to_string(),
        None => conf.log.level.clone().unwrap_or_else(|| "Info".to_string()),
    };

    let _handle = logger::start(
        &level.to_lowercase(),
        &conf.data_directory(),
        conf.log_retention(),
    )?;

    info!("starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let res = match cli.command {
        Command::Register { pooling_interval } => {
            core::core::register(conf, pooling_interval).await
        }
        Command::SessionDiagnostic { show_token } => {
            core::core::session_diagnostic(conf, show_token.unwrap_or(false)).await
        }
        Command::Get { path } => core::core::get(conf, &path).await,
    };

    if let Err(e) = &res {
        error!("{e}");
    }

    res
}
