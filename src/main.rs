use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::info;

use pbr::cli::{Cli, Commands};
use pbr_api::error::PbrError;
use pbr::{config, orchestrate};

fn init_logger(verbosity: log::LevelFilter) {
    Builder::new()
        .filter_level(verbosity)
        .format_timestamp_millis()
        .init();
}

fn require_root() -> Result<()> {
    if !nix::unistd::geteuid().is_root() {
        return Err(PbrError::General("must run as root".to_string()).into());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbosity);

    info!(
        "Starting pbr {}, command '{}'",
        pbr::PBR_VERSION,
        cli.command.name()
    );

    match cli.command {
        Commands::Backup { config: config_path } => {
            let config = config::load(&config_path)
                .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
            orchestrate::run_backup(&config)
        }
        Commands::Restore {
            config: config_path,
            keep_scratch,
        } => {
            require_root()?;
            let config = config::load(&config_path)
                .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
            orchestrate::run_restore(&config, keep_scratch)
        }
        Commands::CheckFacts { config: config_path } => {
            let config = config::load(&config_path)
                .with_context(|| format!("Failed to load config '{}'", config_path.display()))?;
            if orchestrate::run_check_facts(&config)? {
                info!("Facts match the reference set");
                Ok(())
            } else {
                Err(PbrError::General("collected facts do not match the reference set".to_string()).into())
            }
        }
    }
}
