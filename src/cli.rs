use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::PBR_VERSION;

#[derive(Parser, Debug)]
#[clap(version = PBR_VERSION)]
pub struct Cli {
    /// Logging verbosity [OFF, ERROR, WARN, INFO, DEBUG, TRACE]
    #[arg(global = true, short, long, default_value_t = LevelFilter::Info)]
    pub verbosity: LevelFilter,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect facts about the running system and archive it to the configured backup location
    Backup {
        /// Path to the policy configuration file
        #[clap(short, long, default_value = "/etc/pbr/config.yaml")]
        config: PathBuf,
    },

    /// Reconstruct the on-disk storage layout described by a previous backup and restore its contents
    Restore {
        /// Path to the policy configuration file
        #[clap(short, long, default_value = "/etc/pbr/config.yaml")]
        config: PathBuf,

        /// Keep the scratch working directory around after the run, even on success
        #[clap(long)]
        keep_scratch: bool,
    },

    /// Collect facts about the running system and compare them against the reference fact set
    #[clap(name = "check-facts")]
    CheckFacts {
        /// Path to the policy configuration file
        #[clap(short, long, default_value = "/etc/pbr/config.yaml")]
        config: PathBuf,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Backup { .. } => "backup",
            Commands::Restore { .. } => "restore",
            Commands::CheckFacts { .. } => "check-facts",
        }
    }
}
