pub mod cli;
pub mod collect;
pub mod compare;
pub mod config;
pub mod matcher;
pub mod orchestrate;
pub mod probe;
pub mod reconstruct;
pub mod rewrite;
pub mod topology;

pub const PBR_VERSION: &str = env!("CARGO_PKG_VERSION");
