use std::path::Path;

use anyhow::{Context, Error};

use crate::dependencies::Dependency;

pub fn available_space_in_fs(path: impl AsRef<Path>) -> Result<u64, Error> {
    let output = Dependency::Df
        .cmd()
        .arg(path.as_ref())
        .args(["-B", "1", "--output=avail"]) // Return available space in directory in bytes
        .output_and_check()
        .context("Failed to execute df")?;

    parse_df_available_space_output(output)
}

fn parse_df_available_space_output(output: String) -> Result<u64, Error> {
    output
        .lines()
        .nth(1) // Skip the header line
        .context("Failed to access available space output from df")?
        .parse::<u64>()
        .context("Failed to parse available space")
}
