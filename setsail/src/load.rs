use std::path::Path;

use super::types::{KSLine, KSLineSource};

// function to read file and return array of strings
fn load_to_lines(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.lines().map(|f| f.to_string()).collect())
}

/// Function to convert a list of strings into a list of KSLine
/// It is used to read the contents of a KS file into a list of KSLine
/// The goal is to save each line with its source for error reporting
/// and to preserve the raw string for parsing.
fn lines_to_kslines(lines: Vec<String>, source: KSLineSource) -> Vec<KSLine> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, s)| KSLine {
            lineno: i + 1,
            source: source.clone(),
            raw: s,
        })
        .collect()
}

pub fn load_to_kslines(path: &Path, source: KSLineSource) -> Result<Vec<KSLine>, std::io::Error> {
    Ok(lines_to_kslines(load_to_lines(path)?, source))
}

pub fn load_kickstart_file(filename: &Path) -> Result<Vec<KSLine>, std::io::Error> {
    load_to_kslines(filename, KSLineSource::File(filename.to_owned()))
}

pub fn load_kickstart_string(contents: &str) -> Vec<KSLine> {
    lines_to_kslines(
        contents.lines().map(|f| f.to_string()).collect(),
        KSLineSource::InputString,
    )
}
