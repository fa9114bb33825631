//! Disk matching (C4, §4.4).
//!
//! Reconciles the captured disk map from a backup's `FactSet` against the
//! disks actually present on the recovery host, producing a rename map the
//! Fact Rewriter (C5) applies before reconstruction. The operator prompt is
//! an injectable port: production reads a line from stdin, tests supply a
//! deterministic prompter.

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use pbr_api::error::PbrError;
use pbr_api::facts::disk::Disk;

/// A `(old_path, new_path)` mapping, in application order. Identity pairs
/// (a disk matched at its own path) are never included.
pub type RenameMap = Vec<(String, String)>;

/// Injectable operator prompt for disambiguating ambiguous disk matches.
pub trait DiskPrompt {
    /// Presents `candidates` for captured disk `captured_path` and returns
    /// the operator's chosen live path.
    fn choose(&self, captured_path: &str, candidates: &[String]) -> Result<String>;
}

/// Reads a line from stdin, printing the prompt to stderr first.
pub struct StdinPrompt;

impl DiskPrompt for StdinPrompt {
    fn choose(&self, captured_path: &str, candidates: &[String]) -> Result<String> {
        eprintln!(
            "Multiple candidate disks for '{captured_path}': {}",
            candidates.join(", ")
        );
        eprint!("Enter the live disk path to use: ");
        io::stderr().flush().ok();

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read operator response from stdin")?;
        Ok(line.trim().to_string())
    }
}

/// Deterministic test double returning a fixed sequence of answers.
pub struct FixedPrompt {
    answers: std::cell::RefCell<VecDeque<String>>,
}

impl FixedPrompt {
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: std::cell::RefCell::new(answers.into_iter().map(Into::into).collect()),
        }
    }
}

impl DiskPrompt for FixedPrompt {
    fn choose(&self, captured_path: &str, _candidates: &[String]) -> Result<String> {
        self.answers
            .borrow_mut()
            .pop_front()
            .with_context(|| format!("No more scripted answers for '{captured_path}'"))
    }
}

fn is_multipath_path(path: &str) -> bool {
    path.starts_with("/dev/mapper/")
}

/// Matches every captured disk against the live disk set, per the
/// three-tier procedure in §4.4. Returns the rename map to apply before
/// reconstruction.
pub fn match_disks(
    captured: &BTreeMap<String, Disk>,
    live: &BTreeMap<String, Disk>,
    prompt: &dyn DiskPrompt,
) -> Result<RenameMap> {
    let mut remaining_live: BTreeMap<String, Disk> = live.clone();
    let mut renames = RenameMap::new();

    for (old_path, captured_disk) in captured {
        // Tier 1: name match. Whether or not the serial also matches, a
        // same-path candidate only succeeds when its size agrees too.
        if let Some(live_disk) = remaining_live.get(old_path) {
            if captured_disk.size == live_disk.size {
                remaining_live.remove(old_path);
                // old_path == old_path: identity, never recorded.
                continue;
            }
        }

        // Tier 2: scan remaining live disks.
        let mut serial_match = None;
        let mut size_candidates: Vec<String> = Vec::new();
        let mut larger_candidates: Vec<String> = Vec::new();

        for (live_path, live_disk) in &remaining_live {
            if is_multipath_path(old_path) != is_multipath_path(live_path) {
                continue;
            }

            let serial_matches = matches!(
                (&captured_disk.id_serial, &live_disk.id_serial),
                (Some(cs), Some(ls)) if cs == ls
            );

            if serial_matches && captured_disk.size == live_disk.size {
                serial_match = Some(live_path.clone());
                break;
            } else if live_disk.size == captured_disk.size {
                size_candidates.push(live_path.clone());
            } else if live_disk.size > captured_disk.size {
                larger_candidates.push(live_path.clone());
            }
            // live_disk.size < captured_disk.size: neither a size nor
            // larger candidate; handled by the fatal check below once no
            // other candidate exists at all.
        }

        let new_path = if let Some(new_path) = serial_match {
            new_path
        } else if size_candidates.len() == 1 && larger_candidates.is_empty() {
            size_candidates.remove(0)
        } else if !size_candidates.is_empty() || !larger_candidates.is_empty() {
            let mut candidates = size_candidates.clone();
            candidates.extend(larger_candidates.iter().cloned());
            let chosen = prompt
                .choose(old_path, &candidates)
                .with_context(|| format!("Operator prompt failed for disk '{old_path}'"))?;
            if !candidates.contains(&chosen) || !remaining_live.contains_key(&chosen) {
                return Err(PbrError::Exists(format!(
                    "'{chosen}', which is not a valid candidate for '{old_path}'"
                ))
                .into());
            }
            chosen
        } else {
            return Err(PbrError::Exists(format!(
                "a disk large enough to host captured disk '{old_path}' (size {})",
                captured_disk.size
            ))
            .into());
        };

        remaining_live.remove(&new_path);
        if new_path != *old_path {
            renames.push((old_path.clone(), new_path));
        }
    }

    Ok(renames)
}
