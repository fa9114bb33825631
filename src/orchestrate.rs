//! Top-level orchestration (C8, §4.8).
//!
//! Drives the backup, restore, and check-facts flows end to end by
//! composing the Device Probe through Reconstructor components in order.
//! Single-threaded, as the rest of the engine assumes (§5).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use tempfile::TempDir;

use pbr_api::constants::{FACTS_DIR, RESCUE_FACTS_DIR};
use pbr_api::facts::factset::{FactDocuments, FactSet};
use pbr_api::policy::Config;

use crate::{collect, matcher, probe, reconstruct, rewrite, topology};

/// Directory the running system keeps its reference facts in, at either
/// backup time (written) or restore time (read back).
fn facts_dir() -> PathBuf {
    if Path::new(RESCUE_FACTS_DIR).is_dir() {
        PathBuf::from(RESCUE_FACTS_DIR)
    } else {
        PathBuf::from(FACTS_DIR)
    }
}

fn write_documents(dir: &Path, docs: &FactDocuments) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create facts dir '{}'", dir.display()))?;
    fs::write(dir.join("disks.json"), &docs.disks)?;
    fs::write(dir.join("lvm.json"), &docs.lvm)?;
    fs::write(dir.join("mnts.json"), &docs.mnts)?;
    fs::write(dir.join("misc.json"), &docs.misc)?;
    Ok(())
}

fn read_documents(dir: &Path) -> Result<FactDocuments> {
    Ok(FactDocuments {
        disks: fs::read_to_string(dir.join("disks.json"))
            .with_context(|| format!("Failed to read '{}'", dir.join("disks.json").display()))?,
        lvm: fs::read_to_string(dir.join("lvm.json"))
            .with_context(|| format!("Failed to read '{}'", dir.join("lvm.json").display()))?,
        mnts: fs::read_to_string(dir.join("mnts.json"))
            .with_context(|| format!("Failed to read '{}'", dir.join("mnts.json").display()))?,
        misc: fs::read_to_string(dir.join("misc.json"))
            .with_context(|| format!("Failed to read '{}'", dir.join("misc.json").display()))?,
    })
}

/// Runs the backup flow (§4.8): collect, filter to policy, persist.
#[tracing::instrument(skip_all)]
pub fn run_backup(config: &Config) -> Result<()> {
    info!("Collecting storage facts");
    let collected = collect::collect_facts().context("Fact collection failed")?;

    info!("Applying backup exclusion policy");
    let filtered = topology::filter(&collected, config);

    let docs = filtered.to_documents().context("Failed to serialize facts")?;
    write_documents(Path::new(FACTS_DIR), &docs)?;
    info!("Wrote reference facts to '{FACTS_DIR}'");

    Ok(())
}

/// Restore-time exclusions (§4.3/§4.4 boundary): `rc_exclude_disks` and
/// `rc_exclude_vgs` narrow the captured set the Disk Matcher ever sees,
/// using the same VG/disk resolution the backup-time filter already
/// implements, just keyed off the restore exclusion lists instead. The
/// scratch directory is registered here too (§4.8), so nothing captured
/// under it is ever matched against or reconstructed onto.
fn apply_restore_exclusions(facts: &FactSet, config: &Config, scratch_path: &Path) -> FactSet {
    let restore_config = Config {
        bk_exclude_disks: config.rc_exclude_disks.clone(),
        bk_exclude_vgs: config.rc_exclude_vgs.clone(),
        bk_exclude_paths: vec![scratch_path.to_path_buf()],
        ..Default::default()
    };
    topology::filter(facts, &restore_config)
}

/// Renames LUKS header backup sidecars to follow a disk rename, matching
/// captured and rewritten containers by UUID (the key is the thing that
/// moves; the container itself is untouched by the Fact Rewriter).
fn rename_luks_headers(
    before: &BTreeMap<String, pbr_api::facts::luks::LuksContainer>,
    after: &BTreeMap<String, pbr_api::facts::luks::LuksContainer>,
    facts_dir: &Path,
) -> Result<()> {
    use pbr_api::facts::luks::LuksContainer;

    let luks_dir = facts_dir.join("luks");
    for (old_key, container) in before {
        let Some((new_key, _)) = after.iter().find(|(_, c)| c.uuid == container.uuid) else {
            continue;
        };
        let old_base = Path::new(old_key).file_name().map(|n| n.to_string_lossy().into_owned());
        let new_base = Path::new(new_key).file_name().map(|n| n.to_string_lossy().into_owned());
        let (Some(old_base), Some(new_base)) = (old_base, new_base) else {
            continue;
        };
        if old_base == new_base {
            continue;
        }

        let old_file = luks_dir.join(LuksContainer::backup_filename(&old_base));
        let new_file = luks_dir.join(LuksContainer::backup_filename(&new_base));
        if old_file.exists() {
            fs::rename(&old_file, &new_file).with_context(|| {
                format!("Failed to rename LUKS header '{}' to '{}'", old_file.display(), new_file.display())
            })?;
        }
    }
    Ok(())
}

/// Unmounts whatever is already mounted at `staging_root`, if anything, so
/// the Reconstructor's Stage 7 starts from a clean mountpoint (§4.8: this
/// runs before the Topology Filter is applied to the restore-time facts).
fn unmount_staging_root(staging_root: &Path) -> Result<()> {
    if osutils::findmnt::find_by_target(staging_root)
        .context("Failed to inspect staging root mount state")?
        .is_some()
    {
        info!("Unmounting existing mount at staging root '{}'", staging_root.display());
        osutils::mount::umount(staging_root, true)
            .with_context(|| format!("Failed to unmount staging root '{}'", staging_root.display()))?;
    }
    Ok(())
}

/// Cleanup routine run on every exit path out of the restore flow (§4.8):
/// steps the process out of the scratch tree before anything tries to
/// remove it, lazy-unmounts the backup location if one was mounted, and
/// only keeps the scratch directory around when the operator asked for it.
fn cleanup_restore(config: &Config, scratch: TempDir, keep_scratch: bool) {
    if let Ok(cwd) = std::env::current_dir() {
        if cwd.starts_with(scratch.path()) {
            let _ = std::env::set_current_dir("/");
        }
    }

    if let Some(bk_mount) = &config.bk_mount {
        match osutils::findmnt::find_by_target(bk_mount) {
            Ok(Some(_)) => {
                if let Err(e) = osutils::mount::umount_lazy(bk_mount) {
                    warn!("Failed to lazy-unmount backup location '{}': {e:#}", bk_mount.display());
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to inspect backup location '{}': {e:#}", bk_mount.display()),
        }
    }

    if keep_scratch {
        info!("Keeping scratch directory at '{}'", scratch.path().display());
        let _ = scratch.into_path();
    }
}

/// Runs the restore flow (§4.8): unmount the staging root, load reference
/// facts, match disks, rewrite facts, reconstruct, assemble the staging
/// root. The scratch directory is always cleaned up unless `keep_scratch`
/// is set, regardless of outcome.
#[tracing::instrument(skip_all)]
pub fn run_restore(config: &Config, keep_scratch: bool) -> Result<()> {
    let scratch = TempDir::new().context("Failed to create scratch directory")?;

    let result = run_restore_inner(config, scratch.path());
    cleanup_restore(config, scratch, keep_scratch);
    result
}

fn run_restore_inner(config: &Config, scratch_path: &Path) -> Result<()> {
    let facts_dir_path = facts_dir();
    info!("Loading reference facts from '{}'", facts_dir_path.display());
    let docs = read_documents(&facts_dir_path)?;
    let captured = FactSet::from_documents(&docs).context("Failed to parse reference facts")?;

    unmount_staging_root(&config.staging_root())?;

    let captured = apply_restore_exclusions(&captured, config, scratch_path);

    info!("Probing live devices");
    let live_devices = probe::enumerate().context("Device probe failed")?;
    let live_disks = collect::collect_disks(&live_devices).context("Failed to collect live disk facts")?;

    info!("Matching captured disks against live hardware");
    let renames = matcher::match_disks(&captured.disks, &live_disks, &matcher::StdinPrompt)
        .context("Disk matching failed")?;

    let rewritten = rewrite::apply_rename_map(&captured, &renames);
    rename_luks_headers(&captured.misc.luks, &rewritten.misc.luks, &facts_dir_path)
        .context("Failed to rename LUKS header sidecars")?;

    reconstruct::reconstruct(
        &rewritten,
        &live_disks,
        &facts_dir_path,
        &config.staging_root(),
        &reconstruct::EnvLuksKeySource,
    )
    .context("Reconstruction failed")
}

/// Runs the check-facts flow (§4.2, Testable Property 7).
pub fn run_check_facts(_config: &Config) -> Result<bool> {
    collect::check_facts(&facts_dir())
}
