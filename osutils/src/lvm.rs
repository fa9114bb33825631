use std::path::Path;

use anyhow::{Context, Error};
use duct::cmd;
use serde::Deserialize;

/// Raw `pvs`/`vgs`/`lvs --reportformat json` shape, before it's folded into
/// `pbr_api::facts::LvmReport` (§3, §4.1).
#[derive(Debug, Deserialize)]
struct Report {
    report: Vec<ReportBody>,
}

#[derive(Debug, Deserialize)]
struct ReportBody {
    #[serde(default)]
    pv: Vec<PvRow>,
    #[serde(default)]
    vg: Vec<VgRow>,
    #[serde(default)]
    lv: Vec<LvRow>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PvRow {
    pub pv_name: String,
    pub vg_name: String,
    pub pv_uuid: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VgRow {
    pub vg_name: String,
    pub vg_uuid: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LvRow {
    pub lv_name: String,
    pub vg_name: String,
    pub lv_uuid: String,
    pub lv_size: String,
}

/// Runs `pvs --reportformat json -o pv_name,vg_name,pv_uuid`.
pub fn pvs() -> Result<Vec<PvRow>, Error> {
    let output = cmd!(
        "pvs",
        "--reportformat",
        "json",
        "-o",
        "pv_name,vg_name,pv_uuid"
    )
    .read()
    .context("Failed to execute pvs")?;

    Ok(parse_report(&output)?.into_iter().next().map(|b| b.pv).unwrap_or_default())
}

/// Runs `vgs --reportformat json -o vg_name,vg_uuid`.
pub fn vgs() -> Result<Vec<VgRow>, Error> {
    let output = cmd!("vgs", "--reportformat", "json", "-o", "vg_name,vg_uuid")
        .read()
        .context("Failed to execute vgs")?;

    Ok(parse_report(&output)?.into_iter().next().map(|b| b.vg).unwrap_or_default())
}

/// Runs `lvs --reportformat json -o lv_name,vg_name,lv_uuid,lv_size`.
pub fn lvs() -> Result<Vec<LvRow>, Error> {
    let output = cmd!(
        "lvs",
        "--reportformat",
        "json",
        "-o",
        "lv_name,vg_name,lv_uuid,lv_size"
    )
    .read()
    .context("Failed to execute lvs")?;

    Ok(parse_report(&output)?.into_iter().next().map(|b| b.lv).unwrap_or_default())
}

fn parse_report(output: &str) -> Result<Vec<ReportBody>, Error> {
    Ok(serde_json::from_str::<Report>(output)
        .context("Failed to parse LVM report")?
        .report)
}

/// Backs up a volume group's metadata to a file (§4.2 — captured at backup
/// time so it can be replayed verbatim at restore time).
pub fn vgcfgbackup(vg_name: &str, backup_file: impl AsRef<Path>) -> Result<(), Error> {
    cmd!(
        "vgcfgbackup",
        "--file",
        backup_file.as_ref(),
        vg_name
    )
    .stderr_to_stdout()
    .read()
    .with_context(|| format!("Failed to back up metadata for volume group '{vg_name}'"))?;
    Ok(())
}

/// Restores a volume group's metadata from a file onto already-created PVs
/// (§4.7 Stage 4 — LVM stack reconstruction).
pub fn vgcfgrestore(vg_name: &str, backup_file: impl AsRef<Path>) -> Result<(), Error> {
    cmd!("vgcfgrestore", "--file", backup_file.as_ref(), vg_name)
        .stderr_to_stdout()
        .read()
        .with_context(|| format!("Failed to restore metadata for volume group '{vg_name}'"))?;
    Ok(())
}

pub fn pvcreate(device: impl AsRef<Path>) -> Result<(), Error> {
    cmd!("pvcreate", "--force", "-y", device.as_ref())
        .stderr_to_stdout()
        .read()
        .with_context(|| format!("Failed to create PV on '{}'", device.as_ref().display()))?;
    Ok(())
}

/// Recreates a PV with its original UUID, restoring from a `vgcfgbackup`
/// file (§4.7 Stage 4 — the PV must come back with the UUID the VG's
/// metadata backup already references, or `vgcfgrestore` has nothing to
/// attach to).
pub fn pvcreate_restore(
    device: impl AsRef<Path>,
    uuid: &str,
    backup_file: impl AsRef<Path>,
) -> Result<(), Error> {
    cmd!(
        "pvcreate",
        "--force",
        "-y",
        "--uuid",
        uuid,
        "--restorefile",
        backup_file.as_ref(),
        device.as_ref()
    )
    .stderr_to_stdout()
    .read()
    .with_context(|| {
        format!(
            "Failed to recreate PV '{}' with uuid '{uuid}'",
            device.as_ref().display()
        )
    })?;
    Ok(())
}

pub fn pvremove(device: impl AsRef<Path>) -> Result<(), Error> {
    cmd!("pvremove", "--force", "--force", "-y", device.as_ref())
        .stderr_to_stdout()
        .read()
        .with_context(|| format!("Failed to remove PV on '{}'", device.as_ref().display()))?;
    Ok(())
}

/// Activates (`--activate y`) or deactivates (`--activate n`) every LV in a
/// volume group.
pub fn vgchange_activate(vg_name: &str, activate: bool) -> Result<(), Error> {
    let flag = if activate { "y" } else { "n" };
    cmd!("vgchange", "--activate", flag, vg_name)
        .stderr_to_stdout()
        .read()
        .with_context(|| format!("Failed to set activation state of volume group '{vg_name}'"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pvs_report() {
        let output = indoc::indoc! {r#"
            {
              "report": [
                {
                  "pv": [
                    {"pv_name":"/dev/sda2", "vg_name":"rootvg", "pv_uuid":"abc-123"}
                  ]
                }
              ]
            }
        "#};

        let rows = parse_report(output).unwrap();
        assert_eq!(rows[0].pv.len(), 1);
        assert_eq!(rows[0].pv[0].pv_name, "/dev/sda2");
        assert_eq!(rows[0].pv[0].vg_name, "rootvg");
    }
}
