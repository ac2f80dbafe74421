use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use pawnbank_core::{BankConfig, PawnBank, Vault};
use serde::{Deserialize, Serialize};

pub const STATE_VERSION: u8 = 1;

/// Everything the CLI persists between invocations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateFile {
    pub version: u8,
    pub bank: PawnBank<Vault>,
}

impl StateFile {
    pub fn fresh(config: BankConfig) -> Self {
        let vault = Vault::new(config.escrow_account.clone());
        Self {
            version: STATE_VERSION,
            bank: PawnBank::new(config, vault),
        }
    }
}

pub fn read_config(path: &Path) -> Result<BankConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
}

pub fn load(path: &Path) -> Result<StateFile> {
    let raw = fs::read_to_string(path).with_context(|| {
        format!("read state {} (run `pawnbank init` first)", path.display())
    })?;
    let state: StateFile =
        serde_json::from_str(&raw).with_context(|| format!("parse state {}", path.display()))?;
    if state.version != STATE_VERSION {
        bail!(
            "state {} has version {}, expected {}",
            path.display(),
            state.version,
            STATE_VERSION
        );
    }
    Ok(state)
}

/// Writes through a sibling temp file so a crash never leaves a torn state.
pub fn save(path: &Path, state: &StateFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("mkdir {}", parent.display()))?;
    }
    let encoded = serde_json::to_string_pretty(state).context("encode state")?;
    let tmp = tmp_path(path);
    fs::write(&tmp, encoded).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
