use anyhow::{bail, Context as _, Result};
use std::{fs, path::Path};

use crate::{exec, style};

pub const DNSMASQ_DIR: &str = "/etc/NetworkManager/dnsmasq.d";
const DNSMASQ_FILE: &str = "dnsmasq-stm.conf";
const DNSMASQ_SNIPPET: &str = include_str!("../assets/dnsmasq-stm.conf");
const RESTART_COMMAND: &str = "service network-manager restart";

/// One-time system setup: point NetworkManager's dnsmasq at the `.stm`
/// pseudo-domain and restart it. Needs root and an existing dnsmasq.d
/// directory; both are checked up front so failure leaves nothing half
/// written.
pub fn auto_configure() -> Result<()> {
    if !is_root() {
        bail!("you need root rights to do that (use 'sudo stm --auto-conf-network-manager')");
    }

    let dir = Path::new(DNSMASQ_DIR);
    if !dir.is_dir() {
        bail!("folder {DNSMASQ_DIR} does not exist");
    }

    let target = dir.join(DNSMASQ_FILE);
    style::head("FILE", &target.to_string_lossy());
    fs::write(&target, DNSMASQ_SNIPPET)
        .with_context(|| format!("failed to write {}", target.display()))?;

    style::head("RUN", RESTART_COMMAND);
    exec::run(RESTART_COMMAND)?;

    style::ok("configuration updated");
    Ok(())
}

#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
