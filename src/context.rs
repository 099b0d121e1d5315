use anyhow::{bail, Context as _, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const CONFIG_ENV: &str = "STM_CONFIG";

const DEFAULT_CONFIG: &str = include_str!("../assets/default_config.yml");

/// Filesystem locations resolved once at start-up and passed explicitly to
/// every component that needs them.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_file: PathBuf,
}

/// Config path precedence:
/// 1) STM_CONFIG (must exist)
/// 2) default <user config dir>/stm/config.yml (created on first run)
pub fn resolve_paths() -> Result<Paths> {
    if let Some(p) = env_config_path() {
        if !p.exists() {
            bail!(
                "{CONFIG_ENV} is set but file does not exist: {}",
                p.display()
            );
        }
        return Ok(Paths { config_file: p });
    }

    let p = default_config_path()?;
    ensure_default_config(&p)?;
    Ok(Paths { config_file: p })
}

fn env_config_path() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine user configuration directory")?;
    Ok(base.join("stm").join("config.yml"))
}

/// Write the starter config if `path` is absent, creating parent
/// directories as needed. Existing files are left alone.
pub fn ensure_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    if !path.exists() {
        fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::grammar::Grammar;

    #[test]
    fn first_run_writes_a_loadable_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stm").join("config.yml");

        ensure_default_config(&path).unwrap();
        let doc = Config::load_from_path(&path).unwrap();

        let tree = doc.tree();
        assert!(tree.get_str(&["editor"]).is_some());
        for key in ["cmd", "hop-cmd", "tunnel-cmd", "hop-tunnel-cmd", "default-hop"] {
            assert!(tree.get_str(&["ssh", key]).is_some(), "missing ssh.{key}");
        }

        let grammar = Grammar::from_config(tree);
        assert!(!grammar.servers.is_empty());
    }

    #[test]
    fn ensure_default_config_keeps_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "editor: vim\n").unwrap();

        ensure_default_config(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "editor: vim\n");
    }
}
