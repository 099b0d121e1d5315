use anyhow::{bail, Context as _, Result};
use regex::{NoExpand, Regex};
use serde_yaml::Value;
use std::{fs, path::Path};

/// A loaded configuration document.
///
/// The document is parsed once at start-up and never mutated afterwards;
/// everything downstream works through read-only [`ConfigTree`] views.
#[derive(Debug)]
pub struct Config {
    root: Value,
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("malformed config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        Ok(Self { root })
    }

    pub fn tree(&self) -> ConfigTree<'_> {
        ConfigTree {
            node: Some(&self.root),
        }
    }
}

/// Read-only view rooted somewhere inside a [`Config`] document.
///
/// Lookups descend through nested mappings one key at a time; an absent key
/// at any step yields `None` (or an empty view / empty collection), never an
/// error. Callers decide whether a miss is fatal.
#[derive(Debug, Clone, Copy)]
pub struct ConfigTree<'a> {
    node: Option<&'a Value>,
}

impl<'a> ConfigTree<'a> {
    pub fn get(&self, path: &[&str]) -> Option<&'a Value> {
        let mut cur = self.node?;
        for key in path {
            cur = cur.get(*key)?;
        }
        Some(cur)
    }

    /// Scalar at `path` as a string. Integer scalars (ports) surface in
    /// their decimal form.
    pub fn get_str(&self, path: &[&str]) -> Option<String> {
        self.get(path).and_then(scalar_to_string)
    }

    pub fn str_or(&self, path: &[&str], default: &str) -> String {
        self.get_str(path)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn has(&self, path: &[&str]) -> bool {
        self.get(path).is_some()
    }

    /// A view rooted at `path`; empty (all lookups miss) if absent.
    pub fn sub(&self, path: &[&str]) -> ConfigTree<'a> {
        ConfigTree {
            node: self.get(path),
        }
    }

    /// Immediate children of the mapping at `path`, in document order.
    /// Absent path or non-mapping node yields an empty collection.
    pub fn items(&self, path: &[&str]) -> Vec<(String, ConfigTree<'a>)> {
        let Some(map) = self.get(path).and_then(Value::as_mapping) else {
            return Vec::new();
        };
        map.iter()
            .filter_map(|(k, v)| {
                scalar_to_string(k).map(|name| (name, ConfigTree { node: Some(v) }))
            })
            .collect()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Rewrite the top-level `editor:` line of the config file in place,
/// leaving the rest of the user's file (comments, ordering) untouched.
pub fn set_editor(path: &Path, editor: &str) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    let re = Regex::new(r"(?m)^editor\s*:.*$")?;
    if !re.is_match(&text) {
        bail!("no 'editor:' key in {}", path.display());
    }

    let line = format!("editor: {editor}");
    let updated = re.replace(&text, NoExpand(&line));
    fs::write(path, updated.as_bytes())
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}
