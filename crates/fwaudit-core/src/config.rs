use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration from `fwaudit.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub apps: AppsConfig,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

/// How release package files are recognized and linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesConfig {
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub link_base_url: Option<String>,
}

fn default_prefixes() -> Vec<String> {
    vec!["lux2_".to_string(), "sg_".to_string()]
}

impl Default for PackagesConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            link_base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Bound on nested container/image recursion.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    8
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// External tool program names and the shared invocation timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_sevenzip")]
    pub sevenzip: String,
    #[serde(default = "default_unzip")]
    pub unzip: String,
    #[serde(default = "default_mount")]
    pub mount: String,
    #[serde(default = "default_unmount")]
    pub unmount: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sevenzip() -> String {
    "7z".to_string()
}
fn default_unzip() -> String {
    "unzip".to_string()
}
fn default_mount() -> String {
    "ext4fuse".to_string()
}
fn default_unmount() -> String {
    "fusermount".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sevenzip: default_sevenzip(),
            unzip: default_unzip(),
            mount: default_mount(),
            unmount: default_unmount(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Additions to the built-in application tables.
///
/// `deny` and `suite` entries extend the built-ins; `rename` entries
/// override built-ins under the same file name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppsConfig {
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub suite: Vec<String>,
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
}

/// One monitored `{folder, snapshot}` pair for the `run` subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub folder: PathBuf,
    pub snapshot: PathBuf,
}

impl Config {
    /// Load configuration from an `fwaudit.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `fwaudit init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `fwaudit.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join("fwaudit.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!(
                            "Warning: failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `fwaudit init`.
    pub fn default_toml() -> String {
        r#"# fwaudit - Firmware Release Audit Configuration

[packages]
# File name prefixes that mark a release package
prefixes = ["lux2_", "sg_"]
# Base URL for package hyperlinks in HTML reports
# link_base_url = "http://releases.example.com/packages"

[scan]
# Bound on nested container/image recursion
max_depth = 8

[tools]
sevenzip = "7z"
unzip = "unzip"
mount = "ext4fuse"
unmount = "fusermount"
timeout_secs = 120

[apps]
# Extend the built-in classification tables
# deny = ["Bloatware.apk"]
# suite = ["HouseApp"]

# [apps.rename]
# "HouseApp-3.apk" = "House App"

# Monitored folder/snapshot pairs for `fwaudit run`
# [[tasks]]
# folder = "/shares/releases/Lux"
# snapshot = "/shares/releases/xml/luxreport.xml"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.packages.prefixes, vec!["lux2_", "sg_"]);
        assert_eq!(config.scan.max_depth, 8);
        assert_eq!(config.tools.sevenzip, "7z");
        assert!(config.tasks.is_empty());
    }

    #[test]
    fn test_deserialize_config() {
        let toml_str = r#"
[packages]
prefixes = ["fw_"]
link_base_url = "http://releases.example.com"

[scan]
max_depth = 3

[tools]
sevenzip = "7za"
timeout_secs = 30

[[tasks]]
folder = "/data/releases"
snapshot = "/data/snapshots/report.xml"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.packages.prefixes, vec!["fw_"]);
        assert_eq!(
            config.packages.link_base_url.as_deref(),
            Some("http://releases.example.com")
        );
        assert_eq!(config.scan.max_depth, 3);
        assert_eq!(config.tools.sevenzip, "7za");
        assert_eq!(config.tools.timeout_secs, 30);
        // Unset tools keep their defaults
        assert_eq!(config.tools.unzip, "unzip");
        assert_eq!(config.tasks.len(), 1);
        assert_eq!(config.tasks[0].folder, PathBuf::from("/data/releases"));
    }

    #[test]
    fn test_default_toml_is_valid() {
        let toml_str = Config::default_toml();
        let config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.packages.prefixes, vec!["lux2_", "sg_"]);
    }

    #[test]
    fn test_deserialize_apps_section() {
        let toml_str = r#"
[apps]
deny = ["Bloatware.apk"]
suite = ["HouseApp"]

[apps.rename]
"HouseApp-3.apk" = "House App"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.apps.deny, vec!["Bloatware.apk"]);
        assert_eq!(
            config.apps.rename.get("HouseApp-3.apk").map(String::as_str),
            Some("House App")
        );
    }
}
