use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run the installation check on startup
    pub auto_install: bool,
    /// Prefix apt-get invocations with sudo
    pub sudo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { auto_install: true, sudo: true }
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME").map(PathBuf::from).unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(format!("{home}/.config"))
    }).join("metanstain")
}

pub fn config_path() -> PathBuf { config_dir().join("config.toml") }

pub fn load_config() -> Config {
    load_from(&config_path())
}

pub fn load_from(path: &Path) -> Config {
    match fs::read_to_string(path) {
        Ok(s) => match toml::from_str(&s) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring malformed config {}: {}", path.display(), e);
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}
