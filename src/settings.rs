use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "COMMAND_MENU_CONFIG";
pub const DEFAULT_COMMANDS_PATH: &str = "~/.commands.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub config_filepath: String,
    pub edit_button_visible: bool,
    pub reload_button_visible: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_filepath: DEFAULT_COMMANDS_PATH.to_string(),
            edit_button_visible: true,
            reload_button_visible: true,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("reading settings {}", path.display()))?;
            let parsed: Settings = serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(parsed)
        } else {
            let default = Self::default();
            default.save(path)?;
            Ok(default)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {}", parent.display()))?;
        }
        let mut data = serde_json::to_string_pretty(self).context("serialize settings")?;
        data.push('\n');
        fs::write(path, data).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }
}

pub struct AppPaths {
    pub config_dir: PathBuf,
    pub settings_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir().context("Unable to determine config directory")?;
        Ok(Self::in_dir(base.join("command-menu")))
    }

    pub fn in_dir(config_dir: PathBuf) -> Self {
        Self {
            settings_file: config_dir.join("settings.json"),
            log_file: config_dir.join("command-menu.log"),
            config_dir,
        }
    }
}

/// Picks the commands file: an explicit path wins, then the environment
/// variable, then the path stored in settings.
pub fn resolve_commands_path(explicit: Option<&Path>, settings: &Settings) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return expand_home(&path.to_string_lossy());
    }
    if let Ok(value) = env::var(CONFIG_ENV) {
        if !value.trim().is_empty() {
            return expand_home(value.trim());
        }
    }
    expand_home(&settings.config_filepath)
}

/// Expands a leading `~/` or `$HOME/`.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    let rest = path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("$HOME/"));
    match rest {
        Some(rest) => {
            let home = dirs::home_dir().context("Unable to determine home directory")?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_settings_file_is_created() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::in_dir(dir.path().join("command-menu"));
        let settings = Settings::load(&paths.settings_file).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(paths.settings_file.exists());
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "edit_button_visible": false }"#).unwrap();
        let settings = Settings::load(&path).unwrap();
        assert!(!settings.edit_button_visible);
        assert!(settings.reload_button_visible);
        assert_eq!(settings.config_filepath, DEFAULT_COMMANDS_PATH);
    }

    #[test]
    fn explicit_path_wins() {
        let settings = Settings::default();
        let path = resolve_commands_path(Some(Path::new("/tmp/menus.json")), &settings).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/menus.json"));
    }

    #[test]
    fn home_prefixes_expand() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.commands.json").unwrap(), home.join(".commands.json"));
            assert_eq!(expand_home("$HOME/x.json").unwrap(), home.join("x.json"));
        }
        assert_eq!(expand_home("/abs.json").unwrap(), PathBuf::from("/abs.json"));
    }
}
