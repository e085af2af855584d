use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Register F1-F9 system wide.
    pub hotkeys_enabled: bool,
    /// Icon tried before the built-in candidate list.
    pub icon_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            hotkeys_enabled: true,
            icon_path: None,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("system_equalizer")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_config() -> AppConfig {
    load_config_from(&settings_path())
}

pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid settings in {}: {e}", path.display());
            AppConfig::default()
        }),
        Err(e) => {
            tracing::warn!("Could not read {}: {e}", path.display());
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    save_config_to(&settings_path(), config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(config)?;
    std::fs::write(path, data)
}

/// Creates a file watcher on the config directory.
/// Returns the watcher (must be kept alive) and a receiver that fires on preset/settings file changes.
pub fn watch_config_dir() -> notify::Result<(notify::RecommendedWatcher, mpsc::Receiver<()>)> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};

    let (tx, rx) = mpsc::channel();
    let config = config_dir();

    // the directory has to exist before it can be watched
    std::fs::create_dir_all(&config).ok();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                    let _ = tx.send(());
                }
                _ => {}
            }
        }
    })?;

    watcher.watch(&config, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching {}", config.display());

    Ok((watcher, rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("settings.json"));
        assert_eq!(config, AppConfig::default());
        assert!(config.hotkeys_enabled);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let config = AppConfig {
            hotkeys_enabled: false,
            icon_path: Some(PathBuf::from("my.png")),
        };
        save_config_to(&path, &config).unwrap();
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "icon_path": "x.ico" }"#).unwrap();
        let config = load_config_from(&path);
        assert!(config.hotkeys_enabled);
        assert_eq!(config.icon_path, Some(PathBuf::from("x.ico")));
    }

    #[test]
    fn garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_config_from(&path), AppConfig::default());
    }
}
