use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{EqCommand, NUM_BANDS};
use crate::config::config_dir;

pub const NORMAL: &str = "Normal";
pub const BASS: &str = "Bass";
pub const ROCK: &str = "Rock";
pub const JAZZ: &str = "Jazz";
pub const CLASSICAL: &str = "Classical";
pub const POP: &str = "Pop";
pub const ELECTRONIC: &str = "Electronic";
pub const VOCAL: &str = "Vocal";
pub const RESET: &str = "Reset";

/// Function key number of the reset command.
pub const RESET_KEY: u8 = 9;

/// Built-in presets and the function key recalling each of them.
pub const HOTKEY_PRESETS: [(u8, &str); 8] = [
    (1, NORMAL),
    (2, BASS),
    (3, ROCK),
    (4, JAZZ),
    (5, CLASSICAL),
    (6, POP),
    (7, ELECTRONIC),
    (8, VOCAL),
];

/// Built-in presets as they are grouped in the Presets menu, one separator after each group.
pub const MENU_GROUPS: [&[&str]; 3] = [
    &[NORMAL, BASS, ROCK],
    &[JAZZ, CLASSICAL, POP],
    &[ELECTRONIC, VOCAL],
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqPreset {
    pub name: String,
    pub bands: [i32; NUM_BANDS],
}

impl EqPreset {
    pub fn new(name: impl Into<String>, bands: [i32; NUM_BANDS]) -> Self {
        EqPreset {
            name: name.into(),
            bands,
        }
    }
}

pub fn builtin_presets() -> Vec<EqPreset> {
    vec![
        EqPreset::new(NORMAL, [0; NUM_BANDS]),
        EqPreset::new(BASS, [45, 35, 25, 15, 0, -15, -25, -35, -45, -45]),
        EqPreset::new(ROCK, [25, 20, 15, -15, 20, 25, 35, 25, 20, 15]),
        EqPreset::new(JAZZ, [20, 25, 35, 25, 20, 0, -20, -25, -20, 0]),
        EqPreset::new(CLASSICAL, [-20, 0, 20, 25, 35, 25, 20, 0, -20, -25]),
        EqPreset::new(POP, [0, 20, 25, 20, 0, -20, 0, 20, 25, 20]),
        EqPreset::new(ELECTRONIC, [35, 25, 20, 0, -20, -25, -20, 0, 20, 25]),
        EqPreset::new(VOCAL, [-25, -20, 0, 20, 25, 35, 25, 20, 0, -20]),
    ]
}

/// Preset names are matched without regard to ASCII case everywhere.
pub fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

pub fn is_builtin(name: &str) -> bool {
    HOTKEY_PRESETS.iter().any(|&(_, n)| same_name(n, name))
}

/// Maps a function key number (1 for F1) to its command.
pub fn command_for_function_key(key: u8) -> Option<EqCommand> {
    if key == RESET_KEY {
        return Some(EqCommand::Reset);
    }
    HOTKEY_PRESETS
        .iter()
        .find(|&&(k, _)| k == key)
        .map(|&(_, name)| EqCommand::ApplyPreset(name.to_string()))
}

/// Menu label of a built-in preset, e.g. `"Bass (F2)"`.
pub fn menu_label(name: &str) -> String {
    if name == RESET {
        return format!("{} (F{})", RESET, RESET_KEY);
    }
    match HOTKEY_PRESETS.iter().find(|&&(_, n)| n == name) {
        Some((key, _)) => format!("{} (F{})", name, key),
        None => name.to_string(),
    }
}

pub fn presets_path() -> PathBuf {
    config_dir().join("eq_presets.json")
}

pub fn load_user_presets() -> Vec<EqPreset> {
    load_user_presets_from(&presets_path())
}

pub fn load_user_presets_from(path: &Path) -> Vec<EqPreset> {
    if !path.exists() {
        return Vec::new();
    }
    match std::fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid presets in {}: {e}", path.display());
            Vec::new()
        }),
        Err(e) => {
            tracing::warn!("Could not read {}: {e}", path.display());
            Vec::new()
        }
    }
}

pub fn save_user_presets(presets: &[EqPreset]) -> std::io::Result<()> {
    save_user_presets_to(&presets_path(), presets)
}

pub fn save_user_presets_to(path: &Path, presets: &[EqPreset]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(presets)?;
    std::fs::write(path, data)
}

/// Built-ins followed by the user presets.
/// User presets named like a built-in are dropped so hotkeys always recall the fixed table.
pub fn merge_presets(user: Vec<EqPreset>) -> Vec<EqPreset> {
    let mut presets = builtin_presets();
    for up in user {
        if is_builtin(&up.name) {
            tracing::warn!("User preset \"{}\" shadows a built-in and is ignored", up.name);
            continue;
        }
        if let Some(existing) = presets.iter_mut().find(|p| same_name(&p.name, &up.name)) {
            *existing = up;
        } else {
            presets.push(up);
        }
    }
    presets
}

/// Returns all presets: builtins + user presets.
pub fn all_presets() -> Vec<EqPreset> {
    merge_presets(load_user_presets())
}

pub fn find_preset<'a>(presets: &'a [EqPreset], name: &str) -> Option<&'a EqPreset> {
    presets.iter().find(|p| same_name(&p.name, name))
}
