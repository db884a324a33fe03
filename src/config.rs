/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::tab::Tab;
use crate::store::medium::FileMedium;
use crate::store::persist::DEFAULT_KEY;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub start_path: String,
    pub storage: StorageConfig,
    pub log: LogConfig,
    pub shortcuts: Vec<(char, Tab)>,
    pub gamepad: GamepadConfig,
    pub audio_enabled: bool,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub dir: PathBuf,
    pub key: String,
    pub ephemeral: bool,   // keep progress in memory only (guest session)
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: log::LevelFilter,
    pub file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub menu: Vec<String>,
    pub back: Vec<String>,
    pub confirm: Vec<String>,
    pub play: Vec<String>,
    pub rewards: Vec<String>,
    pub character: Vec<String>,
    pub collections: Vec<String>,
    pub shop: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    storage: TomlStorage,
    #[serde(default)]
    log: TomlLog,
    #[serde(default)]
    shortcuts: TomlShortcuts,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    audio: TomlAudio,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_start_path")]
    start_path: String,
}

#[derive(Deserialize, Debug)]
struct TomlStorage {
    #[serde(default)]
    dir: String,
    #[serde(default = "default_key")]
    key: String,
    #[serde(default)]
    ephemeral: bool,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default = "default_log_file")]
    file: String,
}

#[derive(Deserialize, Debug)]
struct TomlShortcuts {
    #[serde(default = "default_key_play")]
    play: char,
    #[serde(default = "default_key_rewards")]
    rewards: char,
    #[serde(default = "default_key_character")]
    character: char,
    #[serde(default = "default_key_collections")]
    collections: char,
    #[serde(default = "default_key_shop")]
    shop: char,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_menu")]
    menu: Vec<String>,
    #[serde(default = "default_pad_back")]
    back: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_play")]
    play: Vec<String>,
    #[serde(default = "default_pad_rewards")]
    rewards: Vec<String>,
    #[serde(default = "default_pad_character")]
    character: Vec<String>,
    #[serde(default = "default_pad_collections")]
    collections: Vec<String>,
    #[serde(default = "default_pad_shop")]
    shop: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_audio_enabled")]
    enabled: bool,
}

// ── Defaults ──

fn default_start_path() -> String { Tab::Play.path().into() }
fn default_key() -> String { DEFAULT_KEY.into() }
fn default_log_level() -> String { "info".into() }
fn default_log_file() -> String { "questmap.log".into() }

fn default_key_play() -> char { 'p' }
fn default_key_rewards() -> char { 'r' }
fn default_key_character() -> char { 'c' }
fn default_key_collections() -> char { 'l' }
fn default_key_shop() -> char { 's' }

fn default_pad_menu() -> Vec<String> { vec!["Start".into()] }
fn default_pad_back() -> Vec<String> { vec!["Select".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["A".into()] }
fn default_pad_play() -> Vec<String> { vec!["Y".into()] }
fn default_pad_rewards() -> Vec<String> { vec!["B".into()] }
fn default_pad_character() -> Vec<String> { vec!["X".into()] }
fn default_pad_collections() -> Vec<String> { vec!["L1".into()] }
fn default_pad_shop() -> Vec<String> { vec!["R1".into()] }
fn default_audio_enabled() -> bool { true }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { start_path: default_start_path() }
    }
}

impl Default for TomlStorage {
    fn default() -> Self {
        TomlStorage { dir: String::new(), key: default_key(), ephemeral: false }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { level: default_log_level(), file: default_log_file() }
    }
}

impl Default for TomlShortcuts {
    fn default() -> Self {
        TomlShortcuts {
            play: default_key_play(),
            rewards: default_key_rewards(),
            character: default_key_character(),
            collections: default_key_collections(),
            shop: default_key_shop(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            menu: default_pad_menu(),
            back: default_pad_back(),
            confirm: default_pad_confirm(),
            play: default_pad_play(),
            rewards: default_pad_rewards(),
            character: default_pad_character(),
            collections: default_pad_collections(),
            shop: default_pad_shop(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { enabled: default_audio_enabled() }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());
        Self::from_toml(toml_cfg)
    }

    /// Built-in defaults, as if `config.toml` were empty.
    #[cfg(test)]
    pub fn defaults() -> Self {
        Self::from_toml(TomlConfig::default())
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        let dir = if cfg.storage.dir.trim().is_empty() {
            FileMedium::default_dir()
        } else {
            PathBuf::from(&cfg.storage.dir)
        };

        // A relative log file lives next to the save data.
        let log_file = PathBuf::from(&cfg.log.file);
        let log_file = if log_file.is_absolute() { log_file } else { dir.join(log_file) };

        let level = cfg.log.level.parse().unwrap_or_else(|_| {
            eprintln!("Warning: unknown log level `{}`, using info.", cfg.log.level);
            log::LevelFilter::Info
        });

        let start_path = if cfg.general.start_path.starts_with('/') {
            cfg.general.start_path
        } else {
            format!("/{}", cfg.general.start_path)
        };

        let key = if cfg.storage.key.trim().is_empty() { default_key() } else { cfg.storage.key };

        AppConfig {
            start_path,
            storage: StorageConfig { dir, key, ephemeral: cfg.storage.ephemeral },
            log: LogConfig { level, file: log_file },
            shortcuts: vec![
                (cfg.shortcuts.play, Tab::Play),
                (cfg.shortcuts.rewards, Tab::Rewards),
                (cfg.shortcuts.character, Tab::Character),
                (cfg.shortcuts.collections, Tab::Collections),
                (cfg.shortcuts.shop, Tab::Shop),
            ],
            gamepad: GamepadConfig {
                menu: cfg.gamepad.menu,
                back: cfg.gamepad.back,
                confirm: cfg.gamepad.confirm,
                play: cfg.gamepad.play,
                rewards: cfg.gamepad.rewards,
                character: cfg.gamepad.character,
                collections: cfg.gamepad.collections,
                shop: cfg.gamepad.shop,
            },
            audio_enabled: cfg.audio.enabled,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG config home (~/.config/questmap)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".config/questmap");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
