/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or the
/// user data directory. Falls back to sensible defaults if the file is
/// missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub api: ApiConfig,
    pub scores: ScoresConfig,
    pub display: DisplayConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick: Duration,          // round clock period
    pub answer_delay: Duration,  // reveal time before the next question
    pub frame: Duration,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub batch_size: usize,
    pub max_character_id: u32,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ScoresConfig {
    pub capacity: usize,
    pub file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub dark: bool,
    pub sound: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub options: [Vec<String>; 4],
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub theme: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    api: TomlApi,
    #[serde(default)]
    scores: TomlScores,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    #[serde(default = "default_answer_delay_ms")]
    answer_delay_ms: u64,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlApi {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
    #[serde(default = "default_max_id")]
    max_character_id: u32,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlScores {
    #[serde(default = "default_capacity")]
    capacity: usize,
    #[serde(default = "default_scores_file")]
    file: String,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_true")]
    dark: bool,
    #[serde(default = "default_true")]
    sound: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_option_1")]
    option_1: Vec<String>,
    #[serde(default = "default_option_2")]
    option_2: Vec<String>,
    #[serde(default = "default_option_3")]
    option_3: Vec<String>,
    #[serde(default = "default_option_4")]
    option_4: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_theme")]
    theme: Vec<String>,
}

// ── Defaults ──

fn default_tick_ms() -> u64 { 1000 }
fn default_answer_delay_ms() -> u64 { 1500 }
fn default_frame_ms() -> u64 { 16 }

fn default_base_url() -> String { "https://rickandmortyapi.com/api/character".into() }
fn default_batch_size() -> usize { 12 }
fn default_max_id() -> u32 { 826 }   // characters published by the API
fn default_timeout_secs() -> u64 { 10 }

fn default_capacity() -> usize { 5 }
fn default_scores_file() -> String { "top_scores.json".into() }

fn default_true() -> bool { true }

fn default_option_1() -> Vec<String> { vec!["Y".into()] }
fn default_option_2() -> Vec<String> { vec!["X".into()] }
fn default_option_3() -> Vec<String> { vec!["B".into()] }
fn default_option_4() -> Vec<String> { vec!["A".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["R1".into()] }
fn default_theme() -> Vec<String> { vec!["L1".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_ms: default_tick_ms(),
            answer_delay_ms: default_answer_delay_ms(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlApi {
    fn default() -> Self {
        TomlApi {
            base_url: default_base_url(),
            batch_size: default_batch_size(),
            max_character_id: default_max_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for TomlScores {
    fn default() -> Self {
        TomlScores {
            capacity: default_capacity(),
            file: default_scores_file(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay { dark: true, sound: true }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            option_1: default_option_1(),
            option_2: default_option_2(),
            option_3: default_option_3(),
            option_4: default_option_4(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            theme: default_theme(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg)
    }

    /// Parse a config document directly. Unknown keys are ignored.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::resolve)
    }

    fn resolve(cfg: TomlConfig) -> Self {
        let scores_file = PathBuf::from(&cfg.scores.file);
        let scores_file = if scores_file.is_absolute() {
            scores_file
        } else {
            crate::sim::scores::data_dir().join(scores_file)
        };

        GameConfig {
            timing: TimingConfig {
                tick: Duration::from_millis(cfg.timing.tick_ms.max(1)),
                answer_delay: Duration::from_millis(cfg.timing.answer_delay_ms),
                frame: Duration::from_millis(cfg.timing.frame_ms.max(1)),
            },
            api: ApiConfig {
                base_url: cfg.api.base_url.trim_end_matches('/').to_string(),
                batch_size: cfg.api.batch_size.max(1),
                max_character_id: cfg.api.max_character_id.max(1),
                timeout: Duration::from_secs(cfg.api.timeout_secs),
            },
            scores: ScoresConfig {
                capacity: cfg.scores.capacity.max(1),
                file: scores_file,
            },
            display: DisplayConfig {
                dark: cfg.display.dark,
                sound: cfg.display.sound,
            },
            gamepad: GamepadConfig {
                options: [
                    cfg.gamepad.option_1,
                    cfg.gamepad.option_2,
                    cfg.gamepad.option_3,
                    cfg.gamepad.option_4,
                ],
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                restart: cfg.gamepad.restart,
                theme: cfg.gamepad.theme,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + user config dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            found.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !found.iter().any(|d| d == &cwd) {
            found.push(cwd);
        }
    }

    // 3. Per-user config directory (~/.config/rickquiz)
    if let Some(cfg) = dirs::config_dir().map(|d| d.join("rickquiz")) {
        if cfg.is_dir() && !found.iter().any(|d| d == &cfg) {
            found.push(cfg);
        }
    }

    if found.is_empty() {
        found.push(PathBuf::from("."));
    }

    found
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "Loaded config");
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "config.toml parse error, using defaults: {e}");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                tracing::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}
