/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [physics]
/// friction = 0.8
/// terminal_gravity = 1.2
///
/// [timing]
/// frame_ms = 16
///
/// [audio]
/// volume = 0.3
///
/// [gamepad]
/// jump = ["A", "B"]
///
/// [general]
/// level_file = "levels/pit.txt"
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::physics::PhysicsParams;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsParams,
    pub timing: TimingConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    /// Level to play; `None` selects the embedded level.
    pub level_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimingConfig {
    /// Target frame period of the host loop.
    pub frame_ms: u64,
    /// Upper bound on the elapsed time fed to one tick (debugger pauses,
    /// suspended terminals).
    pub max_frame_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AudioConfig {
    pub enabled: bool,
    pub volume: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

/// Every key falls back to the matching `PhysicsParams::default()` value.
#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlPhysics {
    move_speed: f32,
    jump_impulse: f32,
    fall_gravity: f32,
    float_clamp: f32,
    hold_cap_ms: f32,
    terminal_gravity: f32,
    friction: f32,
    snap_epsilon: f32,
    edge_bias: f32,
    death_pause_ms: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_max_frame_ms")]
    max_frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_audio_enabled")]
    enabled: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    level_file: Option<String>,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 16 }      // ~60 fps
fn default_max_frame_ms() -> u64 { 50 }
fn default_audio_enabled() -> bool { true }
fn default_volume() -> f32 { 0.3 }

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_restart() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlPhysics {
    fn default() -> Self {
        let p = PhysicsParams::default();
        TomlPhysics {
            move_speed: p.move_speed,
            jump_impulse: p.jump_impulse,
            fall_gravity: p.fall_gravity,
            float_clamp: p.float_clamp,
            hold_cap_ms: p.hold_cap_ms,
            terminal_gravity: p.terminal_gravity,
            friction: p.friction,
            snap_epsilon: p.snap_epsilon,
            edge_bias: p.edge_bias,
            death_pause_ms: p.death_pause_ms,
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            max_frame_ms: default_max_frame_ms(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio {
            enabled: default_audio_enabled(),
            volume: default_volume(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            restart: default_restart(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/ledgehop`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve level file: absolute as given, relative against the search dirs
        let level_file = toml_cfg.general.level_file
            .filter(|s| !s.trim().is_empty())
            .map(|s| resolve_path(&s, search_dirs));

        let frame_ms = toml_cfg.timing.frame_ms.max(1);
        let max_frame_ms = toml_cfg.timing.max_frame_ms.max(frame_ms);

        let volume = if toml_cfg.audio.volume.is_finite() {
            toml_cfg.audio.volume.clamp(0.0, 1.0)
        } else {
            log::warn!("audio.volume is not a number, using {}", default_volume());
            default_volume()
        };

        GameConfig {
            physics: physics_params(toml_cfg.physics),
            timing: TimingConfig { frame_ms, max_frame_ms },
            audio: AudioConfig {
                enabled: toml_cfg.audio.enabled,
                volume,
            },
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                restart: toml_cfg.gamepad.restart,
            },
            level_file,
        }
    }
}

/// Build the tuning set, replacing any non-finite value with its default
/// and keeping friction inside [0, 1] so it can only ever decay velocity.
fn physics_params(t: TomlPhysics) -> PhysicsParams {
    let d = PhysicsParams::default();
    let pick = |name: &str, value: f32, fallback: f32| {
        if value.is_finite() {
            value
        } else {
            log::warn!("physics.{name} is not a number, using {fallback}");
            fallback
        }
    };
    PhysicsParams {
        move_speed: pick("move_speed", t.move_speed, d.move_speed),
        jump_impulse: pick("jump_impulse", t.jump_impulse, d.jump_impulse),
        fall_gravity: pick("fall_gravity", t.fall_gravity, d.fall_gravity),
        float_clamp: pick("float_clamp", t.float_clamp, d.float_clamp),
        hold_cap_ms: pick("hold_cap_ms", t.hold_cap_ms, d.hold_cap_ms),
        terminal_gravity: pick("terminal_gravity", t.terminal_gravity, d.terminal_gravity),
        friction: pick("friction", t.friction, d.friction).clamp(0.0, 1.0),
        snap_epsilon: pick("snap_epsilon", t.snap_epsilon, d.snap_epsilon),
        edge_bias: pick("edge_bias", t.edge_bias, d.edge_bias),
        death_pause_ms: pick("death_pause_ms", t.death_pause_ms, d.death_pause_ms),
    }
}

fn resolve_path(s: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(s);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.is_file())
        // Default: relative to CWD
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
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

    // 3. XDG data home (~/.local/share/ledgehop)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ledgehop");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. Fallback
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
                    Ok(cfg) => {
                        log::info!("loaded {}", path.display());
                        return cfg;
                    }
                    Err(e) => {
                        log::warn!("{} parse error: {e}", path.display());
                        log::warn!("using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
