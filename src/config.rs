/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub provider: ProviderConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub lock_in_ticks: u32,     // suspense hold between lock-in and verdict
    pub reveal_hold_ticks: u32, // verdict shown before advancing
    pub wrong_hold_ticks: u32,  // verdict shown before the loss screen
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub source: String, // "auto" | "gemini" | "bank"
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub packs_dir: PathBuf,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_rate_ms: default_tick_rate(),
            lock_in_ticks: default_lock_in(),
            reveal_hold_ticks: default_reveal_hold(),
            wrong_hold_ticks: default_wrong_hold(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    provider: TomlProvider,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_lock_in")]
    lock_in_ticks: u32,
    #[serde(default = "default_reveal_hold")]
    reveal_hold_ticks: u32,
    #[serde(default = "default_wrong_hold")]
    wrong_hold_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlProvider {
    #[serde(default = "default_source")]
    source: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
    #[serde(default = "default_packs_dir")]
    packs_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 75 }
fn default_lock_in() -> u32 { 24 }      // 1.8s of suspense at 75ms tick
fn default_reveal_hold() -> u32 { 26 }  // ~2s verdict display
fn default_wrong_hold() -> u32 { 26 }

fn default_source() -> String { "auto".into() }
fn default_model() -> String { "gemini-3-flash-preview".into() }
fn default_api_key_env() -> String { "GEMINI_API_KEY".into() }
fn default_timeout() -> u64 { 20 }
fn default_packs_dir() -> String { "questions".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            lock_in_ticks: default_lock_in(),
            reveal_hold_ticks: default_reveal_hold(),
            wrong_hold_ticks: default_wrong_hold(),
        }
    }
}

impl Default for TomlProvider {
    fn default() -> Self {
        TomlProvider {
            source: default_source(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            packs_dir: default_packs_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();

        // Find config.toml
        let toml_cfg = load_toml(&search_dirs);

        // Resolve the question pack directory
        let packs_dir_str = &toml_cfg.provider.packs_dir;
        let packs_dir = if PathBuf::from(packs_dir_str).is_absolute() {
            PathBuf::from(packs_dir_str)
        } else {
            // Search candidate dirs for the packs folder
            search_dirs.iter()
                .map(|d| d.join(packs_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| {
                    // Default: relative to CWD
                    PathBuf::from(packs_dir_str)
                })
        };

        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms,
                lock_in_ticks: toml_cfg.timing.lock_in_ticks,
                reveal_hold_ticks: toml_cfg.timing.reveal_hold_ticks,
                wrong_hold_ticks: toml_cfg.timing.wrong_hold_ticks,
            },
            provider: ProviderConfig {
                source: toml_cfg.provider.source,
                model: toml_cfg.provider.model,
                api_key_env: toml_cfg.provider.api_key_env,
                timeout_secs: toml_cfg.provider.timeout_secs,
                packs_dir,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/summitquiz → /usr/games/summitquiz
        // still finds data relative to the real binary.
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

    // 3. XDG data home (~/.local/share/summitquiz)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/summitquiz");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/summitquiz)
    let sys = PathBuf::from("/usr/share/summitquiz");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_takes_every_default() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 75);
        assert_eq!(cfg.timing.lock_in_ticks, 24);
        assert_eq!(cfg.provider.source, "auto");
        assert_eq!(cfg.provider.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.provider.packs_dir, "questions");
    }

    #[test]
    fn partial_sections_keep_defaults_for_the_rest() {
        let cfg: TomlConfig = toml::from_str(
            r#"
            [timing]
            lock_in_ticks = 10

            [provider]
            source = "bank"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timing.lock_in_ticks, 10);
        assert_eq!(cfg.timing.tick_rate_ms, 75);
        assert_eq!(cfg.provider.source, "bank");
        assert_eq!(cfg.provider.model, default_model());
    }
}
