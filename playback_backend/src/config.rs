use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use strategy_playback::PlaybackConfig;

pub fn load(path: &Path) -> Result<PlaybackConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read playback config at {}", path.display()))?;
    PlaybackConfig::from_json(&data)
        .with_context(|| format!("invalid playback config JSON in {}", path.display()))
}

/// Load `path`, falling back to the built-in timing when it is missing or broken.
pub fn load_or_default(path: &Path) -> PlaybackConfig {
    match load(path) {
        Ok(cfg) => {
            tracing::info!("loaded playback config from {}", path.display());
            cfg
        }
        Err(e) => {
            tracing::warn!("{:#}; using default playback timing", e);
            PlaybackConfig::default()
        }
    }
}

pub fn resolve_config_path() -> PathBuf {
    // PLAYBACK_CONFIG wins; otherwise look next to the crate, the workspace
    // root and the executable
    if let Ok(p) = std::env::var("PLAYBACK_CONFIG") {
        return PathBuf::from(p);
    }

    let candidates = [
        PathBuf::from("config/playback.json"),
        PathBuf::from("playback_backend/config/playback.json"),
        {
            let mut p = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            p.pop(); // exe dir
            p.push("config/playback.json");
            p
        },
    ];

    for c in candidates {
        if c.exists() {
            return c;
        }
    }

    PathBuf::from("config/playback.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/playback.json");
        let cfg = load(&path).unwrap();
        assert_eq!(cfg, PlaybackConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = load_or_default(Path::new("does/not/exist.json"));
        assert_eq!(cfg, PlaybackConfig::default());
        assert!(load(Path::new("does/not/exist.json")).is_err());
    }
}
