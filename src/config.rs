use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Engine tuning knobs, loadable from a TOML file. Every field has a
/// default, so a partial file (or none at all) is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// Episodes shorter than this are dropped as noise.
    pub min_gesture_ms: u64,
    /// Episodes still running past this report a hold.
    pub hold_gesture_ms: u64,
    /// Episodes still running past this are abandoned.
    pub max_gesture_ms: u64,
    /// Ring depth for the entry and exit sample buffers.
    pub sample_depth: usize,
    /// Minimum spacing between hardware polls.
    pub poll_interval_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_gesture_ms: 44,
            hold_gesture_ms: 1000,
            max_gesture_ms: 1400,
            sample_depth: 4,
            poll_interval_ms: 25,
        }
    }
}

fn default_tuning_path() -> Option<PathBuf> {
    let home = UserDirs::new()?.home_dir().to_path_buf();
    Some(home.join(".config").join("wavectl").join("engine.toml"))
}

impl Tuning {
    /// Explicit path wins; otherwise `~/.config/wavectl/engine.toml` if it
    /// exists; otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }
        if let Some(p) = default_tuning_path() {
            if p.exists() {
                info!("loading tuning from {}", p.display());
                return Self::load(&p);
            }
        }
        Ok(Self::default())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        let tuning: Tuning = toml::from_str(&txt)
            .map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_gesture_ms == 0 || self.poll_interval_ms == 0 {
            return Err(anyhow!("durations must be positive"));
        }
        if !(self.min_gesture_ms < self.hold_gesture_ms
            && self.hold_gesture_ms < self.max_gesture_ms)
        {
            return Err(anyhow!(
                "gesture lengths must satisfy min < hold < max (got {} / {} / {})",
                self.min_gesture_ms,
                self.hold_gesture_ms,
                self.max_gesture_ms
            ));
        }
        if !(2..=32).contains(&self.sample_depth) {
            return Err(anyhow!(
                "sample_depth must be between 2 and 32, got {}",
                self.sample_depth
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let t: Tuning = toml::from_str("hold_gesture_ms = 800\nsample_depth = 3\n").unwrap();
        assert_eq!(t.hold_gesture_ms, 800);
        assert_eq!(t.sample_depth, 3);
        assert_eq!(t.min_gesture_ms, 44);
        assert_eq!(t.max_gesture_ms, 1400);
        t.validate().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Tuning>("holdgesture_ms = 800\n").is_err());
    }

    #[test]
    fn rejects_misordered_lengths() {
        let t = Tuning {
            hold_gesture_ms: 2000,
            max_gesture_ms: 1400,
            ..Tuning::default()
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn rejects_degenerate_depth() {
        let t = Tuning {
            sample_depth: 1,
            ..Tuning::default()
        };
        assert!(t.validate().is_err());

        let t = Tuning {
            sample_depth: 64,
            ..Tuning::default()
        };
        assert!(t.validate().is_err());
    }
}
