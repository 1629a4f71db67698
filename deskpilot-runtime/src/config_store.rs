use anyhow::Context;
use deskpilot_core::config::PilotConfig;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<PilotConfig> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: PilotConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Writes the config atomically: a temp file in the same directory is
    /// persisted over the destination.
    pub fn save(&self, cfg: &PilotConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("create config directory: {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(&json).context("write config temp file")?;
        tmp.as_file().sync_all().context("flush config temp file")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("replace config: {}", self.path.display()))?;

        log::debug!("saved config to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_core::config::DisplaySize;

    #[test]
    fn round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("nested").join("pilot.json"));

        let cfg = PilotConfig {
            display: DisplaySize {
                width_px: 1920,
                height_px: 1080,
            },
            settle_delay_ms: 0,
            max_turns: Some(12),
            system_prompt: Some("Be brief.".into()),
            ..PilotConfig::default()
        };

        store.save(&cfg).unwrap();
        assert_eq!(store.load().unwrap(), cfg);
    }

    #[test]
    fn save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pilot.json");
        let store = ConfigStore::at_path(&path);

        store.save(&PilotConfig::default()).unwrap();
        let updated = PilotConfig {
            model: "claude-3-7-sonnet-latest".into(),
            ..PilotConfig::default()
        };
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap().model, "claude-3-7-sonnet-latest");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error_naming_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("absent.json"));
        let err = store.load().unwrap_err();
        assert!(format!("{err:#}").contains("absent.json"));
        assert!(store.path().ends_with("absent.json"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pilot.json");
        fs::write(&path, b"{not json").unwrap();
        let err = ConfigStore::at_path(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("decode config JSON"));
    }
}
