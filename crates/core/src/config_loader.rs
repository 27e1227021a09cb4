use crate::config::AnalysisConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

/// Base file read by [`ConfigLoader::load`] and [`ConfigLoader::load_with_profile`].
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads analysis configuration by merging defaults, TOML, JSON, and
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AnalysisConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads analysis configuration from a specific TOML file.
    ///
    /// A JSON file with the same stem next to it (`Config.json` for
    /// `Config.toml`) is layered on top. Missing files are skipped, leaving
    /// the defaults in place.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AnalysisConfig> {
        Self::layered(path.as_ref(), None)
    }

    /// Loads analysis configuration with a specific profile.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<AnalysisConfig> {
        Self::load_from_with_profile(DEFAULT_CONFIG_PATH, profile)
    }

    /// Loads `path`, then `<stem>.<profile>.toml` from the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AnalysisConfig> {
        Self::layered(path.as_ref(), Some(profile))
    }

    fn layered(path: &Path, profile: Option<&str>) -> Result<AnalysisConfig> {
        let mut figment = Self::base().merge(Toml::file(path));
        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(profile_path(path, profile)));
        }

        // defaults are seeded for every key, so later layers must merge
        let config: AnalysisConfig = figment
            .merge(Json::file(path.with_extension("json")))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        tracing::debug!(
            path = %path.display(),
            profile = profile.unwrap_or("none"),
            ?config,
            "Loaded analysis config"
        );
        Ok(config)
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(AnalysisConfig::default()))
    }
}

fn profile_path(path: &Path, profile: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Config");
    path.with_file_name(format!("{stem}.{profile}.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnapshotSelection;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ConfigLoader::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.scoring.uniform_points, 50);
        assert_eq!(config.snapshot.alignment_tolerance_secs, 0);
    }

    #[test]
    fn json_overrides_defaults_and_toml() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("Config.toml");
        fs::write(&toml_path, "[scoring]\nuniform_points = 20\nhistorical_margin = 2.0\n").unwrap();
        fs::write(
            dir.path().join("Config.json"),
            r#"{"scoring":{"uniform_points":7}}"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from(&toml_path).unwrap();

        assert_eq!(config.scoring.uniform_points, 7);
        assert!((config.scoring.historical_margin - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn json_alone_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Config.json"),
            r#"{"snapshot":{"alignment_tolerance_secs":30}}"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from(dir.path().join("Config.toml")).unwrap();

        assert_eq!(config.snapshot.alignment_tolerance_secs, 30);
        assert_eq!(config.scoring.uniform_points, 50);
    }

    #[test]
    fn profile_layers_over_given_base_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("Config.toml");
        fs::write(&toml_path, "[scoring]\nuniform_points = 20\ntail_extension = 0.5\n").unwrap();
        fs::write(
            dir.path().join("Config.backtest.toml"),
            "[scoring]\nsnapshot_selection = \"earliest\"\ntail_extension = 1.0\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_with_profile(&toml_path, "backtest").unwrap();

        assert_eq!(config.scoring.uniform_points, 20);
        assert_eq!(config.scoring.snapshot_selection, SnapshotSelection::Earliest);
        assert!((config.scoring.tail_extension - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn profile_path_sits_next_to_base_file() {
        assert_eq!(
            profile_path(Path::new("config/Config.toml"), "prod"),
            PathBuf::from("config/Config.prod.toml")
        );
    }
}
