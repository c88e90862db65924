//! Keeper settings from a TOML file merged with command-line flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use logkeeper::{AgeThreshold, ArchiveCapacity, ArchiveErrorPolicy, KeeperConfig};

use crate::cli::RunArgs;

/// Contents of a settings file. Every key is optional so that flags can
/// fill in the rest.
///
/// ```toml
/// selection_pattern = "/var/log/myapp/*.log"
/// age_threshold = "1 month"
/// archive_name = "old.zip"
/// max_archive_entries = 30
/// on_archive_error = "skip"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub selection_pattern: Option<String>,
    pub age_threshold: Option<AgeThreshold>,
    pub archive_name: Option<String>,
    pub max_archive_entries: Option<ArchiveCapacity>,
    pub on_archive_error: Option<ArchiveErrorPolicy>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Build the run configuration; flags take precedence over the file.
pub fn resolve_config(args: &RunArgs) -> Result<KeeperConfig> {
    let file = match &args.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };

    let pattern = args
        .pattern
        .clone()
        .or(file.selection_pattern)
        .context("No selection pattern: pass --pattern or set selection_pattern")?;

    let age = match &args.age {
        Some(text) => text.parse::<AgeThreshold>()?,
        None => file
            .age_threshold
            .context("No age threshold: pass --age or set age_threshold")?,
    };

    let mut config = KeeperConfig::new(pattern, age)?;

    if let Some(name) = args.archive_name.clone().or(file.archive_name) {
        config = config.with_archive_name(name)?;
    }

    let capacity = match args.max_entries {
        Some(max) => ArchiveCapacity::try_from(max)?,
        None => file.max_archive_entries.unwrap_or_default(),
    };

    let policy = if args.skip_archive_errors {
        ArchiveErrorPolicy::Skip
    } else {
        file.on_archive_error.unwrap_or_default()
    };

    Ok(config
        .with_max_archive_entries(capacity)
        .with_archive_error_policy(policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SETTINGS: &str = r#"
selection_pattern = "/var/log/app/*.log"
age_threshold = "1 month"
archive_name = "archive.zip"
max_archive_entries = 30
on_archive_error = "skip"
"#;

    fn write_settings(content: &str) -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logkeeper.toml");
        std::fs::write(&path, content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_file_settings_only() {
        let (_temp, path) = write_settings(SETTINGS);
        let args = RunArgs {
            config: Some(path),
            ..Default::default()
        };

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.selection_pattern(), "/var/log/app/*.log");
        assert_eq!(config.age_threshold().to_string(), "1 month");
        assert_eq!(config.archive_name(), "archive.zip");
        assert_eq!(i64::from(config.max_archive_entries()), 30);
        assert_eq!(config.archive_error_policy(), ArchiveErrorPolicy::Skip);
    }

    #[test]
    fn test_flags_override_file() {
        let (_temp, path) = write_settings(SETTINGS);
        let args = RunArgs {
            config: Some(path),
            pattern: Some("/srv/logs".to_string()),
            age: Some("2 weeks".to_string()),
            max_entries: Some(0),
            ..Default::default()
        };

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.selection_pattern(), "/srv/logs");
        assert_eq!(config.age_threshold().to_string(), "2 weeks");
        assert_eq!(config.archive_name(), "archive.zip");
        assert_eq!(config.max_archive_entries(), ArchiveCapacity::Disabled);
    }

    #[test]
    fn test_flags_without_file_use_defaults() {
        let args = RunArgs {
            pattern: Some("logs".to_string()),
            age: Some("7 days".to_string()),
            ..Default::default()
        };

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.archive_name(), logkeeper::DEFAULT_ARCHIVE_NAME);
        assert_eq!(config.max_archive_entries(), ArchiveCapacity::Unbounded);
        assert_eq!(config.archive_error_policy(), ArchiveErrorPolicy::Abort);
    }

    #[test]
    fn test_missing_required_values() {
        let args = RunArgs {
            age: Some("7 days".to_string()),
            ..Default::default()
        };
        let err = resolve_config(&args).unwrap_err().to_string();
        assert!(err.contains("selection pattern"));

        let args = RunArgs {
            pattern: Some("logs".to_string()),
            ..Default::default()
        };
        let err = resolve_config(&args).unwrap_err().to_string();
        assert!(err.contains("age threshold"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let args = RunArgs {
            pattern: Some("logs".to_string()),
            age: Some("7 days".to_string()),
            max_entries: Some(-3),
            ..Default::default()
        };
        assert!(resolve_config(&args).is_err());

        assert!(FileSettings::parse("max_archive_entries = -2").is_err());
        assert!(FileSettings::parse("unknown_key = 1").is_err());
        assert!(FileSettings::parse(r#"age_threshold = "soon""#).is_err());
    }
}
