//! Operator configuration stored in `timed-stats.toml`

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TimedStatsConfig {
    /// SQLite file holding the `timed` table
    pub database: Option<String>,
}

impl TimedStatsConfig {
    /// Config pointing at the default database under `base`
    pub fn with_default_database(base: &Path) -> Self {
        Self {
            database: Some(default_database_path_in(base).display().to_string()),
        }
    }

    /// Read a config file. A missing file is not an error.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;

        if config.database.as_deref().is_some_and(|d| d.trim().is_empty()) {
            anyhow::bail!("config {}: `database` must not be empty", path.display());
        }
        Ok(Some(config))
    }

    pub fn save(&self, path: &Path, force: bool) -> anyhow::Result<()> {
        if path.exists() && !force {
            anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("writing config {}", path.display()))
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.as_ref().map(PathBuf::from)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("timed-stats.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".timed-stats").join("timed.db")
}

/// Flag beats config file, config file beats the default location
pub fn resolve_database_path(flag: Option<PathBuf>, config: Option<&TimedStatsConfig>) -> PathBuf {
    flag.or_else(|| config.and_then(TimedStatsConfig::database_path))
        .unwrap_or_else(|| default_database_path_in(Path::new(".")))
}

/// Create the directory the database file lives in
pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("creating database directory {}", parent.display())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = TimedStatsConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timed-stats.toml");
        let config = TimedStatsConfig {
            database: Some("data/timed.db".to_string()),
        };

        config.save(&path, false).unwrap();
        assert_eq!(TimedStatsConfig::load(&path).unwrap(), Some(config.clone()));

        assert!(config.save(&path, false).is_err());
        TimedStatsConfig::default().save(&path, true).unwrap();
        assert_eq!(TimedStatsConfig::load(&path).unwrap(), Some(TimedStatsConfig::default()));
    }

    #[test]
    fn test_empty_database_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timed-stats.toml");
        std::fs::write(&path, "database = \"  \"\n").unwrap();

        let err = TimedStatsConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timed-stats.toml");
        std::fs::write(&path, "database = [").unwrap();

        let err = TimedStatsConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn test_resolve_database_path_precedence() {
        let config = TimedStatsConfig {
            database: Some("from-config.db".to_string()),
        };

        assert_eq!(
            resolve_database_path(Some(PathBuf::from("flag.db")), Some(&config)),
            PathBuf::from("flag.db")
        );
        assert_eq!(resolve_database_path(None, Some(&config)), PathBuf::from("from-config.db"));
        assert_eq!(
            resolve_database_path(None, Some(&TimedStatsConfig::default())),
            Path::new(".").join(".timed-stats").join("timed.db")
        );
        assert_eq!(
            resolve_database_path(None, None),
            TimedStatsConfig::with_default_database(Path::new(".")).database_path().unwrap()
        );
    }

    #[test]
    fn test_ensure_db_dir_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("timed.db");
        ensure_db_dir(&db).unwrap();
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
        ensure_db_dir(Path::new("timed.db")).unwrap();
    }
}
