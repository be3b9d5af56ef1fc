use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DB_ENV_VAR: &str = "JOBBOARD_DB";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// `--db` wins over `JOBBOARD_DB`, which wins over the XDG data directory.
    pub fn resolve(cli_db: Option<PathBuf>) -> Result<Self> {
        let db_path = match cli_db {
            Some(path) => path,
            None => match std::env::var_os(DB_ENV_VAR) {
                Some(path) if !path.is_empty() => PathBuf::from(path),
                _ => Self::default_path(),
            },
        };

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }

        Ok(Self { db_path })
    }

    fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobboard") {
            proj_dirs.data_dir().join("jobboard.db")
        } else {
            PathBuf::from("jobboard.db")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.db");
        let config = Config::resolve(Some(path.clone())).unwrap();
        assert_eq!(config.db_path, path);
        assert!(path.parent().unwrap().is_dir());
    }
}
