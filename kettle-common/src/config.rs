// kettle-common/src/config.rs
use std::env::{self, VarError};
use std::path::{Path, PathBuf};

use directories::UserDirs;
use tracing::debug;

use super::error::{KettleError, Result};

// Used when neither KETTLE_PREFIX nor HOMEBREW_PREFIX is set or both are empty.
const DEFAULT_FALLBACK_PREFIX: &str = "/opt/homebrew";
const PREFIX_ENV_VARS: [&str; 2] = ["KETTLE_PREFIX", "HOMEBREW_PREFIX"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prefix: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        debug!("Loading kettle configuration");

        let prefix_str = prefix_from(|var| env::var(var))?.unwrap_or_else(|| {
            debug!(
                "No prefix environment variable set, falling back to default: {}",
                DEFAULT_FALLBACK_PREFIX
            );
            DEFAULT_FALLBACK_PREFIX.to_string()
        });

        let config = Self::with_prefix(prefix_str);
        debug!("Effective prefix set to: {}", config.prefix.display());
        Ok(config)
    }

    pub fn with_prefix(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn cellar_dir(&self) -> PathBuf {
        self.prefix.join("Cellar")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.prefix.join("tmp")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.prefix.join("kettle_logs")
    }

    pub fn formula_cellar_dir(&self, formula_name: &str) -> PathBuf {
        self.cellar_dir().join(formula_name)
    }

    pub fn keg_path(&self, formula_name: &str, version_str: &str) -> PathBuf {
        self.formula_cellar_dir(formula_name).join(version_str)
    }

    pub fn home_dir(&self) -> PathBuf {
        UserDirs::new().map_or_else(|| PathBuf::from("/"), |ud| ud.home_dir().to_path_buf())
    }
}

/// First non-empty prefix variable. A variable that is set but not valid
/// UTF-8 is an error rather than silently skipped.
fn prefix_from<F>(lookup: F) -> Result<Option<String>>
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
{
    for var in PREFIX_ENV_VARS {
        match lookup(var) {
            Ok(value) if !value.is_empty() => {
                debug!("Using prefix from {}: {}", var, value);
                return Ok(Some(value));
            }
            Ok(_) | Err(VarError::NotPresent) => {}
            Err(VarError::NotUnicode(raw)) => {
                return Err(KettleError::Config(format!(
                    "{var} is not valid UTF-8: {}",
                    raw.to_string_lossy()
                )));
            }
        }
    }
    Ok(None)
}
