// kettle-common/src/keg.rs
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::config::Config;
use super::error::{KettleError, Result};

/// An installed package version under the Cellar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledKeg {
    pub name: String,
    pub version_str: String,
    pub path: PathBuf,
}

/// Queries installed packages in the Cellar.
#[derive(Debug, Clone)]
pub struct KegRegistry {
    config: Config,
}

impl KegRegistry {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the lexicographically greatest installed version of `name`.
    pub fn get_installed_keg(&self, name: &str) -> Result<Option<InstalledKeg>> {
        let formula_dir = self.config.formula_cellar_dir(name);
        debug!(
            "[KEG_REGISTRY:{}] Checking {}",
            name,
            formula_dir.display()
        );

        if !formula_dir.is_dir() {
            debug!("[KEG_REGISTRY:{}] No cellar directory.", name);
            return Ok(None);
        }

        let entries = fs::read_dir(&formula_dir).map_err(|e| {
            KettleError::Io(std::sync::Arc::new(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", formula_dir.display(), e),
            )))
        })?;

        let mut latest_keg: Option<InstalledKeg> = None;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "[KEG_REGISTRY:{}] Error reading an entry in '{}': {}. Skipping.",
                        name,
                        formula_dir.display(),
                        e
                    );
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(version_str) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let newer = latest_keg
                .as_ref()
                .is_none_or(|current| version_str > current.version_str.as_str());
            if newer {
                latest_keg = Some(InstalledKeg {
                    name: name.to_string(),
                    version_str: version_str.to_string(),
                    path: path.clone(),
                });
            }
        }

        if let Some(keg) = &latest_keg {
            debug!(
                "[KEG_REGISTRY:{}] Latest keg: {} ({})",
                name,
                keg.version_str,
                keg.path.display()
            );
        }
        Ok(latest_keg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_latest_version_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_prefix(tmp.path());
        fs::create_dir_all(config.keg_path("cmake", "3.20.0")).unwrap();
        fs::create_dir_all(config.keg_path("cmake", "3.29.1")).unwrap();
        fs::write(config.formula_cellar_dir("cmake").join("stray"), b"").unwrap();

        let registry = KegRegistry::new(config);
        let keg = registry.get_installed_keg("cmake").unwrap().unwrap();
        assert_eq!(keg.version_str, "3.29.1");
        assert!(registry.get_installed_keg("ffmpeg").unwrap().is_none());
    }
}
