// kettle-core/src/install/deps.rs
//! Verifies that a recipe's dependencies are present. Nothing is installed
//! here; a missing dependency fails the install before any step runs.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use kettle_common::config::Config;
use kettle_common::dependency::Dependency;
use kettle_common::error::{KettleError, Result};
use kettle_common::keg::KegRegistry;
use kettle_common::model::Recipe;
use tracing::{debug, warn};

/// Where a present dependency was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyLocation {
    /// An installed keg under the Cellar.
    Keg(PathBuf),
    /// An executable of the same name on the search path.
    Executable(PathBuf),
}

impl DependencyLocation {
    pub fn path(&self) -> &Path {
        match self {
            Self::Keg(p) | Self::Executable(p) => p,
        }
    }

    /// Directory whose `bin` (or itself) should lead `PATH` during the build.
    pub fn build_prefix(&self) -> PathBuf {
        match self {
            Self::Keg(p) => p.clone(),
            Self::Executable(p) => p
                .parent()
                .map_or_else(|| p.clone(), Path::to_path_buf),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub dependency: Dependency,
    /// `None` only for optional dependencies that were skipped.
    pub location: Option<DependencyLocation>,
}

/// Answers whether a dependency is present in the environment.
pub trait DependencyProbe {
    fn locate(&self, dep: &Dependency) -> Option<DependencyLocation>;
}

/// Looks for a keg first, then for an executable on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    registry: KegRegistry,
    search_path: Option<OsString>,
}

impl SystemProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: KegRegistry::new(config.clone()),
            search_path: None,
        }
    }

    /// Searches `search_path` instead of the process `PATH`.
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }
}

impl DependencyProbe for SystemProbe {
    fn locate(&self, dep: &Dependency) -> Option<DependencyLocation> {
        match self.registry.get_installed_keg(&dep.name) {
            Ok(Some(keg)) => return Some(DependencyLocation::Keg(keg.path)),
            Ok(None) => {}
            Err(e) => warn!("Could not query keg for '{}': {}", dep.name, e),
        }

        let found = match &self.search_path {
            Some(paths) => which::which_in(&dep.name, Some(paths), "/"),
            None => which::which(&dep.name),
        };
        match found {
            Ok(path) => Some(DependencyLocation::Executable(path)),
            Err(e) => {
                debug!("'{}' not found on search path: {}", dep.name, e);
                None
            }
        }
    }
}

/// Locates every dependency of `recipe`. All missing required names are
/// reported together.
pub fn check_dependencies<P>(recipe: &Recipe, probe: &P) -> Result<Vec<ResolvedDependency>>
where
    P: DependencyProbe + ?Sized,
{
    let mut resolved = Vec::with_capacity(recipe.dependencies.len());
    let mut missing = Vec::new();

    for dep in &recipe.dependencies {
        match probe.locate(dep) {
            Some(location) => {
                debug!("Dependency '{}' present at {}", dep, location.path().display());
                resolved.push(ResolvedDependency {
                    dependency: dep.clone(),
                    location: Some(location),
                });
            }
            None if !dep.is_required() => {
                debug!("Optional dependency '{}' not present, skipping", dep.name);
                resolved.push(ResolvedDependency {
                    dependency: dep.clone(),
                    location: None,
                });
            }
            None => missing.push(dep.name.clone()),
        }
    }

    if missing.is_empty() {
        Ok(resolved)
    } else {
        Err(KettleError::DependencyResolutionError(missing))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use kettle_common::dependency::DependencyTag;
    use kettle_common::model::{InstallStep, SourceLocation};

    use super::*;

    struct Present(HashSet<&'static str>);

    impl DependencyProbe for Present {
        fn locate(&self, dep: &Dependency) -> Option<DependencyLocation> {
            self.0
                .contains(dep.name.as_str())
                .then(|| DependencyLocation::Executable(PathBuf::from("/usr/bin").join(&dep.name)))
        }
    }

    fn recipe(deps: Vec<Dependency>) -> Recipe {
        Recipe {
            name: "demo".into(),
            class_name: "Demo".into(),
            source: SourceLocation::head_git("git://example.com/demo.git"),
            homepage: None,
            desc: None,
            version: None,
            dependencies: deps,
            install_steps: vec![InstallStep::shell("true")],
        }
    }

    #[test]
    fn all_missing_names_are_reported() {
        let r = recipe(vec![
            Dependency::new_runtime("cmake"),
            Dependency::new_runtime("tesseract"),
            Dependency::new_runtime("ffmpeg"),
        ]);
        let probe = Present(["cmake"].into_iter().collect());
        match check_dependencies(&r, &probe) {
            Err(KettleError::DependencyResolutionError(missing)) => {
                assert_eq!(missing, vec!["tesseract".to_string(), "ffmpeg".to_string()]);
            }
            other => panic!("expected dependency error, got {other:?}"),
        }
    }

    #[test]
    fn optional_dependencies_may_be_absent() {
        let r = recipe(vec![
            Dependency::new_runtime("cmake"),
            Dependency::new_with_tags("doxygen", DependencyTag::OPTIONAL),
        ]);
        let probe = Present(["cmake"].into_iter().collect());
        let resolved = check_dependencies(&r, &probe).unwrap();
        assert_eq!(resolved.len(), 2);
        assert!(resolved[1].location.is_none());
        assert_eq!(resolved[0].location.as_ref().unwrap().build_prefix(), PathBuf::from("/usr/bin"));
    }

    #[test]
    fn system_probe_prefers_kegs_then_search_path() {
        let prefix = tempfile::tempdir().unwrap();
        let config = Config::with_prefix(prefix.path());
        let keg = config.keg_path("tesseract", "5.3.0");
        fs::create_dir_all(&keg).unwrap();

        let bin_dir = tempfile::tempdir().unwrap();
        let exe = bin_dir.path().join("cmake");
        fs::write(&exe, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
        }

        let probe = SystemProbe::new(&config).with_search_path(bin_dir.path());
        assert_eq!(
            probe.locate(&Dependency::new_runtime("tesseract")),
            Some(DependencyLocation::Keg(keg))
        );
        assert_eq!(
            probe.locate(&Dependency::new_runtime("cmake")),
            Some(DependencyLocation::Executable(exe))
        );
        assert_eq!(probe.locate(&Dependency::new_runtime("ffmpeg")), None);
    }
}
