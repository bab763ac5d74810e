// kettle-core/src/install/mod.rs
//! The install operation: verify dependencies, obtain the source, run the
//! recipe's steps in order and stop at the first failure.
//!
//! ```text
//! Pending -> DependenciesResolving -> DependenciesSatisfied -> Building -> Installed
//!                     |                                           |
//!                     +-------------------> Failed <--------------+
//! ```

pub mod deps;
pub mod runner;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kettle_aio::SourceCheckout;
use kettle_common::config::Config;
use kettle_common::error::{KettleError, Result};
use kettle_common::model::{InstallStep, Recipe};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::build::env::BuildEnvironment;
use crate::build::receipt::write_receipt;
use deps::{check_dependencies, DependencyProbe, ResolvedDependency};
use runner::{StepOutcome, StepRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstallState {
    Pending,
    DependenciesResolving,
    DependenciesSatisfied,
    Building,
    Installed,
    Failed,
}

impl InstallState {
    pub fn can_transition_to(self, next: InstallState) -> bool {
        use InstallState::*;
        matches!(
            (self, next),
            (Pending, DependenciesResolving)
                | (DependenciesResolving, DependenciesSatisfied)
                | (DependenciesResolving, Failed)
                | (DependenciesSatisfied, Building)
                | (Building, Installed)
                | (Building, Failed)
        )
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::DependenciesResolving => "resolving dependencies",
            Self::DependenciesSatisfied => "dependencies satisfied",
            Self::Building => "building",
            Self::Installed => "installed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedStep {
    pub index: usize,
    /// The step as declared in the recipe.
    pub command: String,
    /// `None` when the step died by signal.
    pub exit_code: Option<i32>,
    pub success: bool,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    pub state: InstallState,
    pub transitions: Vec<InstallState>,
    pub executed_steps: Vec<ExecutedStep>,
    pub keg_path: PathBuf,
    pub receipt_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Keg version label; defaults to [`Recipe::default_version`].
    pub version: Option<String>,
    /// Build in this tree instead of fetching the recipe's source.
    pub source_dir: Option<PathBuf>,
    pub skip_dependency_check: bool,
}

/// Drives one install of one recipe. The recipe is shared read-only; all
/// mutable progress lives in the installer.
#[derive(Debug)]
pub struct Installer {
    recipe: Arc<Recipe>,
    config: Config,
    options: InstallOptions,
    version: String,
    state: InstallState,
    transitions: Vec<InstallState>,
    executed: Vec<ExecutedStep>,
    receipt_path: Option<PathBuf>,
}

impl Installer {
    pub fn new(recipe: Arc<Recipe>, config: Config, options: InstallOptions) -> Self {
        let version = options
            .version
            .clone()
            .unwrap_or_else(|| recipe.default_version().to_string());
        Self {
            recipe,
            config,
            options,
            version,
            state: InstallState::Pending,
            transitions: vec![InstallState::Pending],
            executed: Vec::new(),
            receipt_path: None,
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn keg_path(&self) -> PathBuf {
        self.config.keg_path(&self.recipe.name, &self.version)
    }

    pub fn report(&self) -> InstallReport {
        InstallReport {
            name: self.recipe.name.clone(),
            version: self.version.clone(),
            state: self.state,
            transitions: self.transitions.clone(),
            executed_steps: self.executed.clone(),
            keg_path: self.keg_path(),
            receipt_path: self.receipt_path.clone(),
        }
    }

    fn transition(&mut self, next: InstallState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(KettleError::InstallError(format!(
                "illegal install state change for '{}': {} -> {}",
                self.recipe.name, self.state, next
            )));
        }
        debug!("[{}] {} -> {}", self.recipe.name, self.state, next);
        self.state = next;
        self.transitions.push(next);
        Ok(())
    }

    /// Moves to `Failed` and hands the error back for propagation.
    fn fail(&mut self, err: KettleError) -> KettleError {
        if let Err(e) = self.transition(InstallState::Failed) {
            warn!("{}", e);
        }
        error!("[{}] install failed: {}", self.recipe.name, err);
        err
    }

    /// Renders the steps as they would run against `buildpath`, without
    /// running anything.
    pub fn plan(&self, buildpath: &Path) -> Result<Vec<InstallStep>> {
        let env = BuildEnvironment::new(&self.keg_path(), buildpath, &[]);
        self.recipe
            .install_steps
            .iter()
            .map(|step| env.render_step(step))
            .collect()
    }

    /// Runs the install to completion. On failure the installer is left in
    /// `Failed` and [`Installer::report`] shows how far it got.
    #[instrument(skip(self, probe, runner), fields(recipe = %self.recipe.name, version = %self.version))]
    pub fn run<P, R>(&mut self, probe: &P, runner: &mut R) -> Result<InstallReport>
    where
        P: DependencyProbe + ?Sized,
        R: StepRunner + ?Sized,
    {
        if self.state != InstallState::Pending {
            return Err(KettleError::InstallError(format!(
                "install of '{}' already ran (state: {})",
                self.recipe.name, self.state
            )));
        }

        self.transition(InstallState::DependenciesResolving)?;
        let resolved = if self.options.skip_dependency_check {
            warn!(
                "Skipping dependency check for '{}' ({} declared)",
                self.recipe.name,
                self.recipe.dependencies.len()
            );
            Vec::new()
        } else {
            match check_dependencies(&self.recipe, probe) {
                Ok(resolved) => resolved,
                Err(e) => return Err(self.fail(e)),
            }
        };
        self.transition(InstallState::DependenciesSatisfied)?;

        self.transition(InstallState::Building)?;
        if let Err(e) = self.build(&resolved, runner) {
            return Err(self.fail(e));
        }

        self.transition(InstallState::Installed)?;
        info!(
            "Installed {} {} into {}",
            self.recipe.name,
            self.version,
            self.keg_path().display()
        );
        Ok(self.report())
    }

    fn build<R>(&mut self, resolved: &[ResolvedDependency], runner: &mut R) -> Result<()>
    where
        R: StepRunner + ?Sized,
    {
        let checkout = match &self.options.source_dir {
            Some(dir) => {
                debug!("Using provided source directory {}", dir.display());
                SourceCheckout {
                    root: dir.clone(),
                    temporary: false,
                }
            }
            None => kettle_aio::fetch_source(
                &self.recipe.name,
                &self.recipe.source,
                &self.config.tmp_dir(),
            )?,
        };
        let buildpath = checkout.root.clone();

        let keg_path = self.keg_path();
        let dependency_prefixes: Vec<PathBuf> = resolved
            .iter()
            .filter_map(|r| r.location.as_ref().map(|l| l.build_prefix()))
            .collect();
        let env = BuildEnvironment::new(&keg_path, &buildpath, &dependency_prefixes);

        let recipe = Arc::clone(&self.recipe);
        for (index, step) in recipe.install_steps.iter().enumerate() {
            let rendered = env.render_step(step)?;
            info!("==> {}", rendered);

            let started = Instant::now();
            let outcome = match runner.run_step(&rendered, &env) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("[{}] step {} could not be run: {}", self.recipe.name, index + 1, e);
                    StepOutcome::failed(None)
                }
            };
            self.executed.push(ExecutedStep {
                index,
                command: step.command_line(),
                exit_code: outcome.code,
                success: outcome.success,
                duration: started.elapsed(),
            });

            if !outcome.success {
                if checkout.temporary {
                    info!("Keeping checkout {} for inspection", buildpath.display());
                }
                return Err(KettleError::StepExecutionError {
                    index,
                    command: step.command_line(),
                    status: outcome.code,
                });
            }
        }

        self.receipt_path = Some(write_receipt(&self.recipe, &self.version, &keg_path)?);
        if let Err(e) = checkout.cleanup() {
            warn!("Could not remove checkout {}: {}", buildpath.display(), e);
        }
        Ok(())
    }
}
