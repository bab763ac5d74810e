// kettle/src/cli/install.rs

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use kettle_common::error::Result;
use kettle_common::Config;
use kettle_core::build::receipt::read_receipt;
use kettle_core::install::InstallOptions;
use kettle_core::{load_recipe_file, Installer, ShellRunner, SystemProbe};
use tracing::{debug, instrument};

use super::resolve_recipe_path;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Recipe file (.rb or .json)
    pub recipe: PathBuf,

    /// Build in this source tree instead of fetching the recipe's source
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<PathBuf>,

    /// Do not verify that dependencies are present
    #[arg(long)]
    pub skip_deps: bool,

    /// Keg version label (defaults to HEAD for head-only recipes)
    #[arg(id = "keg_version", long = "keg-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Print the interpolated install steps without running them
    #[arg(long)]
    pub dry_run: bool,
}

impl InstallArgs {
    #[instrument(skip(self, config), fields(recipe = %self.recipe.display()))]
    pub fn run(&self, config: &Config) -> Result<()> {
        let recipe = Arc::new(load_recipe_file(&resolve_recipe_path(config, &self.recipe))?);
        let options = InstallOptions {
            version: self.version.clone(),
            source_dir: self.source_dir.clone(),
            skip_dependency_check: self.skip_deps,
        };
        let mut installer = Installer::new(Arc::clone(&recipe), config.clone(), options);

        if self.dry_run {
            let buildpath = self
                .source_dir
                .clone()
                .unwrap_or_else(|| config.tmp_dir().join(format!("{}-<checkout>", recipe.name)));
            println!(
                "{}{} {} into {}",
                "==> ".bold().blue(),
                "Would install".bold(),
                recipe.name,
                installer.keg_path().display()
            );
            for step in installer.plan(&buildpath)? {
                println!("  {step}");
            }
            return Ok(());
        }

        if let Ok(existing) = read_receipt(&installer.keg_path()) {
            println!(
                "{} {} {} is already installed (at {}), reinstalling",
                "Warning:".yellow(),
                existing.name,
                existing.version,
                existing.time
            );
        }

        println!(
            "{}{} {}",
            "==> ".bold().blue(),
            "Installing".bold(),
            recipe.name
        );
        let probe = SystemProbe::new(config);
        let report = installer.run(&probe, &mut ShellRunner)?;
        debug!("Install report: {:?}", report);

        println!(
            "{}{} {} {} ({} steps)",
            "==> ".bold().blue(),
            "Installed".bold().green(),
            report.name,
            report.keg_path.display(),
            report.executed_steps.len()
        );
        Ok(())
    }
}
