// kettle/src/cli/check.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use kettle_common::error::{KettleError, Result};
use kettle_common::Config;
use kettle_core::load_recipe_file;
use tracing::debug;

use super::resolve_recipe_path;

#[derive(Args, Debug)]
pub struct Check {
    /// Recipe files to validate
    #[arg(required = true)]
    pub recipes: Vec<PathBuf>,
}

impl Check {
    pub fn run(&self, config: &Config) -> Result<()> {
        let mut failed = 0usize;
        for path in &self.recipes {
            let resolved = resolve_recipe_path(config, path);
            match load_recipe_file(&resolved) {
                Ok(recipe) => {
                    debug!("{} parsed as {:?}", resolved.display(), recipe);
                    println!(
                        "{} {} ({} steps)",
                        "ok".green().bold(),
                        resolved.display(),
                        recipe.install_steps.len()
                    );
                }
                Err(e) => {
                    failed += 1;
                    println!("{} {}: {}", "FAIL".red().bold(), resolved.display(), e);
                }
            }
        }

        if failed > 0 {
            return Err(KettleError::RecipesFailed {
                failed,
                total: self.recipes.len(),
            });
        }
        Ok(())
    }
}
