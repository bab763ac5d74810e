// kettle/src/cli/info.rs
use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use kettle_common::dependency::{Dependency, DependencyExt};
use kettle_common::error::Result;
use kettle_common::model::{FetchStrategy, Recipe};
use kettle_common::Config;
use kettle_core::load_recipe_file;

use super::resolve_recipe_path;

#[derive(Args, Debug)]
pub struct Info {
    /// Recipe file (.rb or .json)
    pub recipe: PathBuf,

    /// Print the recipe as JSON
    #[arg(long)]
    pub json: bool,
}

impl Info {
    pub fn run(&self, config: &Config) -> Result<()> {
        let recipe = load_recipe_file(&resolve_recipe_path(config, &self.recipe))?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&recipe)?);
        } else {
            print_recipe(&recipe);
        }
        Ok(())
    }
}

fn print_recipe(recipe: &Recipe) {
    println!("{} {}", "==>".bold().blue(), recipe.name.bold());
    if let Some(desc) = &recipe.desc {
        println!("{desc}");
    }
    if let Some(homepage) = &recipe.homepage {
        println!("{homepage}");
    }
    let strategy = match recipe.source.strategy {
        FetchStrategy::Git => "git",
        FetchStrategy::Url => "url",
    };
    println!(
        "Source: {} ({}, {})",
        recipe.source.url,
        strategy,
        recipe.default_version()
    );

    println!("{}", "==> Dependencies".bold().blue());
    for line in dependency_lines(recipe) {
        println!("{line}");
    }

    println!("{}", "==> Install steps".bold().blue());
    for (i, step) in recipe.install_steps.iter().enumerate() {
        println!("{:>3}. {}", i + 1, step);
    }
}

fn dependency_lines(recipe: &Recipe) -> Vec<String> {
    if recipe.dependencies.is_empty() {
        return vec!["None".to_string()];
    }
    let join = |deps: Vec<&Dependency>| {
        deps.iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = Vec::new();
    let required = recipe.dependencies.required();
    if !required.is_empty() {
        lines.push(format!("Required: {}", join(required)));
    }
    let optional = recipe.dependencies.optional();
    if !optional.is_empty() {
        lines.push(format!("Optional: {}", join(optional)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use kettle_common::dependency::DependencyTag;
    use kettle_common::model::{InstallStep, SourceLocation};

    use super::*;

    #[test]
    fn optional_dependencies_are_listed_apart() {
        let mut recipe = Recipe {
            name: "demo".into(),
            class_name: "Demo".into(),
            source: SourceLocation::head_git("git://example.com/demo.git"),
            homepage: None,
            desc: None,
            version: None,
            dependencies: vec![
                Dependency::new_runtime("cmake"),
                Dependency::new_with_tags("doxygen", DependencyTag::OPTIONAL),
                Dependency::new_with_tags("pkg-config", DependencyTag::BUILD),
            ],
            install_steps: vec![InstallStep::shell("make")],
        };
        assert_eq!(
            dependency_lines(&recipe),
            vec![
                "Required: cmake, pkg-config (build)".to_string(),
                "Optional: doxygen (optional)".to_string(),
            ]
        );

        recipe.dependencies.clear();
        assert_eq!(dependency_lines(&recipe), vec!["None".to_string()]);
    }
}
