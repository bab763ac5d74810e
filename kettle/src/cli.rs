// kettle/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use kettle_common::error::Result;
use kettle_common::Config;

pub mod check;
pub mod info;
pub mod install;

use crate::cli::check::Check;
use crate::cli::info::Info;
use crate::cli::install::InstallArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "kettle", bin_name = "kettle")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show what a recipe declares
    Info(Info),
    /// Parse recipes and report errors without installing
    Check(Check),
    /// Check dependencies, fetch the source and run the install steps
    Install(InstallArgs),
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Info(command) => command.run(config),
            Self::Check(command) => command.run(config),
            Self::Install(command) => command.run(config),
        }
    }
}

/// Expands a leading `~/` against the user's home directory.
pub fn resolve_recipe_path(config: &Config, path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => config.home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}
