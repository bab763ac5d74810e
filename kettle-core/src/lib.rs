// kettle-core/src/lib.rs

pub mod build;
pub mod install;
pub mod recipe;

// Re-export key types for easier use by the CLI crate
pub use build::env::BuildEnvironment;
pub use install::deps::{DependencyProbe, SystemProbe};
pub use install::runner::{ShellRunner, StepRunner};
pub use install::{InstallReport, InstallState, Installer};
pub use recipe::loader::{load_recipe_file, load_recipe_str, RecipeFormat};
