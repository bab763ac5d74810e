// kettle-common/src/model/mod.rs
pub mod recipe;

pub use recipe::{FetchStrategy, InstallStep, Recipe, SourceLocation, SourceSpec};
