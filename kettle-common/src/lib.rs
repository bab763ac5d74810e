// kettle-common/src/lib.rs
pub mod config;
pub mod dependency;
pub mod error;
pub mod keg;
pub mod model;

// Re-export key types
pub use config::Config;
pub use error::{KettleError, Result};
pub use model::Recipe;
