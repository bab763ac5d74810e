// kettle-core/src/recipe/mod.rs
//! Turning descriptor text into a validated [`Recipe`](kettle_common::Recipe).

mod dsl;
mod lexer;
pub mod loader;
