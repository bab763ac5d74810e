// kettle-aio/src/lib.rs
//! Blocking IO operations for kettle (process execution, source fetch)

pub mod fetch;
pub mod process;

pub use fetch::{fetch_source, SourceCheckout};
pub use process::{run_command_status, run_shell_status};
