// kettle-core/src/build/mod.rs
// Build environment and post-install bookkeeping.

pub mod env;
pub mod receipt;

pub use env::BuildEnvironment;
pub use receipt::{read_receipt, write_receipt, InstallReceipt, RECEIPT_FILE_NAME};
