// crates/strand-cli/src/commands/mod.rs
//
// Command module declarations for the Strand CLI.

pub mod content;
pub mod init;
pub mod pool;
pub mod probe;
pub mod query;
pub mod share;
pub mod status;
