//! CLI command implementations for the `cadastro` binary.

pub mod lookup_cmd;
pub mod output;
pub mod search_cmd;
