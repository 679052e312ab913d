//! # CLI Command Implementations
//!
//! One module per subcommand of the `resource-forge` tool. Each contains an
//! `Args` struct derived with `clap` and an `execute` function calling into
//! the `resource_forge` library.

pub mod completions;
pub mod profiles;
pub mod resource;
pub mod validate;
