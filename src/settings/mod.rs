//! Startup configuration: a TOML file picked by build profile or `--settings`,
//! overridable per key through `TOKENGUARD__` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
