//! TOML settings, picked by build profile unless `--settings` names a file.
//! Defaults and parsing are covered by the tests in `settings.rs`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
