//! Configuration for camsync.
//!
//! Values are layered with [`figment`], later sources winning:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. `config.toml` in the platform configuration directory, if present.
//! 3. A file given on the command line (TOML, YAML or JSON).
//! 4. `CAMSYNC_`-prefixed environment variables, `__` separating sections
//!    (`CAMSYNC_TARGET__REMOTE=backup:photos`).

pub mod error;
mod load;
mod settings;

pub use crate::load::{ENV_PREFIX, default_config_file};
pub use crate::settings::{Config, MediaConfig, MetadataConfig, ModelsConfig, RenameConfig, TargetConfig, TargetKind};
