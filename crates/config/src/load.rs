use crate::error::{ErrorKind, Result};
use crate::settings::Config;
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding configuration values.
pub const ENV_PREFIX: &str = "CAMSYNC_";
const APPLICATION: &str = "camsync";
const CONFIG_FILE: &str = "config.toml";

/// `config.toml` in the platform configuration directory
/// (`~/.config/camsync/config.toml` on Linux).
///
/// Returns `None` when no home directory can be determined, e.g. when
/// started from a udev rule without a user environment.
pub fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", APPLICATION).map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

impl Config {
    /// Load, merge and validate configuration from every source.
    ///
    /// `explicit` is a file passed by the user, which unlike the default
    /// file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(default_config_file().as_deref(), explicit)?;
        Self::from_figment(&figment)
    }

    /// Assemble the layered [`Figment`] without extracting it.
    pub fn figment(default_file: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = default_file {
            tracing::debug!(path = %path.display(), "Merging default configuration file");
            figment = figment.merge(Toml::file_exact(path));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Merging configuration file");
            figment = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => figment.merge(Toml::file_exact(path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }
}
