use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Environment prefix; nested keys are separated by `__`
/// (e.g. `BASIS_DATABASE__URL`).
pub const ENV_PREFIX: &str = "BASIS_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, the TOML file and environment variables.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path.as_ref()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with a profile overlay (`Config.<profile>.toml`
    /// next to the base file).
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result fails validation.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        let path = path.as_ref();
        let profile_path = path.with_file_name(format!("Config.{profile}.toml"));

        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Toml::file(profile_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
