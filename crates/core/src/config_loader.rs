use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, TOML, environment variables, and JSON.
    ///
    /// Nested keys come from the environment with a double underscore, e.g.
    /// `SUREBET_SOLVER__SUREBET_FLOOR=0.02`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::figment("config/Config.toml", None)
    }

    /// Loads configuration with a specific profile overlay (`config/Config.<profile>.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::figment("config/Config.toml", Some(profile))
    }

    /// Loads configuration from an explicit TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        Self::figment(path, None)
    }

    fn figment(path: &str, profile: Option<&str>) -> Result<AppConfig> {
        let mut figment =
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path));

        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(format!("config/Config.{profile}.toml")));
        }

        let config: AppConfig = figment
            .merge(Env::prefixed("SUREBET_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        tracing::debug!(path, ?profile, "configuration loaded");
        Ok(config)
    }
}
