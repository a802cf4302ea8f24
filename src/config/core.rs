use anyhow::{Context, Result, bail};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};

use super::AuditConfig;
use super::smart_load;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "DEPAUDIT_";

impl AuditConfig {
    /// Load, merge and validate the configuration
    ///
    /// `overrides` is a partial configuration document (for instance built
    /// from command-line flags) merged on top of every other source.
    pub fn load(custom_config: Option<&str>, overrides: Option<serde_json::Value>) -> Result<Self> {
        if let Some(path) = custom_config {
            if !std::path::Path::new(path).is_file() {
                bail!("Config file not found: {path}");
            }
        }

        let config: AuditConfig = Self::figment(custom_config, overrides)
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// The layered configuration sources, lowest priority first
    pub fn figment(custom_config: Option<&str>, overrides: Option<serde_json::Value>) -> Figment {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        // A custom config replaces the user and repository files
        if let Some(custom_path) = custom_config {
            figment = figment.merge(smart_load::auto(custom_path));
        } else {
            let user = Self::user_config_path();
            figment = figment
                .merge(Toml::file(&user))
                .merge(Json::file(user.replace(".toml", ".json")))
                .merge(Yaml::file(user.replace(".toml", ".yaml")))
                .merge(Toml::file("depaudit.toml"))
                .merge(Json::file("depaudit.json"))
                .merge(Yaml::file("depaudit.yaml"));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        figment
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/depaudit/config.toml"),
            Err(_) => "~/.config/depaudit/config.toml".to_string(),
        }
    }
}
