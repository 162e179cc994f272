use std::path::Path;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::workload::{GeneratorsConfig, WorkloadConfig};

/// Prefix for environment overrides, e.g. `SIMPLE_APP_LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "SIMPLE_APP_";

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

/// Main config, built from defaults, an optional YAML file and the environment.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The address to listen on for HTTP requests.
    pub listen_address: String,
    pub logging: LoggingConfig,
    pub generators: GeneratorsConfig,
    pub workload: WorkloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            logging: LoggingConfig::default(),
            generators: GeneratorsConfig::default(),
            workload: WorkloadConfig::default(),
        }
    }
}

/// Layers the configuration sources. Later sources win:
/// defaults, `path` (if it exists), `SIMPLE_APP_*` variables, then `listen_address`.
pub fn figment(path: &Path, listen_address: Option<&str>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    if let Some(address) = listen_address {
        figment = figment.merge(Serialized::default("listen_address", address));
    }
    figment
}

/// Loads the configuration, see [`figment`] for precedence.
pub fn load_config(path: &Path, listen_address: Option<&str>) -> Result<Config, figment::Error> {
    figment(path, listen_address).extract()
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error rendering configuration schema: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogFormat, LogLevel};
    use figment::Jail;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = load_config(Path::new("missing.yaml"), None)?;
            assert_eq!(config, Config::default());
            assert_eq!(config.listen_address, "0.0.0.0:8080");
            Ok(())
        });
    }

    #[test]
    fn file_then_env_then_flag() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
listen_address: "127.0.0.1:9000"
logging:
  level: debug
  format: json
generators:
  counter_interval_ms: 250
"#,
            )?;
            let config = load_config(Path::new("config.yaml"), None)?;
            assert_eq!(config.listen_address, "127.0.0.1:9000");
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.generators.counter_interval_ms, 250);
            assert_eq!(config.generators.latency_interval_ms, 10);

            jail.set_env("SIMPLE_APP_WORKLOAD__MAX_DELAY_MS", "0");
            jail.set_env("SIMPLE_APP_LISTEN_ADDRESS", "127.0.0.1:9100");
            let config = load_config(Path::new("config.yaml"), None)?;
            assert_eq!(config.workload.max_delay_ms, 0);
            assert_eq!(config.listen_address, "127.0.0.1:9100");

            let config = load_config(Path::new("config.yaml"), Some("127.0.0.1:7070"))?;
            assert_eq!(config.listen_address, "127.0.0.1:7070");
            Ok(())
        });
    }

    #[test]
    fn invalid_level_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "logging:\n  level: loud\n")?;
            assert!(load_config(Path::new("config.yaml"), None).is_err());
            Ok(())
        });
    }
}
