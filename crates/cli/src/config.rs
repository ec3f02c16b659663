use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults compiled into the binary so `calcctl` runs from any directory.
const DEFAULT_CONFIG: &str = include_str!("../global_config.yaml");

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub repl: ReplConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    pub scale: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReplConfig {
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "calc".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub format: LoggingFormatConfig,
    pub levels: LoggingLevelsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingFormatConfig {
    pub show_time: bool,
    #[serde(default)]
    pub json: bool,
    pub location: LoggingLocationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingLocationConfig {
    pub show_file: bool,
    pub show_line: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingLevelsConfig {
    pub debug: bool,
    pub info: bool,
    pub warning: bool,
    pub error: bool,
    pub critical: bool,
}

/// Load configuration, later sources overriding earlier ones:
/// built-in defaults, `./.global_config.yaml`, `override_path`, then
/// `APP__*` environment variables.
pub fn load_config(override_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Yaml))
        // Local override (optional)
        .add_source(File::from(PathBuf::from(".global_config.yaml")).required(false));

    if let Some(path) = override_path {
        builder = builder.add_source(File::from(path.to_path_buf()).required(true));
    }

    // Map nested env vars like APP__ENGINE__SCALE=4
    let config: AppConfig = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    struct EnvGuard(&'static str);
    impl EnvGuard {
        fn new(key: &'static str, val: &str) -> Self {
            env::set_var(key, val);
            Self(key)
        }
    }
    impl Drop for EnvGuard {
        fn drop(&mut self) {
            env::remove_var(self.0);
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults() {
        let config = load_config(None);
        assert!(config.is_ok(), "Failed to load config: {:?}", config.err());

        let config = config.unwrap();
        assert_eq!(config.engine.scale, 2);
        assert_eq!(config.repl.prompt, "calc");
        assert!(config.logging.levels.info);
        assert!(!config.logging.levels.debug);
        assert!(!config.logging.format.json);
    }

    #[test]
    #[serial]
    fn test_env_var_override_precedence() {
        let _guard = EnvGuard::new("APP__ENGINE__SCALE", "4");
        let config = load_config(None).expect("Should load config");
        assert_eq!(config.engine.scale, 4);
    }

    #[test]
    #[serial]
    fn test_type_coercion_boolean() {
        {
            let _guard = EnvGuard::new("APP__LOGGING__FORMAT__JSON", "true");
            let config = load_config(None).expect("Should load config");
            assert!(config.logging.format.json);
        }

        {
            let _guard = EnvGuard::new("APP__LOGGING__LEVELS__INFO", "false");
            let config = load_config(None).expect("Should load config");
            assert!(!config.logging.levels.info);
        }
    }

    #[test]
    #[serial]
    fn test_override_file() {
        let path = env::temp_dir().join(format!("calcctl_config_{}.yaml", std::process::id()));
        std::fs::write(&path, "engine:\n  scale: 6\nrepl:\n  prompt: \"sum\"\n").unwrap();

        let config = load_config(Some(&path)).expect("Should load config");
        assert_eq!(config.engine.scale, 6);
        assert_eq!(config.repl.prompt, "sum");
        // Untouched keys keep their defaults.
        assert!(config.logging.format.show_time);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn test_missing_override_file_is_an_error() {
        let path = env::temp_dir().join("calcctl_config_does_not_exist.yaml");
        assert!(load_config(Some(&path)).is_err());
    }
}
