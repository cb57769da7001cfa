use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub import: Option<ImportConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub file: String,
    pub source: ImportSource,
    pub skip_invalid_records: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    ETrade,
    Nordnet,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let import = match env_map.get("IMPORT_FILE") {
            Some(file) => Some(ImportConfig {
                file: file.clone(),
                source: parse_import_source(&env_map)?,
                skip_invalid_records: parse_bool(&env_map, "SKIP_INVALID_RECORDS", false)?,
            }),
            None => None,
        };

        Ok(Config {
            database_path,
            import,
        })
    }
}

fn parse_import_source(env_map: &HashMap<String, String>) -> Result<ImportSource, ConfigError> {
    match env_map.get("IMPORT_SOURCE").map(|s| s.as_str()) {
        Some("etrade") => Ok(ImportSource::ETrade),
        Some("nordnet") => Ok(ImportSource::Nordnet),
        Some(other) => Err(ConfigError::InvalidValue(
            "IMPORT_SOURCE".to_string(),
            format!("must be etrade or nordnet, got {}", other),
        )),
        None => Err(ConfigError::MissingEnv("IMPORT_SOURCE".to_string())),
    }
}

fn parse_bool(
    env_map: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match env_map.get(key).map(|s| s.as_str()) {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("must be true or false, got {}", other),
        )),
    }
}
