use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::charts::DEFAULT_SIZE;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub output_dir: PathBuf,
    pub chart_width: u32,
    pub chart_height: u32,
    pub batch_max_files: usize,
    pub batch_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: PathBuf::from("charts"),
            chart_width: DEFAULT_SIZE.0,
            chart_height: DEFAULT_SIZE.1,
            batch_max_files: 20,
            batch_concurrency: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable lookup; unset variables fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Ok(Config {
            output_dir: lookup("OUTPUT_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            chart_width: positive(&lookup, "CHART_WIDTH", defaults.chart_width)?,
            chart_height: positive(&lookup, "CHART_HEIGHT", defaults.chart_height)?,
            batch_max_files: positive(&lookup, "BATCH_MAX_FILES", defaults.batch_max_files)?,
            batch_concurrency: positive(&lookup, "BATCH_CONCURRENCY", defaults.batch_concurrency)?,
        })
    }

    pub fn chart_size(&self) -> (u32, u32) {
        (self.chart_width, self.chart_height)
    }
}

fn positive<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let value: T = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.clone(),
    })?;
    if value == T::default() {
        return Err(ConfigError::Zero { name });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.chart_size(), (1400, 600));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OUTPUT_DIR", "/tmp/out"),
            ("CHART_WIDTH", "800"),
            ("BATCH_CONCURRENCY", " 2 "),
        ]))
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.chart_width, 800);
        assert_eq!(config.chart_height, 600);
        assert_eq!(config.batch_concurrency, 2);
    }

    #[test]
    fn test_rejects_garbage_and_zero() {
        assert_eq!(
            Config::from_lookup(lookup(&[("CHART_HEIGHT", "tall")])),
            Err(ConfigError::InvalidValue {
                name: "CHART_HEIGHT",
                value: "tall".to_string()
            })
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("BATCH_MAX_FILES", "0")])),
            Err(ConfigError::Zero {
                name: "BATCH_MAX_FILES"
            })
        );
    }
}
