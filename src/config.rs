use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_DOCS_DIR: &str = "nexus_docs";
const DEFAULT_TEMPERATURE: f64 = 0.3;
const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;
const DEFAULT_STEP_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub docs_dir: PathBuf,
    pub temperature: f64,
    pub max_tool_rounds: usize,
    pub step_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let api_key = get_var("NEXUS_API_KEY")
            .or_else(|| get_var("OPENAI_API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("NEXUS_API_KEY (or OPENAI_API_KEY) is not set. Please set the key.")
            })?;

        Ok(Self {
            api_key,
            base_url: get_var("NEXUS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get_var("NEXUS_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            docs_dir: get_var("NEXUS_DOCS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR)),
            temperature: parse_temperature(get_var("NEXUS_TEMPERATURE").as_deref()),
            max_tool_rounds: parse_positive_usize(
                get_var("NEXUS_MAX_TOOL_ROUNDS").as_deref(),
                DEFAULT_MAX_TOOL_ROUNDS,
            ),
            step_timeout_secs: parse_positive_u64(
                get_var("NEXUS_STEP_TIMEOUT_SECS").as_deref(),
                DEFAULT_STEP_TIMEOUT_SECS,
            ),
        })
    }
}

fn parse_temperature(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| (0.0..=2.0).contains(value))
        .unwrap_or(DEFAULT_TEMPERATURE)
}

fn parse_positive_usize(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let result = config_from_pairs(&[]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("NEXUS_API_KEY"));
    }

    #[test]
    fn blank_api_key_is_an_error() {
        assert!(config_from_pairs(&[("NEXUS_API_KEY", "   ")]).is_err());
    }

    #[test]
    fn openai_key_works_as_fallback() {
        let cfg = config_from_pairs(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.api_key, "sk-test");
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = config_from_pairs(&[("NEXUS_API_KEY", "sk-test")]).unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.docs_dir, PathBuf::from(DEFAULT_DOCS_DIR));
        assert_eq!(cfg.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(cfg.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(cfg.step_timeout_secs, DEFAULT_STEP_TIMEOUT_SECS);
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let cfg = config_from_pairs(&[
            ("NEXUS_API_KEY", "sk-test"),
            ("NEXUS_BASE_URL", "http://localhost:8080/v1/"),
        ])
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn invalid_numeric_settings_fall_back_to_defaults() {
        let cfg = config_from_pairs(&[
            ("NEXUS_API_KEY", "sk-test"),
            ("NEXUS_TEMPERATURE", "9.5"),
            ("NEXUS_MAX_TOOL_ROUNDS", "0"),
            ("NEXUS_STEP_TIMEOUT_SECS", "soon"),
        ])
        .unwrap();
        assert_eq!(cfg.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(cfg.max_tool_rounds, DEFAULT_MAX_TOOL_ROUNDS);
        assert_eq!(cfg.step_timeout_secs, DEFAULT_STEP_TIMEOUT_SECS);
    }

    #[test]
    fn valid_overrides_are_honored() {
        let cfg = config_from_pairs(&[
            ("NEXUS_API_KEY", "sk-test"),
            ("NEXUS_MODEL", "gpt-4.1"),
            ("NEXUS_DOCS_DIR", "/srv/docs"),
            ("NEXUS_TEMPERATURE", "0.7"),
            ("NEXUS_MAX_TOOL_ROUNDS", "3"),
        ])
        .unwrap();
        assert_eq!(cfg.model, "gpt-4.1");
        assert_eq!(cfg.docs_dir, PathBuf::from("/srv/docs"));
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.max_tool_rounds, 3);
    }
}
