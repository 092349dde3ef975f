use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::Level;

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    /// Sampling overrides; `None` keeps the model default.
    pub llm_temperature: Option<f32>,
    pub llm_max_output_tokens: Option<u32>,
    pub search_api_key: String,
    pub search_base_url: String,
    pub search_max_results: u32,
    /// Pause after each successful assumption evaluation.
    pub eval_delay: Duration,
    pub http_timeout: Duration,
    pub bind_addr: String,
    pub max_concurrent_runs: usize,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` wires this to
    /// the process environment (plus `.env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| anyhow!("{} required", key));

        Ok(Self {
            llm_api_key: require("GEMINI_API_KEY")?,
            llm_base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            llm_temperature: parse_opt(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE")?,
            llm_max_output_tokens: parse_opt(
                get("LLM_MAX_OUTPUT_TOKENS"),
                "LLM_MAX_OUTPUT_TOKENS",
            )?,
            search_api_key: require("TAVILY_API_KEY")?,
            search_base_url: get("SEARCH_BASE_URL")
                .unwrap_or_else(|| "https://api.tavily.com".to_string()),
            search_max_results: parse_or(get("SEARCH_MAX_RESULTS"), "SEARCH_MAX_RESULTS", 5)?,
            eval_delay: Duration::from_millis(parse_or(get("EVAL_DELAY_MS"), "EVAL_DELAY_MS", 1000)?),
            http_timeout: Duration::from_secs(parse_or(
                get("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
                120,
            )?),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8501".to_string()),
            max_concurrent_runs: parse_or::<usize>(get("MAX_CONCURRENT_RUNS"), "MAX_CONCURRENT_RUNS", 1)?
                .max(1),
            log_level: parse_or(get("LOG_LEVEL"), "LOG_LEVEL", Level::INFO)?,
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(raw, key)?.unwrap_or(default))
}

fn parse_opt<T>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| {
        v.parse::<T>()
            .with_context(|| format!("Invalid value for {}: {:?}", key, v))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g"), ("TAVILY_API_KEY", "t")]))
                .unwrap();
        assert_eq!(config.llm_model, "gemini-1.5-flash");
        assert_eq!(config.eval_delay, Duration::from_secs(1));
        assert_eq!(config.search_max_results, 5);
        assert_eq!(config.max_concurrent_runs, 1);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
        assert_eq!(config.llm_temperature, None);
        assert_eq!(config.llm_max_output_tokens, None);
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g")])).unwrap_err();
        assert!(err.to_string().contains("TAVILY_API_KEY"));

        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "  "), ("TAVILY_API_KEY", "t")]))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g"),
            ("TAVILY_API_KEY", "t"),
            ("EVAL_DELAY_MS", "0"),
            ("MAX_CONCURRENT_RUNS", "0"),
            ("LOG_LEVEL", "debug"),
            ("LLM_TEMPERATURE", "0.2"),
            ("LLM_MAX_OUTPUT_TOKENS", "8192"),
        ]))
        .unwrap();
        assert_eq!(config.llm_temperature, Some(0.2));
        assert_eq!(config.llm_max_output_tokens, Some(8192));
        assert_eq!(config.eval_delay, Duration::ZERO);
        assert_eq!(config.max_concurrent_runs, 1);
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_bad_number() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g"),
            ("TAVILY_API_KEY", "t"),
            ("EVAL_DELAY_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("EVAL_DELAY_MS"));
    }
}
