use std::env;
use std::net::SocketAddr;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8788";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_RUNTIME_URL: &str = "http://127.0.0.1:8790";
const DEFAULT_CHAT_MAX_TURNS: u32 = 8;
const DEFAULT_RESEARCH_MAX_TURNS: u32 = 30;
const DEFAULT_RESEARCH_MCP_COMMAND: &str = "npx";
const DEFAULT_RESEARCH_MCP_ARGS: &str = "@playwright/mcp@latest --headless";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub log_format: LogFormat,
    pub static_dir: Option<PathBuf>,
    pub runtime_url: String,
    pub runtime_api_key: Option<String>,
    pub model: Option<String>,
    pub chat_max_turns: u32,
    pub research_max_turns: u32,
    pub research_mcp_command: String,
    pub research_mcp_args: Vec<String>,
    pub connect_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid DESKTOP_BIND_ADDR value '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("invalid DESKTOP_LOG_FORMAT value '{value}': expected 'json' or 'pretty'")]
    InvalidLogFormat { value: String },
    #[error("invalid {name} value '{value}': {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        source: ParseIntError,
    },
    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr_raw = var("DESKTOP_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_addr_raw,
                source,
            })?;

        let log_filter = var("DESKTOP_LOG_FILTER").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let log_format = match var("DESKTOP_LOG_FORMAT") {
            None => LogFormat::Json,
            Some(value) => match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => return Err(ConfigError::InvalidLogFormat { value }),
            },
        };

        let static_dir = var("DESKTOP_STATIC_DIR").map(PathBuf::from);

        let runtime_url = var("AGENT_RUNTIME_URL")
            .unwrap_or_else(|| DEFAULT_RUNTIME_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let runtime_api_key = var("AGENT_RUNTIME_API_KEY");
        let model = var("AGENT_MODEL");

        let chat_max_turns = parse_positive(&var, "AGENT_CHAT_MAX_TURNS", DEFAULT_CHAT_MAX_TURNS)?;
        let research_max_turns =
            parse_positive(&var, "AGENT_RESEARCH_MAX_TURNS", DEFAULT_RESEARCH_MAX_TURNS)?;

        let research_mcp_command = var("AGENT_RESEARCH_MCP_COMMAND")
            .unwrap_or_else(|| DEFAULT_RESEARCH_MCP_COMMAND.to_string());
        let research_mcp_args = parse_args(
            &var("AGENT_RESEARCH_MCP_ARGS").unwrap_or_else(|| DEFAULT_RESEARCH_MCP_ARGS.to_string()),
        );

        let connect_timeout = Duration::from_millis(parse_positive(
            &var,
            "AGENT_CONNECT_TIMEOUT_MS",
            DEFAULT_CONNECT_TIMEOUT_MS,
        )?);

        Ok(Self {
            bind_addr,
            log_filter,
            log_format,
            static_dir,
            runtime_url,
            runtime_api_key,
            model,
            chat_max_turns,
            research_max_turns,
            research_mcp_command,
            research_mcp_args,
            connect_timeout,
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            log_filter: "debug".to_string(),
            log_format: LogFormat::Pretty,
            static_dir: None,
            runtime_url: "http://127.0.0.1:9".to_string(),
            runtime_api_key: None,
            model: Some("test-model".to_string()),
            chat_max_turns: DEFAULT_CHAT_MAX_TURNS,
            research_max_turns: DEFAULT_RESEARCH_MAX_TURNS,
            research_mcp_command: DEFAULT_RESEARCH_MCP_COMMAND.to_string(),
            research_mcp_args: parse_args(DEFAULT_RESEARCH_MCP_ARGS),
            connect_timeout: Duration::from_millis(250),
        }
    }
}

/// Reads a non-zero integer of type `T`; values outside its range are `InvalidNumber`.
fn parse_positive<T>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr<Err = ParseIntError> + Default + PartialEq,
{
    let Some(value) = var(name) else {
        return Ok(default);
    };
    let parsed = value
        .parse::<T>()
        .map_err(|source| ConfigError::InvalidNumber {
            name,
            value: value.clone(),
            source,
        })?;
    if parsed == T::default() {
        return Err(ConfigError::ZeroValue { name });
    }
    Ok(parsed)
}

fn parse_args(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8788)));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.runtime_url, "http://127.0.0.1:8790");
        assert_eq!(config.chat_max_turns, 8);
        assert_eq!(config.research_max_turns, 30);
        assert_eq!(config.research_mcp_command, "npx");
        assert_eq!(
            config.research_mcp_args,
            vec!["@playwright/mcp@latest".to_string(), "--headless".to_string()]
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.static_dir.is_none());
        assert!(config.runtime_api_key.is_none());
    }

    #[test]
    fn blank_values_are_treated_as_unset_and_urls_are_normalised() {
        let config = Config::from_lookup(lookup(&[
            ("AGENT_MODEL", "   "),
            ("AGENT_RUNTIME_URL", " http://sidecar:9000/ "),
            ("DESKTOP_LOG_FORMAT", "Pretty"),
            ("DESKTOP_STATIC_DIR", "crates/site/dist"),
        ]))
        .expect("config");
        assert_eq!(config.model, None);
        assert_eq!(config.runtime_url, "http://sidecar:9000");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.static_dir, Some(PathBuf::from("crates/site/dist")));
    }

    #[test]
    fn invalid_values_are_reported_with_the_variable_name() {
        let err = Config::from_lookup(lookup(&[("AGENT_CHAT_MAX_TURNS", "many")]))
            .expect_err("invalid number");
        assert!(err.to_string().contains("AGENT_CHAT_MAX_TURNS"));

        let err = Config::from_lookup(lookup(&[("AGENT_RESEARCH_MAX_TURNS", "0")]))
            .expect_err("zero");
        assert_eq!(err.to_string(), "AGENT_RESEARCH_MAX_TURNS must be greater than zero");

        let err = Config::from_lookup(lookup(&[("DESKTOP_BIND_ADDR", "nowhere")]))
            .expect_err("bind addr");
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));

        let err = Config::from_lookup(lookup(&[("DESKTOP_LOG_FORMAT", "xml")]))
            .expect_err("format");
        assert!(matches!(err, ConfigError::InvalidLogFormat { .. }));
    }

    #[test]
    fn max_turns_beyond_u32_are_rejected_instead_of_wrapping() {
        for name in ["AGENT_CHAT_MAX_TURNS", "AGENT_RESEARCH_MAX_TURNS"] {
            let err = Config::from_lookup(lookup(&[(name, "4294967296")]))
                .expect_err("out of range");
            assert!(
                matches!(&err, ConfigError::InvalidNumber { name: reported, .. } if *reported == name),
                "{err}"
            );
        }

        let config = Config::from_lookup(lookup(&[("AGENT_CHAT_MAX_TURNS", "4294967295")]))
            .expect("u32::MAX fits");
        assert_eq!(config.chat_max_turns, u32::MAX);
    }
}
