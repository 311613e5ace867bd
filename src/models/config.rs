use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::{Context, Result};

fn default_true() -> bool {
    true
}

fn default_chart_top_n() -> usize {
    5
}

fn default_price_scale() -> f64 {
    10_000.0
}

fn default_request_timeout() -> u64 {
    10
}

fn default_log_file() -> String {
    "stock_report.log".to_string()
}

/// Ticker plotted when a portfolio has fewer than `chart_top_n` holdings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FallbackTicker {
    pub code: String,
    pub name: String,
}

pub fn default_fallback_tickers() -> Vec<FallbackTicker> {
    [
        ("005930.KS", "삼성전자"),
        ("000660.KS", "SK하이닉스"),
        ("035420.KS", "NAVER"),
        ("035720.KS", "카카오"),
        ("005380.KS", "현대차"),
    ]
    .iter()
    .map(|(code, name)| FallbackTicker {
        code: code.to_string(),
        name: name.to_string(),
    })
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub base_url: String,
    #[serde(default = "default_chart_top_n")]
    pub chart_top_n: usize,
    /// Closing prices are divided by this before plotting.
    #[serde(default = "default_price_scale")]
    pub price_scale: f64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub show_leaderboard: bool,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_fallback_tickers")]
    pub fallback_tickers: Vec<FallbackTicker>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_str)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn fallback_name(&self, code: &str) -> Option<&str> {
        self.fallback_tickers
            .iter()
            .find(|t| t.code == code)
            .map(|t| t.name.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:8000".to_string(),
            chart_top_n: default_chart_top_n(),
            price_scale: default_price_scale(),
            request_timeout_secs: default_request_timeout(),
            show_leaderboard: true,
            log_file: default_log_file(),
            fallback_tickers: default_fallback_tickers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_url":"http://example.test"}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert_eq!(config.chart_top_n, 5);
        assert_eq!(config.price_scale, 10_000.0);
        assert!(config.show_leaderboard);
        assert_eq!(config.fallback_name("035420.KS"), Some("NAVER"));
        assert_eq!(config.fallback_name("AAPL"), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(dir.path().join("nope.json")).is_err());
    }
}
