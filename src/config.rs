use serde::Deserialize;

use crate::services::DEFAULT_TOP_N;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding titles.json, title_index.json, matrix.json and vocabulary.json
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the request does not say
    #[serde(default = "default_top_n")]
    pub default_top_n: i64,

    /// TMDB API key; enrichment is disabled without it
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix for TMDB poster paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Redis connection URL; enrichment results are not cached without it
    #[serde(default)]
    pub redis_url: Option<String>,
}

fn default_artifact_dir() -> String {
    "artifacts".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_top_n() -> i64 {
    DEFAULT_TOP_N
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();
        assert_eq!(config.artifact_dir, "artifacts");
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.default_top_n, 10);
        assert!(config.tmdb_api_key.is_none());
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("ARTIFACT_DIR", "/srv/bundle"),
            ("PORT", "8080"),
            ("DEFAULT_TOP_N", "5"),
            ("TMDB_API_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.artifact_dir, "/srv/bundle");
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_top_n, 5);
        assert_eq!(config.tmdb_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_invalid_port() {
        assert!(Config::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }
}
