use anyhow::{Context, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CONCURRENT_USERS: usize = 8;

/// Token variables checked in order; the first non-empty one wins.
const TOKEN_VARS: [&str; 2] = ["NODE_APP_GITHUB_TOKEN", "GITHUB_TOKEN"];

/// Process configuration, read once at startup and handed to each component.
#[derive(Clone, Debug)]
pub struct Config {
    pub token: Option<String>,
    pub api_url: String,
    pub host: String,
    pub port: u16,
    /// Upper bound on user enrichment pipelines in flight for one request.
    pub max_concurrent_users: usize,
}

impl Config {
    /// Defaults pointed at `api_url`, with no credential.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            token: None,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_concurrent_users: DEFAULT_MAX_CONCURRENT_USERS,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        if let Some(token) = TOKEN_VARS.iter().find_map(|key| var(*key)) {
            config = config.with_token(token);
        }

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?;
        }
        if let Some(n) = var("MAX_CONCURRENT_USERS") {
            let n: usize = n.parse().with_context(|| {
                format!("MAX_CONCURRENT_USERS must be a positive integer, got {n:?}")
            })?;
            if n == 0 {
                anyhow::bail!("MAX_CONCURRENT_USERS must be at least 1");
            }
            config.max_concurrent_users = n;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
