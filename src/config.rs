use anyhow::{Context, Result};
use clap::Parser;

/// Spotify Relay - token swap and data relay for the Spotify Web API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Spotify application client ID
    #[arg(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Spotify application client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Redirect URI registered for the authorization code flow
    #[arg(long, env = "SPOTIFY_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Base URL of the Spotify accounts service
    #[arg(
        long,
        env = "SPOTIFY_ACCOUNTS_URL",
        default_value = "https://accounts.spotify.com"
    )]
    pub accounts_url: String,

    /// Base URL of the Spotify Web API
    #[arg(long, env = "SPOTIFY_API_URL", default_value = "https://api.spotify.com/v1")]
    pub api_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Upstream request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "30")]
    pub http_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub server_host: String,
    pub server_port: u16,

    // Spotify application
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,

    // Upstream endpoints
    pub accounts_url: String,
    pub api_url: String,

    // Timeouts
    pub token_refresh_threshold: u64,
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let args = CliArgs::parse();

        let config = Config {
            server_host: args.host,
            server_port: args.port,

            client_id: args
                .client_id
                .context("SPOTIFY_CLIENT_ID is required (use --client-id or set SPOTIFY_CLIENT_ID)")?,

            client_secret: args.client_secret.context(
                "SPOTIFY_CLIENT_SECRET is required (use --client-secret or set SPOTIFY_CLIENT_SECRET)",
            )?,

            redirect_uri: args.redirect_uri.context(
                "SPOTIFY_REDIRECT_URI is required (use --redirect-uri or set SPOTIFY_REDIRECT_URI)",
            )?,

            accounts_url: trim_base_url(&args.accounts_url),
            api_url: trim_base_url(&args.api_url),

            token_refresh_threshold: env_or("TOKEN_REFRESH_THRESHOLD", 60),
            http_connect_timeout: env_or("HTTP_CONNECT_TIMEOUT", 10),
            http_request_timeout: args.http_timeout,

            log_level: args.log_level,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            anyhow::bail!("SPOTIFY_CLIENT_ID must not be empty");
        }
        if self.client_secret.trim().is_empty() {
            anyhow::bail!("SPOTIFY_CLIENT_SECRET must not be empty");
        }
        if self.redirect_uri.trim().is_empty() {
            anyhow::bail!("SPOTIFY_REDIRECT_URI must not be empty");
        }

        for (name, url) in [
            ("SPOTIFY_ACCOUNTS_URL", &self.accounts_url),
            ("SPOTIFY_API_URL", &self.api_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("{} must be an http(s) URL, got: {}", name, url);
            }
        }

        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than zero");
        }

        Ok(())
    }
}

/// Read a numeric setting from the environment, falling back to a default
fn env_or(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Strip trailing slashes so endpoint paths can be appended verbatim
fn trim_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
