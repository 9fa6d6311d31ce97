use anyhow::{bail, Context, Result};

/// Service configuration loaded from environment variables.
/// Fails at startup if `API_BASE_URL` is missing or a numeric knob is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the remote sekolah/okupasi REST API, without trailing slash.
    pub api_base_url: String,
    /// Optional service credentials used to re-login when no refresh token exists.
    pub api_username: Option<String>,
    pub api_password: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub match_page_size: usize,
    pub match_result_cap: usize,
    pub roster_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = var("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("Required environment variable 'API_BASE_URL' is not set")?;

        Ok(Config {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            api_username: var("API_USERNAME").filter(|v| !v.is_empty()),
            api_password: var("API_PASSWORD").filter(|v| !v.is_empty()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            match_page_size: positive(&var, "MATCH_PAGE_SIZE", 100)?,
            match_result_cap: positive(&var, "MATCH_RESULT_CAP", 1000)?,
            roster_limit: positive(&var, "ROSTER_LIMIT", 10_000)?,
        })
    }

    /// Service credentials, if both halves are configured.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.api_username, &self.api_password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}

fn positive<F>(var: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<usize>()
        .with_context(|| format!("{key} must be a positive integer"))?;
    if value == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}
