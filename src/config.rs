use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};

use crate::form::DateStyle;

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub issuer_base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub audience: Option<String>,
    pub scope: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Public URL of this app, used to build the OAuth redirect.
    pub base_url: String,
    pub identity: IdentityConfig,
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub session_inactivity: time::Duration,
    pub secure_cookie: bool,
    pub date_style: DateStyle,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let identity = IdentityConfig {
            issuer_base_url: trim_slash(required("AUTH0_ISSUER_BASE_URL")?),
            client_id: required("AUTH0_CLIENT_ID")?,
            client_secret: required("AUTH0_CLIENT_SECRET")?,
            audience: lookup("AUTH0_AUDIENCE").filter(|a| !a.is_empty()),
            scope: or("AUTH0_SCOPE", "openid profile email"),
        };

        Ok(Config {
            host: or("APP_HOST", "0.0.0.0"),
            port: parse(&or("APP_PORT", "8080"), "APP_PORT")?,
            base_url: trim_slash(or("AUTH0_BASE_URL", "http://localhost:8080")),
            identity,
            api_base_url: trim_slash(or("API_BASE_URL", "http://localhost:8000")),
            api_timeout: Duration::from_secs(parse(&or("API_TIMEOUT_SECS", "10"), "API_TIMEOUT_SECS")?),
            session_inactivity: time::Duration::minutes(parse(
                &or("SESSION_INACTIVITY_MINUTES", "30"),
                "SESSION_INACTIVITY_MINUTES",
            )?),
            secure_cookie: parse(&or("SESSION_SECURE_COOKIE", "false"), "SESSION_SECURE_COOKIE")?,
            date_style: parse(&or("DATE_STYLE", "unpadded"), "DATE_STYLE")?,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("APP_HOST/APP_PORT do not form a socket address")
    }
}

fn parse<T>(value: &str, key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow!("invalid {key} {value:?}: {e}"))
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_owned()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "AUTH0_ISSUER_BASE_URL" => Some("https://tenant.example.auth0.com/".to_owned()),
        "AUTH0_CLIENT_ID" => Some("client".to_owned()),
        "AUTH0_CLIENT_SECRET" => Some("secret".to_owned()),
        _ => None,
    })
    .unwrap()
}
