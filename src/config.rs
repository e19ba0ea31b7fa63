use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Session and environment configuration, loaded once from `.env`/env vars
/// and passed explicitly to every command (no hidden global state).
#[derive(Debug, Clone)]
pub struct Config {
    pub partner_id: i32,
    pub admin_secret: String,
    pub user_id: String,
    pub service_url: String,
    pub privileges: String,
    pub reports_dir: PathBuf,
}

impl Config {
    /// Load from the environment. PARTNER_ID and ADMIN_SECRET are required
    /// and abort the run before any API traffic if missing or unparsable.
    pub fn from_env() -> Result<Self> {
        let partner_id = require_env_int("PARTNER_ID")?;
        let admin_secret = env::var("ADMIN_SECRET").unwrap_or_default().trim().to_string();
        if admin_secret.is_empty() {
            bail!("Missing ADMIN_SECRET in .env");
        }

        let user_id = env_or("USER_ID", "admin");
        let service_url = env_or("SERVICE_URL", "https://www.kaltura.com")
            .trim_end_matches('/')
            .to_string();
        let privileges = env_or("PRIVILEGES", "all:*,disableentitlement");
        let reports_dir = PathBuf::from(env_or("REPORTS_DIR", "reports"));

        Ok(Config { partner_id, admin_secret, user_id, service_url, privileges, reports_dir })
    }
}

pub fn env_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

pub fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Comma-separated env list, empty entries dropped.
pub fn env_csv(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn require_env_int(name: &str) -> Result<i32> {
    let raw = env::var(name).unwrap_or_default().trim().to_string();
    if raw.is_empty() {
        bail!("Missing {} in .env", name);
    }
    raw.parse::<i32>().with_context(|| format!("Invalid {} in .env: {:?}", name, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_csv_drops_empty_segments() {
        std::env::set_var("KADMIN_TEST_CSV", " a, ,b,,c ");
        assert_eq!(env_csv("KADMIN_TEST_CSV"), vec!["a", "b", "c"]);
        std::env::remove_var("KADMIN_TEST_CSV");
    }

    #[test]
    fn env_or_falls_back_when_unset() {
        std::env::remove_var("KADMIN_TEST_MISSING");
        assert_eq!(env_or("KADMIN_TEST_MISSING", "dflt"), "dflt");
    }
}
