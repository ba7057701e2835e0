//! Google OAuth credentials.
//!
//! Stored at ~/.config/fixturecal/google.toml. Each field can be replaced by
//! an environment variable (`FIXTURECAL_GOOGLE_CLIENT_ID`,
//! `FIXTURECAL_GOOGLE_CLIENT_SECRET`, `FIXTURECAL_GOOGLE_REFRESH_TOKEN`),
//! which is enough to run without the file at all.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const ENV_PREFIX: &str = "FIXTURECAL_GOOGLE_";

/// Google OAuth client credentials and the operator's refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
}

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("fixturecal"))
}

pub fn load() -> Result<Credentials> {
    let path = base_dir()?.join("google.toml");
    load_from(&path, |key| std::env::var(key).ok())
}

/// Read credentials from `path` (if present), then apply overrides from `env`.
pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
    let file = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))?
    } else {
        CredentialsFile::default()
    };

    let field = |name: &str, from_file: Option<String>| {
        env(&format!("{}{}", ENV_PREFIX, name.to_uppercase()))
            .or(from_file)
            .filter(|value| !value.trim().is_empty())
    };

    let client_id = field("client_id", file.client_id);
    let client_secret = field("client_secret", file.client_secret);
    let refresh_token = field("refresh_token", file.refresh_token);

    match (client_id, client_secret, refresh_token) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Credentials {
            client_id,
            client_secret,
            refresh_token,
        }),
        _ => anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\
            refresh_token = \"your-refresh-token\"\n\n\
            or set {}CLIENT_ID, {}CLIENT_SECRET and {}REFRESH_TOKEN.",
            path.display(),
            ENV_PREFIX,
            ENV_PREFIX,
            ENV_PREFIX
        ),
    }
}
