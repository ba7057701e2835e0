//! Creates a valid Google session (access token) from the operator's
//! refresh token.
//!
//! The access token is cached at ~/.config/fixturecal/session.toml so that
//! back-to-back runs don't refresh every time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app_config::{Credentials, base_dir};

/// Refresh this long before Google says the token expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

pub struct Session {
    path: PathBuf,
    data: SessionData,
}

#[derive(Serialize, Deserialize, Clone)]
struct SessionData {
    access_token: String,
    /// Refresh token the access token was minted from
    refresh_token: String,
    /// None when Google didn't say how long the token lives
    expires_at: Option<DateTime<Utc>>,
}

impl SessionData {
    fn from_tokens(tokens: &AccessToken, refresh_token: &str) -> Self {
        SessionData {
            access_token: tokens.access_token.clone(),
            refresh_token: refresh_token.to_string(),
            expires_at: (tokens.expires_in > 0)
                .then(|| Utc::now() + Duration::seconds(tokens.expires_in)),
        }
    }

    fn is_usable_for(&self, credentials: &Credentials) -> bool {
        let fresh = self
            .expires_at
            .map(|exp| Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) < exp)
            .unwrap_or(true);
        self.refresh_token == credentials.refresh_token && fresh
    }
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Load the cached session, refreshing it if expired or missing.
    pub async fn load_valid(credentials: &Credentials) -> Result<Self> {
        let path = base_dir()?.join("session.toml");

        if let Some(data) = Self::read_cached(&path).filter(|d| d.is_usable_for(credentials)) {
            debug!("using cached Google access token");
            return Ok(Session { path, data });
        }

        let data = Self::refresh(credentials).await?;
        let session = Session { path, data };
        session.save()?;
        Ok(session)
    }

    /// A missing or unreadable cache just means we refresh.
    fn read_cached(path: &Path) -> Option<SessionData> {
        let contents = std::fs::read_to_string(path).ok()?;
        toml::from_str(&contents).ok()
    }

    async fn refresh(credentials: &Credentials) -> Result<SessionData> {
        let client = Client::new(
            credentials.client_id.clone(),
            credentials.client_secret.clone(),
            String::new(),
            String::new(),
            credentials.refresh_token.clone(),
        );

        let tokens = client
            .refresh_access_token()
            .await
            .context("Failed to refresh Google access token")?;

        debug!(expires_in = tokens.expires_in, "refreshed Google access token");
        Ok(SessionData::from_tokens(&tokens, &credentials.refresh_token))
    }

    fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write session to {}", self.path.display()))?;

        // Owner-only, the file holds an access token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", self.path.display()))?;
        }

        Ok(())
    }
}
