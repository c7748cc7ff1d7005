use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const ACCESS_TOKEN_ENV: &str = "REGDESK_ACCESS_TOKEN";

/// Bearer credential passed explicitly to every API call.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Cookie-style token file: either one `name=value` pair per line or a
/// `Cookie` header style `a=1; accessToken=...` line.
pub struct SessionStore {
    path: PathBuf,
    env_token: Option<AccessToken>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_token: None,
        }
    }

    pub fn from_env(path: impl Into<PathBuf>) -> Self {
        let env_token = std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .and_then(|raw| AccessToken::new(&raw));
        if env_token.is_some() {
            info!("Using access token from {}", ACCESS_TOKEN_ENV);
        }
        Self {
            path: path.into(),
            env_token,
        }
    }

    pub fn load(&self) -> Result<Option<AccessToken>> {
        if let Some(token) = &self.env_token {
            return Ok(Some(token.clone()));
        }
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file {}", self.path.display()))?;
        let token = parse_cookie_value(&raw, ACCESS_TOKEN_COOKIE).and_then(|v| AccessToken::new(&v));
        if token.is_none() {
            warn!("Session file {} has no {}", self.path.display(), ACCESS_TOKEN_COOKIE);
        }
        Ok(token)
    }

    pub fn save(&self, token: &AccessToken) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(
            &self.path,
            format!("{}={}\n", ACCESS_TOKEN_COOKIE, token.as_str()),
        )
        .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        info!("Session saved to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        info!("Session cleared");
        Ok(())
    }
}

pub fn parse_cookie_value(raw: &str, name: &str) -> Option<String> {
    raw.lines()
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cookie_header_and_line_formats() {
        assert_eq!(
            parse_cookie_value("theme=dark; accessToken=abc.def; lang=en", ACCESS_TOKEN_COOKIE),
            Some("abc.def".to_string())
        );
        assert_eq!(
            parse_cookie_value("other=1\naccessToken = xyz \n", ACCESS_TOKEN_COOKIE),
            Some("xyz".to_string())
        );
        assert_eq!(parse_cookie_value("refreshToken=1", ACCESS_TOKEN_COOKIE), None);
    }

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session"));

        assert_eq!(store.load().unwrap(), None);

        let token = AccessToken::new("  secret-token ").unwrap();
        store.save(&token).unwrap();
        assert_eq!(store.load().unwrap(), Some(token));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn empty_cookie_value_is_not_a_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        fs::write(&path, "accessToken=\n").unwrap();
        assert_eq!(SessionStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn debug_does_not_leak_token() {
        let token = AccessToken::new("secret").unwrap();
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
    }
}
