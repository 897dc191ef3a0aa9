//! Bearer token used to authorize result fetches.
//!
//! The token is resolved once at startup and is read-only afterwards.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

/// Name of the cookie the server issues the token under.
pub const TOKEN_COOKIE: &str = "token";

#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading token from {}", path.display()))?;
        Ok(Self::new(content))
    }

    /// Pick the `token` cookie out of a `Cookie` header style string
    /// (`"a=1; token=abc; b=2"`). The value is percent-decoded; one that
    /// does not decode to UTF-8 is used as written.
    pub fn from_cookie_header(header: &str) -> Option<Self> {
        let raw = header
            .split(';')
            .map(str::trim_start)
            .find_map(|pair| pair.strip_prefix(TOKEN_COOKIE)?.strip_prefix('='))?;
        match urlencoding::decode(raw) {
            Ok(decoded) => Self::new(decoded.into_owned()),
            Err(_) => Self::new(raw),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Resolve the token: literal, then file, then cookie string.
pub fn resolve(
    literal: Option<&str>,
    file: Option<&Path>,
    cookie: Option<&str>,
) -> Result<Option<Token>> {
    if let Some(token) = literal.and_then(Token::new) {
        return Ok(Some(token));
    }
    if let Some(path) = file {
        if let Some(token) = Token::from_file(path)? {
            return Ok(Some(token));
        }
    }
    Ok(cookie.and_then(Token::from_cookie_header))
}
