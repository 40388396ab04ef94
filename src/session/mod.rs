//! Persisted client session: the auth token and the theme preference.
//!
//! The session is a thin typed view over a [`KeyValueStore`]. It is cheap to
//! clone and shared between the controller and the poller threads, which
//! read the token at request time.

pub mod store;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

pub use store::{FileStore, KeyValueStore, MemoryStore};

const TOKEN_KEY: &str = "auth_token";
const THEME_KEY: &str = "theme";

/// Light or dark display palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to the persisted session.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("logged_in", &self.is_logged_in())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Session backed by `~/.lms-console/session.json`, or an in-memory
    /// store when no home directory is available.
    pub fn open_default() -> Self {
        match crate::config::console_home() {
            Some(dir) => Self::new(Arc::new(FileStore::new(dir.join("session.json")))),
            None => Self::in_memory(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The stored token. An empty string counts as no token.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// The stored theme, `Light` when unset or unrecognised.
    pub fn theme(&self) -> Theme {
        self.store
            .get(THEME_KEY)
            .and_then(|value| Theme::parse(&value))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, theme.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
