//! Theme Store
//!
//! Display-mode preference persisted to local storage. In `system` mode
//! the resolved theme follows the OS signal; `light` and `dark` pin it.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{DomainError, DomainResult};
use crate::lock;
use crate::repository::{ColorSchemeSource, KeyValueStore};

pub const THEME_STORAGE_KEY: &str = "homebones_theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::System => "system",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

impl FromStr for ThemeMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(ThemeMode::System),
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(DomainError::InvalidInput(format!("Unknown theme mode: {other}"))),
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn is_dark(&self) -> bool {
        matches!(self, ResolvedTheme::Dark)
    }
}

struct ThemeShared {
    mode: watch::Sender<ThemeMode>,
    /// Last theme pushed to the presentation layer
    applied: watch::Sender<Option<ResolvedTheme>>,
    os: Arc<dyn ColorSchemeSource>,
}

impl ThemeShared {
    fn resolved(&self) -> ResolvedTheme {
        match *self.mode.borrow() {
            ThemeMode::System if self.os.prefers_dark() => ResolvedTheme::Dark,
            ThemeMode::System => ResolvedTheme::Light,
            ThemeMode::Light => ResolvedTheme::Light,
            ThemeMode::Dark => ResolvedTheme::Dark,
        }
    }

    fn apply(&self) {
        let resolved = self.resolved();
        if self.applied.send_replace(Some(resolved)) != Some(resolved) {
            log::info!("Applied {:?} theme", resolved);
        }
    }
}

pub struct ThemeStore {
    shared: Arc<ThemeShared>,
    storage: Arc<dyn KeyValueStore>,
    os_listener: Mutex<Option<JoinHandle<()>>>,
}

impl ThemeStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, os: Arc<dyn ColorSchemeSource>) -> Self {
        Self {
            shared: Arc::new(ThemeShared {
                mode: watch::channel(ThemeMode::System).0,
                applied: watch::channel(None).0,
                os,
            }),
            storage,
            os_listener: Mutex::new(None),
        }
    }

    /// Load the saved preference, start following OS changes and apply.
    /// Must be called from within a Tokio runtime.
    pub fn init(&self) {
        let saved = match self.storage.get(THEME_STORAGE_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("Ignoring saved theme: {}", e);
                ThemeMode::System
            }),
            None => ThemeMode::System,
        };
        self.shared.mode.send_replace(saved);

        let mut listener = lock(&self.os_listener);
        if listener.is_none() {
            let shared = Arc::clone(&self.shared);
            let mut os_changes = shared.os.subscribe();
            *listener = Some(tokio::spawn(async move {
                while os_changes.changed().await.is_ok() {
                    if *shared.mode.borrow() == ThemeMode::System {
                        shared.apply();
                    }
                }
            }));
        }
        drop(listener);

        self.shared.apply();
    }

    pub fn mode(&self) -> ThemeMode {
        *self.shared.mode.borrow()
    }

    pub fn resolved(&self) -> ResolvedTheme {
        self.shared.resolved()
    }

    /// Theme most recently applied, `None` before `init`
    pub fn applied(&self) -> Option<ResolvedTheme> {
        *self.shared.applied.borrow()
    }

    pub fn subscribe_applied(&self) -> watch::Receiver<Option<ResolvedTheme>> {
        self.shared.applied.subscribe()
    }

    /// Switch mode, apply it, then persist it. The new mode stays in effect
    /// even if persisting fails.
    pub fn set_mode(&self, mode: ThemeMode) -> DomainResult<()> {
        self.shared.mode.send_replace(mode);
        self.shared.apply();
        self.storage.set(THEME_STORAGE_KEY, mode.as_str())
    }

    /// Flip between light and dark; never returns to `system`
    pub fn toggle(&self) -> DomainResult<()> {
        let next = if self.resolved().is_dark() { ThemeMode::Light } else { ThemeMode::Dark };
        self.set_mode(next)
    }
}

impl Drop for ThemeStore {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.os_listener).take() {
            listener.abort();
        }
    }
}
