//! OS-level colour scheme signal.

use tokio::sync::watch;

pub trait ColorSchemeSource: Send + Sync {
    /// Whether the OS currently prefers a dark colour scheme
    fn prefers_dark(&self) -> bool;

    /// Notifications of OS preference changes
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Settable colour scheme signal, for hosts without a native one
pub struct StaticColorScheme {
    tx: watch::Sender<bool>,
}

impl StaticColorScheme {
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            tx: watch::channel(prefers_dark).0,
        }
    }

    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        self.tx.send_replace(prefers_dark);
    }
}

impl Default for StaticColorScheme {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ColorSchemeSource for StaticColorScheme {
    fn prefers_dark(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
