//! Auth Form Store
//!
//! Login / registration form state. Talks to the identity provider
//! directly; the session store picks up the result from the provider's
//! notifications.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::domain::{DomainError, DomainResult, Identity};
use crate::repository::IdentityProvider;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthFormState {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthFormState {
    pub fn title(&self) -> &'static str {
        match self.mode {
            AuthMode::Register => "Create your account",
            AuthMode::Login => "Welcome back",
        }
    }

    pub fn primary_label(&self) -> &'static str {
        match self.mode {
            AuthMode::Register => "Create account",
            AuthMode::Login => "Sign in",
        }
    }
}

pub struct AuthStore {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthFormState>,
}

impl AuthStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            state: watch::channel(AuthFormState::default()).0,
        }
    }

    pub fn state(&self) -> AuthFormState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthFormState> {
        self.state.subscribe()
    }

    pub fn set_mode(&self, mode: AuthMode) {
        self.state.send_modify(|s| {
            s.mode = mode;
            s.error = None;
        });
    }

    pub fn set_email(&self, email: Option<&str>) {
        let email = email.unwrap_or_default().to_string();
        self.state.send_modify(|s| {
            s.email = email;
            s.error = None;
        });
    }

    pub fn set_password(&self, password: Option<&str>) {
        let password = password.unwrap_or_default().to_string();
        self.state.send_modify(|s| {
            s.password = password;
            s.error = None;
        });
    }

    pub fn reset(&self) {
        self.state.send_modify(|s| {
            s.email.clear();
            s.password.clear();
            s.error = None;
            s.loading = false;
        });
    }

    /// Sign in or register with the entered credentials. On failure the
    /// form keeps its input and shows the provider's message.
    pub async fn submit(&self) -> DomainResult<Identity> {
        let (mode, email, password) = {
            let s = self.state.borrow();
            (s.mode, s.email.trim().to_string(), s.password.clone())
        };
        self.state.send_modify(|s| {
            s.error = None;
            s.loading = true;
        });

        let result = if email.is_empty() || password.is_empty() {
            Err(DomainError::InvalidInput("Enter your email and password.".to_string()))
        } else {
            match mode {
                AuthMode::Register => self.provider.create_account(&email, &password).await,
                AuthMode::Login => self.provider.sign_in(&email, &password).await,
            }
        };

        match result {
            Ok(identity) => {
                log::info!("Authenticated {}", identity.uid);
                self.reset();
                Ok(identity)
            }
            Err(e) => {
                let message = match e.to_string() {
                    m if m.is_empty() => "Authentication error".to_string(),
                    m => m,
                };
                log::warn!("Authentication failed: {}", message);
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryIdentityProvider;

    fn store() -> (Arc<MemoryIdentityProvider>, AuthStore) {
        let provider = Arc::new(MemoryIdentityProvider::new());
        (provider.clone(), AuthStore::new(provider))
    }

    #[test]
    fn test_labels_follow_mode() {
        let (_, auth) = store();
        assert_eq!(auth.state().title(), "Welcome back");
        assert_eq!(auth.state().primary_label(), "Sign in");
        auth.set_mode(AuthMode::Register);
        assert_eq!(auth.state().title(), "Create your account");
        assert_eq!(auth.state().primary_label(), "Create account");
    }

    #[tokio::test]
    async fn test_empty_credentials_abort() {
        let (provider, auth) = store();
        auth.set_email(Some("   "));
        auth.set_password(Some("secret1"));

        let err = auth.submit().await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        let state = auth.state();
        assert_eq!(state.error.as_deref(), Some("Enter your email and password."));
        assert!(!state.loading);
        assert_eq!(provider.current(), None);
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (provider, auth) = store();
        auth.set_mode(AuthMode::Register);
        auth.set_email(Some(" a@b.c "));
        auth.set_password(Some("secret1"));
        let created = auth.submit().await.unwrap();
        assert_eq!(created.email.as_deref(), Some("a@b.c"));
        assert_eq!(auth.state().email, "");
        assert_eq!(auth.state().mode, AuthMode::Register);

        provider.sign_out().await.unwrap();
        auth.set_mode(AuthMode::Login);
        auth.set_email(Some("a@b.c"));
        auth.set_password(Some("secret1"));
        let signed_in = auth.submit().await.unwrap();
        assert_eq!(signed_in.uid, created.uid);
    }

    #[tokio::test]
    async fn test_failure_keeps_input_and_shows_message() {
        let (_, auth) = store();
        auth.set_email(Some("a@b.c"));
        auth.set_password(Some("wrong"));

        assert!(auth.submit().await.is_err());
        let state = auth.state();
        assert_eq!(state.error.as_deref(), Some("Invalid email or password."));
        assert_eq!(state.email, "a@b.c");

        auth.set_password(None);
        assert_eq!(auth.state().error, None);
        assert_eq!(auth.state().password, "");
    }
}
