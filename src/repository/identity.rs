//! Identity provider seam
//!
//! The provider owns the session lifecycle; consumers learn about sign-in
//! and sign-out only through the notifications it emits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::{DomainError, DomainResult, Identity};
use crate::lock;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register for identity changes. The current identity (or `None`) is
    /// delivered once registration completes, then again on every change.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Option<Identity>>;

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Identity>;

    async fn create_account(&self, email: &str, password: &str) -> DomainResult<Identity>;

    async fn sign_out(&self) -> DomainResult<()>;
}

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    uid: String,
}

#[derive(Default)]
struct ProviderState {
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    listeners: Vec<mpsc::UnboundedSender<Option<Identity>>>,
}

impl ProviderState {
    fn publish(&mut self, identity: Option<Identity>) {
        self.current = identity.clone();
        self.listeners.retain(|tx| tx.send(identity.clone()).is_ok());
    }
}

/// Email/password accounts kept in memory
#[derive(Default)]
pub struct MemoryIdentityProvider {
    state: Mutex<ProviderState>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `identity` already signed in
    pub fn signed_in(identity: Identity) -> Self {
        let provider = Self::default();
        lock(&provider.state).current = Some(identity);
        provider
    }

    pub fn current(&self) -> Option<Identity> {
        lock(&self.state).current.clone()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<Option<Identity>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = lock(&self.state);
        if tx.send(state.current.clone()).is_ok() {
            state.listeners.push(tx);
        }
        rx
    }

    async fn sign_in(&self, email: &str, password: &str) -> DomainResult<Identity> {
        let mut state = lock(&self.state);
        let uid = match state.accounts.get(email) {
            Some(account) if account.password == password => account.uid.clone(),
            _ => return Err(DomainError::Auth("Invalid email or password.".to_string())),
        };
        let identity = Identity::with_email(uid, email);
        state.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn create_account(&self, email: &str, password: &str) -> DomainResult<Identity> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::Auth(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        let mut state = lock(&self.state);
        if state.accounts.contains_key(email) {
            return Err(DomainError::Auth("Email already in use.".to_string()));
        }
        let uid = uuid::Uuid::new_v4().simple().to_string();
        state.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                uid: uid.clone(),
            },
        );
        // Creating an account signs it in
        let identity = Identity::with_email(uid, email);
        state.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> DomainResult<()> {
        lock(&self.state).publish(None);
        Ok(())
    }
}
