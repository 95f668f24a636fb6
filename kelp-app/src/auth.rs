//! Identity provider interface
//!
//! The app consumes a "current identity or none" signal plus login and
//! logout. Session persistence is the provider's concern, not ours.

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// Auth error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Auth error: {0}")]
    Unknown(String),
}

/// Identity provider interface
#[async_trait]
pub trait AuthBackend: Send + Sync + std::fmt::Debug {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn logout(&self);

    /// Current identity, if a session is active
    fn current(&self) -> Option<Identity>;
}

/// Fixed-credential backend for tests and local development
#[derive(Debug, Default)]
pub struct StaticAuth {
    users: Vec<(String, String)>,
    session: RwLock<Option<Identity>>,
}

impl StaticAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accepted email/password pair
    pub fn with_user(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.push((email.into(), password.into()));
        self
    }
}

#[async_trait]
impl AuthBackend for StaticAuth {
    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let accepted = self
            .users
            .iter()
            .any(|(e, p)| e == email && p == password);
        if !accepted {
            return Err(AuthError::InvalidCredentials);
        }
        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            email: email.to_string(),
        };
        *self.session.write() = Some(identity.clone());
        Ok(identity)
    }

    async fn logout(&self) {
        *self.session.write() = None;
    }

    fn current(&self) -> Option<Identity> {
        self.session.read().clone()
    }
}
