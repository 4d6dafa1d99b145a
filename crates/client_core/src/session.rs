//! Authentication gate in front of every operation.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::service::CryptoService;

pub const MAX_AUTH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub remaining_attempts: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            authenticated: false,
            remaining_attempts: MAX_AUTH_ATTEMPTS,
        }
    }
}

impl Session {
    pub fn locked_out(&self) -> bool {
        !self.authenticated && self.remaining_attempts == 0
    }

    /// The main application is shown exactly while the session is authenticated.
    pub fn app_visible(&self) -> bool {
        self.authenticated
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please enter the master key")]
    EmptyInput,
    #[error("Invalid key. {remaining} attempts remaining.")]
    InvalidKey { remaining: u32 },
    #[error("Access denied. Too many failed attempts.")]
    LockedOut,
    #[error("Authentication failed. Please try again.")]
    Unavailable(String),
}

pub struct SessionGate {
    service: Arc<dyn CryptoService>,
    state: watch::Sender<Session>,
}

impl SessionGate {
    pub fn new(service: Arc<dyn CryptoService>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self { service, state }
    }

    pub fn session(&self) -> Session {
        *self.state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub async fn authenticate(&mut self, key: &str) -> Result<(), AuthError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AuthError::EmptyInput);
        }
        if self.session().locked_out() {
            warn!("authentication attempt while locked out");
            return Err(AuthError::LockedOut);
        }

        let reply = match self.service.authenticate(key).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!("authentication service unavailable: {err}");
                return Err(AuthError::Unavailable(err.to_string()));
            }
        };

        if reply.granted() {
            self.state.send_replace(Session {
                authenticated: true,
                remaining_attempts: MAX_AUTH_ATTEMPTS,
            });
            info!("authentication granted");
            return Ok(());
        }

        let mut remaining = 0;
        self.state.send_modify(|session| {
            session.remaining_attempts = session.remaining_attempts.saturating_sub(1);
            remaining = session.remaining_attempts;
        });
        warn!(remaining_attempts = remaining, "authentication denied");

        if remaining == 0 {
            Err(AuthError::LockedOut)
        } else {
            Err(AuthError::InvalidKey { remaining })
        }
    }

    /// Back to the initial state no matter what came before.
    pub fn logout(&mut self) {
        self.state.send_replace(Session::default());
        info!("session logged out");
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
