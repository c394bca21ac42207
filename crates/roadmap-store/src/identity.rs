//! Identity provider

use crate::types::Session;
use tokio::sync::watch;

/// Source of the current session and its transitions
pub trait IdentityProvider: Send + Sync + std::fmt::Debug {
    /// Current session, `None` for guests
    fn current(&self) -> Option<Session>;

    /// Receiver notified on every sign-in and sign-out
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

/// Identity driven programmatically
#[derive(Debug)]
pub struct StaticIdentity {
    tx: watch::Sender<Option<Session>>,
}

impl StaticIdentity {
    /// Start as a guest
    #[must_use]
    pub fn guest() -> Self {
        Self::new(None)
    }

    /// Start with `session`
    #[must_use]
    pub fn new(session: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx }
    }

    /// Become authenticated as `session`
    pub fn sign_in(&self, session: Session) {
        tracing::info!(user = %session.user_id, "signed in");
        self.tx.send_replace(Some(session));
    }

    /// Return to guest mode
    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::info!("signed out");
        }
    }
}

impl Default for StaticIdentity {
    fn default() -> Self {
        Self::guest()
    }
}

impl IdentityProvider for StaticIdentity {
    fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}
