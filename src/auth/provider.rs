use super::{AuthError, Registration, Session};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// Hosted identity service: session lookup, sign-in, sign-up, sign-out.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// `None` when the account needs confirming before it can sign in.
    async fn sign_up(&self, registration: &Registration) -> Result<Option<Session>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Provider for a token obtained elsewhere. It can forget the token but
/// cannot issue new ones.
pub struct StaticSessionProvider {
    session: Mutex<Option<Session>>,
}

impl StaticSessionProvider {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(AuthError::Unsupported("sign in"))
    }

    async fn sign_up(&self, _registration: &Registration) -> Result<Option<Session>, AuthError> {
        Err(AuthError::Unsupported("sign up"))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_only_forgets() {
        let provider = StaticSessionProvider::new(Some(Session::bearer("abc")));
        assert!(provider.current_session().await.expect("lookup").is_some());
        assert!(matches!(
            provider.sign_in("a@b.c", "pw").await,
            Err(AuthError::Unsupported("sign in"))
        ));

        provider.sign_out().await.expect("sign out");
        assert!(provider.current_session().await.expect("lookup").is_none());
    }
}
