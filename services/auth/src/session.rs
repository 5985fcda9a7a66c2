//! Session lifecycle: bootstrap from storage, login, register and logout

use chrono::Utc;
use common::storage::{CredentialStore, TokenSlot};
use tracing::{debug, info, warn};

use crate::error::{AuthenticationError, RegistrationError};
use crate::models::{Action, LoginRequest, LogoutRequest, RegisterRequest, Role, Session, TokenPair};
use crate::token::TokenCodec;
use crate::transport::AuthTransport;
use crate::validation::validate_registration;

/// Where the store is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// `bootstrap` has not completed yet
    Loading,
    /// No session
    Anonymous,
    /// A decoded, unexpired access token is held
    Authenticated(Session),
}

/// Single owner of the current session and of the persisted credentials
///
/// The session is non-empty exactly when a well-formed access token that was
/// not expired when decoded is held. Expiry is not watched afterwards: a
/// transport reporting `Unauthorized` is the caller's cue to [`logout`].
///
/// [`logout`]: SessionStore::logout
pub struct SessionStore<T, S> {
    transport: T,
    storage: S,
    codec: TokenCodec,
    state: SessionState,
}

impl<T, S> SessionStore<T, S>
where
    T: AuthTransport,
    S: CredentialStore,
{
    /// Create a store in the `Loading` state
    pub fn new(transport: T, storage: S) -> Self {
        Self {
            transport,
            storage,
            codec: TokenCodec::new(),
            state: SessionState::Loading,
        }
    }

    /// Restore the session from persisted credentials
    ///
    /// A stored access token that does not decode, or that is already expired,
    /// is discarded. Always leaves the `Loading` state.
    pub fn bootstrap(&mut self) {
        let stored = match self.storage.get(TokenSlot::Access) {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored access token: {}", e);
                None
            }
        };

        let Some(access) = stored else {
            debug!("No stored credential");
            self.state = SessionState::Anonymous;
            return;
        };

        match self.codec.decode_access(&access) {
            Ok(claims) if !claims.is_expired_at(Utc::now()) => {
                let refresh = self.storage.get(TokenSlot::Refresh).unwrap_or_else(|e| {
                    warn!("Failed to read stored refresh token: {}", e);
                    None
                });
                let session = Session::new(access, refresh, claims);
                info!("Restored session for user: {}", session.username());
                self.state = SessionState::Authenticated(session);
            }
            Ok(_) => {
                info!("Stored access token has expired, discarding it");
                self.discard_access_token();
            }
            Err(e) => {
                warn!("Stored access token is unusable, discarding it: {}", e);
                self.discard_access_token();
            }
        }
    }

    /// Log in and establish a new session
    ///
    /// Nothing is stored and the current state is kept when any step fails.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthenticationError> {
        info!("Login attempt for user: {}", username);

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let tokens = self.transport.login(&request).await.map_err(|e| {
            warn!("Login failed for user {}: {}", username, e);
            AuthenticationError::from(e)
        })?;

        let claims = self.codec.decode_access(&tokens.access)?;
        if claims.is_expired_at(Utc::now()) {
            warn!("Login for user {} returned an expired token", username);
            return Err(AuthenticationError::Expired);
        }

        self.persist(&tokens)?;

        let session = Session::new(tokens.access, Some(tokens.refresh), claims);
        info!(
            "Logged in as {} with role {}",
            session.username(),
            session.role()
        );
        self.state = SessionState::Authenticated(session.clone());
        Ok(session)
    }

    /// Create an account; the current session is left untouched
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<(), RegistrationError> {
        validate_registration(username, email, password).map_err(RegistrationError::Invalid)?;

        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        self.transport.register(&request).await.map_err(|e| {
            warn!("Registration failed for user {}: {}", username, e);
            RegistrationError::from(e)
        })?;

        info!("Registered user: {}", username);
        Ok(())
    }

    /// End the session
    ///
    /// Local state and both credential slots are always cleared; the server is
    /// told about it when a refresh token is known, and any failure doing so
    /// is only logged.
    pub async fn logout(&mut self) {
        let previous = std::mem::replace(&mut self.state, SessionState::Anonymous);
        let refresh = match previous {
            SessionState::Authenticated(session) => session.refresh_token().map(str::to_owned),
            _ => None,
        }
        .or_else(|| self.storage.get(TokenSlot::Refresh).ok().flatten());

        for slot in [TokenSlot::Access, TokenSlot::Refresh] {
            if let Err(e) = self.storage.remove(slot) {
                warn!("Failed to clear {}: {}", slot.key(), e);
            }
        }

        if let Some(refresh) = refresh {
            if let Err(e) = self.transport.logout(&LogoutRequest { refresh }).await {
                warn!("Logout notification failed, ignoring: {}", e);
            }
        }

        info!("Logged out");
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether `bootstrap` is still pending
    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Current session, if any
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    /// Owned copy of the current session
    pub fn snapshot(&self) -> Option<Session> {
        self.session().cloned()
    }

    /// Access token to attach to authenticated requests
    pub fn bearer_token(&self) -> Option<&str> {
        self.session().map(Session::access_token)
    }

    /// Whether the current session may perform `action`; false when anonymous
    pub fn authorize(&self, action: Action) -> bool {
        self.session().is_some_and(|session| session.can(action))
    }

    fn persist(&self, tokens: &TokenPair) -> Result<(), AuthenticationError> {
        let previous_access = self.storage.get(TokenSlot::Access).ok().flatten();
        let previous_refresh = self.storage.get(TokenSlot::Refresh).ok().flatten();

        let result = self
            .storage
            .set(TokenSlot::Access, &tokens.access)
            .and_then(|_| self.storage.set(TokenSlot::Refresh, &tokens.refresh));

        if let Err(e) = result {
            warn!("Failed to persist credentials, restoring previous ones: {}", e);
            self.restore(TokenSlot::Access, previous_access.as_deref());
            self.restore(TokenSlot::Refresh, previous_refresh.as_deref());
            return Err(e.into());
        }
        Ok(())
    }

    fn restore(&self, slot: TokenSlot, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(slot, value),
            None => self.storage.remove(slot),
        };
        if let Err(e) = result {
            warn!("Failed to restore {}: {}", slot.key(), e);
        }
    }

    fn discard_access_token(&mut self) {
        if let Err(e) = self.storage.remove(TokenSlot::Access) {
            warn!("Failed to discard stored access token: {}", e);
        }
        self.state = SessionState::Anonymous;
    }
}
