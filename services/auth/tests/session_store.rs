//! Session lifecycle tests against an in-process auth transport
//!
//! These tests drive the store through bootstrap, login, register and logout
//! and check both the in-memory session and the persisted credential slots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auth::models::{LoginRequest, LogoutRequest, RegisterRequest, TokenPair};
use auth::{
    Action, AuthTransport, AuthenticationError, RegistrationError, Role, SessionState,
    SessionStore,
};
use common::error::{TransportError, TransportResult};
use common::storage::{CredentialStore, MemoryStore, TokenSlot};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

const FAR_FUTURE: i64 = 4_102_444_800;

fn token(payload: Value) -> String {
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(b"server-side-secret"),
    )
    .expect("Failed to encode test token")
}

fn access_token(username: &str, role: &str) -> String {
    token(json!({
        "user_id": 1,
        "username": username,
        "role": role,
        "exp": FAR_FUTURE,
        "token_type": "access",
    }))
}

fn refresh_token() -> String {
    token(json!({ "user_id": 1, "exp": FAR_FUTURE, "token_type": "refresh" }))
}

/// In-process stand-in for the account server
#[derive(Clone, Default)]
struct FakeAuthServer {
    accounts: Arc<Mutex<HashMap<String, (String, TokenPair)>>>,
    registrations: Arc<Mutex<Vec<RegisterRequest>>>,
    logouts: Arc<Mutex<Vec<String>>>,
    logout_fails: bool,
    offline: bool,
    unavailable: bool,
}

impl FakeAuthServer {
    fn with_account(self, username: &str, password: &str, tokens: TokenPair) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(username.to_string(), (password.to_string(), tokens));
        self
    }

    fn logouts(&self) -> Vec<String> {
        self.logouts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthTransport for FakeAuthServer {
    async fn login(&self, request: &LoginRequest) -> TransportResult<TokenPair> {
        if self.offline {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        if self.unavailable {
            return Err(TransportError::Rejected {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        match self.accounts.lock().unwrap().get(&request.username) {
            Some((password, tokens)) if *password == request.password => Ok(tokens.clone()),
            _ => Err(TransportError::Unauthorized),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> TransportResult<()> {
        if self.accounts.lock().unwrap().contains_key(&request.username) {
            return Err(TransportError::Rejected {
                status: 400,
                message: "username: A user with that username already exists.".to_string(),
            });
        }
        self.registrations.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn logout(&self, request: &LogoutRequest) -> TransportResult<()> {
        self.logouts.lock().unwrap().push(request.refresh.clone());
        if self.logout_fails {
            return Err(TransportError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

fn alice_tokens() -> TokenPair {
    TokenPair {
        access: access_token("alice", "editor"),
        refresh: refresh_token(),
    }
}

#[tokio::test]
async fn test_login_establishes_session_and_persists_tokens() {
    let server = FakeAuthServer::default().with_account("alice", "wonderland", alice_tokens());
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server, storage.clone());
    store.bootstrap();
    assert!(!store.is_authenticated());

    let session = store
        .login("alice", "wonderland")
        .await
        .expect("login should succeed");

    assert_eq!(session.username(), "alice");
    assert_eq!(session.role(), Role::Editor);
    assert_eq!(store.session(), Some(&session));
    assert_eq!(store.bearer_token(), Some(alice_tokens().access.as_str()));
    assert_eq!(
        storage.get(TokenSlot::Access).unwrap(),
        Some(alice_tokens().access)
    );
    assert_eq!(
        storage.get(TokenSlot::Refresh).unwrap(),
        Some(alice_tokens().refresh)
    );
}

#[tokio::test]
async fn test_login_with_invalid_credentials_stores_nothing() {
    let server = FakeAuthServer::default().with_account("alice", "wonderland", alice_tokens());
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server, storage.clone());
    store.bootstrap();

    let result = store.login("alice", "wrong").await;

    assert!(matches!(result, Err(AuthenticationError::InvalidCredentials)));
    assert!(!store.is_authenticated());
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
    assert_eq!(storage.get(TokenSlot::Refresh).unwrap(), None);
}

#[tokio::test]
async fn test_failed_login_keeps_current_session() {
    let server = FakeAuthServer::default().with_account("alice", "wonderland", alice_tokens());
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server, storage.clone());
    store.bootstrap();
    store.login("alice", "wonderland").await.expect("login");

    let result = store.login("mallory", "guess").await;

    assert!(result.is_err());
    assert_eq!(store.session().map(|s| s.username()), Some("alice"));
    assert_eq!(
        storage.get(TokenSlot::Access).unwrap(),
        Some(alice_tokens().access)
    );
}

#[tokio::test]
async fn test_login_transport_failure_is_not_invalid_credentials() {
    let server = FakeAuthServer {
        offline: true,
        ..FakeAuthServer::default()
    };
    let mut store = SessionStore::new(server, MemoryStore::new());
    store.bootstrap();

    let result = store.login("alice", "wonderland").await;
    assert!(matches!(result, Err(AuthenticationError::Transport(_))));
}

#[tokio::test]
async fn test_login_during_server_outage_is_not_invalid_credentials() {
    let server = FakeAuthServer {
        unavailable: true,
        ..FakeAuthServer::default()
    }
    .with_account("alice", "wonderland", alice_tokens());
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server, storage.clone());
    store.bootstrap();

    let result = store.login("alice", "wonderland").await;

    assert!(matches!(
        result,
        Err(AuthenticationError::Transport(TransportError::Rejected {
            status: 503,
            ..
        }))
    ));
    assert!(!store.is_authenticated());
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
}

#[tokio::test]
async fn test_login_with_unusable_tokens_stores_nothing() {
    let garbage = TokenPair {
        access: "not-a-token".to_string(),
        refresh: refresh_token(),
    };
    let expired = TokenPair {
        access: token(json!({ "user_id": 1, "exp": 1_000 })),
        refresh: refresh_token(),
    };
    let swapped = TokenPair {
        access: refresh_token(),
        refresh: refresh_token(),
    };
    let server = FakeAuthServer::default()
        .with_account("garbage", "password", garbage)
        .with_account("expired", "password", expired)
        .with_account("swapped", "password", swapped);
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server, storage.clone());
    store.bootstrap();

    assert!(matches!(
        store.login("garbage", "password").await,
        Err(AuthenticationError::InvalidToken(_))
    ));
    assert!(matches!(
        store.login("expired", "password").await,
        Err(AuthenticationError::Expired)
    ));
    assert!(matches!(
        store.login("swapped", "password").await,
        Err(AuthenticationError::InvalidToken(_))
    ));
    assert!(!store.is_authenticated());
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_everything_even_when_notification_fails() {
    let server = FakeAuthServer {
        logout_fails: true,
        ..FakeAuthServer::default()
    }
    .with_account("alice", "wonderland", alice_tokens());
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server.clone(), storage.clone());
    store.bootstrap();
    store.login("alice", "wonderland").await.expect("login");

    store.logout().await;

    assert!(!store.is_authenticated());
    assert_eq!(store.state(), &SessionState::Anonymous);
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
    assert_eq!(storage.get(TokenSlot::Refresh).unwrap(), None);
    assert_eq!(server.logouts(), vec![alice_tokens().refresh]);
}

#[tokio::test]
async fn test_logout_without_any_credential_skips_notification() {
    let server = FakeAuthServer::default();
    let mut store = SessionStore::new(server.clone(), MemoryStore::new());
    store.bootstrap();

    store.logout().await;

    assert!(!store.is_authenticated());
    assert!(server.logouts().is_empty());
}

#[tokio::test]
async fn test_logout_revokes_leftover_refresh_token() {
    let server = FakeAuthServer::default();
    let storage = MemoryStore::new();
    storage.set(TokenSlot::Access, "corrupted").unwrap();
    storage.set(TokenSlot::Refresh, "leftover-refresh").unwrap();
    let mut store = SessionStore::new(server.clone(), storage.clone());
    store.bootstrap();
    assert!(!store.is_authenticated());

    store.logout().await;

    assert_eq!(server.logouts(), vec!["leftover-refresh".to_string()]);
    assert_eq!(storage.get(TokenSlot::Refresh).unwrap(), None);
}

#[test]
fn test_bootstrap_restores_stored_session() {
    let storage = MemoryStore::new();
    storage.set(TokenSlot::Access, &access_token("bob", "admin")).unwrap();
    storage.set(TokenSlot::Refresh, &refresh_token()).unwrap();
    let mut store = SessionStore::new(FakeAuthServer::default(), storage);
    assert!(store.is_loading());

    store.bootstrap();

    assert!(!store.is_loading());
    let session = store.session().expect("session restored");
    assert_eq!(session.username(), "bob");
    assert_eq!(session.role(), Role::Admin);
    assert_eq!(session.refresh_token(), Some(refresh_token().as_str()));
}

#[test]
fn test_bootstrap_defaults_missing_username() {
    let storage = MemoryStore::new();
    storage
        .set(
            TokenSlot::Access,
            &token(json!({ "user_id": 9, "exp": FAR_FUTURE })),
        )
        .unwrap();
    let mut store = SessionStore::new(FakeAuthServer::default(), storage);

    store.bootstrap();

    let session = store.session().expect("session restored");
    assert_eq!(session.username(), "User");
    assert_eq!(session.claims().subject(), "9");
    assert_eq!(session.role(), Role::Viewer);
    assert_eq!(session.refresh_token(), None);
}

#[test]
fn test_bootstrap_discards_malformed_credential() {
    let storage = MemoryStore::new();
    storage.set(TokenSlot::Access, "definitely.not.ajwt").unwrap();
    storage.set(TokenSlot::Refresh, "kept-for-logout").unwrap();
    let mut store = SessionStore::new(FakeAuthServer::default(), storage.clone());

    store.bootstrap();

    assert!(!store.is_loading());
    assert!(store.session().is_none());
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
    assert_eq!(
        storage.get(TokenSlot::Refresh).unwrap(),
        Some("kept-for-logout".to_string())
    );
}

#[test]
fn test_bootstrap_discards_expired_credential() {
    let storage = MemoryStore::new();
    storage
        .set(
            TokenSlot::Access,
            &token(json!({ "user_id": 1, "username": "alice", "exp": 1_000 })),
        )
        .unwrap();
    let mut store = SessionStore::new(FakeAuthServer::default(), storage.clone());

    store.bootstrap();

    assert_eq!(store.state(), &SessionState::Anonymous);
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
}

#[tokio::test]
async fn test_register_validates_before_calling_server() {
    let server = FakeAuthServer::default();
    let mut store = SessionStore::new(server.clone(), MemoryStore::new());
    store.bootstrap();

    let result = store
        .register("bad name", "carol@example.com", "long enough", Role::Viewer)
        .await;
    assert!(matches!(result, Err(RegistrationError::Invalid(_))));

    let result = store
        .register("carol", "carol@example.com", "12345678", Role::Viewer)
        .await;
    assert!(matches!(result, Err(RegistrationError::Invalid(_))));

    assert!(server.registrations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_does_not_log_in() {
    let server = FakeAuthServer::default().with_account("alice", "wonderland", alice_tokens());
    let storage = MemoryStore::new();
    let mut store = SessionStore::new(server.clone(), storage.clone());
    store.bootstrap();

    store
        .register("carol", "carol@example.com", "long enough", Role::Editor)
        .await
        .expect("registration should succeed");

    assert!(!store.is_authenticated());
    assert_eq!(storage.get(TokenSlot::Access).unwrap(), None);
    let registrations = server.registrations.lock().unwrap().clone();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].role, Role::Editor);

    let result = store
        .register("alice", "alice@example.com", "long enough", Role::Viewer)
        .await;
    match result {
        Err(RegistrationError::Rejected(message)) => assert!(message.contains("already exists")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_authorization_follows_role() {
    let viewer = TokenPair {
        access: access_token("dave", "viewer"),
        refresh: refresh_token(),
    };
    let server = FakeAuthServer::default()
        .with_account("alice", "wonderland", alice_tokens())
        .with_account("dave", "password", viewer);
    let mut store = SessionStore::new(server, MemoryStore::new());
    store.bootstrap();
    assert!(!store.authorize(Action::ViewLibrary));

    store.login("dave", "password").await.expect("login");
    assert!(store.authorize(Action::ViewLibrary));
    assert!(!store.authorize(Action::Upload));
    assert!(!store.session().unwrap().can_delete("dave"));

    store.login("alice", "wonderland").await.expect("login");
    assert!(store.authorize(Action::Upload));
    assert!(!store.authorize(Action::ViewAllMedia));
    let session = store.snapshot().expect("session");
    assert!(session.can_delete("alice"));
    assert!(!session.can_delete("dave"));
}
