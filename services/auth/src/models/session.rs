//! Session model

use crate::models::{Action, Role};
use crate::token::Claims;

/// Username shown when the token does not carry one
pub const DEFAULT_USERNAME: &str = "User";

/// Authenticated session: the held tokens and their decoded claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    refresh_token: Option<String>,
    claims: Claims,
}

impl Session {
    pub(crate) fn new(access_token: String, refresh_token: Option<String>, claims: Claims) -> Self {
        Self {
            access_token,
            refresh_token,
            claims,
        }
    }

    /// Bearer credential attached to authenticated requests
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Refresh credential, when one was stored alongside the access token
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Display name, `"User"` when the token carries no username
    pub fn username(&self) -> &str {
        self.claims.username().unwrap_or(DEFAULT_USERNAME)
    }

    pub fn role(&self) -> Role {
        self.claims.role()
    }

    /// Whether the session's role permits the action
    pub fn can(&self, action: Action) -> bool {
        self.role().allows(action)
    }

    /// Whether this session may delete a video uploaded by `uploaded_by`
    ///
    /// Editors may only delete their own uploads; admins may delete anything.
    pub fn can_delete(&self, uploaded_by: &str) -> bool {
        match self.role() {
            Role::Admin => true,
            Role::Editor => self.claims.username() == Some(uploaded_by),
            Role::Viewer => false,
        }
    }
}
