//! Role model and the client-side permission matrix
//!
//! Decisions made here are UI hints only: the server re-checks every request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role carried in the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May browse the library
    #[default]
    Viewer,
    /// May also upload and delete own videos
    Editor,
    /// May do everything, on every user's videos
    Admin,
}

/// Action gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List and play videos
    ViewLibrary,
    /// Upload new videos
    Upload,
    /// Delete videos
    Delete,
    /// See videos uploaded by other users
    ViewAllMedia,
}

impl Role {
    /// Whether the role permits the action
    pub fn allows(self, action: Action) -> bool {
        match action {
            Action::ViewLibrary => true,
            Action::Upload | Action::Delete => matches!(self, Role::Editor | Role::Admin),
            Action::ViewAllMedia => self == Role::Admin,
        }
    }

    /// Wire name of the role
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}
