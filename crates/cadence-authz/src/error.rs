// error.rs - Error types for the access-control core.
//
// Domain variants are deterministic precondition failures and carry the
// identifiers involved so the presentation layer can render them with
// resolved display names. Infrastructure failures come from the store or
// the configuration file and are always propagated, never swallowed.

use std::path::PathBuf;

use thiserror::Error;

use crate::action::Action;
use crate::identity::UserId;

/// Errors returned by the access-control core.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The subject is denied the action it tried to perform.
    #[error("{user} is not allowed to perform action {action}!")]
    ActionForbidden { user: UserId, action: Action },

    /// The authorizer holds no control edge over the authorizee.
    #[error("{authorizer} does not have permission to make authorization on {authorizee}'s account!")]
    InsufficientControl {
        authorizer: UserId,
        authorizee: UserId,
    },

    /// Revoke targeted an edge that does not exist.
    #[error("Authorization from {authorizer} to {authorizee} does not exist!")]
    EdgeNotFound {
        authorizer: UserId,
        authorizee: UserId,
    },

    /// Allow targeted a pair that has no denial.
    #[error("Action {action} already is allowed for user {user}!")]
    AlreadyAllowed { action: Action, user: UserId },

    /// Deny targeted a pair that is already denied.
    #[error("Action {action} already is denied for user {user}!")]
    AlreadyDenied { action: Action, user: UserId },

    /// Grant targeted an edge that already exists.
    #[error("{authorizer} already has authorization permission access over {authorizee}!")]
    EdgeAlreadyExists {
        authorizer: UserId,
        authorizee: UserId,
    },

    /// An action label did not name a known action.
    #[error("unknown action '{label}'")]
    UnknownAction { label: String },

    /// A known action that automatic recording cannot track.
    #[error("action {action} cannot be recorded automatically")]
    NotTrackable { action: Action },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

/// One tag per [`AuthzError`] variant, for callers that map kinds to
/// responses without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ActionForbidden,
    InsufficientControl,
    EdgeNotFound,
    AlreadyAllowed,
    AlreadyDenied,
    EdgeAlreadyExists,
    UnknownAction,
    NotTrackable,
    Storage,
    Config,
}

/// Coarse grouping of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    /// The caller asked for a transition the state machine forbids from the
    /// current state.
    StateConflict,
    /// The subject lacks standing to proceed. Gated operations must stop.
    AuthorizationDenial,
    /// Input rejected at the boundary before touching any relation.
    InvalidInput,
    /// Storage or configuration failure.
    Infrastructure,
}

impl AuthzError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthzError::ActionForbidden { .. } => ErrorKind::ActionForbidden,
            AuthzError::InsufficientControl { .. } => ErrorKind::InsufficientControl,
            AuthzError::EdgeNotFound { .. } => ErrorKind::EdgeNotFound,
            AuthzError::AlreadyAllowed { .. } => ErrorKind::AlreadyAllowed,
            AuthzError::AlreadyDenied { .. } => ErrorKind::AlreadyDenied,
            AuthzError::EdgeAlreadyExists { .. } => ErrorKind::EdgeAlreadyExists,
            AuthzError::UnknownAction { .. } => ErrorKind::UnknownAction,
            AuthzError::NotTrackable { .. } => ErrorKind::NotTrackable,
            AuthzError::Storage(_) => ErrorKind::Storage,
            AuthzError::Config { .. } => ErrorKind::Config,
        }
    }

    pub fn family(&self) -> ErrorFamily {
        match self.kind() {
            ErrorKind::AlreadyAllowed
            | ErrorKind::AlreadyDenied
            | ErrorKind::EdgeAlreadyExists
            | ErrorKind::EdgeNotFound => ErrorFamily::StateConflict,
            ErrorKind::ActionForbidden | ErrorKind::InsufficientControl => {
                ErrorFamily::AuthorizationDenial
            }
            ErrorKind::UnknownAction | ErrorKind::NotTrackable => ErrorFamily::InvalidInput,
            ErrorKind::Storage | ErrorKind::Config => ErrorFamily::Infrastructure,
        }
    }

    pub fn is_state_conflict(&self) -> bool {
        self.family() == ErrorFamily::StateConflict
    }

    pub fn is_authorization_denial(&self) -> bool {
        self.family() == ErrorFamily::AuthorizationDenial
    }
}

/// Failures inside a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported an error other than a uniqueness conflict.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A file I/O operation failed (e.g. creating the database directory).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A persisted row could not be decoded.
    #[error("corrupt {table} row: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// A relation lock was poisoned by a panicking writer.
    #[error("{relation} lock poisoned")]
    Poisoned { relation: &'static str },
}
