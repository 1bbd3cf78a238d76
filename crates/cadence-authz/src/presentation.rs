// presentation.rs - The message contract shared with the presentation layer.
//
// Errors carry opaque ids. Before showing them to a person, the routing
// layer resolves those ids to display names and renders the kind's
// template. The mapping from kind to template is one-to-one and rendering
// never changes the kind. Success confirmations follow the same wording
// the app has always used.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::AuthzError;
use crate::graph::ControlEdge;
use crate::identity::UserId;
use crate::registry::{AllowedPair, DenialRecord};

/// Looks up the human-readable name of an account.
pub trait IdentityResolver {
    /// `None` when the id is unknown; callers then fall back to the raw id.
    fn display_name(&self, user: &UserId) -> Option<String>;
}

/// Resolver that shows ids as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl IdentityResolver for Verbatim {
    fn display_name(&self, user: &UserId) -> Option<String> {
        Some(user.to_string())
    }
}

impl IdentityResolver for HashMap<UserId, String> {
    fn display_name(&self, user: &UserId) -> Option<String> {
        self.get(user).cloned()
    }
}

fn name(resolver: &impl IdentityResolver, user: &UserId) -> String {
    resolver
        .display_name(user)
        .unwrap_or_else(|| user.to_string())
}

/// Render `err` for an end user, with account ids replaced by display names.
pub fn describe(err: &AuthzError, resolver: &impl IdentityResolver) -> String {
    match err {
        AuthzError::ActionForbidden { user, action } => format!(
            "{} is not allowed to perform action {}!",
            name(resolver, user),
            action
        ),
        AuthzError::InsufficientControl {
            authorizer,
            authorizee,
        } => format!(
            "{} does not have permission to make authorization on {}'s account!",
            name(resolver, authorizer),
            name(resolver, authorizee)
        ),
        AuthzError::EdgeNotFound {
            authorizer,
            authorizee,
        } => format!(
            "Authorization from {} to {} does not exist!",
            name(resolver, authorizer),
            name(resolver, authorizee)
        ),
        AuthzError::AlreadyAllowed { action, user } => format!(
            "Action {} already is allowed for user {}!",
            action,
            name(resolver, user)
        ),
        AuthzError::AlreadyDenied { action, user } => format!(
            "Action {} already is denied for user {}!",
            action,
            name(resolver, user)
        ),
        AuthzError::EdgeAlreadyExists {
            authorizer,
            authorizee,
        } => format!(
            "{} already has authorization permission access over {}!",
            name(resolver, authorizer),
            name(resolver, authorizee)
        ),
        other => other.to_string(),
    }
}

pub const DENIED_MSG: &str = "Action successfully denied!";
pub const ALLOWED_MSG: &str = "Action successfully allowed!";
pub const CONTROL_GIVEN_MSG: &str = "Control successfully given!";
pub const CONTROL_REVOKED_MSG: &str = "Control successfully revoked!";

/// A successful mutation, shaped for a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Confirmation {
    Denied {
        msg: String,
        authorization: DenialRecord,
    },
    Allowed {
        msg: String,
        user: UserId,
        action: Action,
    },
    ControlGiven {
        msg: String,
        permission_control: ControlEdge,
    },
    ControlRevoked {
        msg: String,
        authorizer: UserId,
        authorizee: UserId,
    },
}

impl Confirmation {
    pub fn denied(record: DenialRecord) -> Self {
        Confirmation::Denied {
            msg: DENIED_MSG.to_string(),
            authorization: record,
        }
    }

    pub fn allowed(pair: AllowedPair) -> Self {
        Confirmation::Allowed {
            msg: ALLOWED_MSG.to_string(),
            user: pair.user,
            action: pair.action,
        }
    }

    pub fn control_given(edge: ControlEdge) -> Self {
        Confirmation::ControlGiven {
            msg: CONTROL_GIVEN_MSG.to_string(),
            permission_control: edge,
        }
    }

    pub fn control_revoked(authorizer: UserId, authorizee: UserId) -> Self {
        Confirmation::ControlRevoked {
            msg: CONTROL_REVOKED_MSG.to_string(),
            authorizer,
            authorizee,
        }
    }

    pub fn msg(&self) -> &str {
        match self {
            Confirmation::Denied { msg, .. }
            | Confirmation::Allowed { msg, .. }
            | Confirmation::ControlGiven { msg, .. }
            | Confirmation::ControlRevoked { msg, .. } => msg,
        }
    }
}
