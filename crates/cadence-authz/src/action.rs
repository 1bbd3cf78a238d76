// action.rs - The closed set of gated capabilities.
//
// Actions are validated once, at the boundary, and stored under their
// canonical label. Adding a capability means adding a variant here; the
// stores key on `as_str()` and need no schema change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthzError;

/// A named capability subject to gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    /// Creating, editing or deleting posts.
    Post,
    /// Sending or deleting direct messages.
    Message,
    /// Scheduling reminders for oneself or others.
    Nudge,
    /// Logging activity records.
    Record,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Action; 4] = [Action::Post, Action::Message, Action::Nudge, Action::Record];

    /// Canonical label used as the storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Post => "Post",
            Action::Message => "Message",
            Action::Nudge => "Nudge",
            Action::Record => "Record",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AuthzError;

    /// Labels are matched case-insensitively so "post" and "Post" agree.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let trimmed = label.trim();
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AuthzError::UnknownAction {
                label: label.to_string(),
            })
    }
}
