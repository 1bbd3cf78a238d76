// registry.rs - The denial registry.
//
// Per `(user, action)` pair the registry is a two-state machine:
//
//   Allowed (implicit, initial) --deny--> Denied --allow--> Allowed
//
// Nothing else moves a pair between states. Both transitions are single
// atomic store calls, so two racing `deny` calls produce one record and one
// `AlreadyDenied`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::Action;
use crate::error::AuthzError;
use crate::identity::UserId;
use crate::store::{DenialStore, Insertion};

/// A forbidden `(user, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialRecord {
    /// Unique ID for this record.
    pub id: Uuid,
    /// The restricted account.
    pub user: UserId,
    /// The forbidden action.
    pub action: Action,
    /// When the denial was recorded.
    pub denied_at: DateTime<Utc>,
}

impl DenialRecord {
    /// Build a fresh record stamped with the current time.
    pub fn new(user: UserId, action: Action) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            action,
            denied_at: Utc::now(),
        }
    }

    /// Whether this record is for the given logical key.
    pub fn matches(&self, user: &UserId, action: Action) -> bool {
        &self.user == user && self.action == action
    }
}

/// Confirmation that a pair is back in the allowed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedPair {
    pub user: UserId,
    pub action: Action,
}

/// Records which `(user, action)` pairs are currently forbidden.
#[derive(Clone)]
pub struct DenialRegistry {
    store: Arc<dyn DenialStore>,
}

impl DenialRegistry {
    pub fn new(store: Arc<dyn DenialStore>) -> Self {
        Self { store }
    }

    /// Forbid `action` for `user`.
    ///
    /// Fails with [`AuthzError::AlreadyDenied`] if the pair is already denied.
    pub fn deny(&self, user: &UserId, action: Action) -> Result<DenialRecord, AuthzError> {
        let record = DenialRecord::new(user.clone(), action);
        match self.store.insert_denial(&record)? {
            Insertion::Inserted => {
                tracing::info!(user = %user, action = %action, "action denied");
                Ok(record)
            }
            Insertion::Conflict => Err(AuthzError::AlreadyDenied {
                action,
                user: user.clone(),
            }),
        }
    }

    /// Permit `action` for `user` again, removing every matching record.
    ///
    /// Fails with [`AuthzError::AlreadyAllowed`] if the pair was not denied.
    pub fn allow(&self, user: &UserId, action: Action) -> Result<AllowedPair, AuthzError> {
        let removed = self.store.remove_denials(user, action)?;
        if removed == 0 {
            return Err(AuthzError::AlreadyAllowed {
                action,
                user: user.clone(),
            });
        }
        tracing::info!(user = %user, action = %action, "action allowed");
        Ok(AllowedPair {
            user: user.clone(),
            action,
        })
    }

    /// Current denials for `user`, oldest first. Empty if none.
    pub fn denials_for(&self, user: &UserId) -> Result<Vec<DenialRecord>, AuthzError> {
        Ok(self.store.denials_for(user)?)
    }

    pub fn is_denied(&self, user: &UserId, action: Action) -> Result<bool, AuthzError> {
        Ok(self.store.find_denial(user, action)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};

    fn registries() -> Vec<DenialRegistry> {
        vec![
            DenialRegistry::new(Arc::new(MemoryStore::new())),
            DenialRegistry::new(Arc::new(SqliteStore::open_in_memory().unwrap())),
        ]
    }

    #[test]
    fn deny_then_allow_returns_to_allowed() {
        for registry in registries() {
            let alice = UserId::from("alice");
            let record = registry.deny(&alice, Action::Post).unwrap();
            assert_eq!(record.user, alice);
            assert_eq!(record.action, Action::Post);
            assert!(registry.is_denied(&alice, Action::Post).unwrap());

            let allowed = registry.allow(&alice, Action::Post).unwrap();
            assert_eq!(
                allowed,
                AllowedPair {
                    user: alice.clone(),
                    action: Action::Post
                }
            );
            assert!(!registry.is_denied(&alice, Action::Post).unwrap());
        }
    }

    #[test]
    fn second_deny_fails_and_keeps_one_record() {
        for registry in registries() {
            let alice = UserId::from("alice");
            registry.deny(&alice, Action::Post).unwrap();

            let err = registry.deny(&alice, Action::Post).unwrap_err();
            assert!(matches!(
                err,
                AuthzError::AlreadyDenied { action: Action::Post, ref user } if user == &alice
            ));
            assert_eq!(registry.denials_for(&alice).unwrap().len(), 1);
        }
    }

    #[test]
    fn allow_without_denial_fails() {
        for registry in registries() {
            let alice = UserId::from("alice");
            let err = registry.allow(&alice, Action::Message).unwrap_err();
            assert!(matches!(err, AuthzError::AlreadyAllowed { action: Action::Message, .. }));
        }
    }

    #[test]
    fn denials_are_scoped_per_user() {
        for registry in registries() {
            let alice = UserId::from("alice");
            let bob = UserId::from("bob");
            registry.deny(&alice, Action::Post).unwrap();
            registry.deny(&alice, Action::Record).unwrap();
            registry.deny(&bob, Action::Post).unwrap();

            let actions: Vec<Action> = registry
                .denials_for(&alice)
                .unwrap()
                .into_iter()
                .map(|d| d.action)
                .collect();
            assert_eq!(actions, vec![Action::Post, Action::Record]);
            assert!(registry
                .denials_for(&UserId::from("nobody"))
                .unwrap()
                .is_empty());
            assert!(!registry.is_denied(&bob, Action::Record).unwrap());
        }
    }
}
