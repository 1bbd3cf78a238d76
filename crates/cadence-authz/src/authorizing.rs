// authorizing.rs - Facade over the registry, the graph, and the guard.
//
// Besides handing out the three components, the facade carries the
// delegated-management compositions the routing layer uses: an account may
// only change another account's denials while it holds control over it, and
// control is granted by the account being managed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::{AuthzConfig, StoreBackend};
use crate::error::AuthzError;
use crate::graph::{ControlEdge, ControlGraph};
use crate::guard::Guard;
use crate::identity::UserId;
use crate::registry::{AllowedPair, DenialRecord, DenialRegistry};
use crate::store::{ControlStore, DenialStore, MemoryStore, SqliteStore};

/// Both directions of a user's control relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSummary {
    /// Accounts that may manage this user.
    pub authorizers: Vec<UserId>,
    /// Accounts this user may manage.
    pub authorizees: Vec<UserId>,
}

/// The access-control core.
///
/// Cheap to clone; clones share the same stores.
#[derive(Clone)]
pub struct Authorizing {
    registry: DenialRegistry,
    graph: ControlGraph,
    guard: Guard,
}

impl Authorizing {
    /// Build from one store serving both relations.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: DenialStore + ControlStore + 'static,
    {
        Self::from_parts(
            DenialRegistry::new(store.clone()),
            ControlGraph::new(store),
        )
    }

    pub fn from_parts(registry: DenialRegistry, graph: ControlGraph) -> Self {
        let guard = Guard::new(registry.clone(), graph.clone());
        Self {
            registry,
            graph,
            guard,
        }
    }

    /// Volatile instance backed by [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Build the backend named by `config`.
    pub fn open(config: &AuthzConfig) -> Result<Self, AuthzError> {
        match config.backend {
            StoreBackend::Memory => Ok(Self::in_memory()),
            StoreBackend::Sqlite => {
                let store = SqliteStore::open(&config.database_path)?;
                Ok(Self::with_store(Arc::new(store)))
            }
        }
    }

    pub fn registry(&self) -> &DenialRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &ControlGraph {
        &self.graph
    }

    pub fn guard(&self) -> &Guard {
        &self.guard
    }

    /// Deny `action` on `authorizee`'s account, acting as `authorizer`.
    pub fn deny_on_behalf(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
        action: Action,
    ) -> Result<DenialRecord, AuthzError> {
        self.guard.assert_is_authorizer(authorizer, authorizee)?;
        self.registry.deny(authorizee, action)
    }

    /// Allow `action` on `authorizee`'s account, acting as `authorizer`.
    pub fn allow_on_behalf(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
        action: Action,
    ) -> Result<AllowedPair, AuthzError> {
        self.guard.assert_is_authorizer(authorizer, authorizee)?;
        self.registry.allow(authorizee, action)
    }

    /// `owner` lets `authorizer` manage the owner's account.
    pub fn give_control(
        &self,
        owner: &UserId,
        authorizer: &UserId,
    ) -> Result<ControlEdge, AuthzError> {
        self.graph.grant(authorizer, owner)
    }

    /// `authorizer` gives up its own control over `authorizee`.
    ///
    /// Missing control surfaces as `InsufficientControl`, not `EdgeNotFound`.
    pub fn relinquish_control(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<(), AuthzError> {
        self.guard.assert_is_authorizer(authorizer, authorizee)?;
        self.graph.revoke(authorizer, authorizee)
    }

    /// `owner` takes back the control `authorizer` holds over the owner's
    /// account.
    pub fn withdraw_control(&self, owner: &UserId, authorizer: &UserId) -> Result<(), AuthzError> {
        self.graph.revoke(authorizer, owner)
    }

    pub fn control_summary(&self, user: &UserId) -> Result<ControlSummary, AuthzError> {
        let authorizers = self
            .graph
            .authorizers_of(user)?
            .into_iter()
            .map(|edge| edge.authorizer)
            .collect();
        let authorizees = self
            .graph
            .authorizees_of(user)?
            .into_iter()
            .map(|edge| edge.authorizee)
            .collect();
        Ok(ControlSummary {
            authorizers,
            authorizees,
        })
    }
}
