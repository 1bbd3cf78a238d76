// graph.rs - The delegated-control graph.
//
// A directed edge authorizer → authorizee means the authorizer may manage
// the authorizee's denials. Edges are direct only: holding control over an
// account that itself controls a third account grants nothing over the
// third. Self-edges and cycles are accepted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthzError;
use crate::identity::UserId;
use crate::store::{ControlStore, Insertion};

/// One delegated-control relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEdge {
    /// Unique ID for this edge.
    pub id: Uuid,
    /// The account granted management rights.
    pub authorizer: UserId,
    /// The account being managed.
    pub authorizee: UserId,
    /// When control was granted.
    pub granted_at: DateTime<Utc>,
}

impl ControlEdge {
    pub fn new(authorizer: UserId, authorizee: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            authorizer,
            authorizee,
            granted_at: Utc::now(),
        }
    }

    /// Whether this edge is for the given ordered pair.
    pub fn connects(&self, authorizer: &UserId, authorizee: &UserId) -> bool {
        &self.authorizer == authorizer && &self.authorizee == authorizee
    }
}

/// Who may manage whose denials.
#[derive(Clone)]
pub struct ControlGraph {
    store: Arc<dyn ControlStore>,
}

impl ControlGraph {
    pub fn new(store: Arc<dyn ControlStore>) -> Self {
        Self { store }
    }

    /// Let `authorizer` manage `authorizee`.
    ///
    /// Fails with [`AuthzError::EdgeAlreadyExists`] if the edge is present.
    pub fn grant(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<ControlEdge, AuthzError> {
        let edge = ControlEdge::new(authorizer.clone(), authorizee.clone());
        match self.store.insert_edge(&edge)? {
            Insertion::Inserted => {
                tracing::info!(authorizer = %authorizer, authorizee = %authorizee, "control granted");
                Ok(edge)
            }
            Insertion::Conflict => Err(AuthzError::EdgeAlreadyExists {
                authorizer: authorizer.clone(),
                authorizee: authorizee.clone(),
            }),
        }
    }

    /// Remove the edge.
    ///
    /// Fails with [`AuthzError::EdgeNotFound`] if there is none.
    pub fn revoke(&self, authorizer: &UserId, authorizee: &UserId) -> Result<(), AuthzError> {
        if self.store.remove_edge(authorizer, authorizee)? == 0 {
            return Err(AuthzError::EdgeNotFound {
                authorizer: authorizer.clone(),
                authorizee: authorizee.clone(),
            });
        }
        tracing::info!(authorizer = %authorizer, authorizee = %authorizee, "control revoked");
        Ok(())
    }

    /// Accounts `authorizer` may manage.
    pub fn authorizees_of(&self, authorizer: &UserId) -> Result<Vec<ControlEdge>, AuthzError> {
        Ok(self.store.edges_from(authorizer)?)
    }

    /// Accounts that may manage `authorizee`.
    pub fn authorizers_of(&self, authorizee: &UserId) -> Result<Vec<ControlEdge>, AuthzError> {
        Ok(self.store.edges_to(authorizee)?)
    }

    pub fn is_authorizer_of(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<bool, AuthzError> {
        Ok(self.store.find_edge(authorizer, authorizee)?.is_some())
    }
}
