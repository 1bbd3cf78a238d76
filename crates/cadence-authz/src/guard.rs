// guard.rs - Assertion layer consulted before every gated side effect.
//
// Guards are read-only and idempotent. They give no isolation against a
// concurrent deny or revoke: a caller that asserts and then acts can see
// permission withdrawn in between. Gating here is best-effort, not a
// boundary against a malicious concurrent actor.

use crate::action::Action;
use crate::error::AuthzError;
use crate::gate::Operation;
use crate::graph::ControlGraph;
use crate::identity::UserId;
use crate::registry::DenialRegistry;

/// "Fail if X" checks over the denial registry and the control graph.
#[derive(Clone)]
pub struct Guard {
    registry: DenialRegistry,
    graph: ControlGraph,
}

impl Guard {
    pub fn new(registry: DenialRegistry, graph: ControlGraph) -> Self {
        Self { registry, graph }
    }

    /// Fails with [`AuthzError::ActionForbidden`] if `user` is denied `action`.
    pub fn assert_action_allowed(&self, user: &UserId, action: Action) -> Result<(), AuthzError> {
        let denied = self.registry.is_denied(user, action)?;
        tracing::debug!(user = %user, action = %action, denied, "action check");
        if denied {
            return Err(AuthzError::ActionForbidden {
                user: user.clone(),
                action,
            });
        }
        Ok(())
    }

    /// Fails with [`AuthzError::InsufficientControl`] unless `authorizer`
    /// holds a direct control edge over `authorizee`.
    pub fn assert_is_authorizer(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<(), AuthzError> {
        let holds = self.graph.is_authorizer_of(authorizer, authorizee)?;
        tracing::debug!(authorizer = %authorizer, authorizee = %authorizee, holds, "control check");
        if !holds {
            return Err(AuthzError::InsufficientControl {
                authorizer: authorizer.clone(),
                authorizee: authorizee.clone(),
            });
        }
        Ok(())
    }

    /// Check every requirement of `operation` in order, stopping at the
    /// first denied one.
    pub fn assert_operation(&self, operation: &Operation) -> Result<(), AuthzError> {
        for (user, action) in operation.requirements() {
            self.assert_action_allowed(user, action)?;
        }
        Ok(())
    }
}
