// store/memory.rs - In-process backend.
//
// Two vectors, each behind its own mutex, so denial traffic never waits on
// control traffic. The uniqueness check and the push happen under the same
// lock, which is what makes `insert_*` an insert-if-absent.

use std::sync::{Mutex, MutexGuard};

use crate::action::Action;
use crate::error::StoreError;
use crate::graph::ControlEdge;
use crate::identity::UserId;
use crate::registry::DenialRecord;
use crate::store::{ControlStore, DenialStore, Insertion};

/// Volatile store for tests and embedded use. Contents vanish on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    denials: Mutex<Vec<DenialRecord>>,
    edges: Mutex<Vec<ControlEdge>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn denials(&self) -> Result<MutexGuard<'_, Vec<DenialRecord>>, StoreError> {
        self.denials.lock().map_err(|_| StoreError::Poisoned {
            relation: "denials",
        })
    }

    fn edges(&self) -> Result<MutexGuard<'_, Vec<ControlEdge>>, StoreError> {
        self.edges.lock().map_err(|_| StoreError::Poisoned {
            relation: "control edges",
        })
    }
}

impl DenialStore for MemoryStore {
    fn insert_denial(&self, record: &DenialRecord) -> Result<Insertion, StoreError> {
        let mut denials = self.denials()?;
        if denials.iter().any(|d| d.matches(&record.user, record.action)) {
            return Ok(Insertion::Conflict);
        }
        denials.push(record.clone());
        Ok(Insertion::Inserted)
    }

    fn remove_denials(&self, user: &UserId, action: Action) -> Result<usize, StoreError> {
        let mut denials = self.denials()?;
        let before = denials.len();
        denials.retain(|d| !d.matches(user, action));
        Ok(before - denials.len())
    }

    fn find_denial(
        &self,
        user: &UserId,
        action: Action,
    ) -> Result<Option<DenialRecord>, StoreError> {
        let denials = self.denials()?;
        Ok(denials.iter().find(|d| d.matches(user, action)).cloned())
    }

    fn denials_for(&self, user: &UserId) -> Result<Vec<DenialRecord>, StoreError> {
        let denials = self.denials()?;
        Ok(denials.iter().filter(|d| &d.user == user).cloned().collect())
    }
}

impl ControlStore for MemoryStore {
    fn insert_edge(&self, edge: &ControlEdge) -> Result<Insertion, StoreError> {
        let mut edges = self.edges()?;
        if edges.iter().any(|e| e.connects(&edge.authorizer, &edge.authorizee)) {
            return Ok(Insertion::Conflict);
        }
        edges.push(edge.clone());
        Ok(Insertion::Inserted)
    }

    fn remove_edge(&self, authorizer: &UserId, authorizee: &UserId) -> Result<usize, StoreError> {
        let mut edges = self.edges()?;
        let before = edges.len();
        edges.retain(|e| !e.connects(authorizer, authorizee));
        Ok(before - edges.len())
    }

    fn find_edge(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<Option<ControlEdge>, StoreError> {
        let edges = self.edges()?;
        Ok(edges
            .iter()
            .find(|e| e.connects(authorizer, authorizee))
            .cloned())
    }

    fn edges_from(&self, authorizer: &UserId) -> Result<Vec<ControlEdge>, StoreError> {
        let edges = self.edges()?;
        Ok(edges
            .iter()
            .filter(|e| &e.authorizer == authorizer)
            .cloned()
            .collect())
    }

    fn edges_to(&self, authorizee: &UserId) -> Result<Vec<ControlEdge>, StoreError> {
        let edges = self.edges()?;
        Ok(edges
            .iter()
            .filter(|e| &e.authorizee == authorizee)
            .cloned()
            .collect())
    }
}
