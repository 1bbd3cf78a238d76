// store/mod.rs - Storage traits for the two relations.
//
// Each relation gets its own trait so backends can lock them independently.
// Uniqueness of the logical key is the store's job: `insert_*` is an atomic
// insert-if-absent and reports a conflict instead of writing a duplicate,
// and `remove_*` is an atomic delete that reports how many rows it removed.
// The registry and graph never do a separate existence read before writing.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::action::Action;
use crate::error::StoreError;
use crate::graph::ControlEdge;
use crate::identity::UserId;
use crate::registry::DenialRecord;

/// Outcome of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The row was written.
    Inserted,
    /// A row with the same logical key already exists; nothing was written.
    Conflict,
}

/// Persistence for the denial registry, keyed by `(user, action)`.
pub trait DenialStore: Send + Sync {
    /// Insert the record unless one already exists for its `(user, action)`.
    fn insert_denial(&self, record: &DenialRecord) -> Result<Insertion, StoreError>;

    /// Remove every record for `(user, action)`. Returns the number removed.
    fn remove_denials(&self, user: &UserId, action: Action) -> Result<usize, StoreError>;

    /// Look up the record for `(user, action)`.
    fn find_denial(&self, user: &UserId, action: Action)
        -> Result<Option<DenialRecord>, StoreError>;

    /// All records for a user, in insertion order.
    fn denials_for(&self, user: &UserId) -> Result<Vec<DenialRecord>, StoreError>;
}

/// Persistence for the control graph, keyed by `(authorizer, authorizee)`.
pub trait ControlStore: Send + Sync {
    /// Insert the edge unless one already exists for its ordered pair.
    fn insert_edge(&self, edge: &ControlEdge) -> Result<Insertion, StoreError>;

    /// Remove the edge for the ordered pair. Returns the number removed.
    fn remove_edge(&self, authorizer: &UserId, authorizee: &UserId) -> Result<usize, StoreError>;

    /// Look up the edge for the ordered pair.
    fn find_edge(
        &self,
        authorizer: &UserId,
        authorizee: &UserId,
    ) -> Result<Option<ControlEdge>, StoreError>;

    /// Edges leaving `authorizer`, in insertion order.
    fn edges_from(&self, authorizer: &UserId) -> Result<Vec<ControlEdge>, StoreError>;

    /// Edges arriving at `authorizee`, in insertion order.
    fn edges_to(&self, authorizee: &UserId) -> Result<Vec<ControlEdge>, StoreError>;
}
