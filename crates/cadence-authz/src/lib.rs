//! # cadence-authz
//!
//! Access-control core for the Cadence activity app.
//!
//! Posting, messaging, nudging and activity recording are all gated by two
//! small relations owned by this crate:
//!
//! - [`DenialRegistry`]: which `(user, action)` pairs are currently forbidden.
//!   No record means allowed.
//! - [`ControlGraph`]: directed authorizer → authorizee edges. An authorizer
//!   may manage the authorizee's denials.
//!
//! Other subsystems only talk to the [`Guard`], which offers "fail if X"
//! assertions so several checks can be composed before a side effect.
//! [`Authorizing`] bundles the three together with the delegated-management
//! compositions the routing layer needs.
//!
//! ## Key invariants
//!
//! - **At most one record per key**: enforced by the store as an
//!   insert-if-absent, never by read-then-write ordering.
//! - **Direct edges only**: control is not transitive. Self-edges are allowed.
//! - **Best-effort gating**: a guard check followed by a domain operation is
//!   not isolated from a concurrent deny or revoke.
//!
//! ## Quick Example
//!
//! ```rust
//! use cadence_authz::{Action, Authorizing, AuthzError, UserId};
//!
//! let authz = Authorizing::in_memory();
//! let alice = UserId::from("alice");
//! let bob = UserId::from("bob");
//!
//! authz.give_control(&alice, &bob).unwrap();
//! authz.deny_on_behalf(&bob, &alice, Action::Post).unwrap();
//!
//! let err = authz.guard().assert_action_allowed(&alice, Action::Post).unwrap_err();
//! assert!(matches!(err, AuthzError::ActionForbidden { .. }));
//! ```

pub mod action;
pub mod authorizing;
pub mod config;
pub mod error;
pub mod gate;
pub mod graph;
pub mod guard;
pub mod identity;
pub mod presentation;
pub mod registry;
pub mod store;

pub use action::Action;
pub use authorizing::{Authorizing, ControlSummary};
pub use config::{AuthzConfig, StoreBackend};
pub use error::{AuthzError, ErrorFamily, ErrorKind, StoreError};
pub use gate::{Operation, Tracked};
pub use graph::{ControlEdge, ControlGraph};
pub use guard::Guard;
pub use identity::UserId;
pub use presentation::{describe, Confirmation, IdentityResolver, Verbatim};
pub use registry::{AllowedPair, DenialRecord, DenialRegistry};
pub use store::{ControlStore, DenialStore, Insertion, MemoryStore, SqliteStore};
