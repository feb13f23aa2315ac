//! Permflow - workflow-aware permission management
//!
//! Fifteen boolean permission flags form a dependency graph that mirrors the
//! project/scan/finding/report workflow. Toggling a flag cascades through the
//! graph so a role's permission set never enables a flag whose prerequisites
//! are disabled. Sets are persisted per role in LMDB, with token sessions and
//! account administration on top, and an optional REST server behind the
//! `server` feature.

pub mod account;
pub mod editor;
pub mod error;
pub mod flags;
pub mod graph;
pub mod resolver;
pub mod service;
pub mod session;
pub mod set;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

pub use account::{Account, AccountPage, AccountRole, AccountUpdate, NewAccount};
pub use editor::Editor;
pub use error::{PermError, Result};
pub use flags::{Category, PermissionFlag, Role, ALL_FLAGS, ALL_ROLES, FLAG_COUNT};
pub use graph::DependencyGraph;
pub use resolver::{toggle, FlagStatus, Toggle, WorkflowCompliance};
pub use service::{default_set, MemoryService, PermissionService, RolePermissions};
pub use session::{BootstrapResult, SessionInfo};
pub use set::PermissionSet;
pub use store::Store;
