//! Role permission read/write services
//!
//! The seam between the resolver and whatever holds role permissions: the
//! LMDB store in this crate, or a remote endpoint in an embedding console.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{PermError, Result};
use crate::flags::{PermissionFlag, Role, ALL_ROLES};
use crate::graph::DependencyGraph;
use crate::set::PermissionSet;

/// A role together with its permission set (the wire shape of the
/// permissions API)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    pub role: Role,
    pub permissions: PermissionSet,
}

/// Read/write access to per-role permission sets
pub trait PermissionService {
    /// Fetch the stored set for a role
    fn fetch(&self, role: Role) -> Result<PermissionSet>;

    /// Persist a set for a role, returning the stored set
    fn update(&self, role: Role, set: PermissionSet) -> Result<PermissionSet>;
}

impl<S: PermissionService + ?Sized> PermissionService for &S {
    fn fetch(&self, role: Role) -> Result<PermissionSet> {
        (**self).fetch(role)
    }

    fn update(&self, role: Role, set: PermissionSet) -> Result<PermissionSet> {
        (**self).update(role, set)
    }
}

/// Default set seeded for a role before any administrator edits it
pub fn default_set(role: Role) -> PermissionSet {
    use PermissionFlag::*;
    match role {
        Role::User => PermissionSet::from_flags(&[ViewProjects, ViewScans, ViewFindings]),
        Role::Manager => PermissionSet::all(),
    }
}

/// In-memory service for tests and embedding without a store
pub struct MemoryService {
    graph: &'static DependencyGraph,
    sets: Mutex<HashMap<Role, PermissionSet>>,
}

impl MemoryService {
    pub fn new() -> Self {
        let mut sets = HashMap::new();
        for role in ALL_ROLES {
            sets.insert(role, default_set(role));
        }
        MemoryService { graph: DependencyGraph::workflow(), sets: Mutex::new(sets) }
    }
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionService for MemoryService {
    fn fetch(&self, role: Role) -> Result<PermissionSet> {
        let sets = self.sets.lock().map_err(|_| PermError("sets lock poisoned".into()))?;
        Ok(sets.get(&role).copied().unwrap_or_else(PermissionSet::empty))
    }

    fn update(&self, role: Role, set: PermissionSet) -> Result<PermissionSet> {
        self.graph.check(set)?;
        let mut sets =
            self.sets.lock().map_err(|_| PermError("sets lock poisoned".into()))?;
        sets.insert(role, set);
        Ok(set)
    }
}
