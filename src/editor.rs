//! Role editor: the access-control screen's local state machine
//!
//! One role is selected at a time. Its set is fetched on selection, mutated
//! locally through cascading toggles, and persisted only on an explicit save.
//! Switching role (or refreshing) discards unsaved edits, which is also what
//! makes a stale in-flight fetch for a previously selected role harmless:
//! state is always reloaded for the role being switched to.

use crate::error::Result;
use crate::flags::{PermissionFlag, Role};
use crate::graph::DependencyGraph;
use crate::resolver::{self, Toggle};
use crate::service::PermissionService;
use crate::set::PermissionSet;

/// Local editing state for one role's permission set
pub struct Editor<S: PermissionService> {
    service: S,
    graph: &'static DependencyGraph,
    role: Role,
    /// Last state fetched from (or acknowledged by) the service
    server: PermissionSet,
    /// Local edits, not yet saved
    local: PermissionSet,
}

impl<S: PermissionService> Editor<S> {
    /// Open an editor on a role, fetching its current set
    pub fn new(service: S, role: Role) -> Result<Self> {
        let server = service.fetch(role)?;
        Ok(Editor { service, graph: DependencyGraph::workflow(), role, server, local: server })
    }

    /// The selected role
    pub fn role(&self) -> Role {
        self.role
    }

    /// The set as currently edited
    pub fn local(&self) -> PermissionSet {
        self.local
    }

    /// Whether local edits diverge from the last fetched state
    pub fn dirty(&self) -> bool {
        self.local != self.server
    }

    /// Switch to another role, discarding unsaved edits.
    ///
    /// Selecting the already-selected role keeps local edits (the console
    /// re-queries only on actual role change).
    pub fn select_role(&mut self, role: Role) -> Result<()> {
        if role == self.role {
            return Ok(());
        }
        let server = self.service.fetch(role)?;
        self.role = role;
        self.server = server;
        self.local = server;
        Ok(())
    }

    /// Toggle one flag, cascading through the dependency graph. Local only;
    /// nothing is persisted until `save`.
    pub fn toggle(&mut self, flag: PermissionFlag) -> Toggle {
        let desired = !self.local.allows(flag);
        let outcome = resolver::toggle(self.graph, self.local, flag, desired);
        self.local = outcome.set;
        outcome
    }

    /// Set one flag to an explicit value, cascading as needed
    pub fn set(&mut self, flag: PermissionFlag, value: bool) -> Toggle {
        let outcome = resolver::toggle(self.graph, self.local, flag, value);
        self.local = outcome.set;
        outcome
    }

    /// Persist local edits. On failure the edits stay in place for retry.
    pub fn save(&mut self) -> Result<()> {
        let stored = self.service.update(self.role, self.local)?;
        self.server = stored;
        self.local = stored;
        Ok(())
    }

    /// Re-fetch the role's set, discarding unsaved edits
    pub fn refresh(&mut self) -> Result<()> {
        let server = self.service.fetch(self.role)?;
        self.server = server;
        self.local = server;
        Ok(())
    }
}
