//! Toggle cascade resolution
//!
//! Pure functions over a graph and a set: no storage, no errors. Enabling a
//! flag enables its whole prerequisite closure; disabling a flag disables its
//! whole dependent closure. Either way the result satisfies the invariant
//! "a flag is true only if all of its prerequisites are true".

use serde::Serialize;

use crate::flags::PermissionFlag;
use crate::graph::DependencyGraph;
use crate::set::PermissionSet;

/// Outcome of one toggle: the new set plus the flags dragged along by it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    /// The set after the cascade
    pub set: PermissionSet,
    /// The flag that was toggled
    pub flag: PermissionFlag,
    /// The value the flag was set to
    pub value: bool,
    /// Other flags whose value actually changed, workflow order
    pub cascade: Vec<PermissionFlag>,
}

impl Toggle {
    /// Transient message naming the cascade size, in the admin console's
    /// wording. `None` when no other flag changed.
    pub fn describe(&self) -> Option<String> {
        if self.cascade.is_empty() {
            return None;
        }
        let kind = if self.value { "prerequisite" } else { "dependent" };
        Some(format!(
            "{} {} and {} {} permission(s)",
            if self.value { "Enabled" } else { "Disabled" },
            self.flag.title(),
            self.cascade.len(),
            kind
        ))
    }
}

/// Apply a single-flag toggle, cascading to keep the set consistent.
///
/// Total over its domain and idempotent: re-applying the same toggle yields
/// the same set with an empty cascade.
pub fn toggle(
    graph: &DependencyGraph,
    current: PermissionSet,
    target: PermissionFlag,
    desired: bool,
) -> Toggle {
    let next = if desired {
        PermissionSet::from_mask(current.mask() | graph.prerequisite_mask(target) | target.bit())
    } else {
        PermissionSet::from_mask(current.mask() & !(graph.dependent_mask(target) | target.bit()))
    };

    let changed = current.mask() ^ next.mask();
    let cascade = PermissionSet::from_mask(changed & !target.bit()).allowed();

    debug_assert!(graph.satisfies(next) || !graph.satisfies(current));

    Toggle { set: next, flag: target, value: desired, cascade }
}

/// Advisory status of one flag relative to the current set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagStatus {
    /// Prerequisites that are denied while the flag itself is allowed
    pub unmet_prerequisites: Vec<PermissionFlag>,
    /// Dependents that are currently allowed
    pub enabled_dependents: Vec<PermissionFlag>,
}

impl FlagStatus {
    /// The flag is allowed but a prerequisite is not (advisory styling only)
    pub fn has_unmet_prerequisites(&self) -> bool {
        !self.unmet_prerequisites.is_empty()
    }

    /// Disabling the flag would drag other flags down with it
    pub fn has_enabled_dependents(&self) -> bool {
        !self.enabled_dependents.is_empty()
    }
}

/// Inspect a flag's relationship to the rest of the set.
///
/// Purely informational; never blocks a toggle.
pub fn status(graph: &DependencyGraph, set: PermissionSet, flag: PermissionFlag) -> FlagStatus {
    let unmet = if set.allows(flag) {
        graph.prerequisite_mask(flag) & !set.mask()
    } else {
        0
    };
    let enabled = graph.dependent_mask(flag) & set.mask();
    FlagStatus {
        unmet_prerequisites: PermissionSet::from_mask(unmet).allowed(),
        enabled_dependents: PermissionSet::from_mask(enabled).allowed(),
    }
}

/// Per-category workflow readiness, as surfaced by the admin summary panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkflowCompliance {
    pub project_operations_enabled: bool,
    pub scan_operations_enabled: bool,
    pub finding_operations_enabled: bool,
    pub report_operations_enabled: bool,
    pub full_workflow_enabled: bool,
}

impl WorkflowCompliance {
    pub fn of(set: PermissionSet) -> Self {
        use PermissionFlag::*;
        WorkflowCompliance {
            project_operations_enabled: set.allows_all(&[ViewProjects, CreateProject]),
            scan_operations_enabled: set.allows_all(&[ViewScans, CreateScan]),
            finding_operations_enabled: set.allows_all(&[ViewFindings, ValidateFinding]),
            report_operations_enabled: set.allows_all(&[ViewReports, CreateReport]),
            full_workflow_enabled: set.allows_all(&[
                ViewProjects,
                ViewScans,
                ViewFindings,
                ValidateFinding,
                ViewReports,
                CreateReport,
            ]),
        }
    }
}
