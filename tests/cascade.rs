//! Cascade behavior of the toggle resolver
//!
//! Every test drives `resolver::toggle` against the workflow graph and checks
//! the resulting set, the reported cascade, and the dependency invariant.

use permflow::resolver::{self, toggle};
use permflow::{DependencyGraph, PermissionFlag, PermissionSet, ALL_FLAGS};

use PermissionFlag::*;

fn graph() -> &'static DependencyGraph {
    DependencyGraph::workflow()
}

#[test]
fn test_enable_delete_report_pulls_whole_chain() {
    let result = toggle(graph(), PermissionSet::empty(), DeleteReport, true);

    // delete_report sits at the end of the workflow: the full chain comes on
    let expected = PermissionSet::from_flags(&[
        ViewProjects,
        ViewScans,
        ViewFindings,
        ValidateFinding,
        ViewReports,
        CreateReport,
        DeleteReport,
    ]);
    assert_eq!(result.set, expected);
    assert_eq!(result.set.allowed_count(), 7);
    assert_eq!(result.cascade.len(), 6);
    assert!(!result.cascade.contains(&DeleteReport));
    assert!(graph().satisfies(result.set));
}

#[test]
fn test_disable_view_projects_clears_everything() {
    let result = toggle(graph(), PermissionSet::all(), ViewProjects, false);

    assert_eq!(result.set, PermissionSet::empty());
    assert_eq!(result.cascade.len(), 14);
    assert!(graph().satisfies(result.set));
}

#[test]
fn test_enable_create_scan_from_empty() {
    let result = toggle(graph(), PermissionSet::empty(), CreateScan, true);

    assert_eq!(
        result.set,
        PermissionSet::from_flags(&[ViewProjects, ViewScans, CreateScan])
    );
    assert_eq!(result.cascade, vec![ViewProjects, ViewScans]);
}

#[test]
fn test_disable_create_project_only_drops_project_mutations() {
    let result = toggle(graph(), PermissionSet::all(), CreateProject, false);

    // update/delete_project depend on create_project; nothing else does
    assert!(!result.set.allows(CreateProject));
    assert!(!result.set.allows(UpdateProject));
    assert!(!result.set.allows(DeleteProject));
    assert!(result.set.allows(ViewProjects));
    assert!(result.set.allows(ViewScans));
    assert!(result.set.allows(DeleteReport));
    assert_eq!(result.set.allowed_count(), 12);
    assert_eq!(result.cascade, vec![UpdateProject, DeleteProject]);
}

#[test]
fn test_toggle_is_idempotent() {
    for flag in ALL_FLAGS {
        for desired in [true, false] {
            let once = toggle(graph(), PermissionSet::empty(), flag, desired);
            let twice = toggle(graph(), once.set, flag, desired);
            assert_eq!(once.set, twice.set, "{} -> {}", flag, desired);
            assert!(twice.cascade.is_empty(), "second {} -> {} cascaded", flag, desired);
        }
    }
}

#[test]
fn test_invariant_holds_under_arbitrary_sequences() {
    // Deterministic pseudo-random walk over toggles
    let mut state = 0x9e3779b97f4a7c15u64;
    let mut set = PermissionSet::empty();
    for _ in 0..500 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let flag = ALL_FLAGS[(state >> 33) as usize % ALL_FLAGS.len()];
        let desired = state & 1 == 0;
        set = toggle(graph(), set, flag, desired).set;
        assert!(graph().satisfies(set), "violated after {} -> {}", flag, desired);
    }
}

#[test]
fn test_enable_is_noop_when_already_allowed() {
    let current = PermissionSet::from_flags(&[ViewProjects, ViewScans, CreateScan]);
    let result = toggle(graph(), current, ViewScans, true);
    assert_eq!(result.set, current);
    assert!(result.cascade.is_empty());
    assert!(result.describe().is_none());
}

#[test]
fn test_describe_names_cascade_size() {
    let enabled = toggle(graph(), PermissionSet::empty(), DeleteReport, true);
    assert_eq!(
        enabled.describe().unwrap(),
        "Enabled Delete Report and 6 prerequisite permission(s)"
    );

    let disabled = toggle(graph(), PermissionSet::all(), ViewScans, false);
    assert!(disabled
        .describe()
        .unwrap()
        .contains("dependent permission(s)"));
}

#[test]
fn test_status_reports_unmet_and_dependents() {
    let set = PermissionSet::from_flags(&[ViewProjects, ViewScans, ViewFindings, ValidateFinding]);

    // view_scans is enabled with an enabled dependent chain above it
    let status = resolver::status(graph(), set, ViewScans);
    assert!(status.unmet_prerequisites.is_empty());
    assert!(status.enabled_dependents.contains(&ViewFindings));
    assert!(status.enabled_dependents.contains(&ValidateFinding));

    // a disabled flag never reports unmet prerequisites
    let status = resolver::status(graph(), set, DeleteReport);
    assert!(!status.has_unmet_prerequisites());
    assert!(status.enabled_dependents.is_empty());

    // an inconsistent set flags the gap on the enabled flag itself
    let broken = PermissionSet::from_flags(&[DeleteReport]);
    let status = resolver::status(graph(), broken, DeleteReport);
    assert!(status.has_unmet_prerequisites());
    assert!(status.unmet_prerequisites.contains(&ViewReports));
    assert!(status.unmet_prerequisites.contains(&CreateReport));
    assert!(status.unmet_prerequisites.contains(&ViewProjects));
}

#[test]
fn test_workflow_compliance_summary() {
    use permflow::WorkflowCompliance;

    let none = WorkflowCompliance::of(PermissionSet::empty());
    assert!(!none.project_operations_enabled);
    assert!(!none.full_workflow_enabled);

    let all = WorkflowCompliance::of(PermissionSet::all());
    assert!(all.project_operations_enabled);
    assert!(all.scan_operations_enabled);
    assert!(all.finding_operations_enabled);
    assert!(all.report_operations_enabled);
    assert!(all.full_workflow_enabled);

    // The report chain alone satisfies the full-workflow readiness check
    let chain = permflow::resolver::toggle(graph(), PermissionSet::empty(), CreateReport, true).set;
    let compliance = WorkflowCompliance::of(chain);
    assert!(compliance.full_workflow_enabled);
    assert!(!compliance.project_operations_enabled);
}
