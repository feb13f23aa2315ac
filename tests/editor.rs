//! Editor lifecycle against the in-memory service

use permflow::{
    default_set, Editor, MemoryService, PermError, PermissionFlag, PermissionService,
    PermissionSet, Role,
};

use PermissionFlag::*;

/// Service whose update always fails, for save-retry behavior
struct BrokenService;

impl PermissionService for BrokenService {
    fn fetch(&self, _role: Role) -> permflow::Result<PermissionSet> {
        Ok(PermissionSet::empty())
    }

    fn update(&self, _role: Role, _set: PermissionSet) -> permflow::Result<PermissionSet> {
        Err(PermError("service unavailable".into()))
    }
}

#[test]
fn test_editor_starts_from_fetched_set() {
    let editor = Editor::new(MemoryService::new(), Role::User).unwrap();
    assert_eq!(editor.role(), Role::User);
    assert_eq!(editor.local(), default_set(Role::User));
    assert!(!editor.dirty());
}

#[test]
fn test_toggle_cascades_and_marks_dirty() {
    let mut editor = Editor::new(MemoryService::new(), Role::User).unwrap();

    // user default lacks validate_finding; enabling it pulls nothing extra
    let outcome = editor.toggle(ValidateFinding);
    assert!(outcome.value);
    assert!(outcome.cascade.is_empty());
    assert!(editor.dirty());

    // toggling it back off drops it again
    let outcome = editor.toggle(ValidateFinding);
    assert!(!outcome.value);
    assert_eq!(editor.local(), default_set(Role::User));
    assert!(!editor.dirty());
}

#[test]
fn test_role_switch_discards_unsaved_edits() {
    let mut editor = Editor::new(MemoryService::new(), Role::User).unwrap();
    editor.set(DeleteReport, true);
    assert!(editor.dirty());

    editor.select_role(Role::Manager).unwrap();
    assert_eq!(editor.role(), Role::Manager);
    assert_eq!(editor.local(), PermissionSet::all());
    assert!(!editor.dirty());

    // switching back does not resurrect the discarded edit
    editor.select_role(Role::User).unwrap();
    assert_eq!(editor.local(), default_set(Role::User));
}

#[test]
fn test_selecting_same_role_keeps_edits() {
    let mut editor = Editor::new(MemoryService::new(), Role::User).unwrap();
    editor.set(ValidateFinding, true);
    editor.select_role(Role::User).unwrap();
    assert!(editor.dirty());
    assert!(editor.local().allows(ValidateFinding));
}

#[test]
fn test_save_persists_through_service() {
    let service = MemoryService::new();
    let mut editor = Editor::new(&service, Role::User).unwrap();
    editor.set(ValidateFinding, true);
    editor.save().unwrap();
    assert!(!editor.dirty());

    // a fresh editor sees the saved set
    let editor2 = Editor::new(&service, Role::User).unwrap();
    assert!(editor2.local().allows(ValidateFinding));
}

#[test]
fn test_failed_save_keeps_local_edits() {
    let mut editor = Editor::new(BrokenService, Role::User).unwrap();
    editor.set(ViewProjects, true);
    assert!(editor.dirty());
    assert!(editor.save().is_err());
    assert!(editor.dirty());
    assert!(editor.local().allows(ViewProjects));
}

#[test]
fn test_refresh_discards_edits() {
    let service = MemoryService::new();
    let mut editor = Editor::new(&service, Role::Manager).unwrap();
    editor.toggle(ViewProjects); // all -> empty
    assert_eq!(editor.local(), PermissionSet::empty());

    editor.refresh().unwrap();
    assert_eq!(editor.local(), PermissionSet::all());
    assert!(!editor.dirty());
}

#[test]
fn test_memory_service_rejects_inconsistent_set() {
    let service = MemoryService::new();
    let broken = PermissionSet::from_flags(&[CreateScan]);
    assert!(service.update(Role::User, broken).is_err());
    // the stored set is untouched
    assert_eq!(service.fetch(Role::User).unwrap(), default_set(Role::User));
}
