//! Persistence tests for the LMDB-backed store

use permflow::{default_set, PermissionFlag, PermissionService, PermissionSet, Role, Store};
use tempfile::TempDir;

use PermissionFlag::*;

fn open_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().to_str().unwrap()).unwrap();
    (dir, store)
}

#[test]
fn test_open_seeds_role_defaults() {
    let (_dir, store) = open_store();
    assert_eq!(store.fetch_permissions(Role::User).unwrap(), default_set(Role::User));
    assert_eq!(store.fetch_permissions(Role::Manager).unwrap(), PermissionSet::all());
}

#[test]
fn test_update_round_trips() {
    let (_dir, store) = open_store();
    let set = default_set(Role::User).with(ValidateFinding, true);
    store.update_permissions(Role::User, set).unwrap();
    assert_eq!(store.fetch_permissions(Role::User).unwrap(), set);
}

#[test]
fn test_update_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_str().unwrap();
    let set = PermissionSet::from_flags(&[ViewProjects, ViewScans, CreateScan]);
    {
        let store = Store::open(path).unwrap();
        store.update_permissions(Role::User, set).unwrap();
    }
    let store = Store::open(path).unwrap();
    // reopening must not reseed over the stored set
    assert_eq!(store.fetch_permissions(Role::User).unwrap(), set);
}

#[test]
fn test_update_rejects_inconsistent_set() {
    let (_dir, store) = open_store();
    let broken = PermissionSet::from_flags(&[DeleteReport, ViewProjects]);
    assert!(store.update_permissions(Role::User, broken).is_err());
    assert_eq!(store.fetch_permissions(Role::User).unwrap(), default_set(Role::User));
}

#[test]
fn test_clear_all_reseeds_defaults() {
    let (_dir, store) = open_store();
    store.update_permissions(Role::Manager, PermissionSet::empty()).unwrap();
    store.clear_all().unwrap();
    assert_eq!(store.fetch_permissions(Role::Manager).unwrap(), PermissionSet::all());
}

#[test]
fn test_store_implements_permission_service() {
    let (_dir, store) = open_store();
    let set = default_set(Role::User).with(ValidateFinding, true);
    let stored = store.update(Role::User, set).unwrap();
    assert_eq!(stored, set);
    assert_eq!(store.fetch(Role::User).unwrap(), set);
}

#[test]
fn test_editor_over_store() {
    let (_dir, store) = open_store();
    let mut editor = permflow::Editor::new(&store, Role::User).unwrap();
    editor.set(DeleteReport, true);
    editor.save().unwrap();

    // user default plus the full report chain
    let expected = PermissionSet::from_mask(
        default_set(Role::User).mask()
            | PermissionSet::from_flags(&[
                ValidateFinding,
                ViewReports,
                CreateReport,
                DeleteReport,
            ])
            .mask(),
    );
    assert_eq!(store.fetch_permissions(Role::User).unwrap(), expected);
}
