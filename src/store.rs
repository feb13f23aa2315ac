//! LMDB-backed store for role permissions, accounts, and sessions
//!
//! One `Store` per process, opened explicitly and passed by reference; no
//! global environment. Role masks live in their own sub-database keyed by
//! role name; accounts are JSON documents keyed by a numeric id with a
//! unique-email index; sessions are keyed by token hash.

use std::path::Path;

use heed::types::{Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use crate::error::{err, Result};
use crate::flags::{Role, ALL_ROLES};
use crate::graph::DependencyGraph;
use crate::service::{default_set, PermissionService};
use crate::set::PermissionSet;

type DbMask = Database<Str, U64<byteorder::BigEndian>>;
type DbStr = Database<Str, Str>;

/// Store handle owning the LMDB environment and sub-databases
pub struct Store {
    env: Env,
    /// role name -> permission mask
    pub(crate) perms: DbMask,
    /// account id -> JSON account record
    pub(crate) accounts: DbStr,
    /// email -> account id (unique-email index)
    pub(crate) emails: DbStr,
    /// token hash -> "account_id|created_at|expires_at"
    pub(crate) sessions: DbStr,
    /// bookkeeping: seed marker, boot marker, next account id
    pub(crate) meta: DbStr,
}

impl Store {
    /// Open (or create) a store at the given directory, seeding default role
    /// permission sets on first open
    pub fn open(path: &str) -> Result<Store> {
        std::fs::create_dir_all(path).map_err(err)?;
        // SAFETY: LMDB requires that no other process opens this path
        // concurrently during open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 30)
                .max_dbs(5)
                .open(Path::new(path))
                .map_err(err)?
        };

        let mut tx = env.write_txn().map_err(err)?;
        let store = Store {
            perms: env.create_database(&mut tx, Some("perms")).map_err(err)?,
            accounts: env.create_database(&mut tx, Some("accounts")).map_err(err)?,
            emails: env.create_database(&mut tx, Some("emails")).map_err(err)?,
            sessions: env.create_database(&mut tx, Some("sessions")).map_err(err)?,
            meta: env.create_database(&mut tx, Some("meta")).map_err(err)?,
            env: env.clone(),
        };
        store.seed(&mut tx)?;
        tx.commit().map_err(err)?;
        Ok(store)
    }

    /// Execute a read-only operation
    #[inline]
    pub(crate) fn read<T, F: FnOnce(&RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        f(&self.env.read_txn().map_err(err)?)
    }

    /// Execute a write operation in a single committed transaction
    #[inline]
    pub(crate) fn write<T, F: FnOnce(&mut RwTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = self.env.write_txn().map_err(err)?;
        let r = f(&mut tx)?;
        tx.commit().map_err(err)?;
        Ok(r)
    }

    fn seed(&self, tx: &mut RwTxn) -> Result<()> {
        if self.meta.get(tx, "seeded").map_err(err)?.is_some() {
            return Ok(());
        }
        for role in ALL_ROLES {
            self.perms.put(tx, role.as_str(), &default_set(role).mask()).map_err(err)?;
        }
        self.meta.put(tx, "seeded", "1").map_err(err)
    }

    /// Stored permission set for a role
    pub fn fetch_permissions(&self, role: Role) -> Result<PermissionSet> {
        self.read(|tx| {
            Ok(self
                .perms
                .get(tx, role.as_str())
                .map_err(err)?
                .map(PermissionSet::from_mask)
                .unwrap_or_else(|| default_set(role)))
        })
    }

    /// Persist a permission set for a role.
    ///
    /// Rejects sets that violate the prerequisite invariant: a well-behaved
    /// client only produces cascade-resolved sets, so a violation is a
    /// caller bug, not something to repair silently.
    pub fn update_permissions(&self, role: Role, set: PermissionSet) -> Result<PermissionSet> {
        DependencyGraph::workflow().check(set)?;
        self.write(|tx| self.perms.put(tx, role.as_str(), &set.mask()).map_err(err))?;
        Ok(set)
    }

    /// Clear every sub-database and re-seed role defaults (for testing)
    pub fn clear_all(&self) -> Result<()> {
        self.write(|tx| {
            self.perms.clear(tx).map_err(err)?;
            self.accounts.clear(tx).map_err(err)?;
            self.emails.clear(tx).map_err(err)?;
            self.sessions.clear(tx).map_err(err)?;
            self.meta.clear(tx).map_err(err)?;
            self.seed(tx)
        })
    }

    /// Allocate the next account id
    pub(crate) fn next_id(&self, tx: &mut RwTxn) -> Result<u64> {
        let id = self
            .meta
            .get(tx, "next_id")
            .map_err(err)?
            .and_then(|s| s.parse().ok())
            .unwrap_or(1u64);
        self.meta.put(tx, "next_id", &(id + 1).to_string()).map_err(err)?;
        Ok(id)
    }
}

impl PermissionService for Store {
    fn fetch(&self, role: Role) -> Result<PermissionSet> {
        self.fetch_permissions(role)
    }

    fn update(&self, role: Role, set: PermissionSet) -> Result<PermissionSet> {
        self.update_permissions(role, set)
    }
}

/// Milliseconds since the Unix epoch
pub(crate) fn current_epoch() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
