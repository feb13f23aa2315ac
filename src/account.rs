//! Account records and administration
//!
//! Mutating operations take the acting account first and require an
//! administering role (`admin` or `manager`). Deletion is soft: records are
//! flagged and filtered out, never removed.

use heed::RwTxn;
use serde::{Deserialize, Serialize};

use crate::error::{err, PermError, Result};
use crate::flags::Role;
use crate::session::{generate_salt, hash_password};
use crate::store::{current_epoch, Store};

/// Role attached to an account (who they are, not what a role's permission
/// set contains). `admin` administers permissions but does not own an
/// editable permission set of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    Manager,
    User,
}

impl AccountRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            AccountRole::Admin => "admin",
            AccountRole::Manager => "manager",
            AccountRole::User => "user",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(AccountRole::Admin),
            "manager" => Some(AccountRole::Manager),
            "user" => Some(AccountRole::User),
            _ => None,
        }
    }

    /// Whether this role may administer permissions and accounts
    pub const fn can_manage(self) -> bool {
        matches!(self, AccountRole::Admin | AccountRole::Manager)
    }

    /// The permission role whose set applies to this account. Admins resolve
    /// to the manager set.
    pub const fn permission_role(self) -> Role {
        match self {
            AccountRole::Admin | AccountRole::Manager => Role::Manager,
            AccountRole::User => Role::User,
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public account record (no credentials)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: AccountRole,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub deleted: bool,
}

/// Stored record: public fields plus credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredAccount {
    #[serde(flatten)]
    pub account: Account,
    pub salt: String,
    pub password_hash: String,
}

/// Fields for registering an account
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub role: AccountRole,
    pub password: String,
}

/// Partial update for an account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<AccountRole>,
    #[serde(default)]
    pub password: Option<String>,
}

/// One page of accounts
#[derive(Debug, Clone, Serialize)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Require an administering role on the actor
pub(crate) fn require_manager(actor: &Account) -> Result<()> {
    if actor.role.can_manage() {
        Ok(())
    } else {
        Err(PermError(format!("{} lacks account administration", actor.email)))
    }
}

/// Length plus letter and digit; matches the backend's minimum bar
fn check_password_strength(password: &str) -> Result<()> {
    if password.len() < 8
        || !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(PermError(
            "Password must be at least 8 characters with a letter and a digit".into(),
        ));
    }
    Ok(())
}

fn encode(record: &StoredAccount) -> Result<String> {
    serde_json::to_string(record).map_err(err)
}

fn decode(json: &str) -> Result<StoredAccount> {
    serde_json::from_str(json).map_err(err)
}

/// Load a stored record by id (including soft-deleted ones)
pub(crate) fn load(store: &Store, id: &str) -> Result<Option<StoredAccount>> {
    store.read(|tx| {
        store
            .accounts
            .get(tx, id)
            .map_err(err)?
            .map(decode)
            .transpose()
    })
}

/// Load a stored record by email
pub(crate) fn find_by_email(store: &Store, email: &str) -> Result<Option<StoredAccount>> {
    let id = store.read(|tx| Ok(store.emails.get(tx, email).map_err(err)?.map(String::from)))?;
    match id {
        Some(id) => load(store, &id),
        None => Ok(None),
    }
}

/// Create an account inside an open transaction (no actor check)
pub(crate) fn insert_in(store: &Store, tx: &mut RwTxn, new: &NewAccount) -> Result<Account> {
    check_password_strength(&new.password)?;
    let salt = generate_salt();
    let password_hash = hash_password(&salt, &new.password);
    let now = current_epoch();

    if store.emails.get(tx, &new.email).map_err(err)?.is_some() {
        return Err(PermError("Email already registered".into()));
    }
    let id = store.next_id(tx)?.to_string();
    let record = StoredAccount {
        account: Account {
            id: id.clone(),
            email: new.email.clone(),
            name: new.name.clone(),
            role: new.role,
            created_at: now,
            updated_at: now,
            deleted: false,
        },
        salt,
        password_hash,
    };
    store.accounts.put(tx, &id, &encode(&record)?).map_err(err)?;
    store.emails.put(tx, &new.email, &id).map_err(err)?;
    Ok(record.account)
}

/// Create an account without an actor check (bootstrap path)
pub(crate) fn insert(store: &Store, new: &NewAccount) -> Result<Account> {
    store.write(|tx| insert_in(store, tx, new))
}

/// Register a new account. Requires an administering actor.
pub fn register(store: &Store, actor: &Account, new: &NewAccount) -> Result<Account> {
    require_manager(actor)?;
    insert(store, new)
}

/// Fetch an account by id. Requires an administering actor.
pub fn get(store: &Store, actor: &Account, id: &str) -> Result<Account> {
    require_manager(actor)?;
    match load(store, id)? {
        Some(record) if !record.account.deleted => Ok(record.account),
        _ => Err(PermError("Account not found".into())),
    }
}

/// List accounts, newest first. Requires an administering actor.
pub fn list(store: &Store, actor: &Account, page: usize, limit: usize) -> Result<AccountPage> {
    require_manager(actor)?;
    let page = page.max(1);
    let limit = limit.max(1);

    let mut accounts = store.read(|tx| {
        let mut out = Vec::new();
        for item in store.accounts.iter(tx).map_err(err)? {
            let (_, json) = item.map_err(err)?;
            let record = decode(json)?;
            if !record.account.deleted {
                out.push(record.account);
            }
        }
        Ok(out)
    })?;

    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    let total = accounts.len();
    let start = (page - 1).saturating_mul(limit).min(total);
    let end = start.saturating_add(limit).min(total);
    let accounts = accounts[start..end].to_vec();

    Ok(AccountPage { accounts, total, page, limit })
}

/// Update an account in place. Requires an administering actor.
pub fn update(store: &Store, actor: &Account, id: &str, patch: &AccountUpdate) -> Result<Account> {
    require_manager(actor)?;
    if let Some(password) = &patch.password {
        check_password_strength(password)?;
    }

    store.write(|tx| {
        let json = store
            .accounts
            .get(tx, id)
            .map_err(err)?
            .ok_or_else(|| PermError("Account not found".into()))?;
        let mut record = decode(json)?;
        if record.account.deleted {
            return Err(PermError("Account not found".into()));
        }

        if let Some(email) = &patch.email {
            if email != &record.account.email {
                if store.emails.get(tx, email).map_err(err)?.is_some() {
                    return Err(PermError("Email already registered".into()));
                }
                store.emails.delete(tx, &record.account.email).map_err(err)?;
                store.emails.put(tx, email, id).map_err(err)?;
                record.account.email = email.clone();
            }
        }
        if let Some(name) = &patch.name {
            record.account.name = name.clone();
        }
        if let Some(role) = patch.role {
            record.account.role = role;
        }
        if let Some(password) = &patch.password {
            record.salt = generate_salt();
            record.password_hash = hash_password(&record.salt, password);
        }
        record.account.updated_at = current_epoch();

        store.accounts.put(tx, id, &encode(&record)?).map_err(err)?;
        Ok(record.account)
    })
}

/// Soft-delete an account, freeing its email for re-registration. Requires
/// an administering actor.
pub fn remove(store: &Store, actor: &Account, id: &str) -> Result<()> {
    require_manager(actor)?;
    store.write(|tx| {
        let json = store
            .accounts
            .get(tx, id)
            .map_err(err)?
            .ok_or_else(|| PermError("Account not found".into()))?;
        let mut record = decode(json)?;
        if record.account.deleted {
            return Err(PermError("Account not found".into()));
        }
        record.account.deleted = true;
        record.account.updated_at = current_epoch();
        store.accounts.put(tx, id, &encode(&record)?).map_err(err)?;
        // the index entry goes with it, so the email can be registered again
        store.emails.delete(tx, &record.account.email).map_err(err)?;
        Ok(())
    })
}
