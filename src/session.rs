//! Token-based session management
//!
//! Sessions are keyed by the SHA-256 hash of a random bearer token. Only the
//! hash is ever stored; the token itself is returned to the caller once.

use sha2::{Digest, Sha256};

use crate::account::{self, Account, AccountRole, NewAccount};
use crate::error::{err, PermError, Result};
use crate::store::{current_epoch, Store};

/// Session record parsed out of storage
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub account_id: String,
    pub created_at: u64,
    pub expires_at: u64, // 0 = never
}

/// Result of bootstrapping the first admin
#[derive(Debug, Clone)]
pub struct BootstrapResult {
    pub admin: Account,
    pub token: String,
}

/// Generate a cryptographically secure token (32 bytes, base64url encoded)
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
    base64url_encode(&bytes)
}

/// Hash token with SHA-256 for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Base64url encode without padding
fn base64url_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut result = String::with_capacity((data.len() * 4 + 2) / 3);
    for chunk in data.chunks(3) {
        let n = match chunk.len() {
            3 => ((chunk[0] as u32) << 16) | ((chunk[1] as u32) << 8) | (chunk[2] as u32),
            2 => ((chunk[0] as u32) << 16) | ((chunk[1] as u32) << 8),
            1 => (chunk[0] as u32) << 16,
            _ => unreachable!(),
        };
        result.push(ALPHABET[((n >> 18) & 0x3F) as usize] as char);
        result.push(ALPHABET[((n >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 { result.push(ALPHABET[((n >> 6) & 0x3F) as usize] as char); }
        if chunk.len() > 2 { result.push(ALPHABET[(n & 0x3F) as usize] as char); }
    }
    result
}

/// Hex encode
mod hex {
    pub fn encode(data: impl AsRef<[u8]>) -> String {
        data.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Generate random salt (16 bytes, hex encoded)
pub(crate) fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
    hex::encode(bytes)
}

/// Hash password with salt
pub(crate) fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn parse_record(value: &str) -> Result<SessionInfo> {
    let parts: Vec<&str> = value.split('|').collect();
    if parts.len() != 3 {
        return Err(PermError("Corrupted session".into()));
    }
    Ok(SessionInfo {
        account_id: parts[0].to_string(),
        created_at: parts[1].parse().unwrap_or(0),
        expires_at: parts[2].parse().unwrap_or(0),
    })
}

/// Create a session for an account, returns the bearer token
pub fn create_session(store: &Store, account_id: &str, ttl_secs: Option<u64>) -> Result<String> {
    let token = generate_token();
    let hash = hash_token(&token);
    let now = current_epoch();
    let expires = ttl_secs.map(|t| now + t * 1000).unwrap_or(0);

    store.write(|tx| {
        // hash -> account_id|created_at|expires_at
        let value = format!("{}|{}|{}", account_id, now, expires);
        store.sessions.put(tx, &hash, &value).map_err(err)
    })?;

    Ok(token)
}

/// Validate a token and return the account it belongs to
pub fn authenticate(store: &Store, token: &str) -> Result<Account> {
    let hash = hash_token(token);

    let info = store.read(|tx| {
        let value = store
            .sessions
            .get(tx, &hash)
            .map_err(err)?
            .ok_or_else(|| PermError("Invalid token".into()))?;
        parse_record(value)
    })?;

    // 0 = never expires
    if info.expires_at > 0 && info.expires_at < current_epoch() {
        return Err(PermError("Token expired".into()));
    }

    match account::load(store, &info.account_id)? {
        Some(record) if !record.account.deleted => Ok(record.account),
        _ => Err(PermError("Invalid token".into())),
    }
}

/// Revoke a session by token. Returns false if the token was unknown.
pub fn revoke_session(store: &Store, token: &str) -> Result<bool> {
    let hash = hash_token(token);
    store.write(|tx| store.sessions.delete(tx, &hash).map_err(err))
}

/// Revoke every session belonging to an account, returns the count removed
pub fn revoke_all_sessions(store: &Store, account_id: &str) -> Result<u64> {
    store.write(|tx| {
        let mut hashes = Vec::new();
        for item in store.sessions.iter(tx).map_err(err)? {
            let (hash, value) = item.map_err(err)?;
            if parse_record(value)?.account_id == account_id {
                hashes.push(hash.to_string());
            }
        }
        let count = hashes.len() as u64;
        for hash in hashes {
            store.sessions.delete(tx, &hash).map_err(err)?;
        }
        Ok(count)
    })
}

/// Check credentials and open a session
pub fn login(store: &Store, email: &str, password: &str, ttl_secs: Option<u64>) -> Result<(Account, String)> {
    let record = account::find_by_email(store, email)?
        .filter(|r| !r.account.deleted)
        .ok_or_else(|| PermError("Invalid credentials".into()))?;

    if hash_password(&record.salt, password) != record.password_hash {
        return Err(PermError("Invalid credentials".into()));
    }

    let token = create_session(store, &record.account.id, ttl_secs)?;
    Ok((record.account, token))
}

/// Create the first admin account and a session for it. Runs once per store:
/// the marker check, the account insert, and the marker write share one
/// write transaction, so concurrent callers cannot both bootstrap.
pub fn bootstrap_admin(store: &Store, email: &str, name: &str, password: &str) -> Result<BootstrapResult> {
    let new = NewAccount {
        email: email.to_string(),
        name: name.to_string(),
        role: AccountRole::Admin,
        password: password.to_string(),
    };
    let admin = store.write(|tx| {
        if store.meta.get(tx, "boot").map_err(err)?.is_some() {
            return Err(PermError("Already bootstrapped".into()));
        }
        let admin = account::insert_in(store, tx, &new)?;
        store.meta.put(tx, "boot", "1").map_err(err)?;
        Ok(admin)
    })?;

    let token = create_session(store, &admin.id, None)?;
    Ok(BootstrapResult { admin, token })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // 32 bytes, no padding
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn password_hash_depends_on_salt() {
        let h1 = hash_password("aaaa", "hunter02");
        let h2 = hash_password("bbbb", "hunter02");
        assert_ne!(h1, h2);
        assert_eq!(h1, hash_password("aaaa", "hunter02"));
    }

    #[test]
    fn record_parsing_rejects_garbage() {
        assert!(parse_record("1|2").is_err());
        let info = parse_record("7|100|0").unwrap();
        assert_eq!(info.account_id, "7");
        assert_eq!(info.created_at, 100);
        assert_eq!(info.expires_at, 0);
    }
}
