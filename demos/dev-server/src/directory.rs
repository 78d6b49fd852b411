//! An in-memory user directory with argon2 password hashes.
//!
//! Stands in for the relational store during development. Everything is
//! lost on restart.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use gatehouse::prelude::*;
use password_hash::{PasswordHash, SaltString};
use rand::Rng;

struct DevUser {
    user_id: UserId,
    role: Role,
    hash: String,
}

#[derive(Default)]
pub struct DevDirectory {
    users: HashMap<String, DevUser>,
    members: HashSet<(TeamId, UserId)>,
    keys: Mutex<Vec<IssuedKey>>,
    key_owners: Mutex<HashMap<ApiKeyId, UserId>>,
    next_key: AtomicU64,
}

impl DevDirectory {
    /// A directory with one user per role (password = username) and team 1
    /// containing the viewer.
    pub fn seeded() -> Result<Self, password_hash::Error> {
        let mut dir = Self::default();
        dir.add_user(UserId(1), "viewer", "viewer", Role::Viewer)?;
        dir.add_user(UserId(2), "manager", "manager", Role::TeamsManager)?;
        dir.add_user(UserId(3), "admin", "admin", Role::Admin)?;
        dir.add_user(UserId(4), "master", "master", Role::Master)?;
        dir.add_member(TeamId(1), UserId(1));
        Ok(dir)
    }

    pub fn add_user(
        &mut self,
        user_id: UserId,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), password_hash::Error> {
        let hash = hash_password(password)?;
        self.users
            .insert(username.to_string(), DevUser { user_id, role, hash });
        Ok(())
    }

    pub fn add_member(&mut self, team_id: TeamId, user_id: UserId) {
        self.members.insert((team_id, user_id));
    }

    /// The key rows an expiry sweep should look at.
    pub fn issued_keys(&self) -> Result<Vec<IssuedKey>, DirectoryError> {
        Ok(self.keys.lock().map_err(poisoned)?.clone())
    }

    /// Drops the rows of keys a sweep revoked.
    pub fn forget_keys(&self, ids: &[ApiKeyId]) -> Result<(), DirectoryError> {
        self.keys
            .lock()
            .map_err(poisoned)?
            .retain(|row| !ids.contains(&row.id));
        let mut owners = self.key_owners.lock().map_err(poisoned)?;
        for id in ids {
            owners.remove(id);
        }
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let phc = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(phc.to_string())
}

fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn poisoned<T>(_: T) -> DirectoryError {
    DirectoryError("directory lock poisoned".into())
}

impl MembershipSource for DevDirectory {
    async fn team_member_exists(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> Result<bool, MembershipError> {
        Ok(self.members.contains(&(team_id, user_id)))
    }
}

impl UserDirectory for DevDirectory {
    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserAccount>, DirectoryError> {
        let Some(user) = self.users.get(username) else {
            return Ok(None);
        };

        // Keep argon2 off the async workers.
        let hash = user.hash.clone();
        let password = password.to_string();
        let ok = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| DirectoryError(format!("password check panicked: {e}")))?;

        Ok(ok.then_some(UserAccount {
            user_id: user.user_id,
            role: user.role,
        }))
    }

    async fn user_role(&self, user_id: UserId) -> Result<Option<Role>, DirectoryError> {
        Ok(self
            .users
            .values()
            .find(|user| user.user_id == user_id)
            .map(|user| user.role))
    }

    async fn create_api_key(
        &self,
        user_id: UserId,
        ttl_hours: u32,
    ) -> Result<ApiKeyId, DirectoryError> {
        let id = ApiKeyId(self.next_key.fetch_add(1, Ordering::Relaxed) + 1);
        self.keys.lock().map_err(poisoned)?.push(IssuedKey {
            id,
            created_at: SystemTime::now(),
            ttl_hours,
        });
        self.key_owners.lock().map_err(poisoned)?.insert(id, user_id);
        Ok(id)
    }

    async fn delete_api_key(
        &self,
        user_id: UserId,
        key_id: ApiKeyId,
    ) -> Result<bool, DirectoryError> {
        let mut owners = self.key_owners.lock().map_err(poisoned)?;
        if owners.get(&key_id) != Some(&user_id) {
            return Ok(false);
        }
        owners.remove(&key_id);
        drop(owners);

        self.keys
            .lock()
            .map_err(poisoned)?
            .retain(|row| row.id != key_id);
        Ok(true)
    }
}
