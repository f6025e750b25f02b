// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Each user is one JSON document under `users/`. Email uniqueness is held
//! by a second document per address under `users/emails/`, named by a
//! UUIDv5 of the normalized email and created with create-new semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::{DocumentStorage, StorageError, StorageResult};
use crate::auth::Role;

/// User identity stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    pub name: String,
    /// Lower-cased, trimmed email
    pub email: String,
    /// Argon2 PHC string; never leaves the service
    pub password_verifier: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Email index record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaim {
    user_id: String,
    email: String,
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    storage: &'a DocumentStorage,
}

impl<'a> UserRepository<'a> {
    pub fn new(storage: &'a DocumentStorage) -> Self {
        Self { storage }
    }

    /// Index key for an already-normalized email.
    fn email_key(email: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("mailto:{email}").as_bytes()).to_string()
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        Uuid::parse_str(user_id).is_ok() && self.storage.exists(self.storage.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        if !self.exists(user_id) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.storage.read_json(self.storage.paths().user(user_id))
    }

    /// Check whether an email is already claimed.
    pub fn email_taken(&self, email: &str) -> bool {
        self.storage
            .exists(self.storage.paths().email_index(&Self::email_key(email)))
    }

    /// Look up a user by normalized email.
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredUser>> {
        let index_path = self.storage.paths().email_index(&Self::email_key(email));
        let claim: EmailClaim = match self.storage.read_json(index_path) {
            Ok(claim) => claim,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        match self.get(&claim.user_id) {
            Ok(user) => Ok(Some(user)),
            // Claimed but the user document never landed.
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a new user.
    ///
    /// Claims the email first; a claim that already exists fails with
    /// `StorageError::AlreadyExists` even if a concurrent registration won the
    /// race after the caller's own pre-check.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        let index_path = self.storage.paths().email_index(&Self::email_key(&user.email));
        self.storage
            .create_json(
                &index_path,
                &EmailClaim {
                    user_id: user.id.clone(),
                    email: user.email.clone(),
                },
            )
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("User with email {}", user.email))
                }
                other => other,
            })?;

        if let Err(e) = self.storage.write_json(self.storage.paths().user(&user.id), user) {
            if let Err(rollback) = self.storage.delete(&index_path) {
                tracing::warn!(
                    user_id = %user.id,
                    error = %rollback,
                    "Failed to release email claim; address stays reserved"
                );
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (DocumentStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = DocumentStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().expect("Failed to initialize");
        (storage, dir)
    }

    fn test_user(email: &str) -> StoredUser {
        StoredUser {
            id: Uuid::new_v4().to_string(),
            name: "Siti".to_string(),
            email: email.to_string(),
            password_verifier: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role: Role::Resident,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_find_by_email() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        let user = test_user("siti@example.com");
        repo.create(&user).unwrap();

        assert!(repo.email_taken("siti@example.com"));
        assert_eq!(repo.find_by_email("siti@example.com").unwrap(), Some(user.clone()));
        assert_eq!(repo.get(&user.id).unwrap(), user);
    }

    #[test]
    fn second_claim_on_email_fails() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        repo.create(&test_user("dup@example.com")).unwrap();
        let err = repo.create(&test_user("dup@example.com")).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn failed_user_write_releases_email_claim() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);

        // A non-empty directory where the user document belongs makes the
        // final rename fail.
        let user = test_user("siti@example.com");
        let blocker = storage.paths().user(&user.id);
        std::fs::create_dir_all(blocker.join("occupied")).unwrap();

        assert!(repo.create(&user).is_err());
        assert!(!repo.email_taken("siti@example.com"));
        repo.create(&test_user("siti@example.com")).unwrap();
    }

    #[test]
    fn unknown_email_is_none() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);
        assert_eq!(repo.find_by_email("nobody@example.com").unwrap(), None);
    }

    #[test]
    fn get_rejects_non_uuid_ids() {
        let (storage, _dir) = test_storage();
        let repo = UserRepository::new(&storage);
        assert!(matches!(
            repo.get("../entries/x"),
            Err(StorageError::NotFound(_))
        ));
    }
}
