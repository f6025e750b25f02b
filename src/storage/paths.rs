// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persisted state.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user documents.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a user document.
    pub fn user(&self, user_id: &str) -> PathBuf {
        self.users_dir().join(format!("{user_id}.json"))
    }

    /// Directory holding the unique email index.
    pub fn email_index_dir(&self) -> PathBuf {
        self.users_dir().join("emails")
    }

    /// Path to the index record claiming an email key.
    pub fn email_index(&self, email_key: &str) -> PathBuf {
        self.email_index_dir().join(format!("{email_key}.json"))
    }

    // ========== Entry Paths ==========

    /// Directory containing all ledger entries.
    pub fn entries_dir(&self) -> PathBuf {
        self.root.join("entries")
    }

    /// Path to a ledger entry document.
    pub fn entry(&self, entry_id: &str) -> PathBuf {
        self.entries_dir().join(format!("{entry_id}.json"))
    }

    // ========== Attachment Paths ==========

    /// Directory holding published attachment blobs.
    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    /// Staging area for attachment writes that are not yet published.
    pub fn staging_dir(&self) -> PathBuf {
        self.uploads_dir().join(".staging")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_root_is_data() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./data"));
    }

    #[test]
    fn layout_is_rooted() {
        let paths = StoragePaths::new("/srv/ledger");
        assert_eq!(paths.user("u1"), PathBuf::from("/srv/ledger/users/u1.json"));
        assert_eq!(
            paths.email_index("k"),
            PathBuf::from("/srv/ledger/users/emails/k.json")
        );
        assert_eq!(paths.entry("e1"), PathBuf::from("/srv/ledger/entries/e1.json"));
        assert_eq!(
            paths.staging_dir(),
            PathBuf::from("/srv/ledger/uploads/.staging")
        );
    }
}
