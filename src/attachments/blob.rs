// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob persistence behind the attachment manager.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Named binary storage. Names are opaque to the store.
pub trait BlobStore: Send + Sync {
    /// Durably store `data` under `name`. The blob is not visible to `get`
    /// until the whole payload has been written.
    fn put(&self, name: &str, data: &[u8]) -> io::Result<()>;

    fn get(&self, name: &str) -> io::Result<Vec<u8>>;

    fn remove(&self, name: &str) -> io::Result<()>;
}

/// Filesystem blob store publishing through a staging directory.
///
/// Writes land in `staging` first, are synced, then renamed into `dir`.
/// A crash mid-write leaves at most a stray staged file, never a truncated
/// published blob.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
    staging: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>, staging: impl Into<PathBuf>) -> io::Result<Self> {
        let store = Self {
            dir: dir.into(),
            staging: staging.into(),
        };
        fs::create_dir_all(&store.dir)?;
        fs::create_dir_all(&store.staging)?;
        Ok(store)
    }

    /// Remove leftovers of interrupted writes. Returns how many were removed.
    pub fn clear_staging(&self) -> io::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.staging)? {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, name: &str, data: &[u8]) -> io::Result<()> {
        let staged = self.staging.join(format!("{name}.partial"));
        let written = (|| -> io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staged)?;
            file.write_all(data)?;
            file.sync_all()
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&staged);
            return Err(e);
        }

        if let Err(e) = fs::rename(&staged, self.dir.join(name)) {
            let _ = fs::remove_file(&staged);
            return Err(e);
        }
        Ok(())
    }

    fn get(&self, name: &str) -> io::Result<Vec<u8>> {
        let mut file = File::open(self.dir.join(name))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.dir.join(name))
    }
}
