use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

use super::{decode_store, SetAside};
use crate::domain::Store;

/// How a [`LedgerStore::load_report`] call found the backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file did not exist and was created empty
    Fresh,
    /// The file was read and parsed
    Loaded,
    /// The file was read, but some users or entries did not fit the ledger
    /// schema and were moved aside (see [`super::REJECTED_USERS_KEY`])
    Repaired(SetAside),
    /// The file was not valid JSON; its bytes were copied to `backup` and
    /// the primary file was replaced with an empty store
    Recovered { backup: PathBuf },
}

/// Persists the whole [`Store`] as one JSON document.
///
/// Every save rewrites the full file through a synced temporary sibling and
/// a rename, so readers never see a torn write. A file that is not valid
/// JSON is backed up and replaced with an empty store instead of failing the
/// load; valid JSON is never thrown away.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Create a store handle for the JSON file at `path`.
    /// Nothing is touched on disk until the first load or save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the store, creating or recovering the file as needed.
    pub fn load(&self) -> Result<Store> {
        self.load_report().map(|(store, _)| store)
    }

    /// Load the store and report whether it was read, created or recovered.
    pub fn load_report(&self) -> Result<(Store, LoadOutcome)> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let store = Store::new();
                self.save(&store)?;
                tracing::info!(path = %self.path.display(), "Created new ledger file");
                return Ok((store, LoadOutcome::Fresh));
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read ledger file {}", self.path.display())
                });
            }
        };

        let document = match serde_json::from_slice::<Value>(&raw) {
            Ok(document) => document,
            Err(parse_error) => return self.recover(&raw, parse_error),
        };

        let (store, set_aside) = decode_store(document).with_context(|| {
            format!("Ledger file {} does not hold a ledger store", self.path.display())
        })?;

        tracing::debug!(
            path = %self.path.display(),
            users = store.users.len(),
            "Loaded ledger file"
        );
        if set_aside.is_empty() {
            Ok((store, LoadOutcome::Loaded))
        } else {
            tracing::warn!(
                path = %self.path.display(),
                users = set_aside.users,
                entries = set_aside.entries,
                "Some ledger data could not be read and was set aside"
            );
            Ok((store, LoadOutcome::Repaired(set_aside)))
        }
    }

    /// Write the full store, replacing the previous file atomically.
    pub fn save(&self, store: &Store) -> Result<()> {
        let json = serde_json::to_vec_pretty(store).context("Failed to serialize ledger store")?;

        let tmp_path = self.tmp_path();
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        file.write_all(&json)
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to replace {} with {}",
                self.path.display(),
                tmp_path.display()
            )
        })?;

        tracing::debug!(
            path = %self.path.display(),
            users = store.users.len(),
            "Saved ledger file"
        );
        Ok(())
    }

    /// Keep the unparsable bytes in a backup, then start over empty.
    fn recover(
        &self,
        raw: &[u8],
        parse_error: serde_json::Error,
    ) -> Result<(Store, LoadOutcome)> {
        let backup = self.write_backup(raw, Utc::now().timestamp_millis())?;

        let store = Store::new();
        self.save(&store)?;

        tracing::warn!(
            path = %self.path.display(),
            backup = %backup.display(),
            error = %parse_error,
            "Ledger file was corrupt; backed it up and started from an empty store"
        );
        Ok((store, LoadOutcome::Recovered { backup }))
    }

    fn tmp_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".tmp")
    }

    fn backup_path(&self, stamp: i64) -> PathBuf {
        sibling_with_suffix(&self.path, &format!(".broken-{}", stamp))
    }

    /// Write `raw` to `<file>.broken-<stamp>`, bumping the stamp until the
    /// name is free. The file is created exclusively, so an earlier backup is
    /// never overwritten.
    fn write_backup(&self, raw: &[u8], mut stamp: i64) -> Result<PathBuf> {
        loop {
            let candidate = self.backup_path(stamp);
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut file) => {
                    file.write_all(raw).and_then(|_| file.sync_all()).with_context(|| {
                        format!("Failed to back up ledger file to {}", candidate.display())
                    })?;
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create backup file {}", candidate.display())
                    });
                }
            }
        }
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
