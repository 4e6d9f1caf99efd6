#![forbid(unsafe_code)]

//! JSON-file backed ordered-list store.
//!
//! The whole state is one JSON document. Every mutation rewrites it to a
//! sibling temp file and renames that over the original, so a crash
//! mid-write leaves either the old or the new document, never a mix.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tilegrid_core::ItemId;

use crate::store::{
    OrderStore, RankedEntry, StoreError, UserId, append_row, ordered_ids, remove_row,
    replace_rows, sorted_rows,
};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    version: u32,
    users: BTreeMap<UserId, Vec<RankedEntry>>,
}

/// Store persisting every user's rows in a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document {
                version: FORMAT_VERSION,
                users: BTreeMap::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, doc: &Document) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(doc)?;
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate<R>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Vec<RankedEntry>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut doc = self.load()?;
        let result = f(doc.users.entry(user.clone()).or_default())?;
        doc.version = FORMAT_VERSION;
        self.save(&doc)?;
        Ok(result)
    }

    fn read<R>(&self, user: &UserId, f: impl FnOnce(&[RankedEntry]) -> R) -> Result<R, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let doc = self.load()?;
        Ok(f(doc.users.get(user).map(Vec::as_slice).unwrap_or_default()))
    }
}

impl OrderStore for JsonFileStore {
    fn read_order(&self, user: &UserId) -> Result<Vec<ItemId>, StoreError> {
        self.read(user, ordered_ids)
    }

    fn replace_order(&self, user: &UserId, order: &[ItemId]) -> Result<(), StoreError> {
        let fresh = replace_rows(user, order)?;
        self.mutate(user, |rows| {
            *rows = fresh;
            Ok(())
        })
    }

    fn append_item(&self, user: &UserId, item: &ItemId) -> Result<usize, StoreError> {
        self.mutate(user, |rows| append_row(rows, user, item))
    }

    fn remove_item(&self, user: &UserId, item: &ItemId) -> Result<Vec<ItemId>, StoreError> {
        self.mutate(user, |rows| remove_row(rows, user, item))
    }

    fn ranks(&self, user: &UserId) -> Result<Vec<RankedEntry>, StoreError> {
        self.read(user, sorted_rows)
    }
}
