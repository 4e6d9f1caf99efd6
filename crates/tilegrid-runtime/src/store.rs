#![forbid(unsafe_code)]

//! Ordered-list store seam.
//!
//! The store keeps one ranked row per `(user, item)`. Ranks are consumed
//! positionally, so every mutation leaves them dense and zero-based.
//!
//! # Commit model
//!
//! [`OrderStore::replace_order`] is a full replace: all prior rows for the
//! user are superseded in one step, so a failed write never leaves a
//! duplicate or missing rank. Replaying the same order is idempotent.

use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilegrid_core::ItemId;
use web_time::Duration;

/// Owner of one ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One persisted row: an item and its rank for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// The ranked item.
    pub item: ItemId,
    /// Zero-based position in the user's order.
    pub rank: usize,
}

/// Failure of a store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("item {item} is already ranked for user {user}")]
    DuplicateItem { user: UserId, item: ItemId },

    #[error("item {item} is not ranked for user {user}")]
    UnknownItem { user: UserId, item: ItemId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Backend for per-user ordered lists.
///
/// Implementations must make every mutating call atomic per user.
pub trait OrderStore: Send + Sync {
    /// Items for `user`, ascending by rank.
    fn read_order(&self, user: &UserId) -> Result<Vec<ItemId>, StoreError>;

    /// Replace every row for `user` with `order`, ranked by position.
    ///
    /// Rejects orders containing duplicates without touching stored rows.
    fn replace_order(&self, user: &UserId, order: &[ItemId]) -> Result<(), StoreError>;

    /// Append `item` with rank equal to the current row count.
    fn append_item(&self, user: &UserId, item: &ItemId) -> Result<usize, StoreError>;

    /// Remove `item` and renumber the remaining rows densely from zero.
    ///
    /// Returns the resulting order.
    fn remove_item(&self, user: &UserId, item: &ItemId) -> Result<Vec<ItemId>, StoreError>;

    /// Raw ranked rows for `user`, ascending by rank.
    fn ranks(&self, user: &UserId) -> Result<Vec<RankedEntry>, StoreError>;
}

// ---------------------------------------------------------------------------
// Row helpers shared by the bundled stores
// ---------------------------------------------------------------------------

pub(crate) fn ordered_ids(rows: &[RankedEntry]) -> Vec<ItemId> {
    let mut sorted: Vec<&RankedEntry> = rows.iter().collect();
    sorted.sort_by_key(|row| row.rank);
    sorted.into_iter().map(|row| row.item.clone()).collect()
}

pub(crate) fn sorted_rows(rows: &[RankedEntry]) -> Vec<RankedEntry> {
    let mut sorted = rows.to_vec();
    sorted.sort_by_key(|row| row.rank);
    sorted
}

fn ranked(order: impl IntoIterator<Item = ItemId>) -> Vec<RankedEntry> {
    order
        .into_iter()
        .enumerate()
        .map(|(rank, item)| RankedEntry { item, rank })
        .collect()
}

/// Build fresh rows for a full replace, or reject the order.
pub(crate) fn replace_rows(
    user: &UserId,
    order: &[ItemId],
) -> Result<Vec<RankedEntry>, StoreError> {
    for (i, item) in order.iter().enumerate() {
        if order[..i].contains(item) {
            return Err(StoreError::DuplicateItem {
                user: user.clone(),
                item: item.clone(),
            });
        }
    }
    Ok(ranked(order.iter().cloned()))
}

pub(crate) fn append_row(
    rows: &mut Vec<RankedEntry>,
    user: &UserId,
    item: &ItemId,
) -> Result<usize, StoreError> {
    if rows.iter().any(|row| &row.item == item) {
        return Err(StoreError::DuplicateItem {
            user: user.clone(),
            item: item.clone(),
        });
    }
    let rank = rows.len();
    rows.push(RankedEntry {
        item: item.clone(),
        rank,
    });
    Ok(rank)
}

pub(crate) fn remove_row(
    rows: &mut Vec<RankedEntry>,
    user: &UserId,
    item: &ItemId,
) -> Result<Vec<ItemId>, StoreError> {
    if !rows.iter().any(|row| &row.item == item) {
        return Err(StoreError::UnknownItem {
            user: user.clone(),
            item: item.clone(),
        });
    }
    let remaining: Vec<ItemId> = ordered_ids(rows)
        .into_iter()
        .filter(|id| id != item)
        .collect();
    *rows = ranked(remaining.iter().cloned());
    Ok(remaining)
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store.
///
/// Also serves as a test double: [`fail_next`](Self::fail_next) makes the
/// next mutating calls fail, [`time_out_next`](Self::time_out_next) makes
/// them time out, and [`set_latency`](Self::set_latency) slows every call
/// down.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<FxHashMap<UserId, Vec<RankedEntry>>>,
    failures: AtomicU32,
    timeouts: AtomicU32,
    latency_ms: AtomicU64,
    replace_calls: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `user` with `order`.
    pub fn with_order(self, user: &UserId, order: &[ItemId]) -> Result<Self, StoreError> {
        self.replace_order(user, order)?;
        self.replace_calls.store(0, Ordering::SeqCst);
        Ok(self)
    }

    /// Fail the next `count` mutating calls with [`StoreError::Unavailable`].
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` mutating calls with [`StoreError::Timeout`].
    ///
    /// Timeouts are consumed before [`fail_next`](Self::fail_next) failures.
    pub fn time_out_next(&self, count: u32) {
        self.timeouts.store(count, Ordering::SeqCst);
    }

    /// Sleep this long inside every call.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of `replace_order` calls attempted so far.
    #[must_use]
    pub fn replace_calls(&self) -> u64 {
        self.replace_calls.load(Ordering::SeqCst)
    }

    fn simulate(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            std::thread::sleep(Duration::from_millis(latency));
        }
        if take_one(&self.timeouts) {
            return Err(StoreError::Timeout(Duration::from_millis(latency)));
        }
        if take_one(&self.failures) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }

    fn with_rows<R>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Vec<RankedEntry>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        f(rows.entry(user.clone()).or_default())
    }
}

/// Decrement `counter` if it is positive. Returns whether it was.
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl OrderStore for MemoryStore {
    fn read_order(&self, user: &UserId) -> Result<Vec<ItemId>, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(user).map(|r| ordered_ids(r)).unwrap_or_default())
    }

    fn replace_order(&self, user: &UserId, order: &[ItemId]) -> Result<(), StoreError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate()?;
        let fresh = replace_rows(user, order)?;
        self.with_rows(user, |rows| {
            *rows = fresh;
            Ok(())
        })
    }

    fn append_item(&self, user: &UserId, item: &ItemId) -> Result<usize, StoreError> {
        self.simulate()?;
        self.with_rows(user, |rows| append_row(rows, user, item))
    }

    fn remove_item(&self, user: &UserId, item: &ItemId) -> Result<Vec<ItemId>, StoreError> {
        self.simulate()?;
        self.with_rows(user, |rows| remove_row(rows, user, item))
    }

    fn ranks(&self, user: &UserId) -> Result<Vec<RankedEntry>, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(user).map(|r| sorted_rows(r)).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<ItemId> {
        (0..n).map(|i| ItemId::new(format!("m{i}"))).collect()
    }

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn replace_then_read() {
        let store = MemoryStore::new();
        store.replace_order(&user(), &ids(3)).unwrap();
        assert_eq!(store.read_order(&user()).unwrap(), ids(3));
        assert!(store.read_order(&UserId::new("other")).unwrap().is_empty());
    }

    #[test]
    fn replace_is_idempotent() {
        let store = MemoryStore::new();
        let mut order = ids(5);
        order.swap(0, 4);
        store.replace_order(&user(), &order).unwrap();
        let once = store.ranks(&user()).unwrap();
        store.replace_order(&user(), &order).unwrap();
        assert_eq!(store.ranks(&user()).unwrap(), once);
        assert_eq!(store.replace_calls(), 2);
    }

    #[test]
    fn replace_rejects_duplicates_without_writing() {
        let store = MemoryStore::new().with_order(&user(), &ids(2)).unwrap();
        let bad = vec![ItemId::new("a"), ItemId::new("a")];
        assert!(matches!(
            store.replace_order(&user(), &bad),
            Err(StoreError::DuplicateItem { .. })
        ));
        assert_eq!(store.read_order(&user()).unwrap(), ids(2));
    }

    #[test]
    fn remove_reindexes_densely() {
        let store = MemoryStore::new().with_order(&user(), &ids(10)).unwrap();
        let order = store.remove_item(&user(), &ItemId::new("m4")).unwrap();
        assert_eq!(order.len(), 9);
        let ranks: Vec<usize> = store
            .ranks(&user())
            .unwrap()
            .into_iter()
            .map(|r| r.rank)
            .collect();
        assert_eq!(ranks, (0..9).collect::<Vec<_>>());
        assert!(!order.contains(&ItemId::new("m4")));
        assert_eq!(order[4], ItemId::new("m5"));
    }

    #[test]
    fn remove_unknown_is_error() {
        let store = MemoryStore::new().with_order(&user(), &ids(2)).unwrap();
        assert!(matches!(
            store.remove_item(&user(), &ItemId::new("zz")),
            Err(StoreError::UnknownItem { .. })
        ));
    }

    #[test]
    fn append_ranks_at_count() {
        let store = MemoryStore::new().with_order(&user(), &ids(3)).unwrap();
        assert_eq!(store.append_item(&user(), &ItemId::new("new")).unwrap(), 3);
        assert!(matches!(
            store.append_item(&user(), &ItemId::new("new")),
            Err(StoreError::DuplicateItem { .. })
        ));
        assert_eq!(store.read_order(&user()).unwrap().len(), 4);
    }

    #[test]
    fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next(2);
        assert!(store.replace_order(&user(), &ids(1)).is_err());
        assert!(store.replace_order(&user(), &ids(1)).is_err());
        assert!(store.replace_order(&user(), &ids(1)).is_ok());
        assert_eq!(store.replace_calls(), 3);
    }

    #[test]
    fn injected_timeouts_come_first() {
        let store = MemoryStore::new().with_order(&user(), &ids(2)).unwrap();
        store.set_latency(Duration::from_millis(1));
        store.time_out_next(1);
        store.fail_next(1);
        assert!(matches!(
            store.append_item(&user(), &ItemId::new("late")),
            Err(StoreError::Timeout(d)) if d == Duration::from_millis(1)
        ));
        assert!(matches!(
            store.append_item(&user(), &ItemId::new("late")),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.append_item(&user(), &ItemId::new("late")).unwrap(), 2);
    }

    #[test]
    fn failed_replace_keeps_previous_rows() {
        let store = MemoryStore::new().with_order(&user(), &ids(3)).unwrap();
        store.fail_next(1);
        let mut reversed = ids(3);
        reversed.reverse();
        assert!(store.replace_order(&user(), &reversed).is_err());
        assert_eq!(store.read_order(&user()).unwrap(), ids(3));
    }
}
