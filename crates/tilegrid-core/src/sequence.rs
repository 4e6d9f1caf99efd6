#![forbid(unsafe_code)]

//! Ordered item identifiers.
//!
//! The rendering order of the grid *is* the semantic order, so an
//! [`OrderedSequence`] is just a list of [`ItemId`]s that refuses
//! duplicates. Rank `i` is the item at position `i`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Opaque identifier of one grid item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An ordered list of unique item identifiers.
///
/// # Invariants
///
/// 1. No identifier appears twice.
/// 2. [`move_item`](Self::move_item) only permutes; the multiset of
///    identifiers never changes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct OrderedSequence {
    items: Vec<ItemId>,
}

impl OrderedSequence {
    /// Create an empty sequence.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a sequence, rejecting duplicate identifiers.
    pub fn from_ids<I>(ids: I) -> Result<Self, OrderError>
    where
        I: IntoIterator,
        I::Item: Into<ItemId>,
    {
        let mut seq = Self::new();
        for id in ids {
            seq.append(id.into())?;
        }
        Ok(seq)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ItemId> {
        self.items.get(index)
    }

    /// Rank of `id`, if present.
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item == id)
    }

    #[inline]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    #[inline]
    pub fn as_slice(&self) -> &[ItemId] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<ItemId> {
        self.items.clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ItemId> {
        self.items.iter()
    }

    /// Append `id` at the end, returning its rank.
    pub fn append(&mut self, id: ItemId) -> Result<usize, OrderError> {
        if self.contains(&id) {
            return Err(OrderError::DuplicateItem(id));
        }
        self.items.push(id);
        Ok(self.items.len() - 1)
    }

    /// Remove `id`, returning the rank it held. Later items shift down so
    /// ranks stay dense.
    pub fn remove(&mut self, id: &ItemId) -> Result<usize, OrderError> {
        let rank = self
            .position(id)
            .ok_or_else(|| OrderError::UnknownItem(id.clone()))?;
        self.items.remove(rank);
        Ok(rank)
    }

    /// Clamp a possibly out-of-range index to `[0, len)`.
    ///
    /// Returns `None` only for an empty sequence.
    pub fn clamp_index(&self, index: isize) -> Option<usize> {
        let last = self.items.len().checked_sub(1)?;
        Some(usize::try_from(index).map_or(0, |i| i.min(last)))
    }

    /// Move the item at `from` to `to` with a single remove-then-reinsert.
    ///
    /// Items between the two positions shift by one toward `from`; all
    /// others keep their rank. Returns `false` (and does nothing) when the
    /// positions are equal or out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let len = self.items.len();
        if from == to || from >= len || to >= len {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }
}

impl<'de> Deserialize<'de> for OrderedSequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let ids = Vec::<ItemId>::deserialize(deserializer)?;
        Self::from_ids(ids).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a OrderedSequence {
    type Item = &'a ItemId;
    type IntoIter = std::slice::Iter<'a, ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
