//! Shared per-item download state.
//!
//! [`StateTracker`] is the only owner of the identifier → [`DownloadState`] map.
//! Every transition happens inside one short critical section, so "check then
//! write" races between batch workers and interactive requests cannot occur:
//! a claim either observes `Unknown` and moves it to `InProgress` atomically,
//! or it is rejected.
//!
//! The lock is a plain `std::sync::Mutex`; no operation holds it across an
//! await point or I/O.

use crate::types::{DownloadState, ItemId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Exclusive-access wrapper around the state map
#[derive(Debug, Default)]
pub struct StateTracker {
    states: Mutex<HashMap<ItemId, DownloadState>>,
}

impl StateTracker {
    /// Create an empty tracker (every item `Unknown`)
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ItemId, DownloadState>> {
        // The map holds plain values, so a panic elsewhere cannot leave it half-updated
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim an item for processing
    ///
    /// Returns true and moves `Unknown → InProgress` iff the item was `Unknown`.
    /// Returns false without any transition if it is `InProgress` or `Done`.
    pub fn try_claim(&self, id: ItemId) -> bool {
        let mut states = self.lock();
        let state = states.entry(id).or_default();
        if *state == DownloadState::Unknown {
            *state = DownloadState::InProgress;
            tracing::debug!(item_id = id.0, "Claimed item");
            true
        } else {
            false
        }
    }

    /// Claim an item, or report the state that blocked the claim
    pub fn claim_or_state(&self, id: ItemId) -> Result<(), DownloadState> {
        let mut states = self.lock();
        let state = states.entry(id).or_default();
        match *state {
            DownloadState::Unknown => {
                *state = DownloadState::InProgress;
                tracing::debug!(item_id = id.0, "Claimed item");
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Mark an item as stored
    ///
    /// `InProgress → Done`; calling it again on a `Done` item is a no-op.
    pub fn complete(&self, id: ItemId) {
        let mut states = self.lock();
        let state = states.entry(id).or_default();
        if *state == DownloadState::Unknown {
            tracing::warn!(item_id = id.0, "Completing an item that was never claimed");
        }
        *state = DownloadState::Done;
    }

    /// Give up a claim so the item may be retried later
    ///
    /// `InProgress → Unknown`. Items already `Done` are left alone.
    pub fn release(&self, id: ItemId) {
        let mut states = self.lock();
        if let Some(state) = states.get_mut(&id)
            && *state == DownloadState::InProgress
        {
            *state = DownloadState::Unknown;
            tracing::debug!(item_id = id.0, "Released claim");
        }
    }

    /// Current state of an item
    pub fn snapshot(&self, id: ItemId) -> DownloadState {
        self.lock().get(&id).copied().unwrap_or_default()
    }

    /// Mark every listed identifier as `Done`
    ///
    /// Called once at startup with the identifiers found in storage, before any
    /// worker starts. Returns how many identifiers were newly marked.
    pub fn rebuild_from_storage<I>(&self, stored: I) -> usize
    where
        I: IntoIterator<Item = ItemId>,
    {
        let mut states = self.lock();
        let mut marked = 0;
        for id in stored {
            if states.insert(id, DownloadState::Done) != Some(DownloadState::Done) {
                marked += 1;
            }
        }
        tracing::info!(count = marked, "Rebuilt download state from storage");
        marked
    }

    /// Number of items currently claimed
    pub fn in_progress_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|s| **s == DownloadState::InProgress)
            .count()
    }

    /// Number of items known to be stored
    pub fn done_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|s| **s == DownloadState::Done)
            .count()
    }
}
