// The town news feed: a bounded, newest-first, append-only journal.
//
// Every component writes human-readable notices here (phase changes, quest
// completions, thefts, arrests, breaking events). The presentation layer
// reads `entries()` directly. Entries are only ever added at the front; once
// `capacity` is reached the oldest entry falls off the back.
//
// `TickEvent`s (see `event.rs`) are the structured counterpart: machine-
// readable, returned from a single tick, not stored. The journal is the
// persistent, player-facing one.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const DEFAULT_CAPACITY: usize = 50;

/// Which part of the engine wrote an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    Phase,
    Economy,
    Quest,
    Visitor,
    Event,
    Risk,
}

/// One journal line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsEntry {
    pub id: u64,
    pub at: Timestamp,
    /// Turn number when the entry was written.
    pub turn: u64,
    pub category: NewsCategory,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Journal {
    entries: VecDeque<NewsEntry>,
    capacity: usize,
    next_id: u64,
}

impl Default for Journal {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Journal {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            next_id: 1,
        }
    }

    /// Add an entry at the front, evicting the oldest entries past capacity.
    pub fn record(
        &mut self,
        at: Timestamp,
        turn: u64,
        category: NewsCategory,
        message: impl Into<String>,
    ) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(NewsEntry {
            id,
            at,
            turn,
            category,
            message: message.into(),
        });
        self.entries.truncate(self.capacity.max(1));
    }

    /// Change the capacity, evicting immediately if it shrank. Zero is
    /// treated as one.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    pub fn capacity(&self) -> usize {
        self.capacity.max(1)
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &NewsEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&NewsEntry> {
        self.entries.front()
    }

    /// Entries with an id greater than `id`, newest first. Used by drivers
    /// that want to print only what a tick added.
    pub fn since(&self, id: u64) -> impl Iterator<Item = &NewsEntry> {
        self.entries.iter().take_while(move |e| e.id > id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
