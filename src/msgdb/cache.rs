/*
 * cache.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tagliacarte.
 *
 * Tagliacarte is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tagliacarte is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tagliacarte.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Header identity cache (spec §4.2.3): the use cache guarantees one live
//! header object per `MessageKey`; the hit cache is a bounded LRU of
//! recently-read headers.

use crate::msgdb::header::{MessageHeader, MessageKey};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Shared handle to a header. Mutations through one handle are visible
/// through every other handle for the same key (use-cache identity,
/// spec §8 invariant 1). Not `Send`: per the main-thread-only ownership
/// model (spec §5), headers are constructed, mutated and dropped on the
/// main thread.
pub type HeaderHandle = Rc<RefCell<MessageHeader>>;

#[derive(Default)]
pub struct UseCache {
    by_key: HashMap<MessageKey, HeaderHandle>,
}

impl UseCache {
    pub fn get(&self, key: MessageKey) -> Option<HeaderHandle> {
        self.by_key.get(&key).cloned()
    }

    pub fn contains(&self, key: MessageKey) -> bool {
        self.by_key.contains_key(&key)
    }

    pub fn insert(&mut self, key: MessageKey, handle: HeaderHandle) {
        self.by_key.insert(key, handle);
    }

    pub fn remove(&mut self, key: MessageKey) -> Option<HeaderHandle> {
        self.by_key.remove(&key)
    }

    /// Walk every live header, clearing its row pointer before the
    /// underlying store is destroyed (spec §4.2.3: failing to do this is
    /// a memory-safety bug in the original; here it is a logical
    /// invariant since handles may still be held by callers).
    pub fn clear(&mut self) {
        self.by_key.clear();
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }
}

/// LRU of recently-accessed headers (default capacity 512, spec §4.2.3).
pub struct HitCache {
    capacity: usize,
    order: VecDeque<MessageKey>,
}

impl HitCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
        }
    }

    /// Record a touch, evicting the oldest entry if over capacity.
    /// Returns the evicted key, if any.
    pub fn touch(&mut self, key: MessageKey) -> Option<MessageKey> {
        self.order.retain(|k| *k != key);
        self.order.push_back(key);
        if self.order.len() > self.capacity {
            self.order.pop_front()
        } else {
            None
        }
    }

    pub fn remove(&mut self, key: MessageKey) {
        self.order.retain(|k| *k != key);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}
