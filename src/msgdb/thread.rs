/*
 * thread.rs
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

//! A thread is a set of messages sharing a conversation identity (spec §3.1, §3.2).

use crate::msgdb::header::{Flags, MessageKey};

#[derive(Debug, Clone)]
pub struct Thread {
    pub thread_key: MessageKey,
    /// Children in the order they were attached; the tree shape itself
    /// is recovered from each header's `thread_parent`.
    pub children: Vec<MessageKey>,
    pub flags: Flags,
    pub newest_msg_date: i64,
    /// Cached subject of the root, used for subject-fallback matching
    /// (spec §4.3) without re-reading the root header.
    pub subject: String,
}

impl Thread {
    pub fn new(thread_key: MessageKey) -> Self {
        Self {
            thread_key,
            children: Vec::new(),
            flags: Flags::empty(),
            newest_msg_date: 0,
            subject: String::new(),
        }
    }

    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    pub fn root_key(&self) -> MessageKey {
        if self.thread_key == MessageKey::RESERVED_THREAD_KEY_SUBSTITUTE {
            MessageKey(1)
        } else {
            self.thread_key
        }
    }

    pub fn contains(&self, key: MessageKey) -> bool {
        self.children.contains(&key)
    }

    pub fn remove_child(&mut self, key: MessageKey) {
        self.children.retain(|k| *k != key);
    }
}
