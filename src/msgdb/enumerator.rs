/*
 * enumerator.rs
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

//! Forward/backward/filtering enumerators over the all-messages table
//! (spec §4.2.4). Enumerators are registered against the owning
//! database's generation counter and invalidated on `ForceClosed`; using
//! an invalidated enumerator returns `Failure` rather than panicking or
//! silently returning a partial view (spec §5 ordering guarantee).

use crate::error::{DbError, DbResult};
use crate::msgdb::header::MessageKey;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// A restartable cursor over a fixed snapshot of keys, taken when the
/// enumerator is created. Each call to `next()` re-checks the owning
/// database's generation so the enumerator fails cleanly rather than
/// reading through a closed store.
pub struct MessageEnumerator {
    keys: Vec<MessageKey>,
    position: usize,
    direction: Direction,
    generation: Rc<Cell<u64>>,
    created_generation: u64,
}

impl MessageEnumerator {
    pub(crate) fn new_forward(keys: Vec<MessageKey>, generation: Rc<Cell<u64>>) -> Self {
        let created_generation = generation.get();
        Self {
            keys,
            position: 0,
            direction: Direction::Forward,
            generation,
            created_generation,
        }
    }

    pub(crate) fn new_reverse(mut keys: Vec<MessageKey>, generation: Rc<Cell<u64>>) -> Self {
        keys.reverse();
        let created_generation = generation.get();
        Self {
            keys,
            position: 0,
            direction: Direction::Reverse,
            generation,
            created_generation,
        }
    }

    fn is_valid(&self) -> bool {
        self.generation.get() == self.created_generation
    }

    /// Returns `Ok(None)` at end of iteration, `Err(Failure)` if the
    /// owning database was force-closed since this enumerator was made.
    pub fn next(&mut self) -> DbResult<Option<MessageKey>> {
        if !self.is_valid() {
            return Err(DbError::Failure);
        }
        if self.position >= self.keys.len() {
            return Ok(None);
        }
        let key = self.keys[self.position];
        self.position += 1;
        Ok(Some(key))
    }

    pub fn restart(&mut self) -> DbResult<()> {
        if !self.is_valid() {
            return Err(DbError::Failure);
        }
        self.position = 0;
        Ok(())
    }

    pub fn direction_is_reverse(&self) -> bool {
        self.direction == Direction::Reverse
    }
}
