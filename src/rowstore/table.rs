/*
 * table.rs
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

//! An ordered table of rows (spec §4.1, §4.2.2): exactly one all-messages
//! table, one all-threads table, and one per-thread table per thread.

use crate::rowstore::row::{Oid, Row};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Kind name, e.g. "all-messages", "all-threads", or "thread".
    pub kind: String,
    rows: BTreeMap<Oid, Row>,
    insertion_order: Vec<Oid>,
    next_oid: Oid,
    /// Rows removed since the table was last compressed; drives the
    /// 30%-waste auto-compress decision (spec §4.2.4).
    removed_count: usize,
}

impl Table {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            rows: BTreeMap::new(),
            insertion_order: Vec::new(),
            next_oid: 1,
            removed_count: 0,
        }
    }

    /// Allocate the next row id without inserting a row (used by
    /// `CreateMsgHdr` to pre-assign a key before the header is appended).
    pub fn next_oid(&self) -> Oid {
        self.next_oid
    }

    pub fn reserve_oid(&mut self, oid: Oid) {
        if oid >= self.next_oid {
            self.next_oid = oid + 1;
        }
    }

    pub fn insert(&mut self, row: Row) {
        let oid = row.oid;
        self.reserve_oid(oid);
        if !self.rows.contains_key(&oid) {
            self.insertion_order.push(oid);
        }
        self.rows.insert(oid, row);
    }

    pub fn get(&self, oid: Oid) -> Option<&Row> {
        self.rows.get(&oid)
    }

    pub fn get_mut(&mut self, oid: Oid) -> Option<&mut Row> {
        self.rows.get_mut(&oid)
    }

    pub fn remove(&mut self, oid: Oid) -> Option<Row> {
        let removed = self.rows.remove(&oid);
        if removed.is_some() {
            self.insertion_order.retain(|o| *o != oid);
            self.removed_count += 1;
        }
        removed
    }

    pub fn contains(&self, oid: Oid) -> bool {
        self.rows.contains_key(&oid)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in OID (ascending key) order.
    pub fn iter_oid_order(&self) -> impl DoubleEndedIterator<Item = &Row> {
        self.rows.values()
    }

    /// Iterate rows in insertion order.
    pub fn iter_insertion_order(&self) -> impl Iterator<Item = &Row> {
        self.insertion_order.iter().filter_map(move |oid| self.rows.get(oid))
    }

    /// Fraction of rows removed since the last compress, used to decide
    /// whether the next commit should be a `Compress` (spec §4.2.4).
    pub fn waste_fraction(&self) -> f64 {
        let total = self.rows.len() + self.removed_count;
        if total == 0 {
            0.0
        } else {
            self.removed_count as f64 / total as f64
        }
    }

    /// Reset the waste counter after a successful compress commit.
    pub fn mark_compressed(&mut self) {
        self.removed_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_and_oid_order_differ() {
        let mut t = Table::new("all-messages");
        t.insert(Row::new(3));
        t.insert(Row::new(1));
        t.insert(Row::new(2));
        let oid_order: Vec<Oid> = t.iter_oid_order().map(|r| r.oid).collect();
        assert_eq!(oid_order, vec![1, 2, 3]);
        let insertion_order: Vec<Oid> = t.iter_insertion_order().map(|r| r.oid).collect();
        assert_eq!(insertion_order, vec![3, 1, 2]);
    }

    #[test]
    fn waste_fraction_tracks_removals() {
        let mut t = Table::new("all-messages");
        for i in 1..=10 {
            t.insert(Row::new(i));
        }
        for i in 1..=4 {
            t.remove(i);
        }
        assert!((t.waste_fraction() - 0.4).abs() < 1e-9);
        t.mark_compressed();
        assert_eq!(t.waste_fraction(), 0.0);
    }
}
