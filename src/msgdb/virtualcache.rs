/*
 * virtualcache.rs
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

//! Cross-folder virtual-folder result cache (spec §4.2.4): a per-search-URI
//! set of keys persisted across sessions so a virtual folder can show its
//! last known result set before re-running the search.

use crate::msgdb::header::MessageKey;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct VirtualFolderCache {
    by_uri: BTreeMap<String, Vec<MessageKey>>,
}

impl VirtualFolderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cached_hits(&self, uri: &str) -> Vec<MessageKey> {
        self.by_uri.get(uri).cloned().unwrap_or_default()
    }

    /// Sorted-merge diff against `new_keys` (must be sorted ascending):
    /// keys present in the old set but absent from the new one are
    /// "stale" and returned to the caller; keys new to the set are
    /// added; keys common to both are left alone (spec §4.2.4, §8 S5).
    pub fn refresh_cache(&mut self, uri: &str, new_keys: &[MessageKey]) -> Vec<MessageKey> {
        debug_assert!(new_keys.windows(2).all(|w| w[0] <= w[1]), "new_keys must be sorted");
        let old = self.by_uri.entry(uri.to_string()).or_default();
        debug_assert!(old.windows(2).all(|w| w[0] <= w[1]), "cached keys must be sorted");

        let mut stale = Vec::new();
        let mut merged = Vec::with_capacity(new_keys.len());
        let (mut i, mut j) = (0usize, 0usize);
        while i < old.len() && j < new_keys.len() {
            match old[i].cmp(&new_keys[j]) {
                std::cmp::Ordering::Less => {
                    stale.push(old[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(new_keys[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(new_keys[j]);
                    i += 1;
                    j += 1;
                }
            }
        }
        while i < old.len() {
            stale.push(old[i]);
            i += 1;
        }
        while j < new_keys.len() {
            merged.push(new_keys[j]);
            j += 1;
        }
        *old = merged;
        stale
    }

    pub fn update_hdr_in_cache(&mut self, uri: &str, key: MessageKey, add: bool) {
        let entry = self.by_uri.entry(uri.to_string()).or_default();
        match entry.binary_search(&key) {
            Ok(pos) => {
                if !add {
                    entry.remove(pos);
                }
            }
            Err(pos) => {
                if add {
                    entry.insert(pos, key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(v: &[u32]) -> Vec<MessageKey> {
        v.iter().map(|n| MessageKey(*n)).collect()
    }

    #[test]
    fn refresh_cache_scenario_s5() {
        let mut cache = VirtualFolderCache::new();
        cache.by_uri.insert("uri".to_string(), keys(&[10, 20, 30, 40]));
        let stale = cache.refresh_cache("uri", &keys(&[20, 30, 50]));
        assert_eq!(stale, keys(&[10, 40]));
        assert_eq!(cache.get_cached_hits("uri"), keys(&[20, 30, 50]));
    }

    #[test]
    fn refresh_cache_is_idempotent() {
        let mut cache = VirtualFolderCache::new();
        let first = cache.refresh_cache("uri", &keys(&[1, 2, 3]));
        assert_eq!(first, Vec::<MessageKey>::new());
        let second = cache.refresh_cache("uri", &keys(&[1, 2, 3]));
        assert!(second.is_empty());
        assert_eq!(cache.get_cached_hits("uri"), keys(&[1, 2, 3]));
    }
}
