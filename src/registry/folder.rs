/*
 * folder.rs
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

//! A node in the folder tree (spec §4.4, §3 Folder / Folder Info).

use bitflags::bitflags;
use std::cmp::Ordering;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FolderFlags: u32 {
        const INBOX     = 1 << 0;
        const SENT      = 1 << 1;
        const DRAFTS    = 1 << 2;
        const TRASH     = 1 << 3;
        const TEMPLATES = 1 << 4;
        const JUNK      = 1 << 5;
        const QUEUE     = 1 << 6;
        const ARCHIVE   = 1 << 7;
        const VIRTUAL   = 1 << 8;
        const SUBSCRIBED = 1 << 9;
        const NEWSGROUP = 1 << 10;
        const CHECK_NEW = 1 << 11;
        const OFFLINE_SYNC = 1 << 12;
    }
}

impl FolderFlags {
    /// Folders with one of these flags are ordered before ordinary
    /// folders regardless of ordinal, per the special-folder-ordering
    /// hook named in spec §4.4 (never wired up to a concrete ordering in
    /// the distillation; see [`FolderOrder`]).
    pub fn is_special(self) -> bool {
        self.intersects(
            FolderFlags::INBOX
                | FolderFlags::SENT
                | FolderFlags::DRAFTS
                | FolderFlags::TRASH
                | FolderFlags::TEMPLATES
                | FolderFlags::JUNK
                | FolderFlags::QUEUE
                | FolderFlags::ARCHIVE,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Folder {
    pub id: i64,
    pub parent: Option<i64>,
    pub ordinal: i64,
    pub name: String,
    pub flags: FolderFlags,
}

/// Sibling comparator: ordinal first (folders with an explicit ordinal
/// sort before those without), then normalized name (spec §4.4).
///
/// A hook for moving special folders (Inbox, Trash, ...) ahead of
/// ordinary siblings regardless of ordinal is named in the design but
/// intentionally left unwired here, matching the distillation: special
/// folders participate in the same ordinal/name comparison as any other
/// folder. [`FolderFlags::is_special`] exists for a future comparator to
/// consult.
pub struct FolderOrder;

impl FolderOrder {
    pub fn compare(a: &Folder, b: &Folder) -> Ordering {
        match (a.ordinal, b.ordinal) {
            (oa, ob) if oa >= 0 && ob >= 0 => oa
                .cmp(&ob)
                .then_with(|| crate::registry::normalize::normalize(&a.name).cmp(&crate::registry::normalize::normalize(&b.name))),
            (oa, _) if oa >= 0 => Ordering::Less,
            (_, ob) if ob >= 0 => Ordering::Greater,
            _ => crate::registry::normalize::normalize(&a.name).cmp(&crate::registry::normalize::normalize(&b.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: i64, ordinal: i64, name: &str) -> Folder {
        Folder {
            id,
            parent: Some(0),
            ordinal,
            name: name.to_string(),
            flags: FolderFlags::empty(),
        }
    }

    #[test]
    fn ordinal_folders_sort_before_unordered_ones() {
        let a = folder(1, 0, "Zeta");
        let b = folder(2, -1, "Alpha");
        assert_eq!(FolderOrder::compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn unordered_folders_sort_alphabetically_case_insensitive() {
        let a = folder(1, -1, "banana");
        let b = folder(2, -1, "Apple");
        assert_eq!(FolderOrder::compare(&a, &b), Ordering::Greater);
    }
}
