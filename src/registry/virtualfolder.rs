/*
 * virtualfolder.rs
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

//! Typed accessors over a virtual folder's search criteria (spec §3
//! Virtual Folder), stored as ordinary folder properties so the registry
//! schema needs no virtual-folder-specific columns.

use crate::error::DbResult;
use crate::registry::FolderRegistry;

const KEY_SEARCH_URIS: &str = "virtualFolder.searchUris";
const KEY_SEARCH_TERMS: &str = "virtualFolder.searchTerms";
const KEY_SEARCH_ONLINE: &str = "virtualFolder.searchOnline";

pub struct VirtualFolderWrapper<'a> {
    registry: &'a mut FolderRegistry,
    folder_id: i64,
}

impl<'a> VirtualFolderWrapper<'a> {
    pub fn new(registry: &'a mut FolderRegistry, folder_id: i64) -> Self {
        Self { registry, folder_id }
    }

    /// The pipe-delimited set of folder URIs this virtual folder searches.
    pub fn search_folder_uris(&self) -> DbResult<Vec<String>> {
        Ok(self
            .registry
            .get_folder_property(self.folder_id, KEY_SEARCH_URIS)?
            .map(|v| v.split('|').map(|s| s.to_string()).collect())
            .unwrap_or_default())
    }

    pub fn set_search_folder_uris(&mut self, uris: &[String]) -> DbResult<()> {
        self.registry
            .set_folder_property(self.folder_id, KEY_SEARCH_URIS, &uris.join("|"))
    }

    pub fn search_terms(&self) -> DbResult<Option<String>> {
        self.registry.get_folder_property(self.folder_id, KEY_SEARCH_TERMS)
    }

    pub fn set_search_terms(&mut self, terms: &str) -> DbResult<()> {
        self.registry.set_folder_property(self.folder_id, KEY_SEARCH_TERMS, terms)
    }

    pub fn search_online(&self) -> DbResult<bool> {
        Ok(self
            .registry
            .get_folder_property(self.folder_id, KEY_SEARCH_ONLINE)?
            .map(|v| v == "true")
            .unwrap_or(false))
    }

    pub fn set_search_online(&mut self, online: bool) -> DbResult<()> {
        self.registry
            .set_folder_property(self.folder_id, KEY_SEARCH_ONLINE, if online { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::folder::FolderFlags;

    #[test]
    fn search_uris_round_trip() {
        let mut reg = FolderRegistry::open_in_memory().unwrap();
        let id = reg.create_folder(None, "Big Inbox", FolderFlags::VIRTUAL).unwrap();
        let mut vf = VirtualFolderWrapper::new(&mut reg, id);
        vf.set_search_folder_uris(&["mailbox://u@h/Inbox".to_string(), "mailbox://u@h/Archive".to_string()])
            .unwrap();
        vf.set_search_online(true).unwrap();
        assert_eq!(
            vf.search_folder_uris().unwrap(),
            vec!["mailbox://u@h/Inbox".to_string(), "mailbox://u@h/Archive".to_string()]
        );
        assert!(vf.search_online().unwrap());
    }
}
