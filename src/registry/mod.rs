/*
 * mod.rs
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

//! SQLite-backed folder-tree registry (spec §4.4): one row per folder,
//! parent/ordinal/name/flags, loaded into an in-memory tree with a
//! recursive common table expression.

pub mod folder;
pub mod normalize;
pub mod virtualfolder;

use crate::error::{DbError, DbResult};
use folder::{Folder, FolderFlags, FolderOrder};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub struct FolderRegistry {
    conn: Connection,
}

impl FolderRegistry {
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS folders (
                id INTEGER PRIMARY KEY,
                parent_id INTEGER REFERENCES folders(id),
                ordinal INTEGER NOT NULL DEFAULT -1,
                name TEXT NOT NULL,
                flags INTEGER NOT NULL DEFAULT 0,
                UNIQUE(parent_id, name)
            );
            CREATE TABLE IF NOT EXISTS folder_properties (
                folder_id INTEGER NOT NULL REFERENCES folders(id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (folder_id, key)
            );",
        )?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE folders (
                id INTEGER PRIMARY KEY,
                parent_id INTEGER REFERENCES folders(id),
                ordinal INTEGER NOT NULL DEFAULT -1,
                name TEXT NOT NULL,
                flags INTEGER NOT NULL DEFAULT 0,
                UNIQUE(parent_id, name)
            );
            CREATE TABLE folder_properties (
                folder_id INTEGER NOT NULL REFERENCES folders(id),
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (folder_id, key)
            );",
        )?;
        Ok(Self { conn })
    }

    fn row_exists_with_name(&self, parent: Option<i64>, name: &str, exclude_id: Option<i64>) -> DbResult<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name FROM folders WHERE parent_id IS ?1 AND id IS NOT ?2",
        )?;
        let rows = stmt.query_map(params![parent, exclude_id], |r| {
            Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (_id, existing_name) = row?;
            if normalize::same_name(&existing_name, name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn create_folder(&mut self, parent: Option<i64>, name: &str, flags: FolderFlags) -> DbResult<i64> {
        if self.row_exists_with_name(parent, name, None)? {
            return Err(DbError::AlreadyExists);
        }
        self.conn.execute(
            "INSERT INTO folders (parent_id, ordinal, name, flags) VALUES (?1, -1, ?2, ?3)",
            params![parent, name, flags.bits()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_folder(&self, id: i64) -> DbResult<Folder> {
        self.conn
            .query_row(
                "SELECT id, parent_id, ordinal, name, flags FROM folders WHERE id = ?1",
                params![id],
                |r| {
                    Ok(Folder {
                        id: r.get(0)?,
                        parent: r.get(1)?,
                        ordinal: r.get(2)?,
                        name: r.get(3)?,
                        flags: FolderFlags::from_bits_truncate(r.get(4)?),
                    })
                },
            )
            .optional()?
            .ok_or(DbError::FolderMissing)
    }

    fn descendant_ids(&self, id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE sub(id) AS (
                SELECT id FROM folders WHERE parent_id = ?1
                UNION ALL
                SELECT f.id FROM folders f JOIN sub ON f.parent_id = sub.id
            ) SELECT id FROM sub",
        )?;
        let ids = stmt
            .query_map(params![id], |r| r.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Delete a folder and its entire subtree.
    pub fn delete_folder(&mut self, id: i64) -> DbResult<()> {
        let mut ids = self.descendant_ids(id)?;
        ids.push(id);
        let tx = self.conn.transaction()?;
        for fid in &ids {
            tx.execute("DELETE FROM folder_properties WHERE folder_id = ?1", params![fid])?;
            tx.execute("DELETE FROM folders WHERE id = ?1", params![fid])?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn rename(&mut self, id: i64, new_name: &str) -> DbResult<()> {
        let folder = self.get_folder(id)?;
        if self.row_exists_with_name(folder.parent, new_name, Some(id))? {
            return Err(DbError::AlreadyExists);
        }
        self.conn
            .execute("UPDATE folders SET name = ?1 WHERE id = ?2", params![new_name, id])?;
        Ok(())
    }

    pub fn move_folder(&mut self, id: i64, new_parent: Option<i64>) -> DbResult<()> {
        if let Some(np) = new_parent {
            if np == id || self.descendant_ids(id)?.contains(&np) {
                return Err(DbError::Failure);
            }
        }
        let folder = self.get_folder(id)?;
        if self.row_exists_with_name(new_parent, &folder.name, Some(id))? {
            return Err(DbError::AlreadyExists);
        }
        self.conn
            .execute("UPDATE folders SET parent_id = ?1 WHERE id = ?2", params![new_parent, id])?;
        Ok(())
    }

    pub fn set_ordinal(&mut self, id: i64, ordinal: i64) -> DbResult<()> {
        self.conn
            .execute("UPDATE folders SET ordinal = ?1 WHERE id = ?2", params![ordinal, id])?;
        Ok(())
    }

    pub fn set_folder_property(&mut self, id: i64, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO folder_properties (folder_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(folder_id, key) DO UPDATE SET value = excluded.value",
            params![id, key, value],
        )?;
        Ok(())
    }

    pub fn get_folder_property(&self, id: i64, key: &str) -> DbResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM folder_properties WHERE folder_id = ?1 AND key = ?2",
                params![id, key],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn children(&self, parent: Option<i64>) -> DbResult<Vec<Folder>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, parent_id, ordinal, name, flags FROM folders WHERE parent_id IS ?1")?;
        let mut rows = stmt
            .query_map(params![parent], |r| {
                Ok(Folder {
                    id: r.get(0)?,
                    parent: r.get(1)?,
                    ordinal: r.get(2)?,
                    name: r.get(3)?,
                    flags: FolderFlags::from_bits_truncate(r.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.sort_by(FolderOrder::compare);
        Ok(rows)
    }

    /// Load the whole tree rooted at `root` (`None` for the top-level
    /// accounts list), each level sorted with [`FolderOrder`], parents
    /// always preceding their children (spec §4.4).
    pub fn load_tree(&self, root: Option<i64>) -> DbResult<Vec<Folder>> {
        let mut out = Vec::new();
        self.load_tree_into(root, &mut out)?;
        Ok(out)
    }

    fn load_tree_into(&self, parent: Option<i64>, out: &mut Vec<Folder>) -> DbResult<()> {
        for folder in self.children(parent)? {
            let id = folder.id;
            out.push(folder);
            self.load_tree_into(Some(id), out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_load_tree_preserves_order() {
        let mut reg = FolderRegistry::open_in_memory().unwrap();
        let inbox = reg.create_folder(None, "Inbox", FolderFlags::INBOX).unwrap();
        reg.create_folder(Some(inbox), "Zeta", FolderFlags::empty()).unwrap();
        reg.create_folder(Some(inbox), "Alpha", FolderFlags::empty()).unwrap();
        let tree = reg.load_tree(None).unwrap();
        let names: Vec<&str> = tree.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Inbox", "Alpha", "Zeta"]);
    }

    #[test]
    fn duplicate_sibling_name_is_rejected() {
        let mut reg = FolderRegistry::open_in_memory().unwrap();
        reg.create_folder(None, "Inbox", FolderFlags::empty()).unwrap();
        let err = reg.create_folder(None, "inbox", FolderFlags::empty()).unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists));
    }

    #[test]
    fn delete_folder_removes_descendants() {
        let mut reg = FolderRegistry::open_in_memory().unwrap();
        let parent = reg.create_folder(None, "Parent", FolderFlags::empty()).unwrap();
        let child = reg.create_folder(Some(parent), "Child", FolderFlags::empty()).unwrap();
        reg.delete_folder(parent).unwrap();
        assert!(matches!(reg.get_folder(child).unwrap_err(), DbError::FolderMissing));
    }

    #[test]
    fn move_into_own_descendant_is_rejected() {
        let mut reg = FolderRegistry::open_in_memory().unwrap();
        let parent = reg.create_folder(None, "Parent", FolderFlags::empty()).unwrap();
        let child = reg.create_folder(Some(parent), "Child", FolderFlags::empty()).unwrap();
        let err = reg.move_folder(parent, Some(child)).unwrap_err();
        assert!(matches!(err, DbError::Failure));
    }

    #[test]
    fn folder_properties_round_trip() {
        let mut reg = FolderRegistry::open_in_memory().unwrap();
        let id = reg.create_folder(None, "Inbox", FolderFlags::empty()).unwrap();
        reg.set_folder_property(id, "retentionMode", "ByAge").unwrap();
        assert_eq!(
            reg.get_folder_property(id, "retentionMode").unwrap(),
            Some("ByAge".to_string())
        );
    }
}
