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

//! Cross-folder live-view query engine (spec §4.5): a shadow table of
//! indexed header attributes, queried with compiled filter terms, with
//! incremental match-change notification driven by the owning message
//! databases' listener buses.

pub mod filter;

use crate::error::DbResult;
use crate::msgdb::header::{Flags, MessageHeader, MessageKey};
use filter::{compile, FilterTerm};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

/// Column to order `select_messages` results by (spec §4.5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Subject,
    Sender,
    Flags,
}

impl SortColumn {
    fn column(self) -> &'static str {
        match self {
            SortColumn::Date => "date",
            SortColumn::Subject => "subject",
            SortColumn::Sender => "sender",
            SortColumn::Flags => "flags",
        }
    }
}

/// How a view's folder membership is determined (spec §3 Virtual Folder,
/// §4.5): a single folder, an explicit set (cross-account search), every
/// folder carrying a given tag, or a saved virtual folder's scope —
/// modeled the same way as "explicit set" once its URIs are resolved.
#[derive(Debug, Clone)]
pub enum ViewScope {
    SingleFolder(u64),
    FolderSet(Vec<u64>),
    AllFolders,
}

/// Register the `TAGS_INCLUDE`/`TAGS_EXCLUDE` application-supplied SQL
/// functions (spec §4.5.1): whole-token membership tests against a
/// space-separated tag column, so a tag of `urgent` does not match a
/// search for `urg` or get matched by a tag of `urgently`.
fn register_tag_functions(conn: &Connection) -> DbResult<()> {
    conn.create_scalar_function(
        "TAGS_INCLUDE",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let tags = ctx.get::<String>(0)?;
            let value = ctx.get::<String>(1)?;
            Ok(tags.split_whitespace().any(|t| t == value))
        },
    )?;
    conn.create_scalar_function(
        "TAGS_EXCLUDE",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let tags = ctx.get::<String>(0)?;
            let value = ctx.get::<String>(1)?;
            Ok(!tags.split_whitespace().any(|t| t == value))
        },
    )?;
    Ok(())
}

pub trait MatchChangeListener {
    fn on_match_added(&self, key: MessageKey) {
        let _ = key;
    }
    fn on_match_removed(&self, key: MessageKey) {
        let _ = key;
    }
}

/// A live, cross-folder query over indexed header attributes.
pub struct LiveView {
    conn: Connection,
    scope: ViewScope,
    terms: Vec<FilterTerm>,
    last_match_set: HashSet<u32>,
    listeners: Vec<Weak<dyn MatchChangeListener>>,
}

impl LiveView {
    pub fn new(scope: ViewScope, terms: Vec<FilterTerm>) -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE messages (
                msg_key INTEGER PRIMARY KEY,
                folder_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                sender TEXT NOT NULL,
                recipients TEXT NOT NULL,
                date INTEGER NOT NULL,
                flags INTEGER NOT NULL,
                tags TEXT NOT NULL
            )",
        )?;
        register_tag_functions(&conn)?;
        Ok(Self {
            conn,
            scope,
            terms,
            last_match_set: HashSet::new(),
            listeners: Vec::new(),
        })
    }

    pub fn add_match_listener(&mut self, listener: &Rc<dyn MatchChangeListener>) {
        self.listeners.push(Rc::downgrade(listener));
    }

    fn in_scope(&self, folder_id: u64) -> bool {
        match &self.scope {
            ViewScope::SingleFolder(f) => *f == folder_id,
            ViewScope::FolderSet(fs) => fs.contains(&folder_id),
            ViewScope::AllFolders => true,
        }
    }

    /// Index (or reindex) a header's attributes. Called by whatever owns
    /// the underlying message databases in response to `on_hdr_added`,
    /// `on_hdr_flags_changed`, etc. (spec §4.5 incremental update).
    pub fn index_header(&mut self, folder_id: u64, hdr: &MessageHeader) -> DbResult<()> {
        if !self.in_scope(folder_id) {
            return Ok(());
        }
        self.conn.execute(
            "INSERT INTO messages (msg_key, folder_id, subject, sender, recipients, date, flags, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(msg_key) DO UPDATE SET
                subject = excluded.subject, sender = excluded.sender,
                recipients = excluded.recipients, date = excluded.date,
                flags = excluded.flags, tags = excluded.tags",
            params![
                hdr.key.0,
                folder_id as i64,
                hdr.subject,
                hdr.sender,
                hdr.recipients,
                hdr.date,
                hdr.flags.bits(),
                hdr.tags.join(" "),
            ],
        )?;
        self.recompute_match_change(hdr.key)?;
        Ok(())
    }

    pub fn remove_header(&mut self, key: MessageKey) -> DbResult<()> {
        self.conn.execute("DELETE FROM messages WHERE msg_key = ?1", params![key.0])?;
        if self.last_match_set.remove(&key.0) {
            self.notify_removed(key);
        }
        Ok(())
    }

    fn recompute_match_change(&mut self, key: MessageKey) -> DbResult<()> {
        let matches = self.row_matches(key)?;
        let was_match = self.last_match_set.contains(&key.0);
        if matches && !was_match {
            self.last_match_set.insert(key.0);
            self.notify_added(key);
        } else if !matches && was_match {
            self.last_match_set.remove(&key.0);
            self.notify_removed(key);
        }
        Ok(())
    }

    fn row_matches(&self, key: MessageKey) -> DbResult<bool> {
        let compiled = compile(&self.terms);
        let sql = if compiled.sql.is_empty() {
            "SELECT 1 FROM messages WHERE msg_key = ?1".to_string()
        } else {
            format!("SELECT 1 FROM messages WHERE msg_key = ?1 AND ({})", compiled.sql)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(key.0)];
        for p in &compiled.params {
            all_params.push(Box::new(p.clone()));
        }
        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|b| b.as_ref()).collect();
        Ok(stmt.exists(param_refs.as_slice())?)
    }

    fn notify_added(&self, key: MessageKey) {
        for l in self.listeners.iter().filter_map(|w| w.upgrade()) {
            l.on_match_added(key);
        }
    }

    fn notify_removed(&self, key: MessageKey) {
        for l in self.listeners.iter().filter_map(|w| w.upgrade()) {
            l.on_match_removed(key);
        }
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let compiled = compile(&self.terms);
        if compiled.sql.is_empty() {
            (String::new(), Vec::new())
        } else {
            (format!("WHERE {}", compiled.sql), compiled.params)
        }
    }

    /// Total matching messages. Recomputed on demand, not incrementally
    /// tracked, per spec §4.5.
    pub fn count_messages(&self) -> DbResult<u64> {
        let (where_sql, params) = self.where_clause();
        let sql = format!("SELECT COUNT(*) FROM messages {}", where_sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
        Ok(stmt.query_row(param_refs.as_slice(), |r| r.get::<_, i64>(0))? as u64)
    }

    pub fn count_unread_messages(&self) -> DbResult<u64> {
        let (where_sql, params) = self.where_clause();
        let read_bit = Flags::READ.bits();
        let sql = if where_sql.is_empty() {
            format!("SELECT COUNT(*) FROM messages WHERE (flags & {}) = 0", read_bit)
        } else {
            format!("SELECT COUNT(*) FROM messages {} AND (flags & {}) = 0", where_sql, read_bit)
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
        Ok(stmt.query_row(param_refs.as_slice(), |r| r.get::<_, i64>(0))? as u64)
    }

    /// Matching messages, ordered by `sort_column` (descending-date by
    /// default satisfies spec §8 invariant 5), with an optional
    /// `limit`/`offset` page window (spec §4.5.2's `SelectMessages`).
    pub fn select_messages(
        &self,
        sort_column: SortColumn,
        descending: bool,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> DbResult<Vec<MessageKey>> {
        let (where_sql, params) = self.where_clause();
        let mut sql = format!(
            "SELECT msg_key FROM messages {} ORDER BY {} {}",
            where_sql,
            sort_column.column(),
            if descending { "DESC" } else { "ASC" }
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        } else if let Some(offset) = offset {
            // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
            sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p as &dyn rusqlite::ToSql).collect();
        let keys = stmt
            .query_map(param_refs.as_slice(), |r| r.get::<_, u32>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys.into_iter().map(MessageKey).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liveview::filter::{Attribute, Join, Operator};
    use std::cell::RefCell;

    fn hdr(key: u32, folder: u64, subject: &str, date: i64, read: bool) -> MessageHeader {
        let mut h = MessageHeader::new(MessageKey(key), folder);
        h.subject = subject.to_string();
        h.date = date;
        h.sender = "a@x".to_string();
        if read {
            h.flags.insert(Flags::READ);
        }
        h
    }

    #[test]
    fn select_messages_orders_newest_first() {
        let mut view = LiveView::new(ViewScope::AllFolders, vec![]).unwrap();
        view.index_header(1, &hdr(1, 1, "A", 10, false)).unwrap();
        view.index_header(1, &hdr(2, 1, "B", 30, false)).unwrap();
        view.index_header(1, &hdr(3, 1, "C", 20, false)).unwrap();
        let keys: Vec<u32> = view
            .select_messages(SortColumn::Date, true, None, None)
            .unwrap()
            .into_iter()
            .map(|k| k.0)
            .collect();
        assert_eq!(keys, vec![2, 3, 1]);
    }

    #[test]
    fn select_messages_respects_limit_and_offset() {
        let mut view = LiveView::new(ViewScope::AllFolders, vec![]).unwrap();
        view.index_header(1, &hdr(1, 1, "A", 10, false)).unwrap();
        view.index_header(1, &hdr(2, 1, "B", 30, false)).unwrap();
        view.index_header(1, &hdr(3, 1, "C", 20, false)).unwrap();
        let keys: Vec<u32> = view
            .select_messages(SortColumn::Date, true, Some(1), Some(1))
            .unwrap()
            .into_iter()
            .map(|k| k.0)
            .collect();
        assert_eq!(keys, vec![3]);
    }

    #[test]
    fn select_messages_sorts_ascending_by_subject() {
        let mut view = LiveView::new(ViewScope::AllFolders, vec![]).unwrap();
        view.index_header(1, &hdr(1, 1, "Charlie", 10, false)).unwrap();
        view.index_header(1, &hdr(2, 1, "Alpha", 30, false)).unwrap();
        view.index_header(1, &hdr(3, 1, "Bravo", 20, false)).unwrap();
        let keys: Vec<u32> = view
            .select_messages(SortColumn::Subject, false, None, None)
            .unwrap()
            .into_iter()
            .map(|k| k.0)
            .collect();
        assert_eq!(keys, vec![2, 3, 1]);
    }

    #[test]
    fn tags_include_matches_whole_token_only() {
        let terms = vec![FilterTerm {
            join: Join::And,
            attribute: Attribute::Tags,
            operator: Operator::TagsInclude,
            value: "urgent".to_string(),
        }];
        let mut view = LiveView::new(ViewScope::AllFolders, terms).unwrap();
        let mut a = hdr(1, 1, "A", 10, false);
        a.tags = vec!["urgent".to_string()];
        let mut b = hdr(2, 1, "B", 20, false);
        b.tags = vec!["urgently".to_string()];
        view.index_header(1, &a).unwrap();
        view.index_header(1, &b).unwrap();
        assert_eq!(view.count_messages().unwrap(), 1);
    }

    #[test]
    fn count_unread_respects_filter_and_read_flag() {
        let terms = vec![FilterTerm {
            join: Join::And,
            attribute: Attribute::Subject,
            operator: Operator::Contains,
            value: "invoice".to_string(),
        }];
        let mut view = LiveView::new(ViewScope::AllFolders, terms).unwrap();
        view.index_header(1, &hdr(1, 1, "Invoice #1", 10, false)).unwrap();
        view.index_header(1, &hdr(2, 1, "Invoice #2", 20, true)).unwrap();
        view.index_header(1, &hdr(3, 1, "Unrelated", 30, false)).unwrap();
        assert_eq!(view.count_messages().unwrap(), 2);
        assert_eq!(view.count_unread_messages().unwrap(), 1);
    }

    #[test]
    fn single_folder_scope_excludes_other_folders() {
        let mut view = LiveView::new(ViewScope::SingleFolder(1), vec![]).unwrap();
        view.index_header(1, &hdr(1, 1, "A", 10, false)).unwrap();
        view.index_header(2, &hdr(2, 2, "B", 20, false)).unwrap();
        assert_eq!(view.count_messages().unwrap(), 1);
    }

    #[test]
    fn match_change_notifications_fire_on_transition() {
        struct Recorder {
            added: RefCell<Vec<u32>>,
            removed: RefCell<Vec<u32>>,
        }
        impl MatchChangeListener for Recorder {
            fn on_match_added(&self, key: MessageKey) {
                self.added.borrow_mut().push(key.0);
            }
            fn on_match_removed(&self, key: MessageKey) {
                self.removed.borrow_mut().push(key.0);
            }
        }
        let terms = vec![FilterTerm {
            join: Join::And,
            attribute: Attribute::Flags,
            operator: Operator::Is,
            value: "0".to_string(),
        }];
        let mut view = LiveView::new(ViewScope::AllFolders, terms).unwrap();
        let recorder = Rc::new(Recorder {
            added: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
        });
        let listener: Rc<dyn MatchChangeListener> = recorder.clone();
        view.add_match_listener(&listener);

        view.index_header(1, &hdr(1, 1, "A", 10, false)).unwrap();
        view.index_header(1, &hdr(1, 1, "A", 10, true)).unwrap();

        assert_eq!(*recorder.added.borrow(), vec![1]);
        assert_eq!(*recorder.removed.borrow(), vec![1]);
    }
}
