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

//! Per-folder message summary database (spec §4.2): headers, threads,
//! caches, the new-message set and change notification, all sitting on
//! top of a [`crate::rowstore::RowStore`].

pub mod cache;
pub mod enumerator;
pub mod header;
pub mod listener;
pub mod newset;
pub mod thread;
pub mod threading;
pub mod virtualcache;

use crate::config::{ThreadingPreferences, COMPRESS_WASTE_THRESHOLD, DEFAULT_HIT_CACHE_SIZE};
use crate::error::{DbError, DbResult};
use crate::rowstore::row::{CellValue, Row};
use crate::rowstore::token::Token;
use crate::rowstore::{CommitKind, RowStore};
use cache::{HeaderHandle, HitCache, UseCache};
use enumerator::MessageEnumerator;
use header::{Flags, MessageHeader, MessageKey, Priority, StoreToken};
use listener::{DbListener, ListenerSet};
use newset::NewSet;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use thread::Thread;

const ALL_MESSAGES_TABLE: &str = "all-messages";

/// The fixed set of row-store tokens a message header is mapped to.
/// Interned once at open, so lookups are a `HashMap` hit rather than a
/// string compare per cell (spec §4.1).
struct Tokens {
    message_id: Token,
    thread_id: Token,
    thread_parent: Token,
    date: Token,
    sender: Token,
    recipients: Token,
    cc_list: Token,
    bcc_list: Token,
    subject: Token,
    flags: Token,
    tags: Token,
    message_size: Token,
    line_count: Token,
    offline_message_size: Token,
    store_token: Token,
    charset: Token,
    priority: Token,
    label: Token,
    references: Token,
}

impl Tokens {
    fn intern(store: &mut RowStore) -> Self {
        Self {
            message_id: store.intern("message-id"),
            thread_id: store.intern("thread-id"),
            thread_parent: store.intern("thread-parent"),
            date: store.intern("date"),
            sender: store.intern("sender"),
            recipients: store.intern("recipients"),
            cc_list: store.intern("cc"),
            bcc_list: store.intern("bcc"),
            subject: store.intern("subject"),
            flags: store.intern("flags"),
            tags: store.intern("tags"),
            message_size: store.intern("message-size"),
            line_count: store.intern("line-count"),
            offline_message_size: store.intern("offline-message-size"),
            store_token: store.intern("store-token"),
            charset: store.intern("charset"),
            priority: store.intern("priority"),
            label: store.intern("label"),
            references: store.intern("references"),
        }
    }
}

fn priority_to_num(p: Priority) -> u64 {
    match p {
        Priority::Lowest => 0,
        Priority::Low => 1,
        Priority::Normal => 2,
        Priority::High => 3,
        Priority::Highest => 4,
    }
}

fn priority_from_num(n: u64) -> Priority {
    match n {
        0 => Priority::Lowest,
        1 => Priority::Low,
        3 => Priority::High,
        4 => Priority::Highest,
        _ => Priority::Normal,
    }
}

fn store_token_to_string(t: &StoreToken) -> String {
    match t {
        StoreToken::Offset(n) => format!("offset:{}", n),
        StoreToken::Uid(n) => format!("uid:{}", n),
        StoreToken::Opaque(s) => format!("opaque:{}", s),
    }
}

fn store_token_from_string(s: &str) -> Option<StoreToken> {
    let (kind, rest) = s.split_once(':')?;
    match kind {
        "offset" => rest.parse().ok().map(StoreToken::Offset),
        "uid" => rest.parse().ok().map(StoreToken::Uid),
        "opaque" => Some(StoreToken::Opaque(rest.to_string())),
        _ => None,
    }
}

fn header_to_row(tokens: &Tokens, hdr: &MessageHeader) -> Row {
    let mut row = Row::new(hdr.key.0);
    row.set(tokens.message_id, CellValue::str(hdr.message_id.clone()));
    row.set(tokens.thread_id, CellValue::Num(hdr.thread_id.0 as u64));
    if let Some(p) = hdr.thread_parent {
        row.set(tokens.thread_parent, CellValue::Num(p.0 as u64));
    }
    row.set(tokens.date, CellValue::Num(hdr.date as u64));
    row.set(tokens.sender, CellValue::str(hdr.sender.clone()));
    row.set(tokens.recipients, CellValue::str(hdr.recipients.clone()));
    row.set(tokens.cc_list, CellValue::str(hdr.cc_list.clone()));
    row.set(tokens.bcc_list, CellValue::str(hdr.bcc_list.clone()));
    row.set(tokens.subject, CellValue::str(hdr.subject.clone()));
    row.set(tokens.flags, CellValue::Num(hdr.flags.bits() as u64));
    row.set(tokens.tags, CellValue::str(hdr.tags.join(" ")));
    row.set(tokens.message_size, CellValue::Num(hdr.message_size as u64));
    row.set(tokens.line_count, CellValue::Num(hdr.line_count as u64));
    row.set(
        tokens.offline_message_size,
        CellValue::Num(hdr.offline_message_size as u64),
    );
    if let Some(st) = &hdr.store_token {
        row.set(tokens.store_token, CellValue::str(store_token_to_string(st)));
    }
    if let Some(cs) = &hdr.charset {
        row.set(tokens.charset, CellValue::str(cs.clone()));
    }
    row.set(tokens.priority, CellValue::Num(priority_to_num(hdr.priority)));
    row.set(tokens.label, CellValue::Num(hdr.label as u64));
    row.set(tokens.references, CellValue::str(hdr.references.join("\x1f")));
    row
}

fn row_to_header(tokens: &Tokens, row: &Row, folder_id: u64) -> MessageHeader {
    let key = MessageKey(row.oid);
    let mut hdr = MessageHeader::new(key, folder_id);
    if let Some(v) = row.get(tokens.message_id).and_then(|c| c.as_str()) {
        hdr.message_id = v.to_string();
    }
    if let Some(n) = row.get(tokens.thread_id).and_then(|c| c.as_num()) {
        hdr.thread_id = MessageKey(n as u32);
    }
    hdr.thread_parent = row
        .get(tokens.thread_parent)
        .and_then(|c| c.as_num())
        .map(|n| MessageKey(n as u32));
    if let Some(n) = row.get(tokens.date).and_then(|c| c.as_num()) {
        hdr.date = n as i64;
    }
    if let Some(v) = row.get(tokens.sender).and_then(|c| c.as_str()) {
        hdr.sender = v.to_string();
    }
    if let Some(v) = row.get(tokens.recipients).and_then(|c| c.as_str()) {
        hdr.recipients = v.to_string();
    }
    if let Some(v) = row.get(tokens.cc_list).and_then(|c| c.as_str()) {
        hdr.cc_list = v.to_string();
    }
    if let Some(v) = row.get(tokens.bcc_list).and_then(|c| c.as_str()) {
        hdr.bcc_list = v.to_string();
    }
    if let Some(v) = row.get(tokens.subject).and_then(|c| c.as_str()) {
        hdr.subject = v.to_string();
    }
    if let Some(n) = row.get(tokens.flags).and_then(|c| c.as_num()) {
        hdr.flags = Flags::from_bits_truncate(n as u32);
    }
    if let Some(v) = row.get(tokens.tags).and_then(|c| c.as_str()) {
        hdr.tags = if v.is_empty() {
            Vec::new()
        } else {
            v.split_whitespace().map(|s| s.to_string()).collect()
        };
    }
    if let Some(n) = row.get(tokens.message_size).and_then(|c| c.as_num()) {
        hdr.message_size = n as u32;
    }
    if let Some(n) = row.get(tokens.line_count).and_then(|c| c.as_num()) {
        hdr.line_count = n as u32;
    }
    if let Some(n) = row.get(tokens.offline_message_size).and_then(|c| c.as_num()) {
        hdr.offline_message_size = n as u32;
    }
    hdr.store_token = row
        .get(tokens.store_token)
        .and_then(|c| c.as_str())
        .and_then(store_token_from_string);
    hdr.charset = row.get(tokens.charset).and_then(|c| c.as_str()).map(|s| s.to_string());
    if let Some(n) = row.get(tokens.priority).and_then(|c| c.as_num()) {
        hdr.priority = priority_from_num(n);
    }
    if let Some(n) = row.get(tokens.label).and_then(|c| c.as_num()) {
        hdr.label = n as u8;
    }
    if let Some(v) = row.get(tokens.references).and_then(|c| c.as_str()) {
        hdr.references = if v.is_empty() {
            Vec::new()
        } else {
            v.split('\x1f').map(|s| s.to_string()).collect()
        };
    }
    hdr
}

/// A single folder's message summary database: the live, in-memory view
/// over a `.msf` row store plus everything needed to thread, cache and
/// notify listeners about its contents.
pub struct MessageDatabase {
    store: RowStore,
    tokens: Tokens,
    folder_id: u64,
    use_cache: UseCache,
    hit_cache: HitCache,
    listeners: ListenerSet,
    new_set: NewSet,
    pub virtual_cache: virtualcache::VirtualFolderCache,
    threads: HashMap<MessageKey, Thread>,
    message_id_index: HashMap<String, MessageKey>,
    generation: Rc<Cell<u64>>,
    pub threading_prefs: ThreadingPreferences,
    force_reparse: bool,
}

impl MessageDatabase {
    /// Open (or create) the summary file at `path` for folder `folder_id`,
    /// rebuilding the thread map and Message-ID index from the persisted
    /// rows (spec §4.2.1, §4.2.2).
    pub fn open(path: impl AsRef<Path>, folder_id: u64, create: bool) -> DbResult<Self> {
        let mut store = RowStore::open(path, create)?;
        let tokens = Tokens::intern(&mut store);
        let mut db = Self {
            store,
            tokens,
            folder_id,
            use_cache: UseCache::default(),
            hit_cache: HitCache::new(DEFAULT_HIT_CACHE_SIZE),
            listeners: ListenerSet::new(),
            new_set: NewSet::new(),
            virtual_cache: virtualcache::VirtualFolderCache::new(),
            threads: HashMap::new(),
            message_id_index: HashMap::new(),
            generation: Rc::new(Cell::new(0)),
            threading_prefs: ThreadingPreferences::default(),
            force_reparse: false,
        };
        db.rebuild_indices();
        tracing::debug!(folder_id, "message database opened");
        Ok(db)
    }

    fn rebuild_indices(&mut self) {
        self.threads.clear();
        self.message_id_index.clear();
        let Some(table) = self.store.table(ALL_MESSAGES_TABLE) else {
            return;
        };
        for row in table.iter_oid_order() {
            let hdr = row_to_header(&self.tokens, row, self.folder_id);
            self.message_id_index.insert(hdr.message_id.clone(), hdr.key);
            let thread = self
                .threads
                .entry(hdr.thread_id)
                .or_insert_with(|| Thread::new(hdr.thread_id));
            if !thread.children.contains(&hdr.key) {
                thread.children.push(hdr.key);
            }
            if hdr.date > thread.newest_msg_date {
                thread.newest_msg_date = hdr.date;
                thread.subject = threading::strip_re(&hdr.subject);
            }
        }
    }

    pub fn add_listener(&mut self, listener: &Rc<dyn DbListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&mut self, listener: &Rc<dyn DbListener>) {
        self.listeners.remove(listener);
    }

    /// Allocate a fresh key and an empty, uncommitted header object for
    /// the caller to populate before calling [`Self::add_new_hdr_to_db`]
    /// (spec §4.2.4 `CreateNewHdr`). Once the next key would force a
    /// reparse (spec §3.2, §8 S6), the folder's key space is considered
    /// exhausted and this returns `SummaryOutOfDate` instead; the caller
    /// is expected to rebuild the summary from the server/store rather
    /// than continue appending.
    pub fn create_msg_hdr(&mut self) -> DbResult<HeaderHandle> {
        let table = self.store.table_mut(ALL_MESSAGES_TABLE);
        let oid = table.next_oid();
        let key = MessageKey(oid);
        if key.forces_reparse() {
            self.force_reparse = true;
            return Err(DbError::SummaryOutOfDate);
        }
        let handle = Rc::new(RefCell::new(MessageHeader::new(key, self.folder_id)));
        handle.borrow_mut().thread_id = key;
        Ok(handle)
    }

    /// Whether a prior `CreateMsgHdr` call hit the forced-reparse key
    /// threshold. The owning folder is responsible for persisting this
    /// as its `forceReparse` property (spec §8 S6); this crate's registry
    /// stores arbitrary folder properties but does not itself own the
    /// wiring between the two.
    pub fn force_reparse_needed(&self) -> bool {
        self.force_reparse
    }

    /// Thread, persist and index a newly populated header (spec §4.2.4,
    /// §4.3). The header's `thread_id`/`thread_parent` are overwritten by
    /// the threading decision.
    pub fn add_new_hdr_to_db(&mut self, handle: HeaderHandle, as_new: bool) -> DbResult<()> {
        let key = handle.borrow().key;
        let message_id = handle.borrow().message_id.clone();
        let references = handle.borrow().references.clone();
        let subject = handle.borrow().subject.clone();
        let has_re = handle.borrow().flags.contains(Flags::HAS_RE);

        let message_id_index = &self.message_id_index;
        let threads = &self.threads;
        let decision = threading::decide(
            key,
            &message_id,
            &references,
            &subject,
            has_re,
            self.threading_prefs,
            |mid| {
                message_id_index
                    .get(mid)
                    .and_then(|k| threads.values().find(|t| t.contains(*k)).map(|t| (*k, t.thread_key)))
            },
            |stripped| {
                threads
                    .values()
                    .find(|t| t.subject == stripped)
                    .map(|t| t.thread_key)
            },
            |_new_mid| None, // reverse-reference threading needs a second pass once the header exists in the index; see below.
        );

        let (thread_id, thread_parent) = match decision {
            threading::ThreadDecision::AttachTo { thread_id, parent } => (thread_id, Some(parent)),
            threading::ThreadDecision::BecomeParentOf { thread_id } => (thread_id, None),
            threading::ThreadDecision::NewThread => (key.thread_key_for_root(), None),
        };
        {
            let mut hdr = handle.borrow_mut();
            hdr.thread_id = thread_id;
            hdr.thread_parent = thread_parent;
        }

        // Reverse-reference threading (spec §4.3 step 3): does any existing
        // header list this message's id in its references? If so, adopt
        // that header's thread and become its new parent.
        if self.threading_prefs.correct_threading {
            if let Some(child_key) = self.find_header_referencing(&message_id) {
                if let Some(child_thread) = self.threads.values().find(|t| t.contains(child_key)).map(|t| t.thread_key) {
                    let mut hdr = handle.borrow_mut();
                    hdr.thread_id = child_thread;
                    hdr.thread_parent = None;
                }
            }
        }

        let thread_id = handle.borrow().thread_id;
        let thread_parent = handle.borrow().thread_parent;
        let thread = self.threads.entry(thread_id).or_insert_with(|| Thread::new(thread_id));
        thread.children.push(key);
        let date = handle.borrow().date;
        if date > thread.newest_msg_date {
            thread.newest_msg_date = date;
        }
        if thread.subject.is_empty() {
            thread.subject = threading::strip_re(&handle.borrow().subject);
        }

        self.message_id_index.insert(message_id, key);
        self.use_cache.insert(key, handle.clone());
        if let Some(evicted) = self.hit_cache.touch(key) {
            self.use_cache.remove(evicted);
        }
        if as_new {
            self.new_set.add(key);
        }

        let row = header_to_row(&self.tokens, &handle.borrow());
        self.store.table_mut(ALL_MESSAGES_TABLE).insert(row);

        self.listeners.dispatch_added(key, thread_parent, handle.borrow().flags);
        Ok(())
    }

    fn find_header_referencing(&self, message_id: &str) -> Option<MessageKey> {
        let table = self.store.table(ALL_MESSAGES_TABLE)?;
        for row in table.iter_oid_order() {
            if let Some(refs) = row.get(self.tokens.references).and_then(|c| c.as_str()) {
                if refs.split('\x1f').any(|r| r == message_id) {
                    return Some(MessageKey(row.oid));
                }
            }
        }
        None
    }

    /// Remove a header, repairing its thread: children are reparented to
    /// the deleted message's own parent (promoted to root if it had none),
    /// and an emptied thread is dropped entirely (spec §4.2.2).
    pub fn delete_header(&mut self, key: MessageKey) -> DbResult<()> {
        let table = self.store.table_mut(ALL_MESSAGES_TABLE);
        let row = table.remove(key.0).ok_or(DbError::MessageNotFound)?;
        let mut hdr = row_to_header(&self.tokens, &row, self.folder_id);
        hdr.flags.insert(Flags::EXPUNGED);

        if let Some(thread) = self.threads.get_mut(&hdr.thread_id) {
            thread.remove_child(key);
            // Reparent any header that pointed at the deleted one.
            self.reparent_children_of(key, hdr.thread_parent);
            if self.threads[&hdr.thread_id].children.is_empty() {
                self.threads.remove(&hdr.thread_id);
            }
        }
        self.message_id_index.remove(&hdr.message_id);
        self.use_cache.remove(key);
        self.hit_cache.remove(key);
        self.new_set.remove(key);

        self.listeners.dispatch_deleted(key, hdr.flags, hdr.thread_parent);
        Ok(())
    }

    fn reparent_children_of(&mut self, deleted: MessageKey, new_parent: Option<MessageKey>) {
        let table = self.store.table_mut(ALL_MESSAGES_TABLE);
        let child_oids: Vec<u32> = table
            .iter_oid_order()
            .filter(|r| {
                r.get(self.tokens.thread_parent)
                    .and_then(|c| c.as_num())
                    .map(|n| n as u32 == deleted.0)
                    .unwrap_or(false)
            })
            .map(|r| r.oid)
            .collect();
        for oid in child_oids {
            if let Some(row) = table.get_mut(oid) {
                match new_parent {
                    Some(p) => row.set(self.tokens.thread_parent, CellValue::Num(p.0 as u64)),
                    None => {
                        row.remove(self.tokens.thread_parent);
                    }
                }
            }
            if let Some(handle) = self.use_cache.get(MessageKey(oid)) {
                handle.borrow_mut().thread_parent = new_parent;
            }
        }
    }

    /// Copy header fields from an existing header into a freshly created
    /// one in this database (spec §4.2.4 `CopyHdrFromExistingHdr`), used
    /// when moving or copying a message between folders.
    pub fn copy_hdr_from_existing_hdr(&mut self, source: &MessageHeader) -> DbResult<HeaderHandle> {
        let handle = self.create_msg_hdr()?;
        {
            let key = handle.borrow().key;
            let mut hdr = handle.borrow_mut();
            let folder_id = hdr.folder_id;
            *hdr = source.clone();
            hdr.key = key;
            hdr.folder_id = folder_id;
            hdr.thread_id = key;
            hdr.thread_parent = None;
        }
        Ok(handle)
    }

    pub fn get_msg_hdr_for_key(&mut self, key: MessageKey) -> DbResult<HeaderHandle> {
        if let Some(handle) = self.use_cache.get(key) {
            if let Some(evicted) = self.hit_cache.touch(key) {
                self.use_cache.remove(evicted);
            }
            return Ok(handle);
        }
        let row = self
            .store
            .table(ALL_MESSAGES_TABLE)
            .and_then(|t| t.get(key.0))
            .ok_or(DbError::MessageNotFound)?;
        let hdr = row_to_header(&self.tokens, row, self.folder_id);
        let handle: HeaderHandle = Rc::new(RefCell::new(hdr));
        self.use_cache.insert(key, handle.clone());
        if let Some(evicted) = self.hit_cache.touch(key) {
            self.use_cache.remove(evicted);
        }
        Ok(handle)
    }

    pub fn get_msg_hdr_for_message_id(&mut self, message_id: &str) -> DbResult<HeaderHandle> {
        let key = *self
            .message_id_index
            .get(message_id)
            .ok_or(DbError::MessageNotFound)?;
        self.get_msg_hdr_for_key(key)
    }

    fn all_keys_oid_order(&self) -> Vec<MessageKey> {
        self.store
            .table(ALL_MESSAGES_TABLE)
            .map(|t| t.iter_oid_order().map(|r| MessageKey(r.oid)).collect())
            .unwrap_or_default()
    }

    /// All keys currently in the folder, in row-store (oid) order. Used
    /// by the retention/purge pass to select candidates without paying
    /// for full header deserialization up front.
    pub fn enumerate_all_for_retention(&self) -> Vec<MessageKey> {
        self.all_keys_oid_order()
    }

    /// A header's date without touching the use cache or hit cache.
    pub fn header_date(&self, key: MessageKey) -> Option<i64> {
        self.store
            .table(ALL_MESSAGES_TABLE)?
            .get(key.0)
            .and_then(|r| r.get(self.tokens.date))
            .and_then(|c| c.as_num())
            .map(|n| n as i64)
    }

    /// The highest key assigned so far in this folder, as 8-digit hex
    /// (the same encoding the row store persists keys in). A debug
    /// accessor for inspecting how close a folder is to the forced-reparse
    /// threshold without reconstructing a `MessageKey`.
    pub fn high_water_key_hex(&self) -> String {
        let next = self.store.table(ALL_MESSAGES_TABLE).map(|t| t.next_oid()).unwrap_or(1);
        format!("{:08x}", next.saturating_sub(1))
    }

    pub fn enumerate_messages(&self) -> MessageEnumerator {
        MessageEnumerator::new_forward(self.all_keys_oid_order(), self.generation.clone())
    }

    pub fn reverse_enumerate_messages(&self) -> MessageEnumerator {
        MessageEnumerator::new_reverse(self.all_keys_oid_order(), self.generation.clone())
    }

    fn set_flag(&mut self, key: MessageKey, flag: Flags, value: bool) -> DbResult<()> {
        let handle = self.get_msg_hdr_for_key(key)?;
        let old = handle.borrow().flags;
        let mut new = old;
        new.set(flag, value);
        if new == old {
            return Ok(());
        }
        handle.borrow_mut().flags = new;
        if let Some(row) = self.store.table_mut(ALL_MESSAGES_TABLE).get_mut(key.0) {
            row.set(self.tokens.flags, CellValue::Num(new.bits() as u64));
        }
        self.listeners.dispatch_flags_changed(key, old, new);
        if flag == Flags::READ {
            self.listeners.dispatch_read_changed(key);
        }
        Ok(())
    }

    pub fn mark_read(&mut self, key: MessageKey, read: bool) -> DbResult<()> {
        self.set_flag(key, Flags::READ, read)
    }

    pub fn mark_marked(&mut self, key: MessageKey, marked: bool) -> DbResult<()> {
        self.set_flag(key, Flags::MARKED, marked)
    }

    pub fn mark_has_attachment(&mut self, key: MessageKey, has_attachment: bool) -> DbResult<()> {
        self.set_flag(key, Flags::HAS_ATTACHMENT, has_attachment)
    }

    pub fn mark_hdr_not_new(&mut self, key: MessageKey) {
        self.new_set.remove(key);
        if let Ok(handle) = self.get_msg_hdr_for_key(key) {
            handle.borrow_mut().flags.remove(Flags::NEW);
        }
    }

    /// Mark every currently-unread message read; idempotent (spec §8
    /// invariant 8). Returns the keys actually changed.
    pub fn mark_all_read(&mut self) -> DbResult<Vec<MessageKey>> {
        let keys = self.all_keys_oid_order();
        let mut changed = Vec::new();
        for key in keys {
            let handle = self.get_msg_hdr_for_key(key)?;
            if !handle.borrow().is_read() {
                self.mark_read(key, true)?;
                changed.push(key);
            }
        }
        Ok(changed)
    }

    /// Two-phase string property update (spec §4.2.4, §4.2.5): every
    /// listener's pre-change hook runs, then the value is applied once,
    /// then every listener's post-change hook runs with its own status.
    pub fn set_string_property(&mut self, key: MessageKey, name: &str, value: &str) -> DbResult<()> {
        let handle = self.get_msg_hdr_for_key(key)?;
        let name_owned = name.to_string();
        let value_owned = value.to_string();
        self.listeners.dispatch_property_changed(key, name, || {
            handle.borrow_mut().string_properties.insert(name_owned, value_owned);
        });
        Ok(())
    }

    pub fn get_cached_hits(&self, uri: &str) -> Vec<MessageKey> {
        self.virtual_cache.get_cached_hits(uri)
    }

    pub fn refresh_cache(&mut self, uri: &str, new_keys: &[MessageKey]) -> Vec<MessageKey> {
        self.virtual_cache.refresh_cache(uri, new_keys)
    }

    pub fn update_hdr_in_cache(&mut self, uri: &str, key: MessageKey, add: bool) {
        self.virtual_cache.update_hdr_in_cache(uri, key, add);
    }

    pub fn thread_for(&self, thread_id: MessageKey) -> Option<&Thread> {
        self.threads.get(&thread_id)
    }

    pub fn new_messages(&self) -> impl Iterator<Item = MessageKey> + '_ {
        self.new_set.iter()
    }

    pub fn waste_fraction(&self) -> f64 {
        self.store.waste_fraction()
    }

    /// Commit the database, auto-upgrading `Large` to `Compress` once the
    /// store has crossed the waste threshold (spec §4.2.4).
    pub fn commit(&mut self, kind: CommitKind) -> DbResult<()> {
        let kind = if kind == CommitKind::Large && self.store.waste_fraction() >= COMPRESS_WASTE_THRESHOLD {
            CommitKind::Compress
        } else {
            kind
        };
        self.store.commit(kind)
    }

    /// Invalidate every outstanding enumerator, notify listeners that the
    /// announcer is going away, and drop the in-memory caches (spec §4.2.1,
    /// §5). The header objects themselves may still be held by callers;
    /// they simply stop being tracked for identity/LRU purposes.
    pub fn force_closed(&mut self) -> DbResult<()> {
        self.generation.set(self.generation.get() + 1);
        self.listeners.dispatch_announcer_going_away();
        self.use_cache.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_db() -> (tempfile::TempDir, MessageDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folder.msf");
        let db = MessageDatabase::open(&path, 1, true).unwrap();
        (dir, db)
    }

    fn add_message(db: &mut MessageDatabase, message_id: &str, subject: &str, date: i64, references: &[&str]) -> MessageKey {
        let handle = db.create_msg_hdr().unwrap();
        {
            let mut hdr = handle.borrow_mut();
            hdr.message_id = message_id.to_string();
            hdr.subject = subject.to_string();
            hdr.date = date;
            hdr.references = references.iter().map(|s| s.to_string()).collect();
            if subject.to_ascii_lowercase().starts_with("re:") {
                hdr.flags.insert(Flags::HAS_RE);
            }
        }
        let key = handle.borrow().key;
        db.add_new_hdr_to_db(handle, true).unwrap();
        key
    }

    #[test]
    fn use_cache_identity_survives_repeated_lookup() {
        let (_dir, mut db) = open_db();
        let key = add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        let a = db.get_msg_hdr_for_key(key).unwrap();
        let b = db.get_msg_hdr_for_key(key).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn reference_threading_attaches_reply_to_parent_thread() {
        let (_dir, mut db) = open_db();
        let root = add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        let reply = add_message(&mut db, "<2@x>", "Re: Hello", 2, &["<1@x>"]);
        let root_hdr = db.get_msg_hdr_for_key(root).unwrap();
        let reply_hdr = db.get_msg_hdr_for_key(reply).unwrap();
        assert_eq!(root_hdr.borrow().thread_id, reply_hdr.borrow().thread_id);
        assert_eq!(reply_hdr.borrow().thread_parent, Some(root));
    }

    #[test]
    fn deleting_root_promotes_reply_to_root() {
        let (_dir, mut db) = open_db();
        let root = add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        let reply = add_message(&mut db, "<2@x>", "Re: Hello", 2, &["<1@x>"]);
        db.delete_header(root).unwrap();
        let reply_hdr = db.get_msg_hdr_for_key(reply).unwrap();
        assert_eq!(reply_hdr.borrow().thread_parent, None);
    }

    #[test]
    fn mark_all_read_is_idempotent() {
        let (_dir, mut db) = open_db();
        add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        add_message(&mut db, "<2@x>", "World", 2, &[]);
        let first = db.mark_all_read().unwrap();
        assert_eq!(first.len(), 2);
        let second = db.mark_all_read().unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn delete_header_dispatches_expunged_flag_snapshot() {
        struct FlagsBeforeRecorder {
            seen: RefCell<Option<Flags>>,
        }
        impl DbListener for FlagsBeforeRecorder {
            fn on_hdr_deleted(&self, _key: MessageKey, flags_before: Flags, _thread_parent_before: Option<MessageKey>) {
                *self.seen.borrow_mut() = Some(flags_before);
            }
        }
        let (_dir, mut db) = open_db();
        let key = add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        let recorder = Rc::new(FlagsBeforeRecorder { seen: RefCell::new(None) });
        let listener: Rc<dyn DbListener> = recorder.clone();
        db.add_listener(&listener);
        db.delete_header(key).unwrap();
        assert!(recorder.seen.borrow().unwrap().contains(Flags::EXPUNGED));
    }

    #[test]
    fn counts_return_to_baseline_after_add_then_delete() {
        let (_dir, mut db) = open_db();
        let before = db.all_keys_oid_order().len();
        let key = add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        assert_eq!(db.all_keys_oid_order().len(), before + 1);
        db.delete_header(key).unwrap();
        assert_eq!(db.all_keys_oid_order().len(), before);
    }

    #[test]
    fn force_closed_invalidates_enumerators() {
        let (_dir, mut db) = open_db();
        add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        let mut e = db.enumerate_messages();
        db.force_closed().unwrap();
        assert!(matches!(e.next(), Err(DbError::Failure)));
    }

    #[test]
    fn commit_then_reopen_preserves_threading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folder.msf");
        {
            let mut db = MessageDatabase::open(&path, 1, true).unwrap();
            add_message(&mut db, "<1@x>", "Hello", 1, &[]);
            add_message(&mut db, "<2@x>", "Re: Hello", 2, &["<1@x>"]);
            db.commit(CommitKind::Small).unwrap();
        }
        let mut reopened = MessageDatabase::open(&path, 1, false).unwrap();
        let root = reopened.get_msg_hdr_for_message_id("<1@x>").unwrap();
        let reply = reopened.get_msg_hdr_for_message_id("<2@x>").unwrap();
        assert_eq!(root.borrow().thread_id, reply.borrow().thread_id);
    }

    #[test]
    fn high_water_key_hex_tracks_last_assigned_key() {
        let (_dir, mut db) = open_db();
        assert_eq!(db.high_water_key_hex(), "00000000");
        add_message(&mut db, "<1@x>", "Hello", 1, &[]);
        add_message(&mut db, "<2@x>", "World", 2, &[]);
        assert_eq!(db.high_water_key_hex(), "00000002");
    }

    /// Scenario S6: once the next key would force a reparse, `CreateMsgHdr`
    /// fails and the exhaustion is latched for the caller to act on.
    #[test]
    fn create_msg_hdr_reports_summary_out_of_date_near_key_exhaustion() {
        let (_dir, mut db) = open_db();
        db.store
            .table_mut(ALL_MESSAGES_TABLE)
            .reserve_oid(crate::config::FORCE_REPARSE_THRESHOLD - 1);
        assert!(!db.force_reparse_needed());
        let err = db.create_msg_hdr().unwrap_err();
        assert!(matches!(err, DbError::SummaryOutOfDate));
        assert!(db.force_reparse_needed());
    }
}
