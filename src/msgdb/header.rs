/*
 * header.rs
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

//! Message header identity and mutable attributes (spec §3.1).

use bitflags::bitflags;

/// 32-bit identifier of a header, unique within its folder and never
/// reused once committed (spec §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey(pub u32);

impl MessageKey {
    /// Substituted thread key when the root message's own key is `1`,
    /// which collides with the all-messages table's OID in the row
    /// store (spec §3.1, §9 open question).
    pub const RESERVED_THREAD_KEY_SUBSTITUTE: MessageKey = MessageKey(0xFFFF_FFFE);

    pub fn thread_key_for_root(self) -> MessageKey {
        if self.0 == 1 {
            Self::RESERVED_THREAD_KEY_SUBSTITUTE
        } else {
            self
        }
    }

    pub fn is_pseudo(self) -> bool {
        self.0 >= crate::config::PSEUDO_KEY_THRESHOLD
    }

    pub fn forces_reparse(self) -> bool {
        self.0 >= crate::config::FORCE_REPARSE_THRESHOLD
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        const READ               = 1 << 0;
        const MARKED             = 1 << 1;
        const REPLIED            = 1 << 2;
        const FORWARDED          = 1 << 3;
        const REDIRECTED         = 1 << 4;
        const HAS_ATTACHMENT     = 1 << 5;
        const OFFLINE            = 1 << 6;
        const IMAP_DELETED       = 1 << 7;
        const EXPUNGED           = 1 << 8;
        const NEW                = 1 << 9;
        const HAS_RE             = 1 << 10;
        const MDN_REPORT_NEEDED  = 1 << 11;
        const MDN_REPORT_SENT    = 1 << 12;
        const IGNORED            = 1 << 13;
        const WATCHED            = 1 << 14;
        const FEED_MSG           = 1 << 15;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

/// Opaque pointer into the external message store: a byte offset for
/// mbox, a UID for IMAP (spec §3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreToken {
    Offset(u64),
    Uid(u32),
    Opaque(String),
}

#[derive(Debug, Clone)]
pub struct MessageHeader {
    pub key: MessageKey,
    pub folder_id: u64,
    pub thread_id: MessageKey,
    pub thread_parent: Option<MessageKey>,
    pub message_id: String,
    /// Microseconds since epoch (spec §3.1).
    pub date: i64,
    pub sender: String,
    pub recipients: String,
    pub cc_list: String,
    pub bcc_list: String,
    pub subject: String,
    pub flags: Flags,
    pub tags: Vec<String>,
    pub message_size: u32,
    pub line_count: u32,
    pub offline_message_size: u32,
    pub store_token: Option<StoreToken>,
    pub charset: Option<String>,
    pub priority: Priority,
    pub label: u8,
    /// Ordered list of parent Message-IDs, accessed by index (spec §3.1).
    pub references: Vec<String>,
    pub string_properties: std::collections::BTreeMap<String, String>,
    pub uint32_properties: std::collections::BTreeMap<String, u32>,
}

impl MessageHeader {
    pub fn new(key: MessageKey, folder_id: u64) -> Self {
        Self {
            key,
            folder_id,
            thread_id: key,
            thread_parent: None,
            message_id: String::new(),
            date: 0,
            sender: String::new(),
            recipients: String::new(),
            cc_list: String::new(),
            bcc_list: String::new(),
            subject: String::new(),
            flags: Flags::empty(),
            tags: Vec::new(),
            message_size: 0,
            line_count: 0,
            offline_message_size: 0,
            store_token: None,
            charset: None,
            priority: Priority::default(),
            label: 0,
            references: Vec::new(),
            string_properties: std::collections::BTreeMap::new(),
            uint32_properties: std::collections::BTreeMap::new(),
        }
    }

    pub fn is_read(&self) -> bool {
        self.flags.contains(Flags::READ)
    }

    pub fn reference_at(&self, index: usize) -> Option<&str> {
        self.references.get(index).map(|s| s.as_str())
    }
}
