/*
 * retention.rs
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

//! Retention policy application (spec §3 Retention Settings, §4.6.1):
//! age- and count-based message expiry, batched into the row store's
//! commit lifecycle.

use crate::error::DbResult;
use crate::msgdb::header::MessageKey;
use crate::msgdb::MessageDatabase;
use crate::registry::folder::FolderFlags;
use crate::rowstore::CommitKind;

/// Number of deletions per intermediate commit before a final compress
/// (spec §4.6.1).
const DELETE_BATCH_SIZE: usize = 300;
/// Deleting more than this many messages in one pass always ends with a
/// `Compress` commit rather than a plain `Large` one.
const COMPRESS_AFTER_DELETES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionMode {
    KeepAll,
    ByAge { max_age_days: u32 },
    ByCount { max_messages: u32 },
}

/// Apply a folder's retention setting, deleting the messages it selects
/// for expiry. Folders carrying `DRAFTS`, `TEMPLATES` or `QUEUE` are
/// always a no-op (spec §4.6.1: these folders are never auto-expired).
pub fn apply_retention_settings(
    db: &mut MessageDatabase,
    folder_flags: FolderFlags,
    mode: RetentionMode,
    now_micros: i64,
) -> DbResult<usize> {
    if folder_flags.intersects(FolderFlags::DRAFTS | FolderFlags::TEMPLATES | FolderFlags::QUEUE) {
        return Ok(0);
    }

    let candidates = select_expired(db, mode, now_micros)?;
    let total = candidates.len();
    if total == 0 {
        return Ok(0);
    }

    for (i, key) in candidates.into_iter().enumerate() {
        db.delete_header(key)?;
        if (i + 1) % DELETE_BATCH_SIZE == 0 {
            db.commit(CommitKind::Large)?;
        }
    }

    let final_kind = if total > COMPRESS_AFTER_DELETES {
        CommitKind::Compress
    } else {
        CommitKind::Large
    };
    db.commit(final_kind)?;
    Ok(total)
}

fn select_expired(db: &MessageDatabase, mode: RetentionMode, now_micros: i64) -> DbResult<Vec<MessageKey>> {
    let mut all: Vec<MessageKey> = db.enumerate_all_for_retention();
    match mode {
        RetentionMode::KeepAll => Ok(Vec::new()),
        RetentionMode::ByAge { max_age_days } => {
            let cutoff = now_micros - (max_age_days as i64) * 24 * 60 * 60 * 1_000_000;
            Ok(all
                .into_iter()
                .filter(|k| db.header_date(*k).map(|d| d < cutoff).unwrap_or(false))
                .collect())
        }
        RetentionMode::ByCount { max_messages } => {
            all.sort_by_key(|k| db.header_date(*k).unwrap_or(0));
            let max = max_messages as usize;
            if all.len() <= max {
                Ok(Vec::new())
            } else {
                Ok(all[..all.len() - max].to_vec())
            }
        }
    }
}
