/*
 * threading.rs
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

//! Threading algorithm (spec §4.3): References / In-Reply-To, subject
//! fallback, and reverse-reference ("correct threading") attachment,
//! operating on already-parsed header fields (subject/message-id/
//! references) rather than raw RFC 5322 bytes, since MIME parsing is
//! out of this crate's scope.

use crate::config::ThreadingPreferences;
use crate::msgdb::header::MessageKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadDecision {
    /// Attach under an existing thread, as a child of `parent`.
    AttachTo {
        thread_id: MessageKey,
        parent: MessageKey,
    },
    /// The new message is the parent of an existing thread (reverse
    /// reference): that thread is re-rooted under the new message.
    BecomeParentOf { thread_id: MessageKey },
    NewThread,
}

/// Decide how to thread a new header. Does not mutate any state; the
/// caller applies the decision via `AddToThread` (spec §4.3).
#[allow(clippy::too_many_arguments)]
pub fn decide<'a>(
    new_key: MessageKey,
    new_message_id: &str,
    references: &[String],
    subject: &str,
    has_re: bool,
    prefs: ThreadingPreferences,
    lookup_by_message_id: impl Fn(&str) -> Option<(MessageKey, MessageKey)>,
    lookup_thread_root_by_subject: impl Fn(&str) -> Option<MessageKey>,
    lookup_reverse_reference: impl Fn(&str) -> Option<(MessageKey, MessageKey)>,
) -> ThreadDecision {
    // Step 1: reference threading, walking references last-to-first.
    for reference in references.iter().rev() {
        if let Some((found_key, found_thread)) = lookup_by_message_id(reference) {
            if found_key == new_key {
                // Self-reference: discard references entirely, fall through
                // to the remaining strategies as if there were none.
                break;
            }
            return ThreadDecision::AttachTo {
                thread_id: found_thread,
                parent: found_key,
            };
        }
    }

    // Step 2: subject fallback (unless strict-reference mode).
    if !prefs.strict_threading {
        let stripped = strip_re(subject);
        if !stripped.is_empty() {
            if prefs.thread_by_subject_without_re || has_re {
                if let Some(root) = lookup_thread_root_by_subject(&stripped) {
                    return ThreadDecision::AttachTo {
                        thread_id: root,
                        parent: root,
                    };
                }
            }
        }
    }

    // Step 3: reverse-reference threading, gated by preference.
    if prefs.correct_threading {
        if let Some((_existing_key, existing_thread)) = lookup_reverse_reference(new_message_id) {
            return ThreadDecision::BecomeParentOf {
                thread_id: existing_thread,
            };
        }
    }

    ThreadDecision::NewThread
}

/// Strip a leading "Re:" (or `Re[2]:`, bracketed counters, repeated
/// occurrences and surrounding whitespace) from a subject. Idempotent:
/// `strip(strip(s)) == strip(s)` (spec §8 invariant 9).
pub fn strip_re(subject: &str) -> String {
    let mut s = subject.trim();
    loop {
        let trimmed = strip_one_re_prefix(s);
        if trimmed == s {
            break;
        }
        s = trimmed;
    }
    s.trim().to_string()
}

fn strip_one_re_prefix(s: &str) -> &str {
    let s = s.trim_start();
    let lower_prefix: String = s.chars().take(2).collect::<String>().to_ascii_lowercase();
    if lower_prefix != "re" {
        return s;
    }
    let rest = &s[2..];
    // Optional bracketed counter: [2], (2)
    let rest = strip_counter(rest);
    if let Some(after_colon) = rest.strip_prefix(':') {
        return after_colon.trim_start();
    }
    s
}

fn strip_counter(s: &str) -> &str {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, '[')) | Some((_, '(')) => {
            let close = if s.starts_with('[') { ']' } else { ')' };
            if let Some(end) = s.find(close) {
                let inner = &s[1..end];
                if inner.chars().all(|c| c.is_ascii_digit()) && !inner.is_empty() {
                    return &s[end + 1..];
                }
            }
            s
        }
        _ => s,
    }
}
