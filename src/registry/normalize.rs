/*
 * normalize.rs
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

//! Folder name normalization for case-insensitive sibling comparison
//! (spec §4.4). The original compares NFC-normalized, casefolded names;
//! since no Unicode normalization crate is part of this stack, this
//! approximates with `str::to_lowercase`, which is correct for the ASCII
//! and simple-casefolding case but not for composed/decomposed forms of
//! the same string. Documented and accepted as a known limitation.

pub fn normalize(name: &str) -> String {
    name.to_lowercase()
}

pub fn same_name(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_case_insensitive() {
        assert!(same_name("Inbox", "INBOX"));
        assert!(!same_name("Inbox", "Outbox"));
    }
}
