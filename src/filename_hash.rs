/*
 * filename_hash.rs
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

//! On-disk filename derivation for folders whose display name is too
//! long or contains characters the host filesystem rejects (spec §6).
//! Names longer than 55 UTF-16 code units, or containing a reserved
//! character, are replaced by a hashed, percent-encoded stand-in so two
//! folders never collide on disk.

const MAX_UNHASHED_UTF16_LEN: usize = 55;
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Linear-congruential hash over the name's UTF-8 bytes, seeded at 1
/// (spec §6): `h = 0x63C63CD9 * h + 0x9C39C33D + byte`.
pub fn hash_name(name: &str) -> u32 {
    let mut h: u32 = 1;
    for b in name.as_bytes() {
        h = h
            .wrapping_mul(0x63C6_3CD9)
            .wrapping_add(0x9C39_C33D)
            .wrapping_add(*b as u32);
    }
    h
}

fn needs_hashing(name: &str) -> bool {
    name.encode_utf16().count() > MAX_UNHASHED_UTF16_LEN || name.chars().any(|c| RESERVED_CHARS.contains(&c))
}

fn percent_encode_reserved(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if RESERVED_CHARS.contains(&c) || c == '%' {
            for byte in c.to_string().as_bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// The on-disk stem for a folder's summary/mailbox files: the name
/// itself, percent-encoded, if short and unreserved; otherwise an
/// 8-hex-digit hash of the full name (spec §6).
pub fn disk_file_stem(name: &str) -> String {
    if needs_hashing(name) {
        format!("{:08X}", hash_name(name))
    } else {
        percent_encode_reserved(name)
    }
}
