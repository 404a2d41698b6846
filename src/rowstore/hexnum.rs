/*
 * hexnum.rs
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

//! Numbers are persisted as fixed-width hex ASCII (8 or 16 digits, spec
//! §4.1) so that files written on big- and little-endian hosts interoperate
//! byte-for-byte; only the in-memory representation is a native integer.

/// Encode as 8 hex digits (up to a u32).
pub fn encode_hex8(v: u32) -> [u8; 8] {
    let s = format!("{:08x}", v);
    let mut out = [0u8; 8];
    out.copy_from_slice(s.as_bytes());
    out
}

/// Encode as 16 hex digits (up to a u64).
pub fn encode_hex16(v: u64) -> [u8; 16] {
    let s = format!("{:016x}", v);
    let mut out = [0u8; 16];
    out.copy_from_slice(s.as_bytes());
    out
}

pub fn decode_hex(bytes: &[u8]) -> Result<u64, crate::error::DbError> {
    let s = std::str::from_utf8(bytes).map_err(|_| crate::error::DbError::SummaryCorrupt)?;
    u64::from_str_radix(s, 16).map_err(|_| crate::error::DbError::SummaryCorrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex8_roundtrip() {
        let enc = encode_hex8(0xdead_beef);
        assert_eq!(&enc, b"deadbeef");
        assert_eq!(decode_hex(&enc).unwrap(), 0xdead_beef);
    }

    #[test]
    fn hex16_roundtrip() {
        let enc = encode_hex16(0x1234_5678_9abc_def0);
        assert_eq!(decode_hex(&enc).unwrap(), 0x1234_5678_9abc_def0);
    }
}
