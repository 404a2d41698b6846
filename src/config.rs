/*
 * config.rs
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

//! Profile directory resolution and persisted-file path layout (spec §6).
//!
//! Credential storage and the UI's `config.xml` are handled elsewhere
//! (out of scope for this crate); this module only resolves the paths
//! the row store and the folder registry read and write.

use std::path::{Path, PathBuf};

/// Default profile directory: `~/.tagliacarte`.
pub fn default_profile_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tagliacarte"))
}

/// Path to the folder-tree registry SQLite database within a profile.
pub fn registry_path(profile_dir: &Path) -> PathBuf {
    profile_dir.join("panorama.sqlite")
}

/// Path to a folder's summary file (`<folderName>.msf`) given the
/// directory that holds the mail store for that folder.
pub fn summary_path(store_dir: &Path, folder_name: &str) -> PathBuf {
    store_dir.join(format!("{}.msf", folder_name))
}

/// Path to the subdirectory holding a folder's nested children
/// (`<folderName>.sbd`).
pub fn nested_store_dir(store_dir: &Path, folder_name: &str) -> PathBuf {
    store_dir.join(format!("{}.sbd", folder_name))
}

/// Timer and budget defaults for the periodic purge service (spec §4.6.2).
#[derive(Debug, Clone, Copy)]
pub struct PurgeTimerConfig {
    /// How often the purge timer fires.
    pub interval: std::time::Duration,
    /// Delay after startup before the first run.
    pub first_run_delay: std::time::Duration,
    /// Minimum time between two retention passes for the same folder.
    pub min_delay_between_folder_purges: std::time::Duration,
    /// Wall-clock budget for a single purge pass before it self-cancels.
    pub pass_budget: std::time::Duration,
}

impl Default for PurgeTimerConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(5 * 60),
            first_run_delay: std::time::Duration::from_secs(5 * 60),
            min_delay_between_folder_purges: std::time::Duration::from_secs(8 * 60 * 60),
            pass_budget: std::time::Duration::from_millis(500),
        }
    }
}

/// Preferences gating threading behaviour (spec §4.3). Kept as plain
/// booleans rather than a generic preference-bag collaborator, which is
/// out of scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadingPreferences {
    /// Disables subject-fallback threading (spec step 2) entirely.
    pub strict_threading: bool,
    /// Allows subject-fallback threading even without the `HasRe` flag.
    pub thread_by_subject_without_re: bool,
    /// Enables reverse-reference ("correct threading") lookups (spec step 3).
    pub correct_threading: bool,
}

/// Row-store compression threshold: fraction of the file considered
/// wasted before `Commit(Compress)` is chosen automatically (spec §4.2.4).
pub const COMPRESS_WASTE_THRESHOLD: f64 = 0.30;

/// Default LRU hit-cache size (spec §4.2.3).
pub const DEFAULT_HIT_CACHE_SIZE: usize = 512;

/// Message keys at or above this value force a reparse (spec §3.2).
pub const FORCE_REPARSE_THRESHOLD: u32 = 0xFFFFFFF0;

/// Message keys at or above this value are "pseudo/fake offline" slots (spec §3.2).
pub const PSEUDO_KEY_THRESHOLD: u32 = 0xFFFFFF80;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_and_nested_paths() {
        let dir = Path::new("/mail/Local Folders");
        assert_eq!(
            summary_path(dir, "Inbox"),
            PathBuf::from("/mail/Local Folders/Inbox.msf")
        );
        assert_eq!(
            nested_store_dir(dir, "Inbox"),
            PathBuf::from("/mail/Local Folders/Inbox.sbd")
        );
    }

    #[test]
    fn registry_path_is_profile_relative() {
        let profile = Path::new("/home/user/.tagliacarte");
        assert_eq!(
            registry_path(profile),
            PathBuf::from("/home/user/.tagliacarte/panorama.sqlite")
        );
    }
}
