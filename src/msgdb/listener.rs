/*
 * listener.rs
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

//! Change notification (spec §4.2.5): a typed set of events and a vector
//! of listener handles, per the "dynamic dispatch for listeners" design
//! note (§9) — replaces the original's interface-pointer observer list
//! with an enum and `Weak` handles that tolerate removal mid-dispatch.

use crate::msgdb::header::{Flags, MessageKey};
use std::rc::{Rc, Weak};

pub trait DbListener {
    fn on_hdr_added(&self, _key: MessageKey, _parent_key: Option<MessageKey>, _flags: Flags) {}
    fn on_hdr_deleted(&self, _key: MessageKey, _flags_before: Flags, _thread_parent_before: Option<MessageKey>) {}
    fn on_hdr_flags_changed(&self, _key: MessageKey, _old: Flags, _new: Flags) {}
    fn on_parent_changed(&self, _key: MessageKey, _old_parent: Option<MessageKey>, _new_parent: Option<MessageKey>) {}
    fn on_read_changed(&self, _key: MessageKey) {}
    fn on_junk_score_changed(&self, _key: MessageKey) {}
    /// Pre-change hook; the returned status is handed back unchanged to
    /// the matching post-change hook so a listener can compare before
    /// and after without reading the row twice (spec §4.2.4).
    fn on_hdr_property_changing(&self, _key: MessageKey, _name: &str) -> u32 {
        0
    }
    fn on_hdr_property_changed(&self, _key: MessageKey, _name: &str, _status: u32) {}
    fn on_announcer_going_away(&self) {}
}

/// Registered listeners, held weakly so a dropped owner is pruned lazily
/// rather than leaking a dangling registration.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Weak<dyn DbListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: &Rc<dyn DbListener>) {
        self.listeners.push(Rc::downgrade(listener));
    }

    pub fn remove(&mut self, listener: &Rc<dyn DbListener>) {
        self.listeners
            .retain(|w| !w.upgrade().is_some_and(|l| Rc::ptr_eq(&l, listener)));
    }

    /// Dispatch a callback to every live listener, using a snapshot of
    /// the current list so a listener that unregisters another during
    /// its own callback does not affect this dispatch (spec §5 ordering
    /// guarantee).
    fn snapshot(&self) -> Vec<Rc<dyn DbListener>> {
        self.listeners.iter().filter_map(|w| w.upgrade()).collect()
    }

    pub fn dispatch_added(&self, key: MessageKey, parent_key: Option<MessageKey>, flags: Flags) {
        for l in self.snapshot() {
            l.on_hdr_added(key, parent_key, flags);
        }
    }

    pub fn dispatch_deleted(&self, key: MessageKey, flags_before: Flags, thread_parent_before: Option<MessageKey>) {
        for l in self.snapshot() {
            l.on_hdr_deleted(key, flags_before, thread_parent_before);
        }
    }

    pub fn dispatch_flags_changed(&self, key: MessageKey, old: Flags, new: Flags) {
        for l in self.snapshot() {
            l.on_hdr_flags_changed(key, old, new);
        }
    }

    pub fn dispatch_parent_changed(&self, key: MessageKey, old_parent: Option<MessageKey>, new_parent: Option<MessageKey>) {
        for l in self.snapshot() {
            l.on_parent_changed(key, old_parent, new_parent);
        }
    }

    pub fn dispatch_read_changed(&self, key: MessageKey) {
        for l in self.snapshot() {
            l.on_read_changed(key);
        }
    }

    /// Two-phase property change dispatch (spec §4.2.4 `SetStringProperty`):
    /// each listener's pre-hook status is threaded back to its own
    /// post-hook, not mixed across listeners.
    pub fn dispatch_property_changed(&self, key: MessageKey, name: &str, apply: impl FnOnce()) {
        let listeners = self.snapshot();
        let statuses: Vec<u32> = listeners
            .iter()
            .map(|l| l.on_hdr_property_changing(key, name))
            .collect();
        apply();
        for (l, status) in listeners.iter().zip(statuses) {
            l.on_hdr_property_changed(key, name, status);
        }
    }

    pub fn dispatch_announcer_going_away(&mut self) {
        for l in self.snapshot() {
            l.on_announcer_going_away();
        }
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.iter().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        bucket: Rc<RefCell<Vec<MessageKey>>>,
    }

    impl DbListener for Recorder {
        fn on_hdr_added(&self, key: MessageKey, _parent_key: Option<MessageKey>, _flags: Flags) {
            self.bucket.borrow_mut().push(key);
        }
    }

    #[test]
    fn dropped_listener_is_pruned_from_dispatch() {
        let mut set = ListenerSet::new();
        let bucket = Rc::new(RefCell::new(Vec::new()));
        let listener: Rc<dyn DbListener> = Rc::new(Recorder { bucket: bucket.clone() });
        set.add(&listener);
        drop(listener);
        set.dispatch_added(MessageKey(1), None, Flags::empty());
        assert!(bucket.borrow().is_empty());
    }

    #[test]
    fn live_listener_receives_event() {
        let mut set = ListenerSet::new();
        let bucket = Rc::new(RefCell::new(Vec::new()));
        let listener: Rc<dyn DbListener> = Rc::new(Recorder { bucket: bucket.clone() });
        set.add(&listener);
        set.dispatch_added(MessageKey(5), None, Flags::empty());
        assert_eq!(*bucket.borrow(), vec![MessageKey(5)]);
        assert_eq!(set.len(), 1);
    }
}
