// src/receptionist/watcher.rs
//! Termination watcher for every actor the receptionist references.

use std::collections::HashSet;

use crate::pid::Pid;
use crate::runtime::Runtime;

pub(crate) struct TerminationWatcher {
    runtime: Runtime,
    owner: Pid,
    watched: HashSet<Pid>,
}

impl TerminationWatcher {
    pub(crate) fn new(runtime: Runtime, owner: Pid) -> Self {
        Self { runtime, owner, watched: HashSet::new() }
    }

    /// Install a runtime watch on `pid` unless one is already in place.
    pub(crate) fn watch(&mut self, pid: Pid) {
        if self.watched.insert(pid) {
            self.runtime.watch(self.owner, pid);
        }
    }

    /// Drop the watch on `pid` once nothing references it any more.
    pub(crate) fn unwatch_if_unreferenced(&mut self, pid: Pid, still_referenced: bool) {
        if !still_referenced && self.watched.remove(&pid) {
            self.runtime.unwatch(self.owner, pid);
        }
    }

    /// Consume the termination of `pid`. `false` for actors that are not
    /// watched (already cleaned up, or unwatched before the signal landed).
    pub(crate) fn on_terminated(&mut self, pid: Pid) -> bool {
        self.watched.remove(&pid)
    }

    pub(crate) fn watched_count(&self) -> usize {
        self.watched.len()
    }
}
