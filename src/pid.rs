// src/pid.rs
//! Process identifiers handed out by the runtime.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, process-unique actor identifier. Never reused within a process.
pub type Pid = u64;

static NEXT_PID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next free PID.
pub(crate) fn next_pid() -> Pid {
    NEXT_PID.fetch_add(1, Ordering::Relaxed)
}
