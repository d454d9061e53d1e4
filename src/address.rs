// src/address.rs
//! Typed actor addresses.

use crate::mailbox::{MailboxSender, SystemSender};
use crate::pid::Pid;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Handle to a running actor that accepts messages of type `T`.
///
/// Equality and hashing go through the PID only, so two handles to the same
/// actor compare equal regardless of how they were obtained. An `ActorRef`
/// does not own the actor: the runtime decides when it stops, and sends to a
/// stopped actor simply fail.
pub struct ActorRef<T> {
    pid: Pid,
    tx: MailboxSender<T>,
}

impl<T> ActorRef<T> {
    pub(crate) fn new(pid: Pid, tx: MailboxSender<T>) -> Self {
        Self { pid, tx }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Fire-and-forget send. The message is handed back if the mailbox is
    /// full or the actor is gone.
    pub fn send(&self, msg: T) -> Result<(), T> {
        self.tx.send(msg)
    }

    /// Send, dropping the message on failure.
    pub fn tell(&self, msg: T) {
        if self.tx.send(msg).is_err() {
            tracing::trace!(pid = self.pid, "dropped message for unreachable actor");
        }
    }

    /// True once the actor's mailbox is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Number of user messages waiting in the actor's mailbox.
    pub fn mailbox_len(&self) -> usize {
        self.tx.len()
    }

    pub(crate) fn system_sender(&self) -> SystemSender {
        self.tx.system_sender()
    }
}

impl<T> Clone for ActorRef<T> {
    fn clone(&self) -> Self {
        Self { pid: self.pid, tx: self.tx.clone() }
    }
}

impl<T> PartialEq for ActorRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.pid == other.pid
    }
}

impl<T> Eq for ActorRef<T> {}

impl<T> Hash for ActorRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pid.hash(state);
    }
}

impl<T> fmt::Debug for ActorRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorRef<{}>({})", std::any::type_name::<T>(), self.pid)
    }
}

/// Type-erased [`ActorRef`], as stored inside the receptionist.
#[derive(Clone)]
pub(crate) struct AnyRef {
    pid: Pid,
    inner: Arc<dyn Any + Send + Sync>,
}

impl AnyRef {
    pub(crate) fn new<T: Send + 'static>(actor: ActorRef<T>) -> Self {
        Self { pid: actor.pid, inner: Arc::new(actor) }
    }

    pub(crate) fn pid(&self) -> Pid {
        self.pid
    }

    pub(crate) fn downcast<T: 'static>(&self) -> Option<&ActorRef<T>> {
        self.inner.downcast_ref::<ActorRef<T>>()
    }
}

impl fmt::Debug for AnyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyRef({})", self.pid)
    }
}
