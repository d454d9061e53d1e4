// src/mailbox.rs
//! Typed actor mailbox (user payloads plus a prioritized system channel).

use crate::pid::Pid;
use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
use tokio::sync::mpsc;

/// Underlying sender type for user messages; either unbounded or bounded.
enum UserSender<T> {
    Unbounded(mpsc::UnboundedSender<T>),
    Bounded(mpsc::Sender<T>),
}

impl<T> Clone for UserSender<T> {
    fn clone(&self) -> Self {
        match self {
            UserSender::Unbounded(tx) => UserSender::Unbounded(tx.clone()),
            UserSender::Bounded(tx) => UserSender::Bounded(tx.clone()),
        }
    }
}

/// Underlying receiver type for user messages.
enum UserReceiver<T> {
    Unbounded(mpsc::UnboundedReceiver<T>),
    Bounded(mpsc::Receiver<T>),
}

/// Why an actor stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// The actor body returned.
    Normal,
    /// The actor body panicked.
    Panic,
    /// The actor was stopped from the outside.
    Killed,
    /// The actor was already gone when the watch was installed.
    NoProc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitInfo {
    pub from: Pid,
    pub reason: ExitReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SystemMessage {
    /// A watched actor terminated.
    Exit(ExitInfo),
}

/// Type-independent handle to a mailbox's system channel.
pub(crate) type SystemSender = mpsc::UnboundedSender<SystemMessage>;

/// Envelope handed out by [`MailboxReceiver::recv`]: either a typed user
/// payload or a runtime-generated system message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message<T> {
    User(T),
    System(SystemMessage),
}

/// Sender half of a mailbox. Internally we keep separate channels for
/// system messages and user messages so receivers can prioritize system
/// messages (e.g., Exit notifications) over user payloads.
pub struct MailboxSender<T> {
    tx_user: UserSender<T>,
    tx_sys: mpsc::UnboundedSender<SystemMessage>,
    /// Count of user messages currently queued.
    counter: Arc<AtomicUsize>,
}

impl<T> Clone for MailboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx_user: self.tx_user.clone(),
            tx_sys: self.tx_sys.clone(),
            counter: self.counter.clone(),
        }
    }
}

/// Receiver half of a mailbox.
pub struct MailboxReceiver<T> {
    rx_user: UserReceiver<T>,
    rx_sys: mpsc::UnboundedReceiver<SystemMessage>,
    counter: Arc<AtomicUsize>,
}

/// Create a new unbounded mailbox channel (sender, receiver).
pub fn channel<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx_user, rx_user) = mpsc::unbounded_channel();
    let (tx_sys, rx_sys) = mpsc::unbounded_channel();
    let counter = Arc::new(AtomicUsize::new(0));
    (
        MailboxSender { tx_user: UserSender::Unbounded(tx_user), tx_sys, counter: counter.clone() },
        MailboxReceiver { rx_user: UserReceiver::Unbounded(rx_user), rx_sys, counter },
    )
}

/// Create a bounded mailbox channel with given capacity. If the queue is
/// full, `send` will return Err(msg) (drop-new policy). System messages are
/// never bounded.
pub fn bounded_channel<T>(capacity: usize) -> (MailboxSender<T>, MailboxReceiver<T>) {
    let (tx_user, rx_user) = mpsc::channel(capacity);
    let (tx_sys, rx_sys) = mpsc::unbounded_channel();
    let counter = Arc::new(AtomicUsize::new(0));
    (
        MailboxSender { tx_user: UserSender::Bounded(tx_user), tx_sys, counter: counter.clone() },
        MailboxReceiver { rx_user: UserReceiver::Bounded(rx_user), rx_sys, counter },
    )
}

impl<T> MailboxSender<T> {
    /// Send a user payload into the mailbox.
    /// For bounded user queues, policy is drop-new: the payload is handed
    /// back when the queue is full or the receiver is gone.
    pub fn send(&self, msg: T) -> Result<(), T> {
        // increment counter before enqueue attempt
        self.counter.fetch_add(1, Ordering::SeqCst);
        let res = match &self.tx_user {
            UserSender::Unbounded(tx) => tx.send(msg).map_err(|e| e.0),
            UserSender::Bounded(tx) => tx.try_send(msg).map_err(|err| match err {
                mpsc::error::TrySendError::Full(m) => m,
                mpsc::error::TrySendError::Closed(m) => m,
            }),
        };
        if res.is_err() {
            // rollback counter
            self.counter.fetch_sub(1, Ordering::SeqCst);
        }
        res
    }

    /// Send a system message directly.
    pub fn send_system(&self, s: SystemMessage) -> Result<(), SystemMessage> {
        self.tx_sys.send(s).map_err(|e| e.0)
    }

    /// Clone of the system channel, used by the runtime to deliver exit
    /// signals without knowing the mailbox's payload type.
    pub(crate) fn system_sender(&self) -> SystemSender {
        self.tx_sys.clone()
    }

    /// True once the receiving half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx_sys.is_closed()
    }

    /// Return the number of user messages currently queued for this mailbox.
    pub fn len(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> MailboxReceiver<T> {
    /// Await a message from the mailbox, prioritizing any already-enqueued
    /// system messages.
    pub async fn recv(&mut self) -> Option<Message<T>> {
        if let Ok(sys) = self.rx_sys.try_recv() {
            return Some(Message::System(sys));
        }

        tokio::select! {
            biased;
            sys = self.rx_sys.recv() => sys.map(Message::System),
            user = {
                async {
                    match &mut self.rx_user {
                        UserReceiver::Unbounded(rx) => rx.recv().await,
                        UserReceiver::Bounded(rx) => rx.recv().await,
                    }
                }
            } => {
                user.map(|m| {
                    self.counter.fetch_sub(1, Ordering::SeqCst);
                    Message::User(m)
                })
            }
        }
    }

    /// Await the next user payload, discarding system messages on the way.
    /// Convenience for actors that never watch anybody.
    pub async fn recv_user(&mut self) -> Option<T> {
        loop {
            match self.recv().await? {
                Message::User(m) => return Some(m),
                Message::System(_) => continue,
            }
        }
    }

    /// Try to receive without awaiting; system messages are preferred.
    pub fn try_recv(&mut self) -> Option<Message<T>> {
        if let Ok(sys) = self.rx_sys.try_recv() {
            return Some(Message::System(sys));
        }

        let opt = match &mut self.rx_user {
            UserReceiver::Unbounded(rx) => rx.try_recv().ok(),
            UserReceiver::Bounded(rx) => rx.try_recv().ok(),
        };
        opt.map(|m| {
            self.counter.fetch_sub(1, Ordering::SeqCst);
            Message::User(m)
        })
    }
}
