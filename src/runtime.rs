// src/runtime.rs
//! Minimal actor host: spawning, stopping and death-watch.
//!
//! Every actor is one tokio task owning a [`MailboxReceiver`]. The runtime
//! monitors each task; when it finishes (return, panic, or [`Runtime::stop`])
//! the actor is removed from the table and every watcher receives a
//! [`SystemMessage::Exit`] on its system channel.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::AbortHandle;

use crate::address::ActorRef;
use crate::config::ReceptionistConfig;
use crate::mailbox::{self, ExitInfo, ExitReason, MailboxReceiver, Message, SystemMessage, SystemSender};
use crate::pid::{next_pid, Pid};
use crate::receptionist::Receptionist;

struct ActorSlot {
    abort: AbortHandle,
    sys: SystemSender,
}

/// Who watches whom. Guarded by a single lock so that "is the target alive,
/// then add a watcher" cannot interleave with "target died, collect watchers".
#[derive(Default)]
struct WatchTable {
    /// target -> watchers
    watchers: HashMap<Pid, HashSet<Pid>>,
    /// watcher -> targets
    watching: HashMap<Pid, HashSet<Pid>>,
}

impl WatchTable {
    fn insert(&mut self, watcher: Pid, target: Pid) {
        self.watchers.entry(target).or_default().insert(watcher);
        self.watching.entry(watcher).or_default().insert(target);
    }

    fn remove(&mut self, watcher: Pid, target: Pid) {
        if let Some(set) = self.watchers.get_mut(&target) {
            set.remove(&watcher);
            if set.is_empty() {
                self.watchers.remove(&target);
            }
        }
        if let Some(set) = self.watching.get_mut(&watcher) {
            set.remove(&target);
            if set.is_empty() {
                self.watching.remove(&watcher);
            }
        }
    }

    /// Drop every edge touching `pid`, returning the actors that watched it.
    fn remove_actor(&mut self, pid: Pid) -> HashSet<Pid> {
        if let Some(targets) = self.watching.remove(&pid) {
            for target in targets {
                if let Some(set) = self.watchers.get_mut(&target) {
                    set.remove(&pid);
                    if set.is_empty() {
                        self.watchers.remove(&target);
                    }
                }
            }
        }
        let watchers = self.watchers.remove(&pid).unwrap_or_default();
        for watcher in &watchers {
            if let Some(set) = self.watching.get_mut(watcher) {
                set.remove(&pid);
                if set.is_empty() {
                    self.watching.remove(watcher);
                }
            }
        }
        watchers
    }
}

struct RuntimeInner {
    actors: DashMap<Pid, ActorSlot>,
    watches: Mutex<WatchTable>,
    receptionist: OnceCell<Receptionist>,
    config: ReceptionistConfig,
}

/// Handle to an actor runtime. Cheap to clone.
///
/// Every running actor holds a handle of its own, and once started the
/// receptionist runs until it is stopped. Dropping the last user handle
/// therefore does not tear the runtime down; call [`Runtime::shutdown`].
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(ReceptionistConfig::default())
    }

    pub fn with_config(config: ReceptionistConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                actors: DashMap::new(),
                watches: Mutex::new(WatchTable::default()),
                receptionist: OnceCell::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &ReceptionistConfig {
        &self.inner.config
    }

    /// The receptionist for this runtime, started on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn receptionist(&self) -> Receptionist {
        self.inner
            .receptionist
            .get_or_init(|| Receptionist::start(self))
            .clone()
    }

    /// Spawn an actor with an unbounded mailbox.
    pub fn spawn_actor<T, F, Fut>(&self, f: F) -> ActorRef<T>
    where
        T: Send + 'static,
        F: FnOnce(ActorContext<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mailbox::channel();
        self.spawn_with_mailbox(tx, rx, f)
    }

    /// Spawn an actor whose user queue holds at most `capacity` messages.
    pub fn spawn_actor_bounded<T, F, Fut>(&self, capacity: usize, f: F) -> ActorRef<T>
    where
        T: Send + 'static,
        F: FnOnce(ActorContext<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mailbox::bounded_channel(capacity);
        self.spawn_with_mailbox(tx, rx, f)
    }

    fn spawn_with_mailbox<T, F, Fut>(
        &self,
        tx: mailbox::MailboxSender<T>,
        rx: MailboxReceiver<T>,
        f: F,
    ) -> ActorRef<T>
    where
        T: Send + 'static,
        F: FnOnce(ActorContext<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let pid = next_pid();
        let actor = ActorRef::new(pid, tx);
        let ctx = ActorContext {
            myself: actor.clone(),
            mailbox: rx,
            runtime: self.clone(),
        };
        let body = f(ctx);

        // The body waits until its slot is in the table, so an actor that
        // finishes immediately is still observed as alive-then-dead.
        let (start_tx, start_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            if start_rx.await.is_ok() {
                body.await;
            }
        });
        self.inner.actors.insert(
            pid,
            ActorSlot {
                abort: handle.abort_handle(),
                sys: actor.system_sender(),
            },
        );
        let _ = start_tx.send(());
        tracing::debug!(pid, "actor spawned");

        let rt = self.clone();
        tokio::spawn(async move {
            let reason = match handle.await {
                Ok(()) => ExitReason::Normal,
                Err(e) if e.is_panic() => ExitReason::Panic,
                Err(_) => ExitReason::Killed,
            };
            rt.handle_exit(pid, reason);
        });

        actor
    }

    fn handle_exit(&self, pid: Pid, reason: ExitReason) {
        self.inner.actors.remove(&pid);
        let watchers = self.inner.watches.lock().remove_actor(pid);
        tracing::debug!(pid, ?reason, watchers = watchers.len(), "actor exited");
        for watcher in watchers {
            self.notify_exit(watcher, pid, reason.clone());
        }
    }

    fn notify_exit(&self, watcher: Pid, from: Pid, reason: ExitReason) {
        let sys = match self.inner.actors.get(&watcher) {
            Some(slot) => slot.sys.clone(),
            None => return,
        };
        if sys.send(SystemMessage::Exit(ExitInfo { from, reason })).is_err() {
            tracing::trace!(pid = watcher, from, "watcher gone before exit delivery");
        }
    }

    /// Spawn an [`Inbox`]: an actor that forwards every user message to
    /// the returned handle.
    pub fn inbox<T: Send + 'static>(&self) -> Inbox<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = self.spawn_actor(move |mut ctx: ActorContext<T>| async move {
            while let Some(msg) = ctx.recv_user().await {
                if tx.send(msg).is_err() {
                    break;
                }
            }
        });
        Inbox { actor, rx, runtime: self.clone() }
    }

    /// Ask the runtime to deliver an exit signal to `watcher` when `target`
    /// stops. If `target` is not alive the signal (with
    /// [`ExitReason::NoProc`]) is delivered immediately.
    pub fn watch(&self, watcher: Pid, target: Pid) {
        let alive = {
            let mut table = self.inner.watches.lock();
            let alive = self.inner.actors.contains_key(&target);
            if alive {
                table.insert(watcher, target);
            }
            alive
        };
        if !alive {
            self.notify_exit(watcher, target, ExitReason::NoProc);
        }
    }

    pub fn unwatch(&self, watcher: Pid, target: Pid) {
        self.inner.watches.lock().remove(watcher, target);
    }

    /// Abort an actor's task. Watchers see [`ExitReason::Killed`].
    pub fn stop(&self, pid: Pid) {
        if let Some(slot) = self.inner.actors.get(&pid) {
            slot.abort.abort();
        }
    }

    /// Abort every actor, the receptionist included.
    pub fn shutdown(&self) {
        tracing::info!(actors = self.inner.actors.len(), "runtime shutting down");
        for slot in self.inner.actors.iter() {
            slot.abort.abort();
        }
    }

    pub fn is_alive(&self, pid: Pid) -> bool {
        self.inner.actors.contains_key(&pid)
    }

    /// Number of live actors, the receptionist included once started.
    pub fn actor_count(&self) -> usize {
        self.inner.actors.len()
    }

    /// Number of actors `watcher` currently watches.
    pub fn watch_count(&self, watcher: Pid) -> usize {
        self.inner
            .watches
            .lock()
            .watching
            .get(&watcher)
            .map_or(0, HashSet::len)
    }
}

/// A runtime-hosted address whose messages are collected for the caller
/// instead of being handled by an actor body. Handy wherever plain code
/// needs to talk to actors, tests in particular. Dropping the inbox stops
/// its actor, which watchers observe like any other termination.
pub struct Inbox<T> {
    actor: ActorRef<T>,
    rx: mpsc::UnboundedReceiver<T>,
    runtime: Runtime,
}

impl<T: Send + 'static> Inbox<T> {
    pub fn actor(&self) -> &ActorRef<T> {
        &self.actor
    }

    pub fn pid(&self) -> Pid {
        self.actor.pid()
    }

    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// `None` if nothing arrived within `dur`.
    pub async fn recv_timeout(&mut self, dur: Duration) -> Option<T> {
        tokio::time::timeout(dur, self.rx.recv()).await.ok().flatten()
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Drop for Inbox<T> {
    fn drop(&mut self) {
        self.runtime.stop(self.actor.pid());
    }
}

/// Everything an actor body gets to work with.
pub struct ActorContext<T> {
    myself: ActorRef<T>,
    mailbox: MailboxReceiver<T>,
    runtime: Runtime,
}

impl<T: Send + 'static> ActorContext<T> {
    pub fn pid(&self) -> Pid {
        self.myself.pid()
    }

    pub fn myself(&self) -> ActorRef<T> {
        self.myself.clone()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub async fn recv(&mut self) -> Option<Message<T>> {
        self.mailbox.recv().await
    }

    pub async fn recv_user(&mut self) -> Option<T> {
        self.mailbox.recv_user().await
    }

    pub fn try_recv(&mut self) -> Option<Message<T>> {
        self.mailbox.try_recv()
    }

    pub fn watch<U>(&self, target: &ActorRef<U>) {
        self.runtime.watch(self.pid(), target.pid());
    }

    pub fn unwatch<U>(&self, target: &ActorRef<U>) {
        self.runtime.unwatch(self.pid(), target.pid());
    }

    /// Spawn a sibling actor on the same runtime.
    pub fn spawn<U, F, Fut>(&self, f: F) -> ActorRef<U>
    where
        U: Send + 'static,
        F: FnOnce(ActorContext<U>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn_actor(f)
    }
}
