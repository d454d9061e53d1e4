// src/receptionist/mod.rs
//! Typed service discovery.
//!
//! Actors register under a [`ServiceKey`]; other actors subscribe to a key
//! and receive a [`Listing`] immediately and again after every change to the
//! key's membership. All bookkeeping lives in one actor that handles its
//! commands strictly one after another, so each listing reflects a state the
//! registry was actually in. Registered and subscribed actors are watched
//! and dropped from the registry when they stop.

mod dispatcher;
mod protocol;
mod store;
mod subscriptions;
mod watcher;

pub use protocol::{Deregistered, Listing, Registered};

use std::time::Duration;

use crate::address::{ActorRef, AnyRef};
use crate::error::{Error, Result};
use crate::key::{KeyId, ServiceKey};
use crate::mailbox::{self, ExitInfo, Message, SystemMessage};
use crate::pid::{next_pid, Pid};
use crate::runtime::{ActorContext, Runtime};

use dispatcher::{deliver, listing_sink, publish, ListingSink};
use protocol::{Ack, Command};
use store::RegistryStore;
use subscriptions::SubscriptionTable;
use watcher::TerminationWatcher;

/// Client handle to a running receptionist. Cheap to clone.
///
/// None of the protocol operations can fail on the receptionist's side; the
/// returned `Result` only reports that the command could not be enqueued.
#[derive(Clone)]
pub struct Receptionist {
    engine: ActorRef<Command>,
    ask_timeout: Duration,
}

impl Receptionist {
    /// Spawn a receptionist on `runtime`. Most code should use
    /// [`Runtime::receptionist`] instead, which shares one per runtime.
    pub fn start(runtime: &Runtime) -> Self {
        let config = runtime.config().clone();
        let body = |ctx: ActorContext<Command>| async move {
            let engine = Engine::new(ctx.runtime().clone(), ctx.pid());
            engine.run(ctx).await;
        };
        let engine = match config.mailbox_capacity {
            Some(capacity) => runtime.spawn_actor_bounded(capacity, body),
            None => runtime.spawn_actor(body),
        };
        tracing::info!(pid = engine.pid(), "receptionist started");
        Self { engine, ask_timeout: config.ask_timeout() }
    }

    pub fn pid(&self) -> Pid {
        self.engine.pid()
    }

    fn command(&self, cmd: Command) -> Result<()> {
        self.engine.send(cmd).map_err(|cmd| {
            if self.engine.is_closed() {
                Error::ReceptionistStopped
            } else {
                tracing::warn!(?cmd, "receptionist mailbox full, command dropped");
                Error::MailboxFull
            }
        })
    }

    fn register_inner<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        service: &ActorRef<T>,
        ack: Option<Ack>,
    ) -> Result<()> {
        self.command(Command::Register {
            key: key.key_id(),
            service: AnyRef::new(service.clone()),
            ack,
        })
    }

    /// Advertise `service` under `key`. Registering twice is a no-op.
    pub fn register<T: Send + 'static>(&self, key: &ServiceKey<T>, service: &ActorRef<T>) -> Result<()> {
        self.register_inner(key, service, None)
    }

    /// Like [`register`](Self::register), then tell `reply_to` once the
    /// registration is in effect.
    pub fn register_with_ack<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        service: &ActorRef<T>,
        reply_to: &ActorRef<Registered<T>>,
    ) -> Result<()> {
        let ack = Registered { key: key.clone(), service: service.clone() };
        let reply_to = reply_to.clone();
        self.register_inner(key, service, Some(Box::new(move || reply_to.tell(ack))))
    }

    fn deregister_inner<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        service: &ActorRef<T>,
        ack: Option<Ack>,
    ) -> Result<()> {
        self.command(Command::Deregister { key: key.key_id(), service: service.pid(), ack })
    }

    /// Withdraw `service` from `key`. Unknown pairs are ignored.
    pub fn deregister<T: Send + 'static>(&self, key: &ServiceKey<T>, service: &ActorRef<T>) -> Result<()> {
        self.deregister_inner(key, service, None)
    }

    pub fn deregister_with_ack<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        service: &ActorRef<T>,
        reply_to: &ActorRef<Deregistered<T>>,
    ) -> Result<()> {
        let ack = Deregistered { key: key.clone(), service: service.clone() };
        let reply_to = reply_to.clone();
        self.deregister_inner(key, service, Some(Box::new(move || reply_to.tell(ack))))
    }

    /// Receive the current listing of `key` now, and a fresh one after
    /// every membership change until unsubscribed or stopped.
    pub fn subscribe<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        subscriber: &ActorRef<Listing<T>>,
    ) -> Result<()> {
        self.command(Command::Subscribe {
            key: key.key_id(),
            subscriber: subscriber.pid(),
            sink: listing_sink(key.clone(), subscriber.clone()),
        })
    }

    pub fn unsubscribe<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        subscriber: &ActorRef<Listing<T>>,
    ) -> Result<()> {
        self.command(Command::Unsubscribe { key: key.key_id(), subscriber: subscriber.pid() })
    }

    /// Send one listing of `key` to `reply_to`.
    pub fn find<T: Send + 'static>(&self, key: &ServiceKey<T>, reply_to: &ActorRef<Listing<T>>) -> Result<()> {
        self.command(Command::Find {
            key: key.key_id(),
            reply_to: listing_sink(key.clone(), reply_to.clone()),
        })
    }

    /// Find through a temporary reply address and wait for the answer.
    ///
    /// Fails with [`Error::Timeout`] after the configured ask timeout. The
    /// registry is not at fault in that case; the caller may simply retry.
    pub async fn ask_find<T: Send + 'static>(&self, key: &ServiceKey<T>) -> Result<Listing<T>> {
        self.ask_find_within(key, self.ask_timeout).await
    }

    pub async fn ask_find_within<T: Send + 'static>(
        &self,
        key: &ServiceKey<T>,
        within: Duration,
    ) -> Result<Listing<T>> {
        // The reply address never registers or subscribes, so it does not
        // need to be a runtime-hosted actor.
        let (tx, mut rx) = mailbox::channel::<Listing<T>>();
        let reply_to = ActorRef::new(next_pid(), tx);
        self.find(key, &reply_to)?;
        match tokio::time::timeout(within, rx.recv_user()).await {
            Ok(Some(listing)) => Ok(listing),
            Ok(None) | Err(_) => Err(Error::Timeout(within)),
        }
    }
}

/// The receptionist's state, owned by its actor task.
struct Engine {
    store: RegistryStore,
    subscriptions: SubscriptionTable,
    watcher: TerminationWatcher,
}

impl Engine {
    fn new(runtime: Runtime, pid: Pid) -> Self {
        Self {
            store: RegistryStore::default(),
            subscriptions: SubscriptionTable::default(),
            watcher: TerminationWatcher::new(runtime, pid),
        }
    }

    async fn run(mut self, mut ctx: ActorContext<Command>) {
        while let Some(msg) = ctx.recv().await {
            match msg {
                Message::User(cmd) => self.handle(cmd),
                Message::System(SystemMessage::Exit(info)) => self.terminated(info),
            }
        }
    }

    fn handle(&mut self, cmd: Command) {
        tracing::trace!(?cmd, "receptionist command");
        match cmd {
            Command::Register { key, service, ack } => {
                let pid = service.pid();
                let changed = self.store.register(key.clone(), service);
                self.watcher.watch(pid);
                if changed {
                    tracing::debug!(key = %key, pid, "service registered");
                    publish(&self.store, &self.subscriptions, &key);
                }
                if let Some(ack) = ack {
                    ack();
                }
            }
            Command::Deregister { key, service, ack } => {
                if self.store.deregister(&key, service) {
                    tracing::debug!(key = %key, pid = service, "service deregistered");
                    self.release(service);
                    publish(&self.store, &self.subscriptions, &key);
                }
                if let Some(ack) = ack {
                    ack();
                }
            }
            Command::Subscribe { key, subscriber, sink } => {
                self.subscriptions.subscribe(key.clone(), subscriber, sink);
                self.watcher.watch(subscriber);
                // A repeated subscription keeps its first sink, which is the
                // one that must get the snapshot.
                if let Some(sink) = self.subscriptions.sink(&key, subscriber) {
                    deliver(&self.store, &key, sink);
                }
            }
            Command::Unsubscribe { key, subscriber } => {
                if self.subscriptions.unsubscribe(&key, subscriber) {
                    self.release(subscriber);
                }
            }
            Command::Find { key, reply_to } => {
                self.find(&key, &reply_to);
            }
        }
    }

    fn find(&self, key: &KeyId, reply_to: &ListingSink) {
        if !deliver(&self.store, key, reply_to) {
            tracing::trace!(key = %key, "find reply dropped");
        }
    }

    fn release(&mut self, pid: Pid) {
        let referenced = self.store.references(pid) || self.subscriptions.references(pid);
        self.watcher.unwatch_if_unreferenced(pid, referenced);
    }

    fn terminated(&mut self, info: ExitInfo) {
        let pid = info.from;
        if !self.watcher.on_terminated(pid) {
            return;
        }
        let affected = self.store.remove_all(pid);
        let left = self.subscriptions.remove_all(pid);
        tracing::debug!(
            pid,
            reason = ?info.reason,
            services = affected.len(),
            subscriptions = left.len(),
            keys = self.store.key_count(),
            watched = self.watcher.watched_count(),
            "removed terminated actor"
        );
        for key in &affected {
            publish(&self.store, &self.subscriptions, key);
        }
    }
}
