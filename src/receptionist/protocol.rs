// src/receptionist/protocol.rs
//! Messages exchanged with the receptionist.

use std::collections::HashSet;
use std::fmt;

use crate::address::{ActorRef, AnyRef};
use crate::error::{Error, Result};
use crate::key::{KeyId, ServiceKey};
use crate::pid::Pid;

use super::dispatcher::ListingSink;

/// Snapshot of every actor registered under `key` at one point in time.
pub struct Listing<T> {
    key: ServiceKey<T>,
    instances: HashSet<ActorRef<T>>,
}

impl<T: Send + 'static> Listing<T> {
    pub(crate) fn from_erased(key: ServiceKey<T>, refs: &[AnyRef]) -> Self {
        let instances = refs
            .iter()
            .filter_map(|r| {
                let actor = r.downcast::<T>();
                debug_assert!(actor.is_some(), "service registered under mismatched key type");
                actor.cloned()
            })
            .collect();
        Self { key, instances }
    }

    pub fn key(&self) -> &ServiceKey<T> {
        &self.key
    }

    pub fn is_for_key(&self, key: &ServiceKey<T>) -> bool {
        self.key == *key
    }

    /// All registered instances.
    pub fn service_instances(&self) -> &HashSet<ActorRef<T>> {
        &self.instances
    }

    /// Instances, after checking that this listing was produced for `key`.
    /// Useful for actors that subscribe to several keys of the same type.
    pub fn service_instances_for(&self, key: &ServiceKey<T>) -> Result<&HashSet<ActorRef<T>>> {
        if self.is_for_key(key) {
            Ok(&self.instances)
        } else {
            Err(Error::KeyMismatch {
                expected: key.id().to_string(),
                found: self.key.id().to_string(),
            })
        }
    }

    pub fn contains(&self, actor: &ActorRef<T>) -> bool {
        self.instances.contains(actor)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorRef<T>> {
        self.instances.iter()
    }

    /// PIDs of the instances, sorted. Convenient for comparisons.
    pub fn pids(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self.instances.iter().map(ActorRef::pid).collect();
        pids.sort_unstable();
        pids
    }
}

impl<T> Clone for Listing<T> {
    fn clone(&self) -> Self {
        Self { key: self.key.clone(), instances: self.instances.clone() }
    }
}

impl<T> PartialEq for Listing<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.instances == other.instances
    }
}

impl<T> fmt::Debug for Listing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listing")
            .field("key", &self.key)
            .field("instances", &self.instances)
            .finish()
    }
}

macro_rules! ack_message {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        pub struct $name<T> {
            pub key: ServiceKey<T>,
            pub service: ActorRef<T>,
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                Self { key: self.key.clone(), service: self.service.clone() }
            }
        }

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.key == other.key && self.service == other.service
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("key", &self.key)
                    .field("service", &self.service)
                    .finish()
            }
        }
    };
}

ack_message!(
    /// Acknowledgement of a `register_with_ack`.
    Registered
);
ack_message!(
    /// Acknowledgement of a `deregister_with_ack`.
    Deregistered
);

pub(crate) type Ack = Box<dyn FnOnce() + Send>;

/// Type-erased commands processed by the receptionist's loop.
pub(crate) enum Command {
    Register { key: KeyId, service: AnyRef, ack: Option<Ack> },
    Deregister { key: KeyId, service: Pid, ack: Option<Ack> },
    Subscribe { key: KeyId, subscriber: Pid, sink: ListingSink },
    Unsubscribe { key: KeyId, subscriber: Pid },
    Find { key: KeyId, reply_to: ListingSink },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Register { key, service, .. } => write!(f, "Register({key:?}, {})", service.pid()),
            Command::Deregister { key, service, .. } => write!(f, "Deregister({key:?}, {service})"),
            Command::Subscribe { key, subscriber, .. } => write!(f, "Subscribe({key:?}, {subscriber})"),
            Command::Unsubscribe { key, subscriber } => write!(f, "Unsubscribe({key:?}, {subscriber})"),
            Command::Find { key, .. } => write!(f, "Find({key:?})"),
        }
    }
}
