// src/key.rs
//! Typed service keys.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Names a class of interchangeable services that all accept `T`.
///
/// The message type is part of the key's identity: `ServiceKey::<Ping>::new("svc")`
/// and `ServiceKey::<Pong>::new("svc")` are unrelated keys, and only an
/// `ActorRef<Ping>` can ever be registered under the former.
///
/// ```
/// use receptionist::ServiceKey;
///
/// struct Ping;
/// let key = ServiceKey::<Ping>::new("pingService");
/// assert_eq!(key.id(), "pingService");
/// ```
pub struct ServiceKey<T> {
    id: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ServiceKey<T> {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self { id: id.into(), _marker: PhantomData }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type-erased identity used inside the registry.
    pub(crate) fn key_id(&self) -> KeyId {
        KeyId {
            id: self.id.clone(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl<T> Clone for ServiceKey<T> {
    fn clone(&self) -> Self {
        Self { id: self.id.clone(), _marker: PhantomData }
    }
}

impl<T> PartialEq for ServiceKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for ServiceKey<T> {}

impl<T> Hash for ServiceKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey[{}]({})", std::any::type_name::<T>(), self.id)
    }
}

impl<T> fmt::Display for ServiceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Erased key: id plus the message type it was declared with.
#[derive(Clone)]
pub(crate) struct KeyId {
    id: Arc<str>,
    type_id: TypeId,
    type_name: &'static str,
}

impl PartialEq for KeyId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.id == other.id
    }
}

impl Eq for KeyId {}

impl Hash for KeyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.type_id.hash(state);
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey[{}]({})", self.type_name, self.id)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
