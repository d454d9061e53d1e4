// src/receptionist/dispatcher.rs
//! Listing notification.
//!
//! The store and subscription table are type-erased. A subscriber's typed
//! `ActorRef<Listing<T>>` is captured in a [`ListingSink`] when it
//! subscribes, so turning erased services back into a `Listing<T>` happens
//! at the edge and cannot pick the wrong type.

use crate::address::{ActorRef, AnyRef};
use crate::key::{KeyId, ServiceKey};

use super::protocol::Listing;
use super::store::RegistryStore;
use super::subscriptions::SubscriptionTable;

/// Builds a listing from the erased services and pushes it to one
/// recipient. Returns `false` if the recipient could not be reached.
pub(crate) type ListingSink = Box<dyn Fn(&[AnyRef]) -> bool + Send + Sync>;

pub(crate) fn listing_sink<T: Send + 'static>(
    key: ServiceKey<T>,
    recipient: ActorRef<Listing<T>>,
) -> ListingSink {
    Box::new(move |services| {
        recipient
            .send(Listing::from_erased(key.clone(), services))
            .is_ok()
    })
}

/// Send the current listing of `key` to every subscriber. Returns the
/// number of subscribers reached.
pub(crate) fn publish(store: &RegistryStore, subscriptions: &SubscriptionTable, key: &KeyId) -> usize {
    let services = store.find(key);
    let mut delivered = 0;
    for (pid, sink) in subscriptions.subscribers_of(key) {
        if sink(services.as_slice()) {
            delivered += 1;
        } else {
            tracing::trace!(pid, key = %key, "listing dropped, subscriber unreachable");
        }
    }
    tracing::debug!(key = %key, instances = services.len(), delivered, "published listing");
    delivered
}

/// Send the current listing of `key` to a single recipient.
pub(crate) fn deliver(store: &RegistryStore, key: &KeyId, sink: &ListingSink) -> bool {
    sink(store.find(key).as_slice())
}
