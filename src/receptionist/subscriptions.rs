// src/receptionist/subscriptions.rs
//! Subscription table: who wants listing updates for which key.

use std::collections::{HashMap, HashSet};

use crate::key::KeyId;
use crate::pid::Pid;

use super::dispatcher::ListingSink;

#[derive(Default)]
pub(crate) struct SubscriptionTable {
    subscribers: HashMap<KeyId, HashMap<Pid, ListingSink>>,
    keys_by_pid: HashMap<Pid, HashSet<KeyId>>,
}

impl SubscriptionTable {
    /// Returns `true` for a new subscription. A repeated subscription keeps
    /// the original sink.
    pub(crate) fn subscribe(&mut self, key: KeyId, pid: Pid, sink: ListingSink) -> bool {
        let subs = self.subscribers.entry(key.clone()).or_default();
        if subs.contains_key(&pid) {
            return false;
        }
        subs.insert(pid, sink);
        self.keys_by_pid.entry(pid).or_default().insert(key);
        true
    }

    pub(crate) fn unsubscribe(&mut self, key: &KeyId, pid: Pid) -> bool {
        let Some(subs) = self.subscribers.get_mut(key) else {
            return false;
        };
        if subs.remove(&pid).is_none() {
            return false;
        }
        if subs.is_empty() {
            self.subscribers.remove(key);
        }
        if let Some(keys) = self.keys_by_pid.get_mut(&pid) {
            keys.remove(key);
            if keys.is_empty() {
                self.keys_by_pid.remove(&pid);
            }
        }
        true
    }

    pub(crate) fn subscribers_of<'a>(
        &'a self,
        key: &KeyId,
    ) -> impl Iterator<Item = (Pid, &'a ListingSink)> + 'a {
        self.subscribers
            .get(key)
            .into_iter()
            .flat_map(|subs| subs.iter().map(|(pid, sink)| (*pid, sink)))
    }

    pub(crate) fn sink(&self, key: &KeyId, pid: Pid) -> Option<&ListingSink> {
        self.subscribers.get(key)?.get(&pid)
    }

    /// Drop every subscription held by `pid`, returning the keys it left.
    pub(crate) fn remove_all(&mut self, pid: Pid) -> Vec<KeyId> {
        let Some(keys) = self.keys_by_pid.remove(&pid) else {
            return Vec::new();
        };
        for key in &keys {
            if let Some(subs) = self.subscribers.get_mut(key) {
                subs.remove(&pid);
                if subs.is_empty() {
                    self.subscribers.remove(key);
                }
            }
        }
        keys.into_iter().collect()
    }

    pub(crate) fn references(&self, pid: Pid) -> bool {
        self.keys_by_pid.contains_key(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ServiceKey;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Ping;

    fn counting_sink(counter: &Arc<AtomicUsize>) -> ListingSink {
        let counter = counter.clone();
        Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[test]
    fn repeated_subscribe_keeps_one_entry() {
        let mut table = SubscriptionTable::default();
        let key = ServiceKey::<Ping>::new("ping").key_id();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        assert!(table.subscribe(key.clone(), 1, counting_sink(&first)));
        assert!(!table.subscribe(key.clone(), 1, counting_sink(&second)));

        for (_, sink) in table.subscribers_of(&key) {
            sink(Vec::new().as_slice());
        }
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_and_remove_all() {
        let mut table = SubscriptionTable::default();
        let a = ServiceKey::<Ping>::new("a").key_id();
        let b = ServiceKey::<Ping>::new("b").key_id();
        let counter = Arc::new(AtomicUsize::new(0));
        table.subscribe(a.clone(), 1, counting_sink(&counter));
        table.subscribe(b.clone(), 1, counting_sink(&counter));
        table.subscribe(b.clone(), 2, counting_sink(&counter));

        assert!(!table.unsubscribe(&a, 2));
        assert!(table.unsubscribe(&a, 1));
        assert_eq!(table.subscribers_of(&a).count(), 0);
        assert!(table.references(1));

        assert_eq!(table.remove_all(1).len(), 1);
        assert!(!table.references(1));
        let remaining: Vec<Pid> = table.subscribers_of(&b).map(|(pid, _)| pid).collect();
        assert_eq!(remaining, vec![2]);
        assert!(table.sink(&b, 2).is_some());
        assert!(table.sink(&b, 1).is_none());
    }
}
