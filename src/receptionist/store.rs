// src/receptionist/store.rs
//! Registry store: which actors currently offer which key.

use std::collections::{HashMap, HashSet};

use crate::address::AnyRef;
use crate::key::KeyId;
use crate::pid::Pid;

#[derive(Default)]
pub(crate) struct RegistryStore {
    /// Mapping of keys to their registered services, by PID.
    services: HashMap<KeyId, HashMap<Pid, AnyRef>>,
    /// Reverse index so a terminated actor can be removed without a scan.
    keys_by_pid: HashMap<Pid, HashSet<KeyId>>,
}

impl RegistryStore {
    /// Returns `true` if the service was not yet registered under `key`.
    pub(crate) fn register(&mut self, key: KeyId, service: AnyRef) -> bool {
        let pid = service.pid();
        let entries = self.services.entry(key.clone()).or_default();
        if entries.contains_key(&pid) {
            return false;
        }
        entries.insert(pid, service);
        self.keys_by_pid.entry(pid).or_default().insert(key);
        true
    }

    /// Returns `true` if the service was registered under `key`.
    pub(crate) fn deregister(&mut self, key: &KeyId, pid: Pid) -> bool {
        let Some(entries) = self.services.get_mut(key) else {
            return false;
        };
        if entries.remove(&pid).is_none() {
            return false;
        }
        if entries.is_empty() {
            self.services.remove(key);
        }
        if let Some(keys) = self.keys_by_pid.get_mut(&pid) {
            keys.remove(key);
            if keys.is_empty() {
                self.keys_by_pid.remove(&pid);
            }
        }
        true
    }

    /// Current services under `key`; empty for unknown keys.
    pub(crate) fn find(&self, key: &KeyId) -> Vec<AnyRef> {
        self.services
            .get(key)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove `pid` from every key, returning the keys whose membership changed.
    pub(crate) fn remove_all(&mut self, pid: Pid) -> Vec<KeyId> {
        let Some(keys) = self.keys_by_pid.remove(&pid) else {
            return Vec::new();
        };
        for key in &keys {
            if let Some(entries) = self.services.get_mut(key) {
                entries.remove(&pid);
                if entries.is_empty() {
                    self.services.remove(key);
                }
            }
        }
        keys.into_iter().collect()
    }

    pub(crate) fn references(&self, pid: Pid) -> bool {
        self.keys_by_pid.contains_key(&pid)
    }

    pub(crate) fn key_count(&self) -> usize {
        self.services.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ActorRef;
    use crate::key::ServiceKey;
    use crate::mailbox;

    struct Ping;

    fn service(pid: Pid) -> AnyRef {
        let (tx, _rx) = mailbox::channel::<Ping>();
        AnyRef::new(ActorRef::new(pid, tx))
    }

    fn pids(store: &RegistryStore, key: &KeyId) -> Vec<Pid> {
        let mut pids: Vec<Pid> = store.find(key).iter().map(AnyRef::pid).collect();
        pids.sort_unstable();
        pids
    }

    #[test]
    fn register_is_idempotent() {
        let mut store = RegistryStore::default();
        let key = ServiceKey::<Ping>::new("ping").key_id();
        assert!(store.register(key.clone(), service(1)));
        assert!(!store.register(key.clone(), service(1)));
        assert_eq!(pids(&store, &key), vec![1]);
    }

    #[test]
    fn deregister_of_non_member_is_a_noop() {
        let mut store = RegistryStore::default();
        let key = ServiceKey::<Ping>::new("ping").key_id();
        assert!(!store.deregister(&key, 1));
        store.register(key.clone(), service(1));
        assert!(!store.deregister(&key, 2));
        assert!(store.deregister(&key, 1));
        assert!(store.find(&key).is_empty());
        assert!(!store.references(1));
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn remove_all_reports_affected_keys() {
        let mut store = RegistryStore::default();
        let a = ServiceKey::<Ping>::new("a").key_id();
        let b = ServiceKey::<Ping>::new("b").key_id();
        let c = ServiceKey::<Ping>::new("c").key_id();
        store.register(a.clone(), service(1));
        store.register(b.clone(), service(1));
        store.register(b.clone(), service(2));
        store.register(c.clone(), service(2));

        let mut affected: Vec<String> = store.remove_all(1).iter().map(|k| k.to_string()).collect();
        affected.sort();
        assert_eq!(affected, vec!["a", "b"]);
        assert!(store.find(&a).is_empty());
        assert_eq!(pids(&store, &b), vec![2]);
        assert_eq!(pids(&store, &c), vec![2]);
        assert!(store.remove_all(1).is_empty());
        assert_eq!(store.key_count(), 2);
    }
}
