use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

/// Token identifying one scheduled firing. A fresh token is minted on every
/// `set`, so a stale timer task can never fire against a replaced entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryHandle(u64);

struct Entry<V> {
    value: V,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner<K, V>
where
    K: Eq + Hash,
{
    entries: DashMap<K, Entry<V>>,
    generations: AtomicU64,
    on_expire: Box<dyn Fn(K, V) + Send + Sync>,
}

/// Keyed map with an optional wall-clock deadline per entry. When a deadline
/// elapses the entry is removed and the store-wide callback runs with the
/// key and value: at most once per `set`, and never after a `cancel` or
/// `delete` that completed before the firing began. The callback runs on a
/// timer task; keep it cheap (the verification queue just forwards an event
/// into the dispatcher channel).
pub struct ExpiringStore<K, V>
where
    K: Eq + Hash,
{
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for ExpiringStore<K, V>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(on_expire: impl Fn(K, V) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                generations: AtomicU64::new(0),
                on_expire: Box::new(on_expire),
            }),
        }
    }

    /// Store `value` under `key`, replacing (and disarming) any previous
    /// entry. With a `ttl` the expiry callback is scheduled for `now + ttl`.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) -> ExpiryHandle {
        let generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(old) = self.inner.entries.insert(
            key.clone(),
            Entry {
                value,
                generation,
                timer: None,
            },
        ) {
            if let Some(timer) = old.timer {
                timer.abort();
            }
        }

        if let Some(ttl) = ttl {
            let weak = Arc::downgrade(&self.inner);
            let timer_key = key.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(ttl).await;
                if let Some(inner) = weak.upgrade() {
                    Inner::fire(&inner, timer_key, generation);
                }
            });
            // The entry may already be gone if the ttl was zero and the
            // timer won the race; in that case the handle has nothing to arm.
            if let Some(mut entry) = self.inner.entries.get_mut(&key) {
                if entry.generation == generation {
                    entry.timer = Some(handle);
                }
            }
        }

        ExpiryHandle(generation)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.entries.get(key).map(|e| e.value.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// Disarm the scheduled firing, leaving the value in place. Idempotent;
    /// a no-op when the firing has already begun. The generation bump makes
    /// cancellation win any race with a timer task that is past its sleep but
    /// has not yet reached the entry lock.
    pub fn cancel(&self, key: &K) {
        if let Some(mut entry) = self.inner.entries.get_mut(key) {
            entry.generation = self.inner.generations.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
        }
    }

    /// Remove the entry without firing the callback, returning the value.
    pub fn delete(&self, key: &K) -> Option<V> {
        self.inner.entries.remove(key).map(|(_, entry)| {
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            entry.value
        })
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Called from the timer task. Removal and the generation check happen
    /// under the map's entry lock, so a concurrent `cancel`/`delete` either
    /// beats the firing (and it becomes a no-op) or strictly follows it.
    fn fire(inner: &Arc<Self>, key: K, generation: u64) {
        let removed = inner
            .entries
            .remove_if(&key, |_, entry| entry.generation == generation);

        if let Some((key, entry)) = removed {
            debug!("expiring-store entry fired");
            (inner.on_expire)(key, entry.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn counting_store() -> (ExpiringStore<u64, &'static str>, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_clone = Arc::clone(&fired);
        let store = ExpiringStore::new(move |_k, _v| {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        (store, fired)
    }

    #[test]
    fn set_and_get_without_ttl() {
        tokio_test::block_on(async {
            let (store, fired) = counting_store();
            store.set(1, "a", None);
            assert_eq!(store.get(&1), Some("a"));
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(fired.load(Ordering::SeqCst), 0);
        });
    }

    #[tokio::test]
    async fn ttl_fires_once_and_removes_entry() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let fired_clone = Arc::clone(&fired);
        let store: ExpiringStore<u64, &str> = ExpiringStore::new(move |k, v| {
            fired_clone.lock().unwrap().push((k, v));
        });

        store.set(1, "a", Some(Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(*fired.lock().unwrap(), vec![(1, "a")]);
        assert!(!store.contains(&1));
    }

    #[tokio::test]
    async fn cancel_prevents_firing_even_when_due() {
        let (store, fired) = counting_store();
        store.set(1, "a", Some(Duration::from_millis(20)));
        store.cancel(&1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        // cancel disarms but keeps the value
        assert_eq!(store.get(&1), Some("a"));
    }

    #[tokio::test]
    async fn delete_removes_without_firing() {
        let (store, fired) = counting_store();
        store.set(1, "a", Some(Duration::from_millis(20)));
        assert_eq!(store.delete(&1), Some("a"));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn replacing_an_entry_disarms_the_old_timer() {
        let (store, fired) = counting_store();
        store.set(1, "a", Some(Duration::from_millis(20)));
        store.set(1, "b", None);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(store.get(&1), Some("b"));
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let (store, fired) = counting_store();
        store.set(1, "a", Some(Duration::from_millis(20)));
        store.cancel(&1);
        store.cancel(&1);
        store.cancel(&2); // unknown key
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handles_are_unique_per_set() {
        let (store, _) = counting_store();
        let a = store.set(1, "a", None);
        let b = store.set(1, "b", None);
        assert_ne!(a, b);
    }
}
