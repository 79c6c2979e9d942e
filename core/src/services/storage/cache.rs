use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
};

/// Small in-process cache. When full, the entry inserted first is evicted,
/// regardless of how recently it was read.
#[derive(Debug)]
pub struct BoundedCache<V> {
    capacity: usize,
    entries: Mutex<Entries<V>>,
}

#[derive(Debug)]
struct Entries<V> {
    order: VecDeque<String>,
    values: HashMap<String, V>,
}

impl<V: Clone> BoundedCache<V> {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        BoundedCache {
            capacity,
            entries: Mutex::new(Entries {
                order: VecDeque::with_capacity(capacity),
                values: HashMap::with_capacity(capacity),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.values.contains_key(key) {
            while entries.values.len() >= self.capacity {
                match entries.order.pop_front() {
                    Some(oldest) => {
                        entries.values.remove(&oldest);
                    }
                    None => break,
                }
            }
            entries.order.push_back(key.to_string());
        }
        entries.values.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
