use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A map from a key to a set of values, with no empty sets stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MultiMap<K: Ord, V: Ord> {
    map: BTreeMap<K, BTreeSet<V>>,
    empty: BTreeSet<V>,
}

impl<K: Ord + Clone, V: Ord + Clone> MultiMap<K, V> {
    pub fn new() -> MultiMap<K, V> {
        MultiMap {
            map: BTreeMap::new(),
            empty: BTreeSet::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.map.entry(key).or_default().insert(value);
    }

    pub fn remove(&mut self, key: K, value: V) {
        if let Some(set) = self.map.get_mut(&key) {
            set.remove(&value);
            if set.is_empty() {
                self.map.remove(&key);
            }
        }
    }

    pub fn get(&self, key: K) -> &BTreeSet<V> {
        self.map.get(&key).unwrap_or(&self.empty)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn borrow(&self) -> &BTreeMap<K, BTreeSet<V>> {
        &self.map
    }
}

impl<K: Ord + Clone, V: Ord + Clone> Default for MultiMap<K, V> {
    fn default() -> MultiMap<K, V> {
        MultiMap::new()
    }
}

/// Counts how many times each key appears.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Counter<T: Ord + PartialEq + Clone> {
    map: BTreeMap<T, usize>,
    sum: usize,
}

impl<T: Ord + PartialEq + Clone> Default for Counter<T> {
    fn default() -> Counter<T> {
        Counter::new()
    }
}

impl<T: Ord + PartialEq + Clone> Counter<T> {
    pub fn new() -> Counter<T> {
        Counter {
            map: BTreeMap::new(),
            sum: 0,
        }
    }

    pub fn add(&mut self, val: T, amount: usize) -> usize {
        let entry = self.map.entry(val).or_insert(0);
        *entry += amount;
        self.sum += amount;
        *entry
    }

    pub fn inc(&mut self, val: T) -> usize {
        self.add(val, 1)
    }

    pub fn get(&self, val: T) -> usize {
        self.map.get(&val).cloned().unwrap_or(0)
    }

    pub fn sum(&self) -> usize {
        self.sum
    }

    /// Keys seen at least `n` times.
    pub fn at_least(&self, n: usize) -> Vec<T> {
        self.map
            .iter()
            .filter(|(_, cnt)| **cnt >= n)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn borrow(&self) -> &BTreeMap<T, usize> {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multimap_drops_empty_sets() {
        let mut mm: MultiMap<i64, usize> = MultiMap::new();
        mm.insert(5, 1);
        mm.insert(5, 2);
        mm.insert(7, 1);
        assert_eq!(mm.get(5).len(), 2);
        mm.remove(7, 1);
        assert!(mm.get(7).is_empty());
        assert_eq!(mm.len(), 1);
    }

    #[test]
    fn counter_threshold() {
        let mut c = Counter::new();
        c.inc("a");
        c.inc("a");
        c.inc("b");
        assert_eq!(c.at_least(2), vec!["a"]);
        assert_eq!(c.sum(), 3);
    }
}
