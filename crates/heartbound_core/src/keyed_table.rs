//! Chained hash table over string keys.
//!
//! Entries live in an owned arena and are linked by index twice: once into
//! the chain of the bucket their key hashes to, and once into a global list
//! that preserves insertion order. Iteration always follows the global list,
//! so serializing a table reproduces the order in which keys were added.

use std::collections::TryReserveError;
use std::iter::FusedIterator;
use std::mem;

use thiserror::Error;

/// Initial hash state (`0xA5` = `0b1010_0101` repeated).
pub const HASH_SEED: u32 = 0xA5A5_A5A5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("out of memory while storing a table entry")]
    OutOfMemory,
}

impl From<TryReserveError> for TableError {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// Hash `key` into a 32-bit value.
///
/// Keys that are empty or at least `key_bound` bytes long are not mixed at
/// all and hash to [`HASH_SEED`]. The result never depends on process state.
pub fn hash_key(key: &str, key_bound: usize) -> u32 {
    let bytes = key.as_bytes();
    let mut hash = HASH_SEED;
    if bytes.is_empty() || bytes.len() >= key_bound {
        return hash;
    }

    for &byte in bytes {
        let b = u32::from(byte);
        hash = hash.wrapping_add(b);
        hash = hash.wrapping_add(b.wrapping_mul(hash));
        hash = hash.rotate_left(1);
    }
    hash
}

/// Bucket that `key` lands in for a table with `bucket_count` slots.
pub fn bucket_index(key: &str, bucket_count: usize, key_bound: usize) -> usize {
    (hash_key(key, key_bound) as usize) % bucket_count.max(1)
}

#[derive(Debug, Clone)]
struct Entry<V> {
    key: String,
    value: V,
    bucket_next: Option<usize>,
    list_prev: Option<usize>,
    list_next: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct KeyedTable<V = String> {
    slots: Vec<Option<Entry<V>>>,
    free: Vec<usize>,
    buckets: Vec<Option<usize>>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    key_bound: usize,
}

impl<V> KeyedTable<V> {
    pub fn new(bucket_count: usize, key_bound: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            buckets: vec![None; bucket_count.max(1)],
            head: None,
            tail: None,
            len: 0,
            key_bound,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_of(&self, key: &str) -> usize {
        bucket_index(key, self.buckets.len(), self.key_bound)
    }

    /// Store `value` under `key`.
    ///
    /// An existing key keeps its place in insertion order and has its value
    /// replaced; the previous value is returned. On allocation failure the
    /// table is left exactly as it was.
    pub fn insert(&mut self, key: &str, value: V) -> Result<Option<V>, TableError> {
        if let Some(index) = self.find(key) {
            let entry = self.entry_mut(index);
            return Ok(Some(mem::replace(&mut entry.value, value)));
        }

        let mut owned_key = String::new();
        owned_key.try_reserve_exact(key.len())?;
        owned_key.push_str(key);
        if self.free.is_empty() {
            self.slots.try_reserve(1)?;
        }

        let entry = Entry {
            key: owned_key,
            value,
            bucket_next: None,
            list_prev: self.tail,
            list_next: None,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(entry);
                index
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.entry_mut(tail).list_next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);

        let bucket = self.bucket_of(key);
        match self.buckets[bucket] {
            None => self.buckets[bucket] = Some(index),
            Some(mut current) => {
                while let Some(next) = self.entry(current).bucket_next {
                    current = next;
                }
                self.entry_mut(current).bucket_next = Some(index);
            }
        }

        self.len += 1;
        Ok(None)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.find(key).map(|index| &self.entry(index).value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let index = self.find(key)?;
        Some(&mut self.entry_mut(index).value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Unlink `key` from its bucket chain and from the ordered list.
    /// Absent keys are ignored.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let bucket = self.bucket_of(key);
        let mut previous: Option<usize> = None;
        let mut current = self.buckets[bucket];
        while let Some(index) = current {
            if self.entry(index).key == key {
                break;
            }
            previous = current;
            current = self.entry(index).bucket_next;
        }
        let index = current?;

        let bucket_next = self.entry(index).bucket_next;
        match previous {
            Some(prev) => self.entry_mut(prev).bucket_next = bucket_next,
            None => self.buckets[bucket] = bucket_next,
        }

        let (list_prev, list_next) = {
            let entry = self.entry(index);
            (entry.list_prev, entry.list_next)
        };
        match list_prev {
            Some(prev) => self.entry_mut(prev).list_next = list_next,
            None => self.head = list_next,
        }
        match list_next {
            Some(next) => self.entry_mut(next).list_prev = list_prev,
            None => self.tail = list_prev,
        }

        let entry = self.slots[index].take()?;
        if self.free.try_reserve(1).is_ok() {
            self.free.push(index);
        }
        self.len -= 1;
        Some(entry.value)
    }

    /// Entries in the order they were first inserted.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            table: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.buckets.iter_mut().for_each(|bucket| *bucket = None);
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn find(&self, key: &str) -> Option<usize> {
        let mut current = self.buckets[self.bucket_of(key)];
        while let Some(index) = current {
            let entry = self.entry(index);
            if entry.key == key {
                return Some(index);
            }
            current = entry.bucket_next;
        }
        None
    }

    fn entry(&self, index: usize) -> &Entry<V> {
        match &self.slots[index] {
            Some(entry) => entry,
            None => unreachable!("linked slot {index} is vacant"),
        }
    }

    fn entry_mut(&mut self, index: usize) -> &mut Entry<V> {
        match &mut self.slots[index] {
            Some(entry) => entry,
            None => unreachable!("linked slot {index} is vacant"),
        }
    }
}

pub struct Iter<'a, V> {
    table: &'a KeyedTable<V>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let entry = self.table.entry(index);
        self.cursor = entry.list_next;
        self.remaining -= 1;
        Some((entry.key.as_str(), &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

impl<'a, V> IntoIterator for &'a KeyedTable<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
