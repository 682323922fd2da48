//! Recency index for the media cache
//!
//! Entries live in an arena of slots addressed by stable indices. Each slot
//! carries `prev`/`next` links forming a doubly-linked recency list (front =
//! most recently used, back = least recently used), and a key map points at
//! the slot holding each entry. Freed slots are reused through a free list.

use std::collections::HashMap;

use super::types::CacheEntry;

#[derive(Debug)]
struct Node {
    entry: CacheEntry,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Key map plus recency list, always updated together
#[derive(Debug, Default)]
pub(crate) struct LruIndex {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    map: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        let idx = *self.map.get(key)?;
        self.node(idx).map(|node| &node.entry)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let idx = *self.map.get(key)?;
        self.slots[idx].as_mut().map(|node| &mut node.entry)
    }

    /// Insert a new entry as most recently used. An existing entry with the
    /// same key is replaced and returned.
    pub fn insert_front(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        let replaced = self.remove(&entry.key);
        let idx = self.alloc(entry);
        self.link_front(idx);
        replaced
    }

    /// Insert a new entry as least recently used. Used when rebuilding
    /// the index from disk, where entries arrive newest first.
    pub fn push_back(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        let replaced = self.remove(&entry.key);
        let idx = self.alloc(entry);
        self.link_back(idx);
        replaced
    }

    /// Move an entry to the front. Returns false if the key is unknown.
    pub fn promote(&mut self, key: &str) -> bool {
        let Some(&idx) = self.map.get(key) else {
            return false;
        };
        if self.head != Some(idx) {
            self.unlink(idx);
            self.link_front(idx);
        }
        true
    }

    /// The least recently used entry
    pub fn back(&self) -> Option<&CacheEntry> {
        self.tail.and_then(|idx| self.node(idx)).map(|node| &node.entry)
    }

    /// Detach and return the least recently used entry
    pub fn pop_back(&mut self) -> Option<CacheEntry> {
        let key = self.back()?.key.clone();
        self.remove(&key)
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        let node = self.slots[idx].take()?;
        self.free.push(idx);
        Some(node.entry)
    }

    /// Remove every entry, returning them front to back
    pub fn drain(&mut self) -> Vec<CacheEntry> {
        let mut entries = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match self.slots[idx].take() {
                Some(node) => {
                    cursor = node.next;
                    entries.push(node.entry);
                }
                None => break,
            }
        }

        self.slots.clear();
        self.free.clear();
        self.map.clear();
        self.head = None;
        self.tail = None;
        entries
    }

    /// Iterate entries from most to least recently used
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            index: self,
            cursor: self.head,
        }
    }

    /// Keys in the key map (unordered)
    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    fn node(&self, idx: usize) -> Option<&Node> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn alloc(&mut self, entry: CacheEntry) -> usize {
        let key = entry.key.clone();
        let node = Node {
            entry,
            prev: None,
            next: None,
        };

        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.map.insert(key, idx);
        idx
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(head) = self.slots[h].as_mut() {
                    head.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => {
                if let Some(tail) = self.slots[t].as_mut() {
                    tail.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(prev_node) = self.slots[p].as_mut() {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(next_node) = self.slots[n].as_mut() {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}

/// Front-to-back iterator over the recency list
pub(crate) struct Iter<'a> {
    index: &'a LruIndex,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CacheEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.index.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.entry)
    }
}
