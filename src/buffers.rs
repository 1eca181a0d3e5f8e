use std::collections::HashMap;
use std::fmt;

/// Stable identifier the host assigns to an open document (tab, page).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(String);

impl BufferId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BufferId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Per-buffer state keyed by `BufferId`. Entries are created on first use
/// and must be evicted with `remove` when the host closes the buffer.
#[derive(Debug)]
pub struct BufferMap<T> {
    entries: HashMap<BufferId, T>,
}

impl<T> Default for BufferMap<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> BufferMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &BufferId) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &BufferId) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    pub fn insert(&mut self, id: BufferId, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    pub fn remove(&mut self, id: &BufferId) -> Option<T> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Default> BufferMap<T> {
    /// Entry for `id`, created with `T::default()` if missing.
    pub fn entry(&mut self, id: &BufferId) -> &mut T {
        self.entries.entry(id.clone()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_created_lazily() {
        let mut map: BufferMap<Vec<u8>> = BufferMap::new();
        let id = BufferId::new("main.rs");
        assert!(map.get(&id).is_none());

        map.entry(&id).push(1);
        map.entry(&id).push(2);
        assert_eq!(map.get(&id), Some(&vec![1, 2]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_evicts_entry() {
        let mut map: BufferMap<u32> = BufferMap::new();
        map.insert(BufferId::from("a"), 1);
        map.insert(BufferId::from("b"), 2);

        assert_eq!(map.remove(&BufferId::from("a")), Some(1));
        assert_eq!(map.remove(&BufferId::from("a")), None);
        assert_eq!(map.len(), 1);
    }
}
