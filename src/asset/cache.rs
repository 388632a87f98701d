use std::collections::HashMap;

use super::Handle;

/// Append-only asset storage, optionally addressed by name.
///
/// Inserting under a name that is already taken replaces the stored asset
/// and keeps the existing handle.
pub struct AssetCache<T> {
    items: Vec<T>,
    names: HashMap<String, Handle<T>>,
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            names: HashMap::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        let index = self.items.len();
        self.items.push(item);
        Handle::new(index)
    }

    pub fn insert_named(&mut self, name: impl Into<String>, item: T) -> Handle<T> {
        let name = name.into();
        if let Some(&handle) = self.names.get(&name) {
            self.items[handle.index()] = item;
            return handle;
        }

        let handle = self.insert(item);
        self.names.insert(name, handle);
        handle
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index())
    }

    pub fn handle_of(&self, name: &str) -> Option<Handle<T>> {
        self.names.get(name).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.handle_of(name).and_then(|handle| self.get(handle))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
