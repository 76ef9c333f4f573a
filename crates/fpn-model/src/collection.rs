//! Id-keyed collection that iterates in first-insertion order.

use std::collections::HashMap;

use fpn_inp::Id;

#[derive(Debug, Clone)]
pub struct Ordered<T> {
    items: Vec<T>,
    index: HashMap<Id, usize>,
}

impl<T> Default for Ordered<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Ordered<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless `id` is already present. Returns `false` for a duplicate,
    /// in which case the earlier item is kept.
    pub fn insert_first(&mut self, id: Id, item: T) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.items.len());
        self.items.push(item);
        true
    }

    pub fn get_or_insert_with(&mut self, id: Id, make: impl FnOnce() -> T) -> &mut T {
        let pos = match self.index.get(&id) {
            Some(&pos) => pos,
            None => {
                self.index.insert(id, self.items.len());
                self.items.push(make());
                self.items.len() - 1
            }
        };
        &mut self.items[pos]
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.index.get(&id).map(|&pos| &self.items[pos])
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.index.get(&id).map(|&pos| &mut self.items[pos])
    }

    pub fn contains(&self, id: Id) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a Ordered<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order_not_id_order() {
        let mut c = Ordered::new();
        assert!(c.insert_first(30, "c"));
        assert!(c.insert_first(10, "a"));
        assert!(!c.insert_first(30, "dup"));
        assert_eq!(c.as_slice(), &["c", "a"]);
        assert_eq!(c.get(30), Some(&"c"));
    }

    #[test]
    fn get_or_insert_reuses_existing_slot() {
        let mut c: Ordered<Vec<u32>> = Ordered::new();
        c.get_or_insert_with(7, Vec::new).push(1);
        c.get_or_insert_with(7, Vec::new).push(2);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get(7), Some(&vec![1, 2]));
    }
}
