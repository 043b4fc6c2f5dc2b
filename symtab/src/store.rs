// The sorted-iteration discipline shared by the symbol store and the
// semantic-type store (spec.md §4.1 "Ordering for finalization"): entries
// are hash-indexed for `O(1)` lookup/insertion, but finalization needs a
// deterministic byte-lexicographic pass over every entry. The first call to
// `iter_sorted` materializes that view once and caches it; any further
// attempt to insert a fresh key after that point is a programmer error
// (the grammar-parsing phase must have finished before finalization
// starts), enforced here with an assertion rather than silently
// invalidating the cache.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::intern::{Interner, Tag};

pub struct SortedStore<T> {
    interner: Rc<Interner>,
    by_tag: RefCell<HashMap<Tag, T>>,
    sorted_cache: RefCell<Option<Vec<T>>>,
}

impl<T: Clone + Ord> SortedStore<T> {
    pub fn new(interner: Rc<Interner>) -> Self {
        Self {
            interner,
            by_tag: RefCell::new(HashMap::new()),
            sorted_cache: RefCell::new(None),
        }
    }

    pub fn intern(&self, key: &str) -> Tag {
        self.interner.intern(key)
    }

    pub fn get_existing(&self, tag: &Tag) -> Option<T> {
        self.by_tag.borrow().get(tag).cloned()
    }

    pub fn insert_new(&self, tag: Tag, value: T) {
        assert!(
            self.sorted_cache.borrow().is_none(),
            "store: insertion of a fresh key after sorted iteration has begun"
        );
        self.by_tag.borrow_mut().insert(tag, value);
    }

    pub fn len(&self) -> usize {
        self.by_tag.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte-lexicographic order over tags (the `T: Ord` bound is expected
    /// to order by tag, which both `Symbol` and `SemanticType` do).
    pub fn iter_sorted(&self) -> Vec<T> {
        if self.sorted_cache.borrow().is_none() {
            let mut values: Vec<T> = self.by_tag.borrow().values().cloned().collect();
            values.sort();
            *self.sorted_cache.borrow_mut() = Some(values);
        }
        self.sorted_cache.borrow().as_ref().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Item(String);

    #[test]
    fn insertion_after_sort_panics() {
        let interner = Rc::new(Interner::new());
        let store: SortedStore<Item> = SortedStore::new(interner);
        let tag_a = store.intern("bbb");
        store.insert_new(tag_a, Item("bbb".to_string()));
        let _ = store.iter_sorted();
        let tag_b = store.intern("aaa");
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            store.insert_new(tag_b, Item("aaa".to_string()));
        }));
        assert!(result.is_err());
    }

    #[test]
    fn sorted_view_is_byte_lexicographic() {
        let interner = Rc::new(Interner::new());
        let store: SortedStore<Item> = SortedStore::new(interner);
        for name in ["zebra", "apple", "mango"] {
            let tag = store.intern(name);
            store.insert_new(tag, Item(name.to_string()));
        }
        let sorted: Vec<String> = store.iter_sorted().into_iter().map(|i| i.0).collect();
        assert_eq!(sorted, vec!["apple", "mango", "zebra"]);
    }
}
