// Name interning: returns a canonical handle for each distinct tag string.
// Equality between two `Tag`s is handle equality (pointer identity of the
// shared `Rc<str>`), not string comparison, even though two tags interned
// from equal strings always end up sharing the same handle.
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct Tag(Rc<str>);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_ref().hash(state)
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pool of interned strings. Real production instances are shared
/// (`Rc<Interner>`) between the symbol store and the semantic-type store so
/// that, e.g., a token's name and a `<type>` tag of the same spelling are
/// never confused for one another by accident -- callers keep them apart by
/// construction, the interner only guarantees one handle per spelling.
#[derive(Debug, Default)]
pub struct Interner {
    pool: RefCell<HashMap<Box<str>, Tag>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, text: &str) -> Tag {
        if let Some(tag) = self.pool.borrow().get(text) {
            return tag.clone();
        }
        let tag = Tag(Rc::from(text));
        self.pool
            .borrow_mut()
            .insert(text.to_string().into_boxed_str(), tag.clone());
        tag
    }

    /// Debug-only assertion hook: confirms `tag` was produced by this pool,
    /// i.e. that some earlier `intern()` call returned the very same handle.
    pub fn assert_owned_by(&self, tag: &Tag) {
        debug_assert!(
            self.pool
                .borrow()
                .get(tag.as_str())
                .map_or(false, |owned| Rc::ptr_eq(&owned.0, &tag.0)),
            "tag {:?} was not produced by this interner",
            tag.as_str()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_spellings_share_a_handle() {
        let interner = Interner::new();
        let a = interner.intern("IF");
        let b = interner.intern("IF");
        assert_eq!(a, b);
        assert!(Rc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn distinct_spellings_are_distinct() {
        let interner = Interner::new();
        let a = interner.intern("IF");
        let b = interner.intern("ELSE");
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_is_byte_lexicographic() {
        let interner = Interner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("beta");
        assert!(a < b);
    }
}
