// Mirrors the symbol store, but for `<type>` tags: `{tag, location, status,
// props[destructor|printer]}`. The reserved tags `""` and `"*"` carry
// default code props and are exempt from the "declared but never used"
// check (spec.md §4.2).
use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::intern::Tag;
use crate::symbol::{CodeProps, PropKind, SymbolStatus};

#[derive(Debug)]
struct SemanticTypeData {
    tag: Tag,
    location: lexan::Location,
    status: Cell<SymbolStatus>,
    destructor: CodeProps,
    printer: CodeProps,
}

#[derive(Debug, Clone)]
pub struct SemanticType(Rc<SemanticTypeData>);

impl SemanticType {
    pub(crate) fn new(tag: Tag, location: lexan::Location) -> Self {
        Self(Rc::new(SemanticTypeData {
            tag,
            location,
            status: Cell::new(SymbolStatus::Undeclared),
            destructor: CodeProps::default(),
            printer: CodeProps::default(),
        }))
    }

    pub fn tag(&self) -> Tag {
        self.tag.clone()
    }

    pub fn name(&self) -> String {
        self.tag.as_str().to_string()
    }

    pub fn location(&self) -> lexan::Location {
        self.location.clone()
    }

    pub fn is_reserved(&self) -> bool {
        let name = self.tag.as_str();
        name.is_empty() || name == "*"
    }

    pub fn status(&self) -> SymbolStatus {
        self.status.get()
    }

    pub(crate) fn set_status(&self, status: SymbolStatus) {
        self.status.set(status);
    }

    pub fn code_props(&self, kind: PropKind) -> &CodeProps {
        match kind {
            PropKind::Destructor => &self.destructor,
            PropKind::Printer => &self.printer,
        }
    }
}

impl Deref for SemanticType {
    type Target = SemanticTypeData;
    fn deref(&self) -> &SemanticTypeData {
        &self.0
    }
}

impl PartialEq for SemanticType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SemanticType {}

impl PartialOrd for SemanticType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.tag.cmp(&other.tag)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}>", self.tag)
    }
}

/// Hash-indexed collection of semantic-type records with the same
/// sorted-iteration discipline as the symbol store (see `crate::store`).
pub struct SemanticTypeStore {
    store: crate::store::SortedStore<SemanticType>,
}

impl SemanticTypeStore {
    pub(crate) fn new(interner: Rc<crate::intern::Interner>) -> Self {
        let store = crate::store::SortedStore::new(interner);
        let table = Self { store };
        // The two reserved types always exist so that `code_props_get`'s
        // default-resolution fallback (spec.md §4.1) always has somewhere
        // to land.
        table.get("", &lexan::Location::default());
        table.get("*", &lexan::Location::default());
        table
    }

    pub fn get(&self, key: &str, location: &lexan::Location) -> SemanticType {
        let tag = self.store.intern(key);
        if let Some(existing) = self.store.get_existing(&tag) {
            return existing;
        }
        let semantic_type = SemanticType::new(tag.clone(), location.clone());
        self.store.insert_new(tag, semantic_type.clone());
        semantic_type
    }

    pub fn lookup(&self, key: &str) -> Option<SemanticType> {
        let tag = self.store.intern(key);
        self.store.get_existing(&tag)
    }

    pub fn iter_sorted(&self) -> Vec<SemanticType> {
        self.store.iter_sorted()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    #[test]
    fn reserved_types_preexist_and_are_exempt() {
        let store = SemanticTypeStore::new(Rc::new(Interner::new()));
        let empty = store.lookup("").unwrap();
        let star = store.lookup("*").unwrap();
        assert!(empty.is_reserved());
        assert!(star.is_reserved());
    }

    #[test]
    fn get_is_idempotent_by_identity() {
        let store = SemanticTypeStore::new(Rc::new(Interner::new()));
        let loc = lexan::Location::new("t");
        let a = store.get("INT", &loc);
        let b = store.get("INT", &loc);
        assert_eq!(a, b);
    }
}
