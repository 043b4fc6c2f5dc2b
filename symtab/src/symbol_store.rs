// The symbol store: hash-indexed collection of symbol records, with
// creation, lookup, mutation and tag-order iteration (spec.md §4.1). Most
// of the mutators described in spec.md §4.1 live here; the two that need
// state outside a single symbol's record -- `user_token_number_set` (which
// can retarget the engine's distinguished end-token) and `code_props_get`
// (which falls back to the semantic-type store) -- are implemented one
// level up, on `SymbolTable`.
use std::cell::Cell;
use std::rc::Rc;

use crate::diagnostics::DiagnosticSink;
use crate::error::FinalizeError;
use crate::intern::Interner;
use crate::store::SortedStore;
use crate::symbol::{CodePropsKind, PropKind, Symbol, SymbolClass, SymbolStatus, SYMBOL_NUMBER_MAXIMUM};

fn class_name(class: SymbolClass) -> &'static str {
    match class {
        SymbolClass::Unknown => "symbol",
        SymbolClass::Token => "token",
        SymbolClass::NonTerm => "nonterminal",
    }
}

pub struct SymbolStore {
    interner: Rc<Interner>,
    sink: Rc<dyn DiagnosticSink>,
    store: SortedStore<Symbol>,
    ntokens: Cell<u32>,
    nvars: Cell<u32>,
}

impl SymbolStore {
    pub(crate) fn new(interner: Rc<Interner>, sink: Rc<dyn DiagnosticSink>) -> Self {
        let store = SortedStore::new(Rc::clone(&interner));
        Self {
            interner,
            sink,
            store,
            ntokens: Cell::new(0),
            nvars: Cell::new(0),
        }
    }

    pub fn ntokens(&self) -> u32 {
        self.ntokens.get()
    }

    pub fn nvars(&self) -> u32 {
        self.nvars.get()
    }

    pub fn nsyms(&self) -> u32 {
        self.store.len() as u32
    }

    pub fn iter_sorted(&self) -> Vec<Symbol> {
        self.store.iter_sorted()
    }

    pub fn lookup(&self, key: &str) -> Option<Symbol> {
        let tag = self.interner.intern(key);
        self.store.get_existing(&tag)
    }

    /// `get(key, loc) → Symbol`. Interns `key`; on a fresh key, allocates a
    /// symbol with all-default fields. Fatal if this would exceed
    /// `SYMBOL_NUMBER_MAXIMUM`. A non-quoted, hyphenated name draws a
    /// POSIX-Yacc warning (names with `-` are not portable Yacc
    /// identifiers).
    pub fn get(&self, key: &str, location: &lexan::Location) -> Symbol {
        let tag = self.interner.intern(key);
        if let Some(existing) = self.store.get_existing(&tag) {
            return existing;
        }
        if self.store.len() as u32 >= SYMBOL_NUMBER_MAXIMUM {
            self.sink.fatal(
                Some(location),
                &FinalizeError::TooManySymbols {
                    limit: SYMBOL_NUMBER_MAXIMUM,
                }
                .to_string(),
            );
        }
        let is_quoted = key.starts_with('"') || key.starts_with('\'');
        if !is_quoted && key.contains('-') {
            self.sink.warn_yacc(
                location,
                &format!("symbol name \"{}\" contains a '-'", key),
            );
        }
        let symbol = Symbol::new(tag.clone(), location.clone());
        self.store.insert_new(tag, symbol.clone());
        symbol
    }

    pub fn type_set(&self, symbol: &Symbol, type_name: &str, location: &lexan::Location) {
        if type_name.is_empty() {
            return;
        }
        let tag = self.interner.intern(type_name);
        if let Some(previous_location) = symbol.set_type_name(tag, location) {
            self.sink.report_with_previous(
                crate::diagnostics::Severity::Complaint,
                location,
                &previous_location,
                &format!("type already assigned for \"{}\"", symbol.name()),
                "previous assignment",
            );
        }
    }

    pub fn code_props_set(
        &self,
        symbol: &Symbol,
        kind: PropKind,
        code: &str,
        location: &lexan::Location,
    ) {
        let props = symbol.code_props(kind);
        if let Some(previous_location) = props.set(CodePropsKind::User, code, location) {
            let what = match kind {
                PropKind::Destructor => "%destructor",
                PropKind::Printer => "%printer",
            };
            self.sink.report_with_previous(
                crate::diagnostics::Severity::Complaint,
                location,
                &previous_location,
                &format!("{} already declared for \"{}\"", what, symbol.name()),
                "previous declaration",
            );
        }
    }

    /// `precedence_set(sym, prec, assoc, loc)`: no-op when `assoc` is
    /// undefined; otherwise redeclaration-checks `prec` and forces `sym` to
    /// token class.
    pub fn precedence_set(
        &self,
        symbol: &Symbol,
        prec: u16,
        assoc: crate::symbol::Assoc,
        location: &lexan::Location,
    ) {
        use crate::symbol::Assoc;
        if assoc == Assoc::Undef {
            return;
        }
        if let Some(previous_location) = symbol.prec_location() {
            self.sink.report_with_previous(
                crate::diagnostics::Severity::Complaint,
                location,
                &previous_location,
                &format!("precedence already declared for \"{}\"", symbol.name()),
                "previous declaration",
            );
        } else {
            symbol.set_prec_assoc(prec, assoc, location);
        }
        self.class_set(symbol, SymbolClass::Token, location, false);
    }

    /// `class_set(sym, cls, loc, declaring)`. A mismatched reclassification
    /// is a complaint and leaves the original class untouched. The number
    /// is assigned exactly once, on the transition out of "undefined".
    pub fn class_set(
        &self,
        symbol: &Symbol,
        class: SymbolClass,
        location: &lexan::Location,
        declaring: bool,
    ) {
        let current = symbol.class();
        if current != SymbolClass::Unknown && current != class {
            self.sink.complaint(
                location,
                &format!(
                    "symbol \"{}\" redefined as a {} (previously a {})",
                    symbol.name(),
                    class_name(class),
                    class_name(current)
                ),
            );
        } else {
            if symbol.number().is_none() {
                match class {
                    SymbolClass::Token => {
                        symbol.set_number(self.ntokens.get());
                        self.ntokens.set(self.ntokens.get() + 1);
                    }
                    SymbolClass::NonTerm => {
                        symbol.set_number(self.nvars.get());
                        self.nvars.set(self.nvars.get() + 1);
                    }
                    SymbolClass::Unknown => (),
                }
            }
            symbol.set_class(class);
        }
        if declaring {
            if symbol.status() == SymbolStatus::Declared {
                self.sink.warn_other(
                    Some(location),
                    &format!("symbol \"{}\" redeclared", symbol.name()),
                );
            }
            symbol.set_status(SymbolStatus::Declared);
        }
    }

    /// `make_alias(sym, str, loc)`: links `sym` (the identifier form) with
    /// `str` (its literal-string form) into one logical symbol.
    pub fn make_alias(&self, symbol: &Symbol, string_symbol: &Symbol, location: &lexan::Location) {
        if symbol.alias().is_some() || string_symbol.alias().is_some() {
            self.sink.warn_other(
                Some(location),
                &format!(
                    "symbol \"{}\" already has an alias",
                    if symbol.alias().is_some() { symbol.name() } else { string_symbol.name() }
                ),
            );
            return;
        }
        self.class_set(string_symbol, SymbolClass::Token, location, false);
        string_symbol.set_user_token_number(symbol.user_token_number());
        symbol.set_user_token_number(crate::symbol::UserTokenNumber::HasStringAlias);
        if let Some(number) = symbol.number() {
            string_symbol.set_number(number);
        }
        symbol.set_alias(string_symbol.clone());
        string_symbol.set_alias(symbol.clone());
        if let Some(type_name) = symbol.type_name() {
            self.type_set(string_symbol, type_name.as_str(), &symbol.location());
        }
    }

    /// `user_token_number_set` without the end-token special case; used by
    /// `SymbolTable` after it has handled `n == 0` itself.
    pub(crate) fn user_token_number_set_plain(
        &self,
        symbol: &Symbol,
        n: i32,
        location: &lexan::Location,
    ) {
        use crate::symbol::UserTokenNumber;
        let target = if let Some(alias) = symbol.alias() {
            if symbol.user_token_number() == UserTokenNumber::HasStringAlias {
                alias
            } else {
                symbol.clone()
            }
        } else {
            symbol.clone()
        };
        if let UserTokenNumber::Number(existing) = target.user_token_number() {
            if existing != n {
                self.sink.complaint(
                    location,
                    &format!(
                        "user token number for \"{}\" redeclared as {} (was {})",
                        target.name(),
                        n,
                        existing
                    ),
                );
            }
            return;
        }
        target.set_user_token_number(UserTokenNumber::Number(n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::StderrSink;
    use crate::symbol::Assoc;

    fn new_store() -> SymbolStore {
        SymbolStore::new(Rc::new(Interner::new()), Rc::new(StderrSink::new()))
    }

    #[test]
    fn get_is_idempotent_and_counts_symbols() {
        let store = new_store();
        let loc = lexan::Location::new("t");
        let a = store.get("IF", &loc);
        let b = store.get("IF", &loc);
        assert_eq!(a, b);
        assert_eq!(store.nsyms(), 1);
    }

    #[test]
    fn class_set_assigns_dense_numbers_per_class() {
        let store = new_store();
        let loc = lexan::Location::new("t");
        let tok_a = store.get("A", &loc);
        let tok_b = store.get("B", &loc);
        let nt = store.get("expr", &loc);
        store.class_set(&tok_a, SymbolClass::Token, &loc, true);
        store.class_set(&tok_b, SymbolClass::Token, &loc, true);
        store.class_set(&nt, SymbolClass::NonTerm, &loc, true);
        assert_eq!(tok_a.number(), Some(0));
        assert_eq!(tok_b.number(), Some(1));
        assert_eq!(nt.number(), Some(0));
        assert_eq!(store.ntokens(), 2);
        assert_eq!(store.nvars(), 1);
    }

    #[test]
    fn class_mismatch_is_a_complaint_and_keeps_original_class() {
        let store = new_store();
        let loc = lexan::Location::new("t");
        let sym = store.get("x", &loc);
        store.class_set(&sym, SymbolClass::Token, &loc, false);
        store.class_set(&sym, SymbolClass::NonTerm, &loc, false);
        assert_eq!(sym.class(), SymbolClass::Token);
        assert_eq!(store.sink.error_count(), 1);
    }

    #[test]
    fn make_alias_links_symmetrically_and_shares_number() {
        let store = new_store();
        let loc = lexan::Location::new("t");
        let ident = store.get("IF", &loc);
        let literal = store.get("\"if\"", &loc);
        store.class_set(&ident, SymbolClass::Token, &loc, true);
        store.make_alias(&ident, &literal, &loc);
        assert_eq!(ident.alias(), Some(literal.clone()));
        assert_eq!(literal.alias(), Some(ident.clone()));
        assert_eq!(ident.number(), literal.number());
        assert_eq!(
            ident.user_token_number(),
            crate::symbol::UserTokenNumber::HasStringAlias
        );
    }

    #[test]
    fn precedence_set_forces_token_class() {
        let store = new_store();
        let loc = lexan::Location::new("t");
        let sym = store.get("PLUS", &loc);
        store.precedence_set(&sym, 5, Assoc::Left, &loc);
        assert_eq!(sym.class(), SymbolClass::Token);
        assert_eq!(sym.prec(), 5);
        assert_eq!(sym.assoc(), Assoc::Left);
    }
}
