// The engine: ties together the symbol store, the semantic-type store and
// the precedence graph behind the public operations named throughout
// spec.md §4, plus the handful of distinguished symbols every grammar
// carries implicitly (`$accept`, `error`, `$undefined`, `$end`).
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::diagnostics::DiagnosticSink;
use crate::error::FinalizeError;
use crate::intern::Interner;
use crate::precedence::PrecedenceGraph;
use crate::semantic_type::{SemanticType, SemanticTypeStore};
use crate::symbol::{Assoc, CodeProps, PropKind, Symbol, SymbolClass, UserTokenNumber};
use crate::symbol_store::SymbolStore;

pub struct SymbolTable {
    sink: Rc<dyn DiagnosticSink>,
    symbols: SymbolStore,
    semantic_types: SemanticTypeStore,
    precedence: RefCell<PrecedenceGraph>,

    accept: Symbol,
    errtoken: Symbol,
    undeftoken: Symbol,
    endtoken: RefCell<Symbol>,
    startsymbol: RefCell<Option<Symbol>>,

    packed: RefCell<Option<Vec<Symbol>>>,
    token_translations: RefCell<Option<Vec<u32>>>,
    max_user_token_number: Cell<u32>,
}

impl SymbolTable {
    pub fn new(sink: Rc<dyn DiagnosticSink>) -> Self {
        let interner = Rc::new(Interner::new());
        let symbols = SymbolStore::new(Rc::clone(&interner), Rc::clone(&sink));
        let semantic_types = SemanticTypeStore::new(Rc::clone(&interner));
        let origin = lexan::Location::new("<internal>");

        let accept = symbols.get("$accept", &origin);
        symbols.class_set(&accept, SymbolClass::NonTerm, &origin, false);

        let errtoken = symbols.get("error", &origin);
        symbols.class_set(&errtoken, SymbolClass::Token, &origin, false);

        let undeftoken = symbols.get("$undefined", &origin);
        symbols.class_set(&undeftoken, SymbolClass::Token, &origin, false);

        let endtoken = symbols.get("$end", &origin);
        symbols.class_set(&endtoken, SymbolClass::Token, &origin, false);
        endtoken.set_user_token_number(UserTokenNumber::Number(0));

        Self {
            sink,
            symbols,
            semantic_types,
            precedence: RefCell::new(PrecedenceGraph::new()),
            accept,
            errtoken,
            undeftoken,
            endtoken: RefCell::new(endtoken),
            startsymbol: RefCell::new(None),
            packed: RefCell::new(None),
            token_translations: RefCell::new(None),
            max_user_token_number: Cell::new(0),
        }
    }

    pub fn accept(&self) -> Symbol {
        self.accept.clone()
    }

    pub fn errtoken(&self) -> Symbol {
        self.errtoken.clone()
    }

    pub fn undeftoken(&self) -> Symbol {
        self.undeftoken.clone()
    }

    pub fn endtoken(&self) -> Symbol {
        self.endtoken.borrow().clone()
    }

    pub fn startsymbol(&self) -> Option<Symbol> {
        self.startsymbol.borrow().clone()
    }

    pub fn set_start_symbol(&self, symbol: &Symbol, location: &lexan::Location) {
        let mut current = self.startsymbol.borrow_mut();
        if current.is_none() {
            *current = Some(symbol.clone());
        } else if current.as_ref() != Some(symbol) {
            self.sink.complaint(
                location,
                &format!("start symbol already set (redeclared as \"{}\")", symbol.name()),
            );
        }
    }

    pub fn symbol_get(&self, key: &str, location: &lexan::Location) -> Symbol {
        self.symbols.get(key, location)
    }

    pub fn symbol_lookup(&self, key: &str) -> Option<Symbol> {
        self.symbols.lookup(key)
    }

    /// Records that a rule body mentioned `symbol`. Not one of the named
    /// operations in spec.md §4.1 (rule storage is an external
    /// collaborator, spec.md §1), but the grammar-parsing side needs some
    /// way to drive the `status` transition out of `undeclared` described
    /// in spec.md §3, and to feed the "defined but unused" sweep this
    /// crate adds in Phase A (see `SPEC_FULL.md` §10.5).
    pub fn symbol_reference(&self, symbol: &Symbol, _location: &lexan::Location) {
        symbol.mark_referenced();
        if symbol.status() == crate::symbol::SymbolStatus::Undeclared {
            symbol.set_status(crate::symbol::SymbolStatus::Needed);
        }
    }

    /// The handful of symbols that exist regardless of what the grammar
    /// declares and so are exempt from the "defined but unused" sweep:
    /// they are never meant to appear on the right-hand side of a user
    /// rule.
    pub(crate) fn is_distinguished(&self, symbol: &Symbol) -> bool {
        symbol == &self.accept
            || symbol == &self.errtoken
            || symbol == &self.undeftoken
            || symbol == &self.endtoken()
            || self.startsymbol().as_ref() == Some(symbol)
    }

    pub fn symbol_type_set(&self, symbol: &Symbol, type_name: &str, location: &lexan::Location) {
        self.symbols.type_set(symbol, type_name, location);
        if !type_name.is_empty() {
            let semantic_type = self.semantic_types.get(type_name, location);
            if semantic_type.status() == crate::symbol::SymbolStatus::Undeclared {
                semantic_type.set_status(crate::symbol::SymbolStatus::Needed);
            }
        }
    }

    /// Explicit `%type <tag>` declaration (with or without symbols
    /// following it on the same line). Distinguishes a type deliberately
    /// declared from one merely referenced through a symbol's type name
    /// (see Phase A in `finalize`).
    pub fn declare_semantic_type(&self, key: &str, location: &lexan::Location) -> SemanticType {
        let semantic_type = self.semantic_types.get(key, location);
        semantic_type.set_status(crate::symbol::SymbolStatus::Declared);
        semantic_type
    }

    pub fn symbol_code_props_set(
        &self,
        symbol: &Symbol,
        kind: PropKind,
        code: &str,
        location: &lexan::Location,
    ) {
        self.symbols.code_props_set(symbol, kind, code, location);
    }

    pub fn semantic_type_code_props_set(
        &self,
        semantic_type: &SemanticType,
        kind: PropKind,
        code: &str,
        location: &lexan::Location,
    ) {
        let props = semantic_type.code_props(kind);
        if let Some(previous_location) = props.set(crate::symbol::CodePropsKind::User, code, location) {
            let what = match kind {
                PropKind::Destructor => "%destructor",
                PropKind::Printer => "%printer",
            };
            self.sink.report_with_previous(
                crate::diagnostics::Severity::Complaint,
                location,
                &previous_location,
                &format!("{} already declared for {}", what, semantic_type),
                "previous declaration",
            );
        }
    }

    /// `code_props_get(sym, kind)`: resolves (1) the symbol's own prop, (2)
    /// its semantic type's prop, (3) the default semantic type's prop
    /// (`"*"` if the symbol has a type, else `""`) -- but only for
    /// user-defined symbols (spec.md §4.1, §9 note 5).
    pub fn symbol_code_props_get(&self, symbol: &Symbol, kind: PropKind) -> CodeProps {
        let own = symbol.code_props(kind);
        if own.is_set() {
            own.mark_used();
            return clone_props(own);
        }
        if symbol.is_generated() || symbol == &self.errtoken {
            return CodeProps::default();
        }
        if let Some(type_name) = symbol.type_name() {
            if let Some(semantic_type) = self.semantic_types.lookup(type_name.as_str()) {
                let props = semantic_type.code_props(kind);
                if props.is_set() {
                    props.mark_used();
                    return clone_props(props);
                }
            }
            if let Some(star) = self.semantic_types.lookup("*") {
                let props = star.code_props(kind);
                if props.is_set() {
                    props.mark_used();
                }
                return clone_props(props);
            }
        }
        if let Some(empty) = self.semantic_types.lookup("") {
            let props = empty.code_props(kind);
            if props.is_set() {
                props.mark_used();
            }
            return clone_props(props);
        }
        CodeProps::default()
    }

    pub fn symbol_precedence_set(
        &self,
        symbol: &Symbol,
        prec: u16,
        assoc: Assoc,
        location: &lexan::Location,
    ) {
        self.symbols.precedence_set(symbol, prec, assoc, location);
    }

    pub fn symbol_class_set(
        &self,
        symbol: &Symbol,
        class: SymbolClass,
        location: &lexan::Location,
        declaring: bool,
    ) {
        self.symbols.class_set(symbol, class, location, declaring);
    }

    /// `user_token_number_set(sym, n, loc)`. `n == 0` retargets the
    /// distinguished end token onto `sym` itself (spec.md §4.1: bison
    /// grammars may declare their own name for token 0). Unlike the general
    /// case, the symbol previously playing the end-token role is not `sym`'s
    /// alias -- it is simply retired (spec.md §3 `alias` is reserved for
    /// true identifier/string-literal pairs); retiring excludes it from
    /// packing without disturbing any real alias `sym` already carries.
    /// Goes through the same redeclaration discipline as every other
    /// `user_token_number_set` call: a symbol already assigned a different
    /// user token number (0 or otherwise) draws a two-location complaint
    /// instead of silently being overwritten, and a symbol that is the
    /// identifier side of a real alias pair has the write routed to its
    /// string-form partner.
    pub fn symbol_user_token_number_set(&self, symbol: &Symbol, n: i32, location: &lexan::Location) {
        if n != 0 {
            self.symbols.user_token_number_set_plain(symbol, n, location);
            return;
        }
        let target = match symbol.user_token_number() {
            UserTokenNumber::HasStringAlias => symbol.alias().unwrap_or_else(|| symbol.clone()),
            _ => symbol.clone(),
        };
        if let UserTokenNumber::Number(existing) = target.user_token_number() {
            if existing != 0 {
                self.sink.complaint(
                    location,
                    &format!(
                        "user token number for \"{}\" redeclared as 0 (was {})",
                        target.name(),
                        existing
                    ),
                );
            }
            return;
        }
        let previous_endtoken = self.endtoken.borrow().clone();
        if previous_endtoken == target {
            target.set_user_token_number(UserTokenNumber::Number(0));
            return;
        }
        if previous_endtoken.tag().as_str() != "$end" {
            self.sink.report_with_previous(
                crate::diagnostics::Severity::Complaint,
                location,
                &previous_endtoken.location(),
                &format!(
                    "user token number 0 redeclared for \"{}\" (already assigned to \"{}\")",
                    target.name(),
                    previous_endtoken.name()
                ),
                "previous declaration",
            );
            return;
        }
        if target.alias().is_some() {
            self.sink.complaint(
                location,
                &format!(
                    "\"{}\" already has an alias and cannot become the end token",
                    target.name()
                ),
            );
            return;
        }
        previous_endtoken.retire();
        target.set_number(0);
        target.set_user_token_number(UserTokenNumber::Number(0));
        *self.endtoken.borrow_mut() = target;
    }

    pub fn symbol_make_alias(&self, symbol: &Symbol, string_symbol: &Symbol, location: &lexan::Location) {
        self.symbols.make_alias(symbol, string_symbol, location);
    }

    pub fn semantic_type_get(&self, key: &str, location: &lexan::Location) -> SemanticType {
        self.semantic_types.get(key, location)
    }

    pub fn register_precedence(&self, hi: u32, lo: u32) {
        self.precedence.borrow_mut().register_precedence(hi, lo);
    }

    pub fn register_assoc(&self, i: u32, j: u32) {
        self.precedence.borrow_mut().register_assoc(i, j);
    }

    /// Collapses equivalent precedence-graph nodes into group nodes
    /// (spec.md §4.4 `group_relations`). Not part of `finalize`'s fixed
    /// five-phase pipeline -- a caller only needs it before emitting the
    /// relation DOT graph or the transitive-reduction graph.
    pub fn group_precedence_relations(&self) {
        self.precedence.borrow_mut().group_relations();
    }

    /// Emits the "useless precedence"/"useless associativity" warnings
    /// (spec.md §4.4). Expects `finalize()` to have already run so every
    /// token carries its final packed `number`.
    pub fn warn_unused_precedence(&self) {
        self.precedence.borrow().warn_unused(&self.sink, &self.symbols());
    }

    pub fn write_precedence_graph(&self, path: &std::path::Path) -> std::io::Result<()> {
        self.precedence
            .borrow()
            .write_rel_dot_to_file(&self.symbols(), path)
    }

    pub fn write_precedence_transitive_reduction(&self, path: &std::path::Path) -> std::io::Result<()> {
        self.precedence
            .borrow()
            .write_transitive_reduction_to_file(&self.symbols(), path)
    }

    pub(crate) fn sink(&self) -> &Rc<dyn DiagnosticSink> {
        &self.sink
    }

    pub(crate) fn symbols_store(&self) -> &SymbolStore {
        &self.symbols
    }

    pub(crate) fn semantic_types_store(&self) -> &SemanticTypeStore {
        &self.semantic_types
    }

    pub(crate) fn precedence_graph(&self) -> &RefCell<PrecedenceGraph> {
        &self.precedence
    }

    pub(crate) fn set_packed(&self, packed: Vec<Symbol>) {
        *self.packed.borrow_mut() = Some(packed);
    }

    pub(crate) fn set_token_translations(&self, translations: Vec<u32>, max_user_token_number: u32) {
        *self.token_translations.borrow_mut() = Some(translations);
        self.max_user_token_number.set(max_user_token_number);
    }

    pub(crate) fn fatal(&self, error: FinalizeError) -> ! {
        self.sink.fatal(None, &error.to_string());
    }

    /// Symbols in final packed order, indexed by internal number. Empty
    /// until `finalize()` has run.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.packed.borrow().clone().unwrap_or_default()
    }

    pub fn nsyms(&self) -> u32 {
        self.packed.borrow().as_ref().map_or(0, |p| p.len() as u32)
    }

    pub fn ntokens(&self) -> u32 {
        self.symbols().iter().filter(|s| s.is_token()).count() as u32
    }

    pub fn nvars(&self) -> u32 {
        self.nsyms() - self.ntokens()
    }

    pub fn token_translations(&self) -> Vec<u32> {
        self.token_translations.borrow().clone().unwrap_or_default()
    }

    pub fn max_user_token_number(&self) -> u32 {
        self.max_user_token_number.get()
    }

    /// A short human-readable dump of the finalized table, in the manner
    /// the teacher's `Grammar::write_description` lays out a grammar:
    /// one line per symbol in internal-number order.
    pub fn description(&self) -> String {
        let mut out = String::new();
        for symbol in self.symbols() {
            let type_name = symbol
                .type_name()
                .map(|t| format!("<{}>", t))
                .unwrap_or_default();
            out.push_str(&format!(
                "{:>4}  {:<8}  {:<16}  {:<10}  {:>3}  {}\n",
                symbol.number_or_sentinel(),
                if symbol.is_token() { "token" } else { "nterm" },
                symbol.name(),
                type_name,
                symbol.prec(),
                symbol.assoc(),
            ));
        }
        out
    }
}

fn clone_props(props: &CodeProps) -> CodeProps {
    let clone = CodeProps::default();
    if props.is_set() {
        clone.set(props.kind(), &props.code(), &props.location().unwrap_or_default());
    }
    clone
}
