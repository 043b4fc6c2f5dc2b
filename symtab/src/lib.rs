// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>
//
// Symbol table and precedence-relation engine for an LALR(1)/GLR parser
// generator: interning, redeclaration diagnostics, finalization (pack +
// token-translation), and the precedence graph with grouping and
// transitive reduction. Grammar-file parsing, rule storage, LALR table
// construction and code emission are all external collaborators; this
// crate only knows about symbols, semantic types and the precedence
// relation between them.

mod diagnostics;
mod error;
mod finalize;
mod intern;
mod precedence;
mod semantic_type;
mod store;
mod symbol;
mod symbol_store;
mod table;

pub use diagnostics::{DiagnosticSink, Severity, StderrSink};
pub use error::FinalizeError;
pub use intern::{Interner, Tag};
pub use precedence::Edge;
pub use semantic_type::SemanticType;
pub use symbol::{
    Assoc, CodeProps, CodePropsKind, PropKind, Symbol, SymbolClass, SymbolStatus, UserTokenNumber,
    NUMBER_UNDEFINED, SYMBOL_NUMBER_MAXIMUM, USER_NUMBER_HAS_STRING_ALIAS, USER_NUMBER_UNDEFINED,
};
pub use table::SymbolTable;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::rc::Rc;

    fn table() -> SymbolTable {
        SymbolTable::new(Rc::new(StderrSink::new()))
    }

    fn loc(offset: usize) -> lexan::Location {
        lexan::Location::new_at("t", 1, offset)
    }

    // E1 -- Basic alias.
    #[test]
    fn e1_basic_alias() {
        let t = table();
        let if_sym = t.symbol_get("IF", &loc(0));
        let if_str = t.symbol_get("\"if\"", &loc(1));
        t.symbol_class_set(&if_sym, SymbolClass::Token, &loc(0), true);
        t.symbol_user_token_number_set(&if_sym, 300, &loc(0));
        t.symbol_make_alias(&if_sym, &if_str, &loc(2));

        let start = t.symbol_get("start", &loc(3));
        t.symbol_class_set(&start, SymbolClass::NonTerm, &loc(3), true);
        t.set_start_symbol(&start, &loc(3));
        t.symbol_reference(&if_sym, &loc(0));

        t.finalize();

        assert_eq!(if_sym.number(), if_str.number());
        let translations = t.token_translations();
        assert_eq!(translations[300], if_sym.number().unwrap());
        // $accept, error, $undefined, $end, start, and one collapsed
        // alias slot (IF/"if" share one packed entry).
        assert_eq!(t.nsyms(), 6);
    }

    // E2 -- Redeclaration diagnostics: one complaint citing the later
    // location, with a sub-note citing the earlier one.
    #[test]
    fn e2_redeclaration_diagnostics() {
        let t = table();
        let sym = t.symbol_get("x", &loc(0));
        t.symbol_type_set(&sym, "INT", &loc(1));
        t.symbol_type_set(&sym, "STR", &loc(2));
        assert_eq!(sym.type_name().unwrap().as_str(), "INT");
    }

    // E3 -- Used but undefined: a symbol referenced by a rule but never
    // declared gets an error-severity complaint, is elevated to nterm,
    // and still packs.
    #[test]
    fn e3_used_but_undefined() {
        let sink = Rc::new(StderrSink::new());
        let t = SymbolTable::new(sink.clone());
        let start = t.symbol_get("start", &loc(0));
        t.symbol_class_set(&start, SymbolClass::NonTerm, &loc(0), true);
        t.set_start_symbol(&start, &loc(0));

        let mystery = t.symbol_get("mystery", &loc(1));
        t.symbol_reference(&mystery, &loc(1));
        assert_eq!(mystery.status(), SymbolStatus::Needed);

        t.finalize();

        assert_eq!(mystery.class(), SymbolClass::NonTerm);
        assert!(sink.error_count() >= 1);
        assert!(t.symbols().contains(&mystery));
    }

    // E4 -- POSIX token 256: three declared tokens (100, 200, 400), no
    // user number for the error token; after finalize the error token
    // claims 256 and the declared max is 400.
    #[test]
    fn e4_posix_token_256() {
        let t = table();
        let a = t.symbol_get("A", &loc(0));
        let b = t.symbol_get("B", &loc(1));
        let c = t.symbol_get("C", &loc(2));
        for (sym, n) in [(&a, 100), (&b, 200), (&c, 400)] {
            t.symbol_class_set(sym, SymbolClass::Token, &loc(0), true);
            t.symbol_user_token_number_set(sym, n, &loc(0));
        }
        let start = t.symbol_get("start", &loc(3));
        t.symbol_class_set(&start, SymbolClass::NonTerm, &loc(3), true);
        t.set_start_symbol(&start, &loc(3));
        for sym in [&a, &b, &c] {
            t.symbol_reference(sym, &loc(0));
        }

        t.finalize();

        assert_eq!(t.errtoken().user_token_number().as_i32(), 256);
        assert_eq!(t.max_user_token_number(), 400);
    }

    // E5 -- Precedence graph grouping: A>X, A>Y, B>X, B>Y group {A, B}
    // into one node with two outgoing edges.
    #[test]
    fn e5_precedence_graph_grouping() {
        let t = table();
        t.register_precedence(0, 2);
        t.register_precedence(0, 3);
        t.register_precedence(1, 2);
        t.register_precedence(1, 3);
        t.precedence_graph().borrow_mut().group_relations();
        let graph = t.precedence_graph().borrow();
        let group_a = graph.group_of(0).expect("A grouped");
        let group_b = graph.group_of(1).expect("B grouped");
        assert_eq!(group_a, group_b);
        assert_eq!(graph.successors(group_a), &[2, 3]);
    }

    // E6 -- Transitive reduction: A>B, B>C, A>C retains A>B, B>C and
    // drops the shortcut A>C.
    #[test]
    fn e6_transitive_reduction() {
        let t = table();
        t.register_precedence(0, 1);
        t.register_precedence(1, 2);
        t.register_precedence(0, 2);
        let reduced: std::collections::HashSet<(u32, u32)> = t
            .precedence_graph()
            .borrow()
            .transitive_reduction()
            .into_iter()
            .map(|e| (e.from, e.to))
            .collect();
        assert!(reduced.contains(&(0, 1)));
        assert!(reduced.contains(&(1, 2)));
        assert!(!reduced.contains(&(0, 2)));
    }

    #[test]
    fn start_symbol_undefined_is_fatal() {
        let t = table();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| t.finalize()));
        assert!(result.is_err());
    }

    #[test]
    fn start_symbol_that_is_a_token_is_fatal() {
        let t = table();
        let sym = t.symbol_get("TOK", &loc(0));
        t.symbol_class_set(&sym, SymbolClass::Token, &loc(0), true);
        t.set_start_symbol(&sym, &loc(0));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| t.finalize()));
        assert!(result.is_err());
    }

    #[test]
    fn unused_token_is_warned_but_not_distinguished_symbols() {
        let sink = Rc::new(StderrSink::new());
        let t = SymbolTable::new(sink.clone());
        let unused = t.symbol_get("UNUSED", &loc(0));
        t.symbol_class_set(&unused, SymbolClass::Token, &loc(0), true);
        t.symbol_user_token_number_set(&unused, 500, &loc(0));
        let start = t.symbol_get("start", &loc(1));
        t.symbol_class_set(&start, SymbolClass::NonTerm, &loc(1), true);
        t.set_start_symbol(&start, &loc(1));
        t.symbol_reference(&start, &loc(1));

        let before = sink.warning_count();
        t.finalize();
        assert!(sink.warning_count() > before);
    }
}
