// The five-phase finalization pipeline (spec.md §4.3), run once over a
// fully-populated table: check-defined, alias-consistency, pack,
// token-translation, start-symbol validation.
use crate::error::FinalizeError;
use crate::symbol::{PropKind, Symbol, SymbolClass, SymbolStatus, UserTokenNumber};
use crate::table::SymbolTable;

impl SymbolTable {
    pub fn finalize(&self) {
        self.propagate_alias_referenced();
        self.phase_a_check_defined();
        self.phase_b_alias_consistency();
        self.phase_c_pack();
        self.phase_d_token_translation();
        self.phase_e_start_symbol();
    }

    /// A rule typically references a token by its identifier form only,
    /// never by its literal-string alias (or vice versa); the "defined
    /// but unused" sweep in Phase A would otherwise false-positive on
    /// whichever half of the pair the grammar never spells out by name.
    /// Runs ahead of Phase A so the sweep sees the merged picture.
    fn propagate_alias_referenced(&self) {
        for symbol in self.symbols_store().iter_sorted() {
            if let Some(alias) = symbol.alias() {
                if symbol.is_referenced() || alias.is_referenced() {
                    symbol.mark_referenced();
                    alias.mark_referenced();
                }
            }
        }
    }

    /// For every still-`unknown` symbol, elevate it to `nterm` (a symbol
    /// that only ever appears on a rule's right-hand side defaults to
    /// being treated as a nonterminal that produces nothing) and report
    /// at *error* severity if a rule actually referenced it (`status =
    /// needed`), else at warning severity. Then sweep the semantic types:
    /// warn on any referenced-but-never-declared type, and on any
    /// declared type whose `%destructor`/`%printer` went unused.
    fn phase_a_check_defined(&self) {
        for symbol in self.symbols_store().iter_sorted() {
            if symbol.is_retired() {
                continue;
            }
            if symbol.class() == SymbolClass::Unknown {
                let referenced = symbol.status() == SymbolStatus::Needed;
                self.symbols_store()
                    .class_set(&symbol, SymbolClass::NonTerm, &symbol.location(), false);
                let message = format!("symbol \"{}\" used but undefined", symbol.name());
                if referenced {
                    self.sink().complaint(&symbol.location(), &message);
                } else {
                    self.sink().warn_other(Some(&symbol.location()), &message);
                }
            } else if !symbol.is_referenced() && !self.is_distinguished(&symbol) {
                let what = if symbol.is_token() { "token" } else { "non-terminal" };
                self.sink().warn_other(
                    Some(&symbol.location()),
                    &format!("{} \"{}\" is not used", what, symbol.name()),
                );
            }
            symbol.code_props(PropKind::Destructor).mark_used();
            symbol.code_props(PropKind::Printer).mark_used();
        }

        for semantic_type in self.semantic_types_store().iter_sorted() {
            if semantic_type.is_reserved() {
                continue;
            }
            match semantic_type.status() {
                SymbolStatus::Needed => {
                    self.sink().warn_other(
                        Some(&semantic_type.location()),
                        &format!("type {} used but undeclared", semantic_type),
                    );
                }
                SymbolStatus::Declared => {
                    for kind in [PropKind::Destructor, PropKind::Printer] {
                        let props = semantic_type.code_props(kind);
                        if props.is_set() && !props.is_used() {
                            let what = match kind {
                                PropKind::Destructor => "%destructor",
                                PropKind::Printer => "%printer",
                            };
                            self.sink().warn_other(
                                props.location().as_ref(),
                                &format!("{} for type {} is never used", what, semantic_type),
                            );
                        }
                    }
                }
                SymbolStatus::Undeclared => (),
            }
        }
    }

    /// For every alias pair, copy whichever fields only one side set onto
    /// the other; a field both sides set keeps its own redeclaration
    /// complaint (already raised when it was written) and is left alone
    /// here.
    fn phase_b_alias_consistency(&self) {
        for symbol in self.symbols_store().iter_sorted() {
            if symbol.user_token_number() != UserTokenNumber::HasStringAlias {
                continue;
            }
            let alias = match symbol.alias() {
                Some(alias) => alias,
                None => continue,
            };
            propagate_type_name(&symbol, &alias);
            propagate_type_name(&alias, &symbol);
            symbol
                .code_props(PropKind::Destructor)
                .propagate_from(alias.code_props(PropKind::Destructor));
            alias
                .code_props(PropKind::Destructor)
                .propagate_from(symbol.code_props(PropKind::Destructor));
            symbol
                .code_props(PropKind::Printer)
                .propagate_from(alias.code_props(PropKind::Printer));
            alias
                .code_props(PropKind::Printer)
                .propagate_from(symbol.code_props(PropKind::Printer));
            propagate_prec(&symbol, &alias);
            propagate_prec(&alias, &symbol);
        }
    }

    /// Allocates the dense `symbols[0..nsyms)` array: nonterminal numbers
    /// are shifted past the token range, the identifier side of an alias
    /// pair is skipped (its string-form partner stands in for it), a
    /// retired record (a `$end` superseded by a user-named token 0) is
    /// dropped outright, and the resulting gaps are compacted away,
    /// renumbering every surviving symbol (and its alias partner, to
    /// preserve `s.alias.number == s.number`) to its final packed index.
    fn phase_c_pack(&self) {
        let ntokens = self.symbols_store().ntokens();
        let mut slots: Vec<Option<Symbol>> = vec![None; self.symbols_store().nsyms() as usize];
        for symbol in self.symbols_store().iter_sorted() {
            if symbol.user_token_number() == UserTokenNumber::HasStringAlias || symbol.is_retired() {
                continue;
            }
            let mut number = symbol.number().unwrap_or(0);
            if symbol.is_nterm() {
                number += ntokens;
                symbol.set_number(number);
            }
            let index = number as usize;
            if index >= slots.len() {
                slots.resize(index + 1, None);
            }
            slots[index] = Some(symbol);
        }

        let mut packed = Vec::with_capacity(slots.len());
        for slot in slots {
            if let Some(symbol) = slot {
                let write_index = packed.len() as u32;
                symbol.set_number(write_index);
                if let Some(alias) = symbol.alias() {
                    alias.set_number(write_index);
                }
                packed.push(symbol);
            }
        }
        self.set_packed(packed);
    }

    /// Builds the lexer-facing translation table: user token numbers are
    /// sparse and externally chosen, `token_translations[u]` maps one back
    /// to the dense internal number (or to `undeftoken` if `u` was never
    /// claimed). `undeftoken` itself is exempt from the "assign a fresh
    /// number to every still-undefined token" sweep below -- like real
    /// Bison, `$undefined` is never lexer-visible, so it never claims a
    /// user token number of its own.
    fn phase_d_token_translation(&self) {
        let packed = self.symbols();
        let declared_max = packed
            .iter()
            .filter(|s| s.is_token())
            .filter_map(|s| match s.user_token_number() {
                UserTokenNumber::Number(n) => Some(n as u32),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let mut max_user_token_number = declared_max.max(256);

        let number_256_claimed = packed
            .iter()
            .any(|s| s.user_token_number() == UserTokenNumber::Number(256));
        if !number_256_claimed && !self.errtoken().user_token_number().is_defined() {
            self.errtoken().set_user_token_number(UserTokenNumber::Number(256));
        }

        let undeftoken = self.undeftoken();
        for symbol in &packed {
            if symbol == &undeftoken {
                continue;
            }
            if symbol.is_token() && !symbol.user_token_number().is_defined() {
                max_user_token_number += 1;
                symbol.set_user_token_number(UserTokenNumber::Number(max_user_token_number as i32));
            }
        }

        let undeftoken_number = self.undeftoken().number().unwrap_or(0);
        let mut translations = vec![undeftoken_number; max_user_token_number as usize + 1];
        for symbol in &packed {
            if !symbol.is_token() {
                continue;
            }
            if let UserTokenNumber::Number(u) = symbol.user_token_number() {
                let u = u as usize;
                if u >= translations.len() {
                    continue;
                }
                if translations[u] != undeftoken_number {
                    self.sink().complaint(
                        &symbol.location(),
                        &format!("user token number {} redeclared", u),
                    );
                } else {
                    translations[u] = symbol.number().unwrap_or(undeftoken_number);
                }
            }
        }
        self.set_token_translations(translations, max_user_token_number);
    }

    fn phase_e_start_symbol(&self) {
        match self.startsymbol() {
            None => self.fatal(FinalizeError::StartSymbolUndefined),
            Some(start) => {
                if start.class() == SymbolClass::Token {
                    self.fatal(FinalizeError::StartSymbolIsToken);
                }
            }
        }
    }
}

fn propagate_type_name(target: &Symbol, source: &Symbol) {
    if let Some(type_name) = source.type_name() {
        let location = source.type_name_location().unwrap_or_else(|| source.location());
        let _ = target.set_type_name(type_name, &location);
    }
}

fn propagate_prec(target: &Symbol, source: &Symbol) {
    if target.prec_location().is_none() {
        if let Some(location) = source.prec_location() {
            target.set_prec_assoc(source.prec(), source.assoc(), &location);
        }
    }
}
