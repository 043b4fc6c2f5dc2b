// Copyright 2021 Peter Williams <pwil3058@gmail.com> <pwil3058@bigpond.net.au>
//
// Drives `symtab`'s public API the way a grammar-file parser would, on a
// small hard-coded arithmetic grammar, then finalizes the table and
// writes the two diagnostic DOT graphs. There is no grammar-file parser
// in this workspace (spec.md §1 scopes that out); this binary exists so
// the CLI plumbing the generator family depends on is still exercised.
use clap::crate_authors;
use structopt::StructOpt;

use std::{path::PathBuf, process, rc::Rc};

use symtab::{Assoc, DiagnosticSink, StderrSink, SymbolClass, SymbolTable};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "symtab_demo",
    about = "Builds a small hard-coded symbol table and writes its precedence graphs",
    author = crate_authors!(),
)]
struct CLOptions {
    /// Overwrite the output files (if they exist)
    #[structopt(short, long)]
    force: bool,
    /// Directory the two DOT files are written to
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    output_dir: PathBuf,
}

fn build_table(sink: Rc<dyn DiagnosticSink>) -> SymbolTable {
    let table = SymbolTable::new(sink);
    let loc = |label: &str| lexan::Location::new(label);

    let plus = table.symbol_get("PLUS", &loc("demo"));
    table.symbol_class_set(&plus, SymbolClass::Token, &loc("demo"), true);
    table.symbol_precedence_set(&plus, 1, Assoc::Left, &loc("demo"));

    let times = table.symbol_get("TIMES", &loc("demo"));
    table.symbol_class_set(&times, SymbolClass::Token, &loc("demo"), true);
    table.symbol_precedence_set(&times, 2, Assoc::Left, &loc("demo"));

    let num = table.symbol_get("NUM", &loc("demo"));
    table.symbol_class_set(&num, SymbolClass::Token, &loc("demo"), true);

    let expr = table.symbol_get("expr", &loc("demo"));
    table.symbol_class_set(&expr, SymbolClass::NonTerm, &loc("demo"), true);
    table.set_start_symbol(&expr, &loc("demo"));

    for sym in [&plus, &times, &num, &expr] {
        table.symbol_reference(sym, &loc("demo"));
    }

    table.register_precedence(times.number().unwrap(), plus.number().unwrap());
    table.register_assoc(times.number().unwrap(), plus.number().unwrap());

    table.finalize();
    table
}

fn main() {
    let cl_options = CLOptions::from_args();

    let rel_path = cl_options.output_dir.join("precedence.dot");
    let reduction_path = cl_options.output_dir.join("precedence_reduced.dot");
    if !cl_options.force && (rel_path.exists() || reduction_path.exists()) {
        eprintln!(
            "{}: output files already exist",
            cl_options.output_dir.to_string_lossy()
        );
        process::exit(1);
    }

    let sink = Rc::new(StderrSink::new());
    let table = build_table(sink.clone());

    print!("{}", table.description());

    table.warn_unused_precedence();
    table.group_precedence_relations();

    if let Err(error) = table.write_precedence_graph(&rel_path) {
        eprintln!("error writing {}: {}", rel_path.to_string_lossy(), error);
        process::exit(2);
    }
    if let Err(error) = table.write_precedence_transitive_reduction(&reduction_path) {
        eprintln!(
            "error writing {}: {}",
            reduction_path.to_string_lossy(),
            error
        );
        process::exit(2);
    }

    if sink.error_count() > 0 {
        process::exit(4);
    }
}
