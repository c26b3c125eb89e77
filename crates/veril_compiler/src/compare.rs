//! Structural tree comparison.
//!
//! Two parsed files compare equal when their trees match node for node,
//! ignoring formatting trivia: whitespace nodes and the preprocessor
//! markers spliced around expansions. This is what lets a reformatted file
//! (or the same file re-preprocessed under equivalent macros) be recognized
//! as unchanged.

use crate::pipeline::Compiler;
use veril_ast::{FileContent, NodeId, NodeKind};

/// Compares two compiled runs file by file, in library order.
///
/// Equal when every pair of corresponding parsed files matches under
/// [`compare_trees`].
pub fn compare_compilations(a: &Compiler, b: &Compiler) -> bool {
    if a.library.files.len() != b.library.files.len() {
        return false;
    }
    a.library
        .files
        .iter()
        .zip(b.library.files.iter())
        .all(|(&fa, &fb)| match (a.files.get(&fa), b.files.get(&fb)) {
            (Some(x), Some(y)) => compare_trees(x, y),
            _ => false,
        })
}

/// Returns `true` when the two trees are structurally identical modulo
/// trivia.
pub fn compare_trees(a: &FileContent, b: &FileContent) -> bool {
    match (a.root(), b.root()) {
        (Some(ra), Some(rb)) => compare_nodes(a, ra, b, rb),
        (None, None) => true,
        _ => false,
    }
}

fn is_trivia(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Whitespace | NodeKind::PpMarkerBegin | NodeKind::PpMarkerEnd
    )
}

fn compare_nodes(a: &FileContent, na: NodeId, b: &FileContent, nb: NodeId) -> bool {
    let va = a.node(na);
    let vb = b.node(nb);
    if va.kind != vb.kind || va.symbol != vb.symbol {
        return false;
    }
    let ca: Vec<NodeId> = a
        .children(na)
        .into_iter()
        .filter(|&c| !is_trivia(a.node(c).kind))
        .collect();
    let cb: Vec<NodeId> = b
        .children(nb)
        .into_iter()
        .filter(|&c| !is_trivia(b.node(c).kind))
        .collect();
    if ca.len() != cb.len() {
        return false;
    }
    ca.iter()
        .zip(cb.iter())
        .all(|(&x, &y)| compare_nodes(a, x, b, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use veril_common::SymbolTable;
    use veril_diagnostics::DiagnosticSink;
    use veril_source::SourceDb;

    fn parse(source: &str, symbols: &SymbolTable) -> FileContent {
        let mut db = SourceDb::new();
        let file = db.add_source("t.sv", source.to_string());
        let sink = DiagnosticSink::new();
        let library = symbols.register("work");
        veril_parser::parse_file(file, &db, library, symbols, &sink)
    }

    #[test]
    fn identical_sources_compare_equal() {
        let symbols = SymbolTable::new();
        let a = parse("module m(input logic a); endmodule", &symbols);
        let b = parse("module m(input logic a); endmodule", &symbols);
        assert!(compare_trees(&a, &b));
    }

    #[test]
    fn formatting_differences_compare_equal() {
        let symbols = SymbolTable::new();
        let a = parse("module m(input logic a); endmodule", &symbols);
        let b = parse(
            "module m (\n    input logic a\n);\nendmodule\n",
            &symbols,
        );
        assert!(compare_trees(&a, &b));
    }

    #[test]
    fn marker_nodes_are_ignored() {
        let symbols = SymbolTable::new();
        let a = parse("module m; wire w; endmodule", &symbols);
        let b = parse(
            "\u{1}B:0\u{2}module m; wire w; endmodule\u{1}E:0\u{2}",
            &symbols,
        );
        assert!(compare_trees(&a, &b));
    }

    #[test]
    fn different_names_compare_unequal() {
        let symbols = SymbolTable::new();
        let a = parse("module m; endmodule", &symbols);
        let b = parse("module n; endmodule", &symbols);
        assert!(!compare_trees(&a, &b));
    }

    #[test]
    fn different_structure_compares_unequal() {
        let symbols = SymbolTable::new();
        let a = parse("module m; wire w; endmodule", &symbols);
        let b = parse("module m; wire w, v; endmodule", &symbols);
        assert!(!compare_trees(&a, &b));
    }

    #[test]
    fn empty_files_compare_equal() {
        let symbols = SymbolTable::new();
        let a = parse("", &symbols);
        let b = parse("", &symbols);
        assert!(compare_trees(&a, &b));
    }
}
