//! Core parser infrastructure and top-level SystemVerilog-2017 parsing rules.
//!
//! The `Parser` struct provides primitive operations (advance, expect, eat)
//! and error recovery, while top-level methods parse source files, modules,
//! interfaces, packages, programs, classes, and primitives. Nodes are
//! emitted bottom-up into a [`FileContent`] arena: children are allocated
//! before their parent, so the arena is numbered post-order and the root
//! design node carries the highest index.

use crate::token::{SvToken, Token};
use veril_ast::{FileContent, NodeId, NodeKind, VObject};
use veril_common::{Symbol, SymbolTable};
use veril_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use veril_source::{FileId, SourceDb, Span};

/// Parser-stage diagnostic code (syntax errors).
pub(crate) const E201: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 201,
};

/// Unmatched end label (e.g., `endmodule : wrong`).
pub(crate) const E202: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 202,
};

/// Identifier over the implementation length limit.
pub(crate) const E203: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 203,
};

/// Longest identifier accepted.
const MAX_IDENTIFIER_LEN: usize = 1024;

/// A recursive descent parser for preprocessed SystemVerilog-2017 text.
pub struct Parser<'src> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) source: &'src str,
    pub(crate) file: FileId,
    pub(crate) symbols: &'src SymbolTable,
    pub(crate) sink: &'src DiagnosticSink,
    pub(crate) fc: FileContent,
    /// Marker nodes allocated up front, attached under the design root.
    marker_nodes: Vec<NodeId>,
    /// Earlier siblings of a multi-name declaration, spliced into the item
    /// list just before the declaration's returned node.
    pub(crate) pending_items: Vec<NodeId>,
    /// Line-start offsets of the parsed stream, for line/column fields.
    line_starts: Vec<u32>,
}

impl<'src> Parser<'src> {
    /// Creates a new parser over a lexed token stream.
    ///
    /// Preprocessor marker tokens are split out immediately: each becomes a
    /// leaf node (lowest arena indices) and is later attached under the
    /// design root, keeping the remaining token stream pure syntax.
    pub fn new(
        tokens: Vec<Token>,
        source: &'src str,
        file: FileId,
        library: Symbol,
        symbols: &'src SymbolTable,
        sink: &'src DiagnosticSink,
    ) -> Self {
        let mut fc = FileContent::new(file, library);
        let mut marker_nodes = Vec::new();
        let mut rest = Vec::with_capacity(tokens.len());
        let line_starts = compute_line_starts(source);
        for tok in tokens {
            match tok.kind {
                SvToken::PpMarkerBegin | SvToken::PpMarkerEnd => {
                    let kind = if tok.kind == SvToken::PpMarkerBegin {
                        NodeKind::PpMarkerBegin
                    } else {
                        NodeKind::PpMarkerEnd
                    };
                    let text = &source[tok.span.start as usize..tok.span.end as usize];
                    // Payload is the origin-record index between ':' and the
                    // closing byte.
                    let payload = text
                        .trim_start_matches(['\u{1}', 'B', 'E', ':'])
                        .trim_end_matches('\u{2}');
                    let symbol = symbols.register(payload);
                    let (line, col) = line_col(&line_starts, tok.span.start);
                    let (end_line, end_col) = line_col(&line_starts, tok.span.end);
                    let id = fc.add(VObject::leaf(kind, symbol, file, line, col, end_line, end_col));
                    marker_nodes.push(id);
                }
                _ => rest.push(tok),
            }
        }
        Self {
            tokens: rest,
            pos: 0,
            source,
            file,
            symbols,
            sink,
            fc,
            marker_nodes,
            pending_items: Vec::new(),
            line_starts,
        }
    }

    /// Drains declarations queued by a multi-name item.
    pub(crate) fn take_pending(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.pending_items)
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    pub(crate) fn current(&self) -> SvToken {
        self.tokens[self.pos].kind
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    pub(crate) fn current_text(&self) -> &'src str {
        let span = self.current_span();
        &self.source[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: SvToken) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current() == SvToken::Eof
    }

    pub(crate) fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    pub(crate) fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    pub(crate) fn eat(&mut self, kind: SvToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: SvToken) {
        if !self.eat(kind) {
            self.expected(&format!("{kind:?}"));
        }
    }

    /// Expects and returns an identifier with its span. Emits an error and
    /// returns the bad symbol if the current token is not one.
    pub(crate) fn expect_ident(&mut self) -> (Symbol, Span) {
        if self.at(SvToken::Identifier) || self.at(SvToken::EscapedIdentifier) {
            let span = self.current_span();
            let text = self.current_text();
            if text.len() > MAX_IDENTIFIER_LEN {
                self.sink.emit(Diagnostic::error(
                    E203,
                    format!("identifier exceeds {MAX_IDENTIFIER_LEN} characters"),
                    span,
                ));
            }
            let sym = self.symbols.register(text);
            self.advance();
            (sym, span)
        } else {
            self.expected("identifier");
            (Symbol::BAD, self.current_span())
        }
    }

    pub(crate) fn peek_kind(&self, offset: usize) -> SvToken {
        let idx = self.pos + offset;
        if idx < self.tokens.len() {
            self.tokens[idx].kind
        } else {
            SvToken::Eof
        }
    }

    // ========================================================================
    // Node building
    // ========================================================================

    /// Allocates a node whose children are already in the arena.
    ///
    /// Sibling edges chain each child to its predecessor, the parent's
    /// `child` edge points at the last child, and each child's parent edge
    /// is fixed up to the new node.
    pub(crate) fn finish(
        &mut self,
        kind: NodeKind,
        symbol: Symbol,
        start: Span,
        children: &[NodeId],
    ) -> NodeId {
        let end = self.prev_span();
        let span = if end.start >= start.start {
            start.merge(end)
        } else {
            start
        };
        let (line, col) = line_col(&self.line_starts, span.start);
        let (end_line, end_col) = line_col(&self.line_starts, span.end);

        let mut node = VObject::leaf(kind, symbol, self.file, line, col, end_line, end_col);
        node.child = children.last().copied();
        let id = self.fc.add(node);
        for pair in children.windows(2) {
            self.fc.set_sibling(pair[1], pair[0]);
        }
        for &c in children {
            self.fc.set_parent(c, id);
        }
        id
    }

    /// Allocates a leaf node covering `span`.
    pub(crate) fn leaf(&mut self, kind: NodeKind, symbol: Symbol, span: Span) -> NodeId {
        let (line, col) = line_col(&self.line_starts, span.start);
        let (end_line, end_col) = line_col(&self.line_starts, span.end);
        self.fc
            .add(VObject::leaf(kind, symbol, self.file, line, col, end_line, end_col))
    }

    // ========================================================================
    // Error handling and recovery
    // ========================================================================

    pub(crate) fn error(&self, msg: &str) {
        self.sink
            .emit(Diagnostic::error(E201, msg, self.current_span()));
    }

    pub(crate) fn expected(&self, what: &str) {
        let actual = format!("{:?}", self.current());
        self.sink.emit(Diagnostic::error(
            E201,
            format!("expected {what}, found {actual}"),
            self.current_span(),
        ));
    }

    pub(crate) fn recover_to_semicolon(&mut self) {
        while !self.at_eof() && !self.at(SvToken::Semicolon) {
            self.advance();
        }
        self.eat(SvToken::Semicolon);
    }

    /// Produces an error node at the current token and advances past it.
    pub(crate) fn error_node(&mut self, msg: &str) -> NodeId {
        let span = self.current_span();
        self.error(msg);
        self.advance();
        self.leaf(NodeKind::Error, Symbol::BAD, span)
    }

    // ========================================================================
    // Top-level parsing
    // ========================================================================

    /// Parses a complete source file, consuming the parser.
    ///
    /// The returned [`FileContent`]'s root node has kind
    /// [`NodeKind::Design`] and the highest arena index.
    pub fn parse_source_file(mut self) -> FileContent {
        let start = self.current_span();
        let mut items: Vec<NodeId> = std::mem::take(&mut self.marker_nodes);

        while !self.at_eof() {
            match self.current() {
                SvToken::Module => items.push(self.parse_module()),
                SvToken::Interface => items.push(self.parse_interface()),
                SvToken::Package => items.push(self.parse_package()),
                SvToken::Program => items.push(self.parse_program()),
                SvToken::Class | SvToken::Virtual if self.class_ahead() => {
                    items.push(self.parse_class())
                }
                SvToken::Primitive => items.push(self.parse_udp()),
                SvToken::Bind => items.push(self.parse_bind()),
                SvToken::Import => items.push(self.parse_import()),
                SvToken::Typedef => items.push(self.parse_typedef()),
                SvToken::Parameter | SvToken::Localparam => {
                    items.extend(self.parse_parameter_decl());
                    self.expect(SvToken::Semicolon);
                }
                _ => {
                    items.push(self.error_node(
                        "expected 'module', 'interface', 'package', 'program', 'class', or 'primitive'",
                    ));
                }
            }
        }

        let root = self.finish(NodeKind::Design, Symbol::BAD, start, &items);
        debug_assert_eq!(self.fc.root(), Some(root));
        self.fc
    }

    fn class_ahead(&self) -> bool {
        self.at(SvToken::Class) || (self.at(SvToken::Virtual) && self.peek_kind(1) == SvToken::Class)
    }

    /// Parses a module declaration.
    fn parse_module(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Module);
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();

        if self.at(SvToken::Hash) {
            children.push(self.parse_parameter_port_list());
        }
        if self.at(SvToken::LeftParen) {
            children.push(self.parse_port_list());
        }
        self.expect(SvToken::Semicolon);

        self.parse_items_until(SvToken::Endmodule, &mut children);
        self.expect(SvToken::Endmodule);
        self.check_end_label(name);

        let id = self.finish(NodeKind::Module, name, start, &children);
        self.fc.register_definition(name, id);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses an interface declaration.
    fn parse_interface(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Interface);
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();

        if self.at(SvToken::Hash) {
            children.push(self.parse_parameter_port_list());
        }
        if self.at(SvToken::LeftParen) {
            children.push(self.parse_port_list());
        }
        self.expect(SvToken::Semicolon);

        self.parse_items_until(SvToken::Endinterface, &mut children);
        self.expect(SvToken::Endinterface);
        self.check_end_label(name);

        let id = self.finish(NodeKind::Interface, name, start, &children);
        self.fc.register_definition(name, id);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses a package declaration.
    fn parse_package(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Package);
        let (name, _) = self.expect_ident();
        self.expect(SvToken::Semicolon);

        let mut children = Vec::new();
        self.parse_items_until(SvToken::Endpackage, &mut children);
        self.expect(SvToken::Endpackage);
        self.check_end_label(name);

        let id = self.finish(NodeKind::Package, name, start, &children);
        self.fc.register_definition(name, id);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses a program block declaration.
    fn parse_program(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Program);
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();

        if self.at(SvToken::Hash) {
            children.push(self.parse_parameter_port_list());
        }
        if self.at(SvToken::LeftParen) {
            children.push(self.parse_port_list());
        }
        self.expect(SvToken::Semicolon);

        self.parse_items_until(SvToken::Endprogram, &mut children);
        self.expect(SvToken::Endprogram);
        self.check_end_label(name);

        let id = self.finish(NodeKind::Program, name, start, &children);
        self.fc.register_definition(name, id);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses a class declaration (optionally `virtual`).
    pub(crate) fn parse_class(&mut self) -> NodeId {
        let start = self.current_span();
        self.eat(SvToken::Virtual);
        self.expect(SvToken::Class);
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();

        if self.at(SvToken::Hash) {
            children.push(self.parse_parameter_port_list());
        }
        if self.at(SvToken::Extends) {
            let ext_start = self.current_span();
            self.advance();
            let mut ext_children = Vec::new();
            let base = self.parse_scoped_name(&mut ext_children);
            if self.at(SvToken::Hash) {
                ext_children.push(self.parse_parameter_port_list());
            }
            if self.at(SvToken::LeftParen) {
                // Base constructor arguments.
                self.skip_balanced_parens();
            }
            children.push(self.finish(NodeKind::Extends, base, ext_start, &ext_children));
        }
        self.expect(SvToken::Semicolon);

        self.parse_class_items(&mut children);
        self.expect(SvToken::Endclass);
        self.check_end_label(name);

        let id = self.finish(NodeKind::Class, name, start, &children);
        self.fc.register_definition(name, id);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses a `pkg::name` or plain `name` reference used in `extends`.
    /// Any scope prefix is emitted into `children`; the final segment is the
    /// returned symbol.
    pub(crate) fn parse_scoped_name(&mut self, children: &mut Vec<NodeId>) -> Symbol {
        let (mut name, mut span) = self.expect_ident();
        while self.at(SvToken::ColonColon) {
            children.push(self.leaf(NodeKind::PackageScope, name, span));
            self.advance();
            let (next, next_span) = self.expect_ident();
            name = next;
            span = next_span;
        }
        name
    }

    /// Parses a UDP (`primitive ... endprimitive`).
    fn parse_udp(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Primitive);
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();

        // Port name list.
        if self.eat(SvToken::LeftParen) {
            let list_start = self.prev_span();
            let mut ports = Vec::new();
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                let (pname, pspan) = self.expect_ident();
                ports.push(self.leaf(NodeKind::PortRef, pname, pspan));
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
            children.push(self.finish(NodeKind::UdpPortList, Symbol::BAD, list_start, &ports));
        }
        self.expect(SvToken::Semicolon);

        // Port declarations and optional initial statement.
        loop {
            match self.current() {
                SvToken::Input | SvToken::Output => {
                    children.push(self.parse_non_ansi_port_decl());
                }
                SvToken::Reg => {
                    children.push(self.parse_net_or_var_decl());
                }
                SvToken::Initial => {
                    let init_start = self.current_span();
                    self.advance();
                    let (out_name, out_span) = self.expect_ident();
                    let target = self.leaf(NodeKind::Identifier, out_name, out_span);
                    self.expect(SvToken::Equals);
                    let value = self.parse_expression();
                    self.expect(SvToken::Semicolon);
                    children.push(self.finish(
                        NodeKind::UdpInitial,
                        Symbol::BAD,
                        init_start,
                        &[target, value],
                    ));
                }
                _ => break,
            }
        }

        // Table.
        if self.at(SvToken::Table) {
            let table_start = self.current_span();
            self.advance();
            let mut entries = Vec::new();
            while !self.at(SvToken::Endtable) && !self.at_eof() {
                entries.push(self.parse_udp_table_entry());
            }
            self.expect(SvToken::Endtable);
            children.push(self.finish(NodeKind::UdpTable, Symbol::BAD, table_start, &entries));
        }

        self.expect(SvToken::Endprimitive);
        self.check_end_label(name);

        let id = self.finish(NodeKind::Udp, name, start, &children);
        self.fc.register_definition(name, id);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses one UDP table row up to its semicolon. The row is stored as a
    /// space-separated symbol string.
    fn parse_udp_table_entry(&mut self) -> NodeId {
        let start = self.current_span();
        let mut text = String::new();
        while !self.at(SvToken::Semicolon) && !self.at(SvToken::Endtable) && !self.at_eof() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(self.current_text());
            self.advance();
        }
        self.eat(SvToken::Semicolon);
        let sym = self.symbols.register(&text);
        let span = start.merge(self.prev_span());
        self.leaf(NodeKind::UdpTableEntry, sym, span)
    }

    /// Parses a `bind` directive: `bind target_scope mod inst(...);`.
    pub(crate) fn parse_bind(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Bind);
        let (target, target_span) = self.expect_ident();
        let target_node = self.leaf(NodeKind::Identifier, target, target_span);
        let inst = self.parse_instantiation();
        self.finish(NodeKind::Bind, target, start, &[target_node, inst])
    }

    /// Parses an import item: `import pkg::*;` or `import pkg::name;`.
    pub(crate) fn parse_import(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Import);
        let mut children = Vec::new();
        loop {
            let (pkg, pkg_span) = self.expect_ident();
            self.expect(SvToken::ColonColon);
            let scope = self.leaf(NodeKind::PackageScope, pkg, pkg_span);
            children.push(scope);
            if !self.eat(SvToken::Star) {
                // Named import: the imported symbol rides along as a child.
                let (item, item_span) = self.expect_ident();
                children.push(self.leaf(NodeKind::Identifier, item, item_span));
            }
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::Import, Symbol::BAD, start, &children)
    }

    /// Checks an optional `: label` after an `end*` keyword against the
    /// declaration name.
    pub(crate) fn check_end_label(&mut self, name: Symbol) {
        if self.eat(SvToken::Colon) {
            let (label, span) = self.expect_ident();
            if label != name && !label.is_bad() && !name.is_bad() {
                self.sink.emit(Diagnostic::error(
                    E202,
                    format!(
                        "end label `{}` does not match `{}`",
                        self.symbols.lookup(label),
                        self.symbols.lookup(name)
                    ),
                    span,
                ));
            }
        }
    }

    /// Consumes a balanced parenthesized region, including the delimiters.
    pub(crate) fn skip_balanced_parens(&mut self) {
        if !self.eat(SvToken::LeftParen) {
            return;
        }
        let mut depth = 1u32;
        while depth > 0 && !self.at_eof() {
            match self.current() {
                SvToken::LeftParen => depth += 1,
                SvToken::RightParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }
}

fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut starts = vec![0u32];
    for (i, byte) in source.bytes().enumerate() {
        if byte == b'\n' {
            starts.push((i + 1) as u32);
        }
    }
    starts
}

fn line_col(line_starts: &[u32], offset: u32) -> (u32, u16) {
    let idx = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i - 1,
    };
    let line = (idx as u32) + 1;
    let col = (offset - line_starts[idx] + 1).min(u16::MAX as u32) as u16;
    (line, col)
}
