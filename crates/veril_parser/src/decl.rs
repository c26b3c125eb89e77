//! Declaration parsing: ports, parameters, data types, nets and variables,
//! typedefs, tasks/functions, modports, generates, instantiations, and the
//! module-item dispatch loop.

use crate::parser::Parser;
use crate::token::SvToken;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;

impl Parser<'_> {
    /// Returns `true` if the current token starts a net declaration.
    fn at_net_type(&self) -> bool {
        matches!(
            self.current(),
            SvToken::Wire
                | SvToken::Tri
                | SvToken::Tri0
                | SvToken::Tri1
                | SvToken::Wand
                | SvToken::Wor
                | SvToken::Trireg
                | SvToken::Supply0
                | SvToken::Supply1
                | SvToken::Uwire
        )
    }

    /// Returns `true` if the current token is a built-in variable type.
    fn at_var_type(&self) -> bool {
        matches!(
            self.current(),
            SvToken::Logic
                | SvToken::Bit
                | SvToken::Byte
                | SvToken::Shortint
                | SvToken::Int
                | SvToken::Longint
                | SvToken::Integer
                | SvToken::Time
                | SvToken::Real
                | SvToken::Shortreal
                | SvToken::Realtime
                | SvToken::StringKw
                | SvToken::Chandle
                | SvToken::Event
                | SvToken::Reg
                | SvToken::Void
        )
    }

    /// Parses items until `terminator` (not consumed), pushing nodes into
    /// `items`. This is the shared body loop for modules, interfaces,
    /// packages, and programs; nested design elements and generate blocks
    /// route back through it.
    pub(crate) fn parse_items_until(&mut self, terminator: SvToken, items: &mut Vec<NodeId>) {
        while !self.at(terminator) && !self.at_eof() {
            if let Some(item) = self.parse_item() {
                let at = items.len();
                items.push(item);
                // A multi-name declaration queued its earlier siblings;
                // splice them in before the node just pushed.
                if !self.pending_items.is_empty() {
                    let pending = self.take_pending();
                    items.splice(at..at, pending);
                }
            }
        }
    }

    /// Parses one module/interface/package/program item.
    ///
    /// Returns `None` for empty items (stray semicolons).
    pub(crate) fn parse_item(&mut self) -> Option<NodeId> {
        match self.current() {
            SvToken::Semicolon => {
                self.advance();
                None
            }
            SvToken::Input | SvToken::Output | SvToken::Inout | SvToken::Ref => {
                Some(self.parse_non_ansi_port_decl())
            }
            _ if self.at_net_type() => Some(self.parse_net_or_var_decl()),
            _ if self.at_var_type() => Some(self.parse_net_or_var_decl()),
            SvToken::Var | SvToken::Const | SvToken::Static | SvToken::Automatic => {
                Some(self.parse_net_or_var_decl())
            }
            SvToken::Enum | SvToken::Struct | SvToken::Union => Some(self.parse_net_or_var_decl()),
            SvToken::Parameter | SvToken::Localparam => {
                let params = self.parse_parameter_decl();
                self.expect(SvToken::Semicolon);
                self.wrap_many(params)
            }
            SvToken::Typedef => Some(self.parse_typedef()),
            SvToken::Import => Some(self.parse_import()),
            SvToken::Export => Some(self.parse_export()),
            SvToken::Genvar => Some(self.parse_genvar_decl()),
            SvToken::Function => Some(self.parse_function()),
            SvToken::Task => Some(self.parse_task()),
            SvToken::Always
            | SvToken::AlwaysComb
            | SvToken::AlwaysFf
            | SvToken::AlwaysLatch
            | SvToken::Initial
            | SvToken::Final => Some(self.parse_process()),
            SvToken::Assign => Some(self.parse_cont_assign()),
            SvToken::Generate => Some(self.parse_generate_region()),
            SvToken::For => Some(self.parse_gen_for()),
            SvToken::If => Some(self.parse_gen_if()),
            SvToken::Case => Some(self.parse_gen_case()),
            SvToken::Begin => Some(self.parse_gen_block()),
            SvToken::Modport => Some(self.parse_modport()),
            SvToken::Clocking => Some(self.parse_clocking_block()),
            SvToken::Bind => Some(self.parse_bind()),
            SvToken::Assert | SvToken::Assume | SvToken::Cover => Some(self.parse_assertion()),
            SvToken::Property => Some(self.parse_property_decl()),
            SvToken::Sequence => Some(self.parse_sequence_decl()),
            SvToken::Defparam => Some(self.parse_defparam()),
            SvToken::Class | SvToken::Virtual => Some(self.parse_class()),
            SvToken::Identifier | SvToken::EscapedIdentifier => Some(self.parse_named_item()),
            _ => Some(self.error_node("unexpected token in body")),
        }
    }

    /// Flattens several sibling declarations into one returned item; extra
    /// nodes are parented later by the enclosing `finish`, so we only need
    /// to hand back the last one after queueing the rest.
    fn wrap_many(&mut self, mut nodes: Vec<NodeId>) -> Option<NodeId> {
        // Items are collected one at a time by the caller loop; chain all
        // but the last through the pending list.
        match nodes.len() {
            0 => None,
            1 => Some(nodes.remove(0)),
            _ => {
                let last = nodes.pop().unwrap();
                self.pending_items.extend(nodes);
                Some(last)
            }
        }
    }

    /// An item starting with an identifier: an instantiation or a variable
    /// declaration of a user-named type.
    fn parse_named_item(&mut self) -> NodeId {
        // `name #(` / `name inst (` → instantiation.
        let next = self.peek_kind(1);
        let is_instantiation = next == SvToken::Hash
            || ((next == SvToken::Identifier || next == SvToken::EscapedIdentifier)
                && self.peek_kind(2) == SvToken::LeftParen);
        if is_instantiation {
            self.parse_instantiation()
        } else {
            self.parse_net_or_var_decl()
        }
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Parses `#( ... )` parameter ports.
    pub(crate) fn parse_parameter_port_list(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Hash);
        self.expect(SvToken::LeftParen);
        let mut children = Vec::new();
        while !self.at(SvToken::RightParen) && !self.at_eof() {
            match self.current() {
                SvToken::Parameter | SvToken::Localparam => {
                    children.extend(self.parse_parameter_decl());
                }
                SvToken::Comma => {
                    self.advance();
                }
                _ => {
                    // Bare `name = expr` or `type`-less continuation.
                    children.push(self.parse_param_assignment_decl(false));
                }
            }
        }
        self.expect(SvToken::RightParen);
        self.finish(NodeKind::ParamPortList, Symbol::BAD, start, &children)
    }

    /// Parses `parameter ...` / `localparam ...` (without the trailing
    /// semicolon), producing one node per declared name.
    pub(crate) fn parse_parameter_decl(&mut self) -> Vec<NodeId> {
        let local = self.at(SvToken::Localparam);
        self.advance();

        // `parameter type T = int`
        if self.current_text() == "type" && self.peek_kind(1) == SvToken::Identifier {
            self.advance();
            let mut out = Vec::new();
            loop {
                let start = self.current_span();
                let (name, _) = self.expect_ident();
                let mut children = Vec::new();
                if self.eat(SvToken::Equals) {
                    children.push(self.parse_data_type());
                }
                out.push(self.finish(NodeKind::TypeParameter, name, start, &children));
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            return out;
        }

        // Optional data type / range before the first name.
        let type_node = self.maybe_parse_param_type();

        let mut out = Vec::new();
        let mut next_type = type_node;
        loop {
            out.push(self.parse_param_tail(local, next_type.take()));
            if !self.eat(SvToken::Comma) {
                break;
            }
            // A fresh `parameter`/`localparam` keyword starts a new
            // declaration; the caller's loop picks it up.
            if matches!(self.current(), SvToken::Parameter | SvToken::Localparam) {
                break;
            }
            // `parameter int A = 1, int B = 2` retypes mid-list.
            next_type = self.maybe_parse_param_type();
        }
        out
    }

    /// A parameter's optional leading type: builtin type, signing, packed
    /// dimensions, or a named type followed by a name.
    fn maybe_parse_param_type(&mut self) -> Option<NodeId> {
        if self.at_var_type()
            || self.at(SvToken::Signed)
            || self.at(SvToken::Unsigned)
            || self.at(SvToken::LeftBracket)
        {
            Some(self.parse_data_type())
        } else if self.at(SvToken::Identifier) && self.peek_kind(1) == SvToken::Identifier {
            Some(self.parse_data_type())
        } else {
            None
        }
    }

    fn parse_param_tail(&mut self, local: bool, type_node: Option<NodeId>) -> NodeId {
        let start = self.current_span();
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();
        if let Some(t) = type_node {
            children.push(t);
        }
        while self.at(SvToken::LeftBracket) {
            children.push(self.parse_dimension(NodeKind::UnpackedDimension));
        }
        if self.eat(SvToken::Equals) {
            children.push(self.parse_expression());
        }
        let kind = if local {
            NodeKind::Localparam
        } else {
            NodeKind::Parameter
        };
        self.finish(kind, name, start, &children)
    }

    /// Bare `name = expr` inside a parameter port list.
    fn parse_param_assignment_decl(&mut self, local: bool) -> NodeId {
        self.parse_param_tail(local, None)
    }

    // ========================================================================
    // Ports
    // ========================================================================

    /// Parses a module/interface/program `( ... )` port list.
    pub(crate) fn parse_port_list(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::LeftParen);
        let mut children = Vec::new();

        // Detect non-ANSI style: a bare identifier list.
        let non_ansi = (self.at(SvToken::Identifier) || self.at(SvToken::EscapedIdentifier))
            && matches!(
                self.peek_kind(1),
                SvToken::Comma | SvToken::RightParen
            );

        if non_ansi {
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                let (name, span) = self.expect_ident();
                children.push(self.leaf(NodeKind::PortRef, name, span));
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
        } else {
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                children.push(self.parse_ansi_port_group());
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
        }
        self.expect(SvToken::RightParen);
        self.finish(NodeKind::PortList, Symbol::BAD, start, &children)
    }

    /// One ANSI port declaration group: direction/type then one name.
    ///
    /// Comma-separated continuation names without a fresh direction are
    /// parsed as groups carrying an implicit type.
    fn parse_ansi_port_group(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();

        if matches!(
            self.current(),
            SvToken::Input | SvToken::Output | SvToken::Inout | SvToken::Ref
        ) {
            let dir_sym = self.symbols.register(self.current_text());
            let span = self.current_span();
            self.advance();
            children.push(self.leaf(NodeKind::Direction, dir_sym, span));
        }

        // Interface port: `ifname.modport name` or the `interface` keyword.
        // A bare `typename name` port parses as a named data type; the
        // component compiler decides later whether the name is an interface.
        if (self.at(SvToken::Identifier) && self.peek_kind(1) == SvToken::Dot)
            || self.at(SvToken::Interface)
        {
            let hdr_start = self.current_span();
            let iface_sym = if self.at(SvToken::Interface) {
                let s = self.symbols.register("interface");
                self.advance();
                s
            } else {
                let (s, _) = self.expect_ident();
                s
            };
            let mut hdr_children = Vec::new();
            if self.eat(SvToken::Dot) {
                let (mp, mp_span) = self.expect_ident();
                hdr_children.push(self.leaf(NodeKind::Identifier, mp, mp_span));
            }
            children.push(self.finish(
                NodeKind::InterfacePortHeader,
                iface_sym,
                hdr_start,
                &hdr_children,
            ));
        } else if self.at_net_type()
            || self.at_var_type()
            || self.at(SvToken::Var)
            || self.at(SvToken::Signed)
            || self.at(SvToken::Unsigned)
            || self.at(SvToken::LeftBracket)
            || (self.at(SvToken::Identifier)
                && matches!(
                    self.peek_kind(1),
                    SvToken::Identifier | SvToken::EscapedIdentifier | SvToken::ColonColon
                ))
        {
            children.push(self.parse_data_type());
        }

        children.push(self.parse_declarator());
        self.finish(NodeKind::Port, Symbol::BAD, start, &children)
    }

    /// A non-ANSI port declaration inside the body:
    /// `input logic [7:0] a, b;`
    pub(crate) fn parse_non_ansi_port_decl(&mut self) -> NodeId {
        let start = self.current_span();
        let dir_sym = self.symbols.register(self.current_text());
        let dir_span = self.current_span();
        self.advance();
        let mut children = vec![self.leaf(NodeKind::Direction, dir_sym, dir_span)];

        if self.at_net_type() || self.at_var_type() || self.at(SvToken::Var) {
            children.push(self.parse_data_type());
        } else if self.at(SvToken::Signed)
            || self.at(SvToken::Unsigned)
            || self.at(SvToken::LeftBracket)
        {
            children.push(self.parse_data_type());
        }

        loop {
            children.push(self.parse_declarator());
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::NonAnsiPortDecl, Symbol::BAD, start, &children)
    }

    // ========================================================================
    // Data types and declarations
    // ========================================================================

    /// Parses a data type: builtin keyword, named (possibly package-scoped)
    /// type, enum/struct/union, with optional signing and packed dimensions.
    pub(crate) fn parse_data_type(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();

        self.eat(SvToken::Var);
        self.eat(SvToken::Const);
        self.eat(SvToken::Static);
        self.eat(SvToken::Automatic);

        let symbol = match self.current() {
            SvToken::Enum => {
                let e = self.parse_enum_type();
                children.push(e);
                Symbol::BAD
            }
            SvToken::Struct | SvToken::Union => {
                let s = self.parse_struct_or_union_type();
                children.push(s);
                Symbol::BAD
            }
            SvToken::Identifier | SvToken::EscapedIdentifier => {
                let mut scope = Vec::new();
                let name = self.parse_scoped_name(&mut scope);
                children.extend(scope);
                name
            }
            _ if self.at_net_type() || self.at_var_type() => {
                let sym = self.symbols.register(self.current_text());
                let span = self.current_span();
                self.advance();
                children.push(self.leaf(NodeKind::TypeKeyword, sym, span));
                sym
            }
            // Implicit type: just signing and/or a range.
            _ => Symbol::BAD,
        };

        if self.at(SvToken::Signed) || self.at(SvToken::Unsigned) {
            let sym = self.symbols.register(self.current_text());
            let span = self.current_span();
            self.advance();
            children.push(self.leaf(NodeKind::Signing, sym, span));
        }
        while self.at(SvToken::LeftBracket) {
            children.push(self.parse_dimension(NodeKind::PackedDimension));
        }

        self.finish(NodeKind::DataType, symbol, start, &children)
    }

    /// Parses `enum [base_type] { name [= expr], ... }`.
    fn parse_enum_type(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Enum);
        let mut children = Vec::new();
        if !self.at(SvToken::LeftBrace) {
            children.push(self.parse_data_type());
        }
        self.expect(SvToken::LeftBrace);
        while !self.at(SvToken::RightBrace) && !self.at_eof() {
            let m_start = self.current_span();
            let (name, _) = self.expect_ident();
            let mut m_children = Vec::new();
            if self.eat(SvToken::Equals) {
                m_children.push(self.parse_expression());
            }
            children.push(self.finish(NodeKind::EnumMember, name, m_start, &m_children));
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::RightBrace);
        self.finish(NodeKind::EnumType, Symbol::BAD, start, &children)
    }

    /// Parses `struct|union [packed] [signed] { members } `.
    fn parse_struct_or_union_type(&mut self) -> NodeId {
        let start = self.current_span();
        let kind = if self.at(SvToken::Union) {
            NodeKind::UnionType
        } else {
            NodeKind::StructType
        };
        self.advance();
        let mut children = Vec::new();
        if self.at(SvToken::Packed) {
            let sym = self.symbols.register("packed");
            let span = self.current_span();
            self.advance();
            children.push(self.leaf(NodeKind::Signing, sym, span));
        }
        self.eat(SvToken::Signed);
        self.expect(SvToken::LeftBrace);
        while !self.at(SvToken::RightBrace) && !self.at_eof() {
            let m_start = self.current_span();
            let ty = self.parse_data_type();
            let mut members = vec![ty];
            loop {
                members.push(self.parse_declarator());
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::Semicolon);
            children.push(self.finish(NodeKind::StructMember, Symbol::BAD, m_start, &members));
        }
        self.expect(SvToken::RightBrace);
        self.finish(kind, Symbol::BAD, start, &children)
    }

    /// Parses a `[...]` dimension (range `[msb:lsb]` or size `[n]`).
    pub(crate) fn parse_dimension(&mut self, kind: NodeKind) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::LeftBracket);
        let mut children = Vec::new();
        if !self.at(SvToken::RightBracket) {
            children.push(self.parse_expression());
            if self.eat(SvToken::Colon) {
                children.push(self.parse_expression());
            }
        }
        self.expect(SvToken::RightBracket);
        self.finish(kind, Symbol::BAD, start, &children)
    }

    /// Parses `name [unpacked dims] [= init]`.
    pub(crate) fn parse_declarator(&mut self) -> NodeId {
        let start = self.current_span();
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();
        while self.at(SvToken::LeftBracket) {
            children.push(self.parse_dimension(NodeKind::UnpackedDimension));
        }
        if self.eat(SvToken::Equals) {
            children.push(self.parse_expression());
        }
        self.finish(NodeKind::Declarator, name, start, &children)
    }

    /// Parses a net or variable declaration (also used for UDP `reg` decls
    /// and named-type declarations).
    pub(crate) fn parse_net_or_var_decl(&mut self) -> NodeId {
        let start = self.current_span();
        let is_net = self.at_net_type();
        let ty = self.parse_data_type();
        let mut children = vec![ty];
        loop {
            children.push(self.parse_declarator());
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::Semicolon);
        let kind = if is_net {
            NodeKind::NetDecl
        } else {
            NodeKind::VarDecl
        };
        self.finish(kind, Symbol::BAD, start, &children)
    }

    /// Parses `typedef <type> name [dims];` (and forward class typedefs).
    pub(crate) fn parse_typedef(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Typedef);

        // Forward declaration: `typedef class C;`
        if self.at(SvToken::Class) {
            self.advance();
            let (name, _) = self.expect_ident();
            self.expect(SvToken::Semicolon);
            return self.finish(NodeKind::Typedef, name, start, &[]);
        }

        let ty = self.parse_data_type();
        let (name, _) = self.expect_ident();
        let mut children = vec![ty];
        while self.at(SvToken::LeftBracket) {
            children.push(self.parse_dimension(NodeKind::UnpackedDimension));
        }
        self.expect(SvToken::Semicolon);
        let id = self.finish(NodeKind::Typedef, name, start, &children);
        self.fc.register_declaration(name, id);
        id
    }

    fn parse_export(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Export);
        // `export *::*;` or named exports; either way consume to ';'.
        let mut children = Vec::new();
        while !self.at(SvToken::Semicolon) && !self.at_eof() {
            if self.at(SvToken::Identifier) {
                let (name, span) = self.expect_ident();
                children.push(self.leaf(NodeKind::PackageScope, name, span));
            } else {
                self.advance();
            }
        }
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::Export, Symbol::BAD, start, &children)
    }

    fn parse_genvar_decl(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Genvar);
        let mut children = Vec::new();
        loop {
            let (name, span) = self.expect_ident();
            children.push(self.leaf(NodeKind::Declarator, name, span));
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::GenvarDecl, Symbol::BAD, start, &children)
    }

    fn parse_defparam(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Defparam);
        let target = self.parse_expression();
        self.expect(SvToken::Equals);
        let value = self.parse_expression();
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::Defparam, Symbol::BAD, start, &[target, value])
    }

    // ========================================================================
    // Tasks and functions
    // ========================================================================

    /// Parses a function declaration with its body.
    pub(crate) fn parse_function(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Function);
        self.eat(SvToken::Automatic);
        self.eat(SvToken::Static);

        let mut children = Vec::new();
        // Return type, unless the next identifier is immediately the name.
        let has_return_type = !((self.at(SvToken::Identifier)
            || self.at(SvToken::EscapedIdentifier))
            && matches!(
                self.peek_kind(1),
                SvToken::LeftParen | SvToken::Semicolon
            ));
        if has_return_type {
            children.push(self.parse_data_type());
        }
        let (name, _) = self.expect_ident();

        if self.eat(SvToken::LeftParen) {
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                children.push(self.parse_tf_port());
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
        }
        self.expect(SvToken::Semicolon);

        while !self.at(SvToken::Endfunction) && !self.at_eof() {
            children.push(self.parse_statement());
        }
        self.expect(SvToken::Endfunction);
        self.check_end_label(name);

        let id = self.finish(NodeKind::FunctionDecl, name, start, &children);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses a task declaration with its body.
    pub(crate) fn parse_task(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Task);
        self.eat(SvToken::Automatic);
        self.eat(SvToken::Static);
        let (name, _) = self.expect_ident();

        let mut children = Vec::new();
        if self.eat(SvToken::LeftParen) {
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                children.push(self.parse_tf_port());
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
        }
        self.expect(SvToken::Semicolon);

        while !self.at(SvToken::Endtask) && !self.at_eof() {
            children.push(self.parse_statement());
        }
        self.expect(SvToken::Endtask);
        self.check_end_label(name);

        let id = self.finish(NodeKind::TaskDecl, name, start, &children);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses one task/function port: `[direction] [type] name [= default]`.
    fn parse_tf_port(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = Vec::new();
        if matches!(
            self.current(),
            SvToken::Input | SvToken::Output | SvToken::Inout | SvToken::Ref
        ) {
            let sym = self.symbols.register(self.current_text());
            let span = self.current_span();
            self.advance();
            children.push(self.leaf(NodeKind::Direction, sym, span));
        }
        // Type present unless the identifier is directly followed by the
        // end of this port.
        let type_ahead = !((self.at(SvToken::Identifier) || self.at(SvToken::EscapedIdentifier))
            && matches!(
                self.peek_kind(1),
                SvToken::Comma | SvToken::RightParen | SvToken::Equals | SvToken::LeftBracket
            ));
        if type_ahead {
            children.push(self.parse_data_type());
        }
        children.push(self.parse_declarator());
        self.finish(NodeKind::TfPort, Symbol::BAD, start, &children)
    }

    // ========================================================================
    // Interface details
    // ========================================================================

    /// Parses `modport name (input a, output b, clocking cb, ...);`.
    pub(crate) fn parse_modport(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Modport);
        let (name, _) = self.expect_ident();
        self.expect(SvToken::LeftParen);

        let mut children = Vec::new();
        let mut dir_sym = self.symbols.register("inout");
        while !self.at(SvToken::RightParen) && !self.at_eof() {
            match self.current() {
                SvToken::Input | SvToken::Output | SvToken::Inout | SvToken::Ref => {
                    dir_sym = self.symbols.register(self.current_text());
                    self.advance();
                }
                SvToken::Clocking => {
                    let item_start = self.current_span();
                    self.advance();
                    let (cb, cb_span) = self.expect_ident();
                    let cb_node = self.leaf(NodeKind::ClockingItem, cb, cb_span);
                    children.push(self.finish(NodeKind::ModportPort, cb, item_start, &[cb_node]));
                    if !self.eat(SvToken::Comma) {
                        break;
                    }
                }
                _ => {
                    let item_start = self.current_span();
                    let (pname, _) = self.expect_ident();
                    let dir_node = self.leaf(NodeKind::Direction, dir_sym, item_start);
                    children.push(self.finish(
                        NodeKind::ModportPort,
                        pname,
                        item_start,
                        &[dir_node],
                    ));
                    if !self.eat(SvToken::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(SvToken::RightParen);
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::Modport, name, start, &children)
    }

    /// Parses a clocking block, keeping only direction/name items.
    fn parse_clocking_block(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Clocking);
        let (name, _) = self.expect_ident();
        let mut children = Vec::new();
        if self.at(SvToken::At) {
            children.push(self.parse_event_control_header());
        }
        self.expect(SvToken::Semicolon);
        while !self.at(SvToken::Endclocking) && !self.at_eof() {
            match self.current() {
                SvToken::Input | SvToken::Output | SvToken::Inout | SvToken::Default => {
                    let item_start = self.current_span();
                    self.recover_to_semicolon();
                    children.push(self.leaf(NodeKind::ClockingItem, Symbol::BAD, item_start));
                }
                _ => self.advance(),
            }
        }
        self.expect(SvToken::Endclocking);
        self.check_end_label(name);
        self.finish(NodeKind::ClockingBlock, name, start, &children)
    }

    // ========================================================================
    // Generates
    // ========================================================================

    fn parse_generate_region(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Generate);
        let mut children = Vec::new();
        self.parse_items_until(SvToken::Endgenerate, &mut children);
        self.expect(SvToken::Endgenerate);
        self.finish(NodeKind::GenerateRegion, Symbol::BAD, start, &children)
    }

    /// Parses `for (init; cond; step) body` at item level.
    pub(crate) fn parse_gen_for(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::For);
        self.expect(SvToken::LeftParen);

        // Init: `genvar i = expr` or `i = expr`.
        let init_start = self.current_span();
        self.eat(SvToken::Genvar);
        let (ivar, ivar_span) = self.expect_ident();
        let ivar_node = self.leaf(NodeKind::Identifier, ivar, ivar_span);
        self.expect(SvToken::Equals);
        let init_expr = self.parse_expression();
        let init = self.finish(
            NodeKind::BlockingAssign,
            ivar,
            init_start,
            &[ivar_node, init_expr],
        );
        self.expect(SvToken::Semicolon);

        let cond = self.parse_expression();
        self.expect(SvToken::Semicolon);

        let step = self.parse_gen_for_step();
        self.expect(SvToken::RightParen);

        let body = self.parse_item();
        let mut children = vec![init, cond, step];
        children.extend(self.take_pending());
        children.push(
            body.unwrap_or_else(|| self.leaf(NodeKind::Error, Symbol::BAD, self.current_span())),
        );

        self.finish(NodeKind::GenFor, ivar, start, &children)
    }

    /// The step of a generate-for: `i++`, `i = i + 1`, `i += 2`.
    fn parse_gen_for_step(&mut self) -> NodeId {
        let start = self.current_span();
        let expr = self.parse_expression();
        if self.eat(SvToken::Equals) {
            let rhs = self.parse_expression();
            self.finish(NodeKind::BlockingAssign, Symbol::BAD, start, &[expr, rhs])
        } else {
            expr
        }
    }

    pub(crate) fn parse_gen_if(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::If);
        self.expect(SvToken::LeftParen);
        let cond = self.parse_expression();
        self.expect(SvToken::RightParen);
        let then_item = self.parse_item();
        let mut children = vec![cond];
        children.extend(self.take_pending());
        children.push(
            then_item
                .unwrap_or_else(|| self.leaf(NodeKind::Error, Symbol::BAD, self.current_span())),
        );
        if self.eat(SvToken::Else) {
            if let Some(e) = self.parse_item() {
                children.extend(self.take_pending());
                children.push(e);
            }
        }
        self.finish(NodeKind::GenIf, Symbol::BAD, start, &children)
    }

    pub(crate) fn parse_gen_case(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Case);
        self.expect(SvToken::LeftParen);
        let scrutinee = self.parse_expression();
        self.expect(SvToken::RightParen);
        let mut children = vec![scrutinee];
        while !self.at(SvToken::Endcase) && !self.at_eof() {
            let item_start = self.current_span();
            let mut item_children = Vec::new();
            if self.eat(SvToken::Default) {
                self.eat(SvToken::Colon);
            } else {
                loop {
                    item_children.push(self.parse_expression());
                    if !self.eat(SvToken::Comma) {
                        break;
                    }
                }
                self.expect(SvToken::Colon);
            }
            if let Some(body) = self.parse_item() {
                item_children.extend(self.take_pending());
                item_children.push(body);
            }
            children.push(self.finish(NodeKind::CaseItem, Symbol::BAD, item_start, &item_children));
        }
        self.expect(SvToken::Endcase);
        self.finish(NodeKind::GenCase, Symbol::BAD, start, &children)
    }

    /// Parses `begin [: label] items end [: label]` at item level.
    pub(crate) fn parse_gen_block(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Begin);
        let label = if self.eat(SvToken::Colon) {
            let (l, _) = self.expect_ident();
            l
        } else {
            Symbol::BAD
        };
        let mut children = Vec::new();
        self.parse_items_until(SvToken::End, &mut children);
        self.expect(SvToken::End);
        if label != Symbol::BAD {
            self.check_end_label(label);
        } else if self.eat(SvToken::Colon) {
            let _ = self.expect_ident();
        }
        self.finish(NodeKind::GenBlock, label, start, &children)
    }

    // ========================================================================
    // Instantiations
    // ========================================================================

    /// Parses `mod #(params)? u1 (conns) {, u2 (conns)};`.
    pub(crate) fn parse_instantiation(&mut self) -> NodeId {
        let start = self.current_span();
        let (module_name, _) = self.expect_ident();
        let mut children = Vec::new();

        if self.at(SvToken::Hash) {
            self.advance();
            self.expect(SvToken::LeftParen);
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                children.push(self.parse_connection(NodeKind::ParamAssignment));
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
        }

        loop {
            let inst_start = self.current_span();
            let (inst_name, _) = self.expect_ident();
            let mut inst_children = Vec::new();
            while self.at(SvToken::LeftBracket) {
                inst_children.push(self.parse_dimension(NodeKind::UnpackedDimension));
            }
            self.expect(SvToken::LeftParen);
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                inst_children.push(self.parse_connection(NodeKind::PortConnection));
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
            children.push(self.finish(
                NodeKind::HierInstance,
                inst_name,
                inst_start,
                &inst_children,
            ));
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::Semicolon);
        self.finish(NodeKind::Instantiation, module_name, start, &children)
    }

    /// One connection: `.name(expr)`, `.name()`, `.name`, `.*`, or a
    /// positional expression.
    fn parse_connection(&mut self, kind: NodeKind) -> NodeId {
        let start = self.current_span();
        if self.eat(SvToken::DotStar) {
            let star = self.symbols.register("*");
            return self.leaf(kind, star, start);
        }
        if self.eat(SvToken::Dot) {
            let (name, _) = self.expect_ident();
            let mut children = Vec::new();
            if self.eat(SvToken::LeftParen) {
                if !self.at(SvToken::RightParen) {
                    children.push(self.parse_expression());
                }
                self.expect(SvToken::RightParen);
            }
            return self.finish(kind, name, start, &children);
        }
        let expr = self.parse_expression();
        self.finish(kind, Symbol::BAD, start, &[expr])
    }

    // ========================================================================
    // Assertions, properties, sequences
    // ========================================================================

    /// Parses an immediate or concurrent assertion item.
    pub(crate) fn parse_assertion(&mut self) -> NodeId {
        let start = self.current_span();
        let kind_sym = self.symbols.register(self.current_text());
        self.advance();
        self.eat(SvToken::Property);
        let mut children = Vec::new();
        if self.eat(SvToken::LeftParen) {
            if !self.at(SvToken::RightParen) {
                children.push(self.parse_expression());
            }
            self.expect(SvToken::RightParen);
        }
        // Optional action block.
        if !self.at(SvToken::Semicolon) && !self.at(SvToken::Else) {
            if !self.at_eof() && !self.at(SvToken::Endmodule) {
                children.push(self.parse_statement());
            }
        } else {
            self.eat(SvToken::Semicolon);
        }
        if self.eat(SvToken::Else) {
            children.push(self.parse_statement());
        }
        self.finish(NodeKind::Assertion, kind_sym, start, &children)
    }

    /// Parses a property declaration, skimming the body.
    fn parse_property_decl(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Property);
        let (name, _) = self.expect_ident();
        while !self.at(SvToken::Endproperty) && !self.at_eof() {
            self.advance();
        }
        self.expect(SvToken::Endproperty);
        self.check_end_label(name);
        let id = self.finish(NodeKind::PropertyDecl, name, start, &[]);
        self.fc.register_declaration(name, id);
        id
    }

    /// Parses a sequence declaration, skimming the body.
    fn parse_sequence_decl(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Sequence);
        let (name, _) = self.expect_ident();
        while !self.at(SvToken::Endsequence) && !self.at_eof() {
            self.advance();
        }
        self.expect(SvToken::Endsequence);
        self.check_end_label(name);
        let id = self.finish(NodeKind::SequenceDecl, name, start, &[]);
        self.fc.register_declaration(name, id);
        id
    }

    // ========================================================================
    // Class items
    // ========================================================================

    /// Parses class body items until `endclass`.
    pub(crate) fn parse_class_items(&mut self, items: &mut Vec<NodeId>) {
        while !self.at(SvToken::Endclass) && !self.at_eof() {
            // Member qualifiers.
            loop {
                match self.current() {
                    SvToken::Local | SvToken::Protected | SvToken::Static | SvToken::Virtual
                        if self.peek_kind(1) != SvToken::Class =>
                    {
                        self.advance();
                    }
                    SvToken::Identifier if matches!(self.current_text(), "rand" | "randc") => {
                        self.advance();
                    }
                    _ => break,
                }
            }
            match self.current() {
                SvToken::Function => {
                    if self.peek_kind(1) == SvToken::New {
                        items.push(self.parse_constructor());
                    } else {
                        items.push(self.parse_function());
                    }
                }
                SvToken::Task => items.push(self.parse_task()),
                SvToken::Constraint => items.push(self.parse_constraint()),
                SvToken::Covergroup => items.push(self.parse_covergroup()),
                SvToken::Class | SvToken::Virtual => items.push(self.parse_class()),
                SvToken::Typedef => items.push(self.parse_typedef()),
                SvToken::Parameter | SvToken::Localparam => {
                    let params = self.parse_parameter_decl();
                    self.expect(SvToken::Semicolon);
                    items.extend(params);
                }
                SvToken::Extern | SvToken::Pure => {
                    // Prototype only: consume to ';'.
                    self.recover_to_semicolon();
                }
                SvToken::Semicolon => {
                    self.advance();
                }
                _ => {
                    if let Some(item) = self.parse_item() {
                        items.push(item);
                    }
                }
            }
        }
    }

    /// Parses `function new(...); body endfunction`.
    fn parse_constructor(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Function);
        let name = self.symbols.register("new");
        self.expect(SvToken::New);
        let mut children = Vec::new();
        if self.eat(SvToken::LeftParen) {
            while !self.at(SvToken::RightParen) && !self.at_eof() {
                children.push(self.parse_tf_port());
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
        }
        self.expect(SvToken::Semicolon);
        while !self.at(SvToken::Endfunction) && !self.at_eof() {
            children.push(self.parse_statement());
        }
        self.expect(SvToken::Endfunction);
        self.check_end_label(name);
        self.finish(NodeKind::FunctionDecl, name, start, &children)
    }

    /// Parses `constraint name { ... }`, skimming the body.
    fn parse_constraint(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Constraint);
        let (name, _) = self.expect_ident();
        if self.eat(SvToken::LeftBrace) {
            let mut depth = 1u32;
            while depth > 0 && !self.at_eof() {
                match self.current() {
                    SvToken::LeftBrace => depth += 1,
                    SvToken::RightBrace => depth -= 1,
                    _ => {}
                }
                self.advance();
            }
        }
        self.finish(NodeKind::Constraint, name, start, &[])
    }

    /// Parses `covergroup name ...; ... endgroup`, skimming the body.
    fn parse_covergroup(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Covergroup);
        let (name, _) = self.expect_ident();
        while !self.at(SvToken::Endgroup) && !self.at_eof() {
            self.advance();
        }
        self.expect(SvToken::Endgroup);
        self.check_end_label(name);
        self.finish(NodeKind::Covergroup, name, start, &[])
    }
}
