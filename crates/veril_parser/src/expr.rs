//! Expression parsing with Pratt precedence.
//!
//! Operator nodes carry the operator text as their symbol; operand order is
//! left-to-right in the children list.

use crate::parser::Parser;
use crate::token::SvToken;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;

/// Binding power of an infix operator, or `None` if the token is not one.
/// Follows IEEE 1800-2017 table 11-2 (higher binds tighter).
fn infix_binding_power(tok: SvToken) -> Option<(u8, u8)> {
    let bp = match tok {
        SvToken::DoubleStar => (22, 21), // right-assoc
        SvToken::Star | SvToken::Slash | SvToken::Percent => (19, 20),
        SvToken::Plus | SvToken::Minus => (17, 18),
        SvToken::ShiftLeft | SvToken::ShiftRight | SvToken::AShiftLeft | SvToken::AShiftRight => {
            (15, 16)
        }
        SvToken::LessThan
        | SvToken::LessEquals
        | SvToken::GreaterThan
        | SvToken::GreaterEquals => (13, 14),
        SvToken::DoubleEquals
        | SvToken::BangEquals
        | SvToken::TripleEquals
        | SvToken::BangDoubleEquals
        | SvToken::WildcardEq
        | SvToken::WildcardNeq => (11, 12),
        SvToken::Amp => (9, 10),
        SvToken::Caret | SvToken::TildeCaret => (7, 8),
        SvToken::Pipe => (5, 6),
        SvToken::AmpAmp => (3, 4),
        SvToken::PipePipe => (1, 2),
        _ => return None,
    };
    Some(bp)
}

fn is_prefix_op(tok: SvToken) -> bool {
    matches!(
        tok,
        SvToken::Plus
            | SvToken::Minus
            | SvToken::Bang
            | SvToken::Tilde
            | SvToken::Amp
            | SvToken::TildeAmp
            | SvToken::Pipe
            | SvToken::TildePipe
            | SvToken::Caret
            | SvToken::TildeCaret
            | SvToken::PlusPlus
            | SvToken::MinusMinus
    )
}

impl Parser<'_> {
    /// Parses a full expression (conditional operator and below).
    pub(crate) fn parse_expression(&mut self) -> NodeId {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> NodeId {
        let start = self.current_span();
        let mut lhs = self.parse_primary_expression();

        loop {
            // `inside` set-membership.
            if self.at(SvToken::Inside) && min_bp == 0 {
                self.advance();
                self.expect(SvToken::LeftBrace);
                let mut children = vec![lhs];
                while !self.at(SvToken::RightBrace) && !self.at_eof() {
                    if self.at(SvToken::LeftBracket) {
                        children.push(self.parse_dimension(NodeKind::UnpackedDimension));
                    } else {
                        children.push(self.parse_expr_bp(1));
                    }
                    if !self.eat(SvToken::Comma) {
                        break;
                    }
                }
                self.expect(SvToken::RightBrace);
                lhs = self.finish(NodeKind::Inside, Symbol::BAD, start, &children);
                continue;
            }

            if let Some((l_bp, r_bp)) = infix_binding_power(self.current()) {
                if l_bp < min_bp {
                    break;
                }
                let op = self.symbols.register(self.current_text());
                self.advance();
                let rhs = self.parse_expr_bp(r_bp);
                lhs = self.finish(NodeKind::BinaryOp, op, start, &[lhs, rhs]);
                continue;
            }

            // Conditional operator, lowest precedence, right-assoc.
            if self.at(SvToken::QuestionMark) && min_bp == 0 {
                self.advance();
                let then_expr = self.parse_expr_bp(0);
                self.expect(SvToken::Colon);
                let else_expr = self.parse_expr_bp(0);
                lhs = self.finish(
                    NodeKind::TernaryOp,
                    Symbol::BAD,
                    start,
                    &[lhs, then_expr, else_expr],
                );
                continue;
            }

            break;
        }
        lhs
    }

    /// Parses a primary expression with its postfix operators (selects,
    /// hierarchy, calls, casts, increments).
    pub(crate) fn parse_primary_expression(&mut self) -> NodeId {
        let start = self.current_span();

        // Prefix unary operators.
        if is_prefix_op(self.current()) {
            let op = self.symbols.register(self.current_text());
            self.advance();
            let operand = self.parse_primary_expression();
            return self.finish(NodeKind::UnaryOp, op, start, &[operand]);
        }

        let mut expr = match self.current() {
            SvToken::IntLiteral => self.literal_leaf(NodeKind::IntLiteral),
            SvToken::BasedLiteral => self.literal_leaf(NodeKind::BasedLiteral),
            SvToken::RealLiteral => self.literal_leaf(NodeKind::RealLiteral),
            SvToken::UnbasedUnsized => self.literal_leaf(NodeKind::UnbasedUnsized),
            SvToken::StringLiteral => self.literal_leaf(NodeKind::StringLiteral),
            SvToken::SystemIdentifier => {
                let sym = self.symbols.register(self.current_text());
                let span = self.current_span();
                self.advance();
                if self.eat(SvToken::LeftParen) {
                    let mut args = Vec::new();
                    while !self.at(SvToken::RightParen) && !self.at_eof() {
                        args.push(self.parse_expression());
                        if !self.eat(SvToken::Comma) {
                            break;
                        }
                    }
                    self.expect(SvToken::RightParen);
                    self.finish(NodeKind::SystemCall, sym, span, &args)
                } else {
                    self.leaf(NodeKind::SystemCall, sym, span)
                }
            }
            SvToken::Identifier | SvToken::EscapedIdentifier => {
                let (name, span) = self.expect_ident();
                // Package- or class-scoped reference: `pkg::name`.
                if self.at(SvToken::ColonColon) {
                    self.advance();
                    let inner = self.parse_primary_expression();
                    self.finish(NodeKind::PackageScope, name, span, &[inner])
                } else if self.at(SvToken::Apostrophe)
                    && self.peek_kind(1) == SvToken::LeftParen
                {
                    // Cast: `type'(expr)`.
                    self.advance();
                    self.expect(SvToken::LeftParen);
                    let inner = self.parse_expression();
                    self.expect(SvToken::RightParen);
                    self.finish(NodeKind::Cast, name, span, &[inner])
                } else {
                    self.leaf(NodeKind::Identifier, name, span)
                }
            }
            SvToken::This | SvToken::Super | SvToken::Null | SvToken::Dollar => {
                let sym = self.symbols.register(self.current_text());
                let span = self.current_span();
                self.advance();
                self.leaf(NodeKind::Identifier, sym, span)
            }
            SvToken::New => {
                let sym = self.symbols.register("new");
                let span = self.current_span();
                self.advance();
                if self.eat(SvToken::LeftParen) {
                    let mut args = Vec::new();
                    while !self.at(SvToken::RightParen) && !self.at_eof() {
                        args.push(self.parse_expression());
                        if !self.eat(SvToken::Comma) {
                            break;
                        }
                    }
                    self.expect(SvToken::RightParen);
                    self.finish(NodeKind::Call, sym, span, &args)
                } else {
                    self.leaf(NodeKind::Call, sym, span)
                }
            }
            SvToken::Tagged => {
                self.advance();
                let (name, span) = self.expect_ident();
                let mut children = Vec::new();
                if !matches!(
                    self.current(),
                    SvToken::Semicolon
                        | SvToken::Comma
                        | SvToken::RightParen
                        | SvToken::RightBrace
                ) {
                    children.push(self.parse_primary_expression());
                }
                self.finish(NodeKind::TaggedPattern, name, span, &children)
            }
            SvToken::LeftParen => {
                self.advance();
                let inner = self.parse_expression();
                let node = if self.eat(SvToken::Colon) {
                    // Min:typ:max.
                    let typ = self.parse_expression();
                    self.expect(SvToken::Colon);
                    let max = self.parse_expression();
                    self.finish(NodeKind::MinTypMax, Symbol::BAD, start, &[inner, typ, max])
                } else {
                    inner
                };
                self.expect(SvToken::RightParen);
                node
            }
            SvToken::LeftBrace => self.parse_concat_or_replication(),
            SvToken::ApostropheBrace => self.parse_assignment_pattern(),
            _ if self.at_builtin_type_for_cast() => {
                // `int'(expr)`, `logic'(x)` style casts.
                let sym = self.symbols.register(self.current_text());
                let span = self.current_span();
                self.advance();
                if self.at(SvToken::Apostrophe) && self.peek_kind(1) == SvToken::LeftParen {
                    self.advance();
                    self.expect(SvToken::LeftParen);
                    let inner = self.parse_expression();
                    self.expect(SvToken::RightParen);
                    self.finish(NodeKind::Cast, sym, span, &[inner])
                } else {
                    self.leaf(NodeKind::Identifier, sym, span)
                }
            }
            _ => {
                let span = self.current_span();
                self.expected("expression");
                self.advance();
                self.leaf(NodeKind::Error, Symbol::BAD, span)
            }
        };

        // Postfix operators.
        loop {
            match self.current() {
                SvToken::LeftBracket => {
                    expr = self.parse_select(expr, start);
                }
                SvToken::Dot => {
                    self.advance();
                    let (member, member_span) = self.expect_ident();
                    if self.at(SvToken::LeftParen) {
                        self.advance();
                        let mut children = vec![expr];
                        while !self.at(SvToken::RightParen) && !self.at_eof() {
                            children.push(self.parse_expression());
                            if !self.eat(SvToken::Comma) {
                                break;
                            }
                        }
                        self.expect(SvToken::RightParen);
                        expr = self.finish(NodeKind::MethodCall, member, start, &children);
                    } else {
                        let seg = self.leaf(NodeKind::Identifier, member, member_span);
                        expr = self.finish(NodeKind::HierPath, member, start, &[expr, seg]);
                    }
                }
                SvToken::LeftParen => {
                    self.advance();
                    let mut children = vec![expr];
                    while !self.at(SvToken::RightParen) && !self.at_eof() {
                        // Named function arguments: `.formal(actual)`.
                        if self.at(SvToken::Dot) {
                            self.advance();
                            let (formal, f_span) = self.expect_ident();
                            self.expect(SvToken::LeftParen);
                            let actual = self.parse_expression();
                            self.expect(SvToken::RightParen);
                            let f_start = f_span;
                            children.push(self.finish(
                                NodeKind::PortConnection,
                                formal,
                                f_start,
                                &[actual],
                            ));
                        } else {
                            children.push(self.parse_expression());
                        }
                        if !self.eat(SvToken::Comma) {
                            break;
                        }
                    }
                    self.expect(SvToken::RightParen);
                    expr = self.finish(NodeKind::Call, Symbol::BAD, start, &children);
                }
                SvToken::PlusPlus | SvToken::MinusMinus => {
                    let op = self.symbols.register(self.current_text());
                    self.advance();
                    expr = self.finish(NodeKind::UnaryOp, op, start, &[expr]);
                }
                _ => break,
            }
        }
        expr
    }

    fn at_builtin_type_for_cast(&self) -> bool {
        matches!(
            self.current(),
            SvToken::Int
                | SvToken::Logic
                | SvToken::Bit
                | SvToken::Byte
                | SvToken::Shortint
                | SvToken::Longint
                | SvToken::Integer
                | SvToken::Signed
                | SvToken::Unsigned
                | SvToken::Real
        )
    }

    fn literal_leaf(&mut self, kind: NodeKind) -> NodeId {
        let sym = self.symbols.register(self.current_text());
        let span = self.current_span();
        self.advance();
        self.leaf(kind, sym, span)
    }

    /// Parses `[index]`, `[msb:lsb]`, `[base +: width]`, `[base -: width]`.
    fn parse_select(&mut self, base: NodeId, start: veril_source::Span) -> NodeId {
        self.expect(SvToken::LeftBracket);
        let first = self.parse_expression();
        let node = match self.current() {
            SvToken::Colon => {
                self.advance();
                let second = self.parse_expression();
                self.finish(NodeKind::PartSelect, Symbol::BAD, start, &[base, first, second])
            }
            SvToken::PlusColon | SvToken::MinusColon => {
                let op = self.symbols.register(self.current_text());
                self.advance();
                let width = self.parse_expression();
                self.finish(NodeKind::PartSelect, op, start, &[base, first, width])
            }
            _ => self.finish(NodeKind::BitSelect, Symbol::BAD, start, &[base, first]),
        };
        self.expect(SvToken::RightBracket);
        node
    }

    /// Parses `{a, b, c}` or `{n{expr}}`.
    fn parse_concat_or_replication(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::LeftBrace);
        if self.at(SvToken::RightBrace) {
            // Empty queue literal `{}`.
            self.advance();
            return self.finish(NodeKind::Concat, Symbol::BAD, start, &[]);
        }
        let first = self.parse_expression();
        if self.at(SvToken::LeftBrace) {
            // Replication: `{count{items}}`.
            self.advance();
            let mut children = vec![first];
            while !self.at(SvToken::RightBrace) && !self.at_eof() {
                children.push(self.parse_expression());
                if !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightBrace);
            self.expect(SvToken::RightBrace);
            return self.finish(NodeKind::Replication, Symbol::BAD, start, &children);
        }
        let mut children = vec![first];
        while self.eat(SvToken::Comma) {
            children.push(self.parse_expression());
        }
        self.expect(SvToken::RightBrace);
        self.finish(NodeKind::Concat, Symbol::BAD, start, &children)
    }

    /// Parses `'{expr, ...}` with optional `name:`/`default:` keys.
    fn parse_assignment_pattern(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::ApostropheBrace);
        let mut children = Vec::new();
        while !self.at(SvToken::RightBrace) && !self.at_eof() {
            if self.at(SvToken::Default) && self.peek_kind(1) == SvToken::Colon {
                let d_start = self.current_span();
                self.advance();
                self.advance();
                let value = self.parse_expression();
                let sym = self.symbols.register("default");
                children.push(self.finish(NodeKind::TaggedPattern, sym, d_start, &[value]));
            } else if (self.at(SvToken::Identifier) || self.at(SvToken::EscapedIdentifier))
                && self.peek_kind(1) == SvToken::Colon
                && self.peek_kind(2) != SvToken::Colon
            {
                let k_start = self.current_span();
                let (key, _) = self.expect_ident();
                self.advance(); // ':'
                let value = self.parse_expression();
                children.push(self.finish(NodeKind::TaggedPattern, key, k_start, &[value]));
            } else {
                children.push(self.parse_expression());
            }
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::RightBrace);
        self.finish(NodeKind::AssignmentPattern, Symbol::BAD, start, &children)
    }
}
