//! Statement and process parsing.

use crate::parser::Parser;
use crate::token::SvToken;
use veril_ast::{NodeId, NodeKind};
use veril_common::Symbol;

impl Parser<'_> {
    /// Parses an `always`/`always_comb`/`always_ff`/`always_latch`/
    /// `initial`/`final` construct.
    pub(crate) fn parse_process(&mut self) -> NodeId {
        let start = self.current_span();
        let kind = match self.current() {
            SvToken::Always => NodeKind::AlwaysBlock,
            SvToken::AlwaysComb => NodeKind::AlwaysComb,
            SvToken::AlwaysFf => NodeKind::AlwaysFf,
            SvToken::AlwaysLatch => NodeKind::AlwaysLatch,
            SvToken::Initial => NodeKind::InitialBlock,
            _ => NodeKind::FinalBlock,
        };
        self.advance();
        let body = self.parse_statement();
        self.finish(kind, Symbol::BAD, start, &[body])
    }

    /// Parses `assign [#delay] lvalue = expr {, lvalue = expr};`.
    ///
    /// Each assignment becomes one `ContAssign` node; for comma lists the
    /// earlier nodes are queued as pending items.
    pub(crate) fn parse_cont_assign(&mut self) -> NodeId {
        self.expect(SvToken::Assign);
        if self.at(SvToken::Hash) {
            self.parse_delay_value();
        }
        let mut nodes = Vec::new();
        loop {
            let a_start = self.current_span();
            let lhs = self.parse_expression();
            self.expect(SvToken::Equals);
            let rhs = self.parse_expression();
            nodes.push(self.finish(NodeKind::ContAssign, Symbol::BAD, a_start, &[lhs, rhs]));
            if !self.eat(SvToken::Comma) {
                break;
            }
        }
        self.expect(SvToken::Semicolon);
        let last = nodes.pop().unwrap();
        self.pending_items.extend(nodes);
        last
    }

    /// Consumes a `#` delay value (`#10`, `#(expr)`).
    fn parse_delay_value(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Hash);
        let expr = if self.eat(SvToken::LeftParen) {
            let e = self.parse_expression();
            self.expect(SvToken::RightParen);
            e
        } else {
            self.parse_primary_expression()
        };
        self.finish(NodeKind::DelayControl, Symbol::BAD, start, &[expr])
    }

    /// Parses one statement (or a block-local declaration).
    pub(crate) fn parse_statement(&mut self) -> NodeId {
        match self.current() {
            SvToken::Begin => self.parse_seq_block(),
            SvToken::Fork => self.parse_par_block(),
            SvToken::Unique | SvToken::Priority => {
                let qualifier = self.symbols.register(self.current_text());
                self.advance();
                match self.current() {
                    SvToken::If => self.parse_if_stmt(qualifier),
                    SvToken::Case | SvToken::Casex | SvToken::Casez => {
                        self.parse_case_stmt(qualifier)
                    }
                    _ => self.error_node("expected 'if' or 'case' after qualifier"),
                }
            }
            SvToken::If => self.parse_if_stmt(Symbol::BAD),
            SvToken::Case | SvToken::Casex | SvToken::Casez => self.parse_case_stmt(Symbol::BAD),
            SvToken::For => self.parse_for_stmt(),
            SvToken::Foreach => self.parse_foreach_stmt(),
            SvToken::While => self.parse_while_stmt(),
            SvToken::Do => self.parse_do_while_stmt(),
            SvToken::Repeat => self.parse_repeat_stmt(),
            SvToken::Forever => self.parse_forever_stmt(),
            SvToken::Return => {
                let start = self.current_span();
                self.advance();
                let mut children = Vec::new();
                if !self.at(SvToken::Semicolon) {
                    children.push(self.parse_expression());
                }
                self.expect(SvToken::Semicolon);
                self.finish(NodeKind::ReturnStmt, Symbol::BAD, start, &children)
            }
            SvToken::Break => {
                let span = self.current_span();
                self.advance();
                self.expect(SvToken::Semicolon);
                self.leaf(NodeKind::BreakStmt, Symbol::BAD, span)
            }
            SvToken::Continue => {
                let span = self.current_span();
                self.advance();
                self.expect(SvToken::Semicolon);
                self.leaf(NodeKind::ContinueStmt, Symbol::BAD, span)
            }
            SvToken::Wait => {
                let start = self.current_span();
                self.advance();
                self.expect(SvToken::LeftParen);
                let cond = self.parse_expression();
                self.expect(SvToken::RightParen);
                let body = self.parse_statement();
                self.finish(NodeKind::WaitStmt, Symbol::BAD, start, &[cond, body])
            }
            SvToken::Disable => {
                let start = self.current_span();
                self.advance();
                let (name, span) = self.expect_ident();
                let target = self.leaf(NodeKind::Identifier, name, span);
                self.expect(SvToken::Semicolon);
                self.finish(NodeKind::ExprStmt, name, start, &[target])
            }
            SvToken::At => self.parse_event_controlled_stmt(),
            SvToken::Hash => {
                let start = self.current_span();
                let delay = self.parse_delay_value();
                let body = self.parse_statement();
                self.finish(NodeKind::DelayControl, Symbol::BAD, start, &[delay, body])
            }
            SvToken::Semicolon => {
                let span = self.current_span();
                self.advance();
                self.leaf(NodeKind::NullStmt, Symbol::BAD, span)
            }
            SvToken::Assert | SvToken::Assume | SvToken::Cover => self.parse_assertion(),
            SvToken::Typedef => self.parse_typedef(),
            // Block-local declarations.
            _ if self.at_statement_decl() => self.parse_net_or_var_decl(),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    /// Returns `true` when the statement position holds a declaration.
    fn at_statement_decl(&self) -> bool {
        match self.current() {
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
            | SvToken::Var
            | SvToken::Const
            | SvToken::Automatic
            | SvToken::Static => true,
            SvToken::Identifier | SvToken::EscapedIdentifier => {
                // `type_t x;` or `pkg::type_t x;`
                matches!(self.peek_kind(1), SvToken::Identifier | SvToken::EscapedIdentifier)
                    || (self.peek_kind(1) == SvToken::ColonColon
                        && matches!(self.peek_kind(3), SvToken::Identifier | SvToken::EscapedIdentifier))
            }
            _ => false,
        }
    }

    fn parse_seq_block(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Begin);
        let label = if self.eat(SvToken::Colon) {
            let (l, _) = self.expect_ident();
            l
        } else {
            Symbol::BAD
        };
        let mut children = Vec::new();
        while !self.at(SvToken::End) && !self.at_eof() {
            children.push(self.parse_statement());
        }
        self.expect(SvToken::End);
        if self.eat(SvToken::Colon) {
            let _ = self.expect_ident();
        }
        self.finish(NodeKind::SeqBlock, label, start, &children)
    }

    fn parse_par_block(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Fork);
        let label = if self.eat(SvToken::Colon) {
            let (l, _) = self.expect_ident();
            l
        } else {
            Symbol::BAD
        };
        let mut children = Vec::new();
        while !matches!(
            self.current(),
            SvToken::Join | SvToken::JoinAny | SvToken::JoinNone
        ) && !self.at_eof()
        {
            children.push(self.parse_statement());
        }
        self.advance();
        if self.eat(SvToken::Colon) {
            let _ = self.expect_ident();
        }
        self.finish(NodeKind::ParBlock, label, start, &children)
    }

    fn parse_if_stmt(&mut self, qualifier: Symbol) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::If);
        self.expect(SvToken::LeftParen);
        let cond = self.parse_expression();
        self.expect(SvToken::RightParen);
        let then_branch = self.parse_statement();
        let mut children = vec![cond, then_branch];
        if self.eat(SvToken::Else) {
            children.push(self.parse_statement());
        }
        self.finish(NodeKind::IfStmt, qualifier, start, &children)
    }

    fn parse_case_stmt(&mut self, qualifier: Symbol) -> NodeId {
        let start = self.current_span();
        let case_kind = self.symbols.register(self.current_text());
        self.advance();
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
            item_children.push(self.parse_statement());
            children.push(self.finish(NodeKind::CaseItem, Symbol::BAD, item_start, &item_children));
        }
        self.expect(SvToken::Endcase);
        let sym = if qualifier.is_bad() { case_kind } else { qualifier };
        self.finish(NodeKind::CaseStmt, sym, start, &children)
    }

    fn parse_for_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::For);
        self.expect(SvToken::LeftParen);

        // Init: declaration (`int i = 0`) or assignment (`i = 0`).
        let init = if self.at_statement_decl() {
            let d_start = self.current_span();
            let ty = self.parse_data_type();
            let decl = self.parse_declarator();
            self.finish(NodeKind::VarDecl, Symbol::BAD, d_start, &[ty, decl])
        } else if !self.at(SvToken::Semicolon) {
            let a_start = self.current_span();
            let lhs = self.parse_expression();
            self.expect(SvToken::Equals);
            let rhs = self.parse_expression();
            self.finish(NodeKind::BlockingAssign, Symbol::BAD, a_start, &[lhs, rhs])
        } else {
            self.leaf(NodeKind::NullStmt, Symbol::BAD, self.current_span())
        };
        self.expect(SvToken::Semicolon);

        let cond = if self.at(SvToken::Semicolon) {
            self.leaf(NodeKind::NullStmt, Symbol::BAD, self.current_span())
        } else {
            self.parse_expression()
        };
        self.expect(SvToken::Semicolon);

        let step = if self.at(SvToken::RightParen) {
            self.leaf(NodeKind::NullStmt, Symbol::BAD, self.current_span())
        } else {
            let s_start = self.current_span();
            let e = self.parse_expression();
            if self.eat(SvToken::Equals) {
                let rhs = self.parse_expression();
                self.finish(NodeKind::BlockingAssign, Symbol::BAD, s_start, &[e, rhs])
            } else {
                e
            }
        };
        self.expect(SvToken::RightParen);

        let body = self.parse_statement();
        self.finish(NodeKind::ForStmt, Symbol::BAD, start, &[init, cond, step, body])
    }

    fn parse_foreach_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Foreach);
        self.expect(SvToken::LeftParen);
        let array = self.parse_expression();
        self.expect(SvToken::RightParen);
        let body = self.parse_statement();
        self.finish(NodeKind::ForeachStmt, Symbol::BAD, start, &[array, body])
    }

    fn parse_while_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::While);
        self.expect(SvToken::LeftParen);
        let cond = self.parse_expression();
        self.expect(SvToken::RightParen);
        let body = self.parse_statement();
        self.finish(NodeKind::WhileStmt, Symbol::BAD, start, &[cond, body])
    }

    fn parse_do_while_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Do);
        let body = self.parse_statement();
        self.expect(SvToken::While);
        self.expect(SvToken::LeftParen);
        let cond = self.parse_expression();
        self.expect(SvToken::RightParen);
        self.expect(SvToken::Semicolon);
        let sym = self.symbols.register("do");
        self.finish(NodeKind::WhileStmt, sym, start, &[body, cond])
    }

    fn parse_repeat_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Repeat);
        self.expect(SvToken::LeftParen);
        let count = self.parse_expression();
        self.expect(SvToken::RightParen);
        let body = self.parse_statement();
        self.finish(NodeKind::RepeatStmt, Symbol::BAD, start, &[count, body])
    }

    fn parse_forever_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        self.expect(SvToken::Forever);
        let body = self.parse_statement();
        self.finish(NodeKind::ForeverStmt, Symbol::BAD, start, &[body])
    }

    /// Parses `@(...) stmt`, `@* stmt`, or `@ident stmt`.
    fn parse_event_controlled_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        let mut children = self.parse_event_items();
        children.push(self.parse_statement());
        self.finish(NodeKind::EventControl, Symbol::BAD, start, &children)
    }

    /// Parses the `@...` header of a clocking block (no body statement).
    pub(crate) fn parse_event_control_header(&mut self) -> NodeId {
        let start = self.current_span();
        let children = self.parse_event_items();
        self.finish(NodeKind::EventControl, Symbol::BAD, start, &children)
    }

    /// Parses the sensitivity portion after `@`. A `*` produces no items.
    fn parse_event_items(&mut self) -> Vec<NodeId> {
        self.expect(SvToken::At);
        let mut items = Vec::new();
        if self.eat(SvToken::Star) {
            return items;
        }
        if self.eat(SvToken::LeftParen) {
            if self.eat(SvToken::Star) {
                self.expect(SvToken::RightParen);
                return items;
            }
            loop {
                items.push(self.parse_event_item());
                if !self.eat(SvToken::Or) && !self.eat(SvToken::Comma) {
                    break;
                }
            }
            self.expect(SvToken::RightParen);
        } else {
            // `@clk` without parens.
            items.push(self.parse_event_item());
        }
        items
    }

    /// One sensitivity item: `[posedge|negedge|edge] expr`.
    fn parse_event_item(&mut self) -> NodeId {
        let start = self.current_span();
        let edge = match self.current() {
            SvToken::Posedge | SvToken::Negedge | SvToken::Edge => {
                let sym = self.symbols.register(self.current_text());
                self.advance();
                Some(sym)
            }
            _ => None,
        };
        let expr = self.parse_expression();
        match edge {
            Some(sym) => self.finish(NodeKind::UnaryOp, sym, start, &[expr]),
            None => expr,
        }
    }

    /// Parses an assignment or a bare expression statement.
    ///
    /// The left-hand side is parsed as a primary (lvalue) so that `<=`
    /// reads as a nonblocking assignment, not a comparison.
    fn parse_expr_or_assign_stmt(&mut self) -> NodeId {
        let start = self.current_span();
        let lhs = self.parse_primary_expression();

        let (kind, op_sym) = match self.current() {
            SvToken::Equals => (NodeKind::BlockingAssign, Symbol::BAD),
            SvToken::LessEquals => (NodeKind::NonblockingAssign, Symbol::BAD),
            SvToken::PlusEquals
            | SvToken::MinusEquals
            | SvToken::StarEquals
            | SvToken::SlashEquals
            | SvToken::PercentEquals
            | SvToken::AmpEquals
            | SvToken::PipeEquals
            | SvToken::CaretEquals
            | SvToken::ShiftLeftEquals
            | SvToken::ShiftRightEquals
            | SvToken::AShiftLeftEquals
            | SvToken::AShiftRightEquals => {
                (NodeKind::BlockingAssign, self.symbols.register(self.current_text()))
            }
            _ => {
                self.expect(SvToken::Semicolon);
                return self.finish(NodeKind::ExprStmt, Symbol::BAD, start, &[lhs]);
            }
        };
        self.advance();

        // Intra-assignment timing control: `a = #1 b;` / `a <= @(posedge clk) b;`
        let mut children = vec![lhs];
        if self.at(SvToken::Hash) {
            children.push(self.parse_delay_value());
        } else if self.at(SvToken::At) {
            let ec_start = self.current_span();
            let items = self.parse_event_items();
            children.push(self.finish(NodeKind::EventControl, Symbol::BAD, ec_start, &items));
        }
        children.push(self.parse_expression());
        self.expect(SvToken::Semicolon);
        self.finish(kind, op_sym, start, &children)
    }
}
