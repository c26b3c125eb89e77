//! Conditional-compilation stack for `ifdef/`ifndef/`elsif/`else/`endif.
//!
//! Each open conditional contributes a frame. A frame's branch is live iff
//! its own condition held *and* the enclosing text was live when the frame
//! was pushed. `elsif`/`else` track whether any earlier branch of the same
//! chain was taken, so at most one branch of a chain is ever live.

use veril_common::Symbol;
use veril_source::Span;

/// The directive kind that pushed a frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CondKind {
    /// An `ifdef frame.
    Ifdef,
    /// An `ifndef frame.
    Ifndef,
    /// An `elsif frame.
    Elsif,
    /// An `else frame.
    Else,
}

/// One open conditional branch.
#[derive(Clone, Debug)]
struct Frame {
    kind: CondKind,
    /// The macro the branch tested (bad symbol for `else).
    macro_name: Symbol,
    /// Whether this branch's own condition held.
    own_defined: bool,
    /// The live flag of the enclosing text when the chain opened.
    previous_active: bool,
    /// Whether any branch of this chain (including this one) has been live.
    chain_taken: bool,
    /// Span of the directive, for unterminated-conditional reporting.
    span: Span,
}

impl Frame {
    fn is_live(&self) -> bool {
        self.own_defined && self.previous_active
    }

    fn opens_chain(&self) -> bool {
        matches!(self.kind, CondKind::Ifdef | CondKind::Ifndef)
    }
}

/// The stack of open conditional branches.
#[derive(Default)]
pub struct CondStack {
    frames: Vec<Frame>,
}

impl CondStack {
    /// Creates an empty stack (everything live).
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Returns `true` if text at the current position should be emitted.
    pub fn active(&self) -> bool {
        self.frames.last().map_or(true, Frame::is_live)
    }

    /// Returns `true` if no conditional is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Enters an `ifdef (or `ifndef when `negated`) testing `macro_name`.
    ///
    /// `defined` is the macro table's answer for `macro_name`, looked up
    /// without evaluation.
    pub fn enter_if(&mut self, macro_name: Symbol, defined: bool, negated: bool, span: Span) {
        let previous_active = self.active();
        let own = if negated { !defined } else { defined };
        self.frames.push(Frame {
            kind: if negated { CondKind::Ifndef } else { CondKind::Ifdef },
            macro_name,
            own_defined: own,
            previous_active,
            chain_taken: own,
            span,
        });
    }

    /// Enters an `elsif testing `macro_name`.
    ///
    /// Pops back to the chain's most recent `elsif or its opening
    /// `ifdef/`ifndef, then pushes an `elsif frame that is live only if no
    /// earlier branch of the chain was. Returns `false` when there is no
    /// open chain (stray directive).
    pub fn enter_elsif(&mut self, macro_name: Symbol, defined: bool, span: Span) -> bool {
        let Some((previous_active, chain_taken)) = self.pop_branch() else {
            return false;
        };
        let own = defined && !chain_taken;
        self.frames.push(Frame {
            kind: CondKind::Elsif,
            macro_name,
            own_defined: own,
            previous_active,
            chain_taken: chain_taken || own,
            span,
        });
        true
    }

    /// Enters an `else branch.
    ///
    /// Returns `false` when there is no open chain (stray directive).
    pub fn enter_else(&mut self, span: Span) -> bool {
        let Some((previous_active, chain_taken)) = self.pop_branch() else {
            return false;
        };
        let own = !chain_taken;
        self.frames.push(Frame {
            kind: CondKind::Else,
            macro_name: Symbol::BAD,
            own_defined: own,
            previous_active,
            chain_taken: true,
            span,
        });
        true
    }

    /// Exits at an `endif, popping frames until the opening `ifdef/`ifndef
    /// is removed. Restores the outer live flag.
    ///
    /// Returns `false` when there is no open chain (stray directive).
    pub fn exit_endif(&mut self) -> bool {
        if self.frames.is_empty() {
            return false;
        }
        while let Some(frame) = self.frames.pop() {
            if frame.opens_chain() {
                return true;
            }
        }
        true
    }

    /// Pops the current branch frame of the innermost chain, returning its
    /// inherited `(previous_active, chain_taken)` state.
    ///
    /// If the top frame is the chain opener, its state is consumed but the
    /// opener is popped too: the replacement branch frame carries the chain
    /// forward until `endif.
    fn pop_branch(&mut self) -> Option<(bool, bool)> {
        let top = self.frames.last()?;
        let state = (top.previous_active, top.chain_taken);
        if top.opens_chain() {
            // Keep the opener so `endif can find it; mark it dead.
            let opener = self.frames.last_mut()?;
            opener.own_defined = false;
        } else {
            self.frames.pop();
        }
        Some(state)
    }

    /// Returns the `(directive, span)` of the innermost unclosed chain
    /// opener, for unterminated-conditional reporting at EOF.
    pub fn dangling(&self) -> Option<(&'static str, Span)> {
        self.frames.iter().rev().find_map(|f| match f.kind {
            CondKind::Ifdef => Some(("ifdef", f.span)),
            CondKind::Ifndef => Some(("ifndef", f.span)),
            _ => None,
        })
    }

    /// The macro tested by the innermost frame, if any. Used by tests.
    pub fn innermost_macro(&self) -> Option<Symbol> {
        self.frames.last().map(|f| f.macro_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veril_common::SymbolTable;

    fn sym(syms: &SymbolTable, s: &str) -> Symbol {
        syms.register(s)
    }

    #[test]
    fn empty_stack_is_active() {
        let stack = CondStack::new();
        assert!(stack.active());
        assert!(stack.is_empty());
    }

    #[test]
    fn ifdef_defined_takes_then_branch() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        stack.enter_if(sym(&syms, "FOO"), true, false, Span::DUMMY);
        assert!(stack.active());
        assert!(stack.enter_else(Span::DUMMY));
        assert!(!stack.active());
        assert!(stack.exit_endif());
        assert!(stack.active());
        assert!(stack.is_empty());
    }

    #[test]
    fn ifdef_undefined_takes_else_branch() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        stack.enter_if(sym(&syms, "FOO"), false, false, Span::DUMMY);
        assert!(!stack.active());
        assert!(stack.enter_else(Span::DUMMY));
        assert!(stack.active());
        assert!(stack.exit_endif());
    }

    #[test]
    fn ifndef_inverts() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        stack.enter_if(sym(&syms, "FOO"), false, true, Span::DUMMY);
        assert!(stack.active());
        assert!(stack.exit_endif());
    }

    #[test]
    fn elsif_chain_takes_first_true_branch_only() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        // `ifdef A (undefined) / `elsif B (defined) / `elsif C (defined) / `else
        stack.enter_if(sym(&syms, "A"), false, false, Span::DUMMY);
        assert!(!stack.active());
        assert!(stack.enter_elsif(sym(&syms, "B"), true, Span::DUMMY));
        assert!(stack.active());
        assert!(stack.enter_elsif(sym(&syms, "C"), true, Span::DUMMY));
        assert!(!stack.active(), "chain already taken at B");
        assert!(stack.enter_else(Span::DUMMY));
        assert!(!stack.active());
        assert!(stack.exit_endif());
        assert!(stack.is_empty());
    }

    #[test]
    fn nested_inactive_suppresses_inner_active() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        stack.enter_if(sym(&syms, "OUTER"), false, false, Span::DUMMY);
        // Inner condition holds, but the enclosing text is dead.
        stack.enter_if(sym(&syms, "INNER"), true, false, Span::DUMMY);
        assert!(!stack.active());
        assert!(stack.exit_endif());
        assert!(!stack.active());
        assert!(stack.exit_endif());
        assert!(stack.active());
    }

    #[test]
    fn stray_directives_rejected() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        assert!(!stack.enter_elsif(sym(&syms, "X"), true, Span::DUMMY));
        assert!(!stack.enter_else(Span::DUMMY));
        assert!(!stack.exit_endif());
    }

    #[test]
    fn dangling_reports_opener() {
        let syms = SymbolTable::new();
        let mut stack = CondStack::new();
        stack.enter_if(sym(&syms, "FOO"), true, false, Span::DUMMY);
        let (directive, _) = stack.dangling().unwrap();
        assert_eq!(directive, "ifdef");
        // An `else does not clear the dangling opener.
        stack.enter_else(Span::DUMMY);
        assert!(stack.dangling().is_some());
        stack.exit_endif();
        assert!(stack.dangling().is_none());
    }
}
