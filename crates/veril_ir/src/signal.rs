//! Ports and nets of a design component.

use crate::ids::{ComponentId, ExprId, TypespecId};
use crate::loc::SourceLoc;
use serde::{Deserialize, Serialize};
use veril_ast::NodeId;
use veril_common::Symbol;

/// Port or signal direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    Inout,
    /// `ref`
    Ref,
    /// No direction written (internal nets, unresolved modport signals).
    Unspecified,
}

impl Direction {
    /// Parses a direction keyword.
    pub fn parse(s: &str) -> Option<Direction> {
        match s {
            "input" => Some(Direction::Input),
            "output" => Some(Direction::Output),
            "inout" => Some(Direction::Inout),
            "ref" => Some(Direction::Ref),
            _ => None,
        }
    }
}

/// A port or net in a design component.
///
/// One `SignalDecl` per declared name; ports keep declaration order in the
/// component's port list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalDecl {
    /// The signal name.
    pub name: Symbol,
    /// Port direction, or `Unspecified` for internal signals.
    pub direction: Direction,
    /// The net-type keyword (`wire`, `logic`, `reg`, ...) the declaration
    /// used, or the `default_nettype` fallback for implicit ports.
    pub net_type: Symbol,
    /// Packed-dimension AST nodes, for re-evaluation under overrides.
    pub packed_dims: Vec<NodeId>,
    /// Unpacked-dimension AST nodes.
    pub unpacked_dims: Vec<NodeId>,
    /// Interface definition link for interface ports.
    pub interface_def: Option<ComponentId>,
    /// Interface type name as written, before resolution.
    pub interface_name: Option<Symbol>,
    /// Modport name for interface ports, when written.
    pub modport: Option<Symbol>,
    /// Default value expression, when written.
    pub default_value: Option<ExprId>,
    /// The signal's typespec, when compiled.
    pub typespec: Option<TypespecId>,
    /// Source location of the declaring name.
    pub loc: SourceLoc,
    /// The declaring AST node.
    pub node: Option<NodeId>,
}

impl SignalDecl {
    /// Creates a minimally filled signal.
    pub fn new(name: Symbol, direction: Direction, net_type: Symbol, loc: SourceLoc) -> Self {
        Self {
            name,
            direction,
            net_type,
            packed_dims: Vec::new(),
            unpacked_dims: Vec::new(),
            interface_def: None,
            interface_name: None,
            modport: None,
            default_value: None,
            typespec: None,
            loc,
            node: None,
        }
    }

    /// Returns `true` if this signal is an interface port.
    pub fn is_interface_port(&self) -> bool {
        self.interface_name.is_some() || self.interface_def.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse() {
        assert_eq!(Direction::parse("input"), Some(Direction::Input));
        assert_eq!(Direction::parse("output"), Some(Direction::Output));
        assert_eq!(Direction::parse("inout"), Some(Direction::Inout));
        assert_eq!(Direction::parse("ref"), Some(Direction::Ref));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn interface_port_detection() {
        let mut s = SignalDecl::new(
            Symbol::from_raw(1),
            Direction::Unspecified,
            Symbol::from_raw(2),
            SourceLoc::UNKNOWN,
        );
        assert!(!s.is_interface_port());
        s.interface_name = Some(Symbol::from_raw(3));
        assert!(s.is_interface_port());
    }

    #[test]
    fn serde_roundtrip() {
        let s = SignalDecl::new(
            Symbol::from_raw(1),
            Direction::Input,
            Symbol::from_raw(2),
            SourceLoc::UNKNOWN,
        );
        let json = serde_json::to_string(&s).unwrap();
        let back: SignalDecl = serde_json::from_str(&json).unwrap();
        assert_eq!(back.direction, Direction::Input);
    }
}
