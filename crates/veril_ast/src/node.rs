//! AST node representation.

use serde::{Deserialize, Serialize};
use veril_common::Symbol;
use veril_source::FileId;

/// Index of a [`VObject`] within its file's arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a `NodeId` from a raw `u32` index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// The syntactic kind of a [`VObject`].
///
/// One variant per grammar production the parser materializes. Whitespace
/// and preprocessor markers get their own kinds so trees can be diffed for
/// formatting equivalence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum NodeKind {
    // Top level
    Design,
    Module,
    Interface,
    Package,
    Program,
    Class,
    Udp,

    // Headers and declarations
    ParamPortList,
    Parameter,
    Localparam,
    TypeParameter,
    PortList,
    Port,
    PortRef,
    NonAnsiPortDecl,
    NetDecl,
    VarDecl,
    Declarator,
    Typedef,
    Import,
    Export,
    Extends,
    GenvarDecl,
    Defparam,
    Attribute,

    // Keyword leaves (payload in `symbol`)
    Direction,
    TypeKeyword,
    Signing,

    // Types
    DataType,
    ImplicitType,
    NamedType,
    PackageScopedType,
    EnumType,
    EnumMember,
    StructType,
    UnionType,
    StructMember,
    PackedDimension,
    UnpackedDimension,
    InterfacePortHeader,

    // Interface details
    Modport,
    ModportPort,
    ClockingBlock,
    ClockingItem,

    // Tasks and functions
    FunctionDecl,
    TaskDecl,
    TfPort,

    // Processes and module items
    AlwaysBlock,
    AlwaysComb,
    AlwaysFf,
    AlwaysLatch,
    InitialBlock,
    FinalBlock,
    ContAssign,
    Instantiation,
    HierInstance,
    PortConnection,
    ParamAssignment,
    Bind,
    GenerateRegion,
    GenFor,
    GenIf,
    GenCase,
    GenBlock,

    // UDP details
    UdpPortList,
    UdpInitial,
    UdpTable,
    UdpTableEntry,

    // Assertions
    PropertyDecl,
    SequenceDecl,
    Assertion,
    Constraint,
    Covergroup,

    // Statements
    SeqBlock,
    ParBlock,
    IfStmt,
    CaseStmt,
    CaseItem,
    ForStmt,
    ForeachStmt,
    WhileStmt,
    RepeatStmt,
    ForeverStmt,
    BlockingAssign,
    NonblockingAssign,
    EventControl,
    DelayControl,
    WaitStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    NullStmt,
    ExprStmt,
    Label,

    // Expressions
    Identifier,
    HierPath,
    PackageScope,
    ClassScope,
    IntLiteral,
    BasedLiteral,
    RealLiteral,
    StringLiteral,
    UnbasedUnsized,
    UnaryOp,
    BinaryOp,
    TernaryOp,
    Call,
    SystemCall,
    MethodCall,
    BitSelect,
    PartSelect,
    Concat,
    Replication,
    Inside,
    AssignmentPattern,
    TaggedPattern,
    Cast,
    MinTypMax,

    // Trivia
    Whitespace,
    PpMarkerBegin,
    PpMarkerEnd,

    // Error recovery
    Error,
}

/// One packed AST node.
///
/// All edges are indices into the same file's arena. `child` points at the
/// node's *last* child and `sibling` at the node's *previous* sibling, so
/// both always point at strictly lower indices; source order is restored by
/// [`FileContent::children`](crate::FileContent::children). `parent` points
/// upward and is fixed up when the parent is allocated. `definition` is the
/// only field written after parse, by the symbol resolver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VObject {
    /// The node's name or payload symbol (bad symbol when unnamed).
    pub symbol: Symbol,
    /// The file the node was parsed from.
    pub file: FileId,
    /// Start line (1-indexed).
    pub line: u32,
    /// Start column (1-indexed).
    pub column: u16,
    /// End line (1-indexed, inclusive).
    pub end_line: u32,
    /// End column (1-indexed, exclusive).
    pub end_column: u16,
    /// The enclosing node, if any. Points at a higher index.
    pub parent: Option<NodeId>,
    /// The node's last child, if any. Points at a lower index.
    pub child: Option<NodeId>,
    /// The node's previous sibling, if any. Points at a lower index.
    pub sibling: Option<NodeId>,
    /// Late-bound link to the declaring node, filled by the resolver.
    pub definition: Option<NodeId>,
    /// The syntactic kind.
    pub kind: NodeKind,
}

impl VObject {
    /// Creates a leaf node with no edges.
    pub fn leaf(
        kind: NodeKind,
        symbol: Symbol,
        file: FileId,
        line: u32,
        column: u16,
        end_line: u32,
        end_column: u16,
    ) -> Self {
        Self {
            symbol,
            file,
            line,
            column,
            end_line,
            end_column,
            parent: None,
            child: None,
            sibling: None,
            definition: None,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_roundtrip() {
        let id = NodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn node_id_ordering() {
        assert!(NodeId::from_raw(1) < NodeId::from_raw(2));
    }

    #[test]
    fn leaf_has_no_edges() {
        let v = VObject::leaf(
            NodeKind::Identifier,
            Symbol::BAD,
            FileId::from_raw(0),
            1,
            1,
            1,
            4,
        );
        assert!(v.parent.is_none());
        assert!(v.child.is_none());
        assert!(v.sibling.is_none());
        assert!(v.definition.is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let v = VObject::leaf(
            NodeKind::Module,
            Symbol::from_raw(3),
            FileId::from_raw(0),
            2,
            1,
            5,
            10,
        );
        let json = serde_json::to_string(&v).unwrap();
        let back: VObject = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, NodeKind::Module);
        assert_eq!(back.line, 2);
    }
}
