//! Token types for the SystemVerilog-2017 lexer.
//!
//! Defines the `SvToken` enum covering the keywords, operators, punctuation,
//! and literals the parser understands, plus the `Token` struct pairing a
//! token kind with its source `Span`. Keywords are case-sensitive. Literal
//! values are not stored in the token; they are retrieved from the source
//! text using the token's span.

use serde::{Deserialize, Serialize};
use veril_source::Span;

/// A SystemVerilog-2017 token kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum SvToken {
    // === Design-element keywords ===
    Module,
    Endmodule,
    Interface,
    Endinterface,
    Package,
    Endpackage,
    Program,
    Endprogram,
    Class,
    Endclass,
    Primitive,
    Endprimitive,
    Table,
    Endtable,

    // === Declaration keywords ===
    Parameter,
    Localparam,
    Defparam,
    Typedef,
    Enum,
    Struct,
    Union,
    Packed,
    Signed,
    Unsigned,
    Const,
    Var,
    Static,
    Automatic,
    Genvar,
    Import,
    Export,
    Extends,
    Virtual,
    Extern,
    Pure,
    Local,
    Protected,
    New,
    This,
    Super,
    Null,
    Tagged,

    // === Net and data types ===
    Wire,
    Tri,
    Tri0,
    Tri1,
    Wand,
    Wor,
    Trireg,
    Supply0,
    Supply1,
    Uwire,
    Logic,
    Bit,
    Byte,
    Shortint,
    Int,
    Longint,
    Integer,
    Time,
    Real,
    Shortreal,
    Realtime,
    StringKw,
    Chandle,
    Void,
    Event,
    Reg,

    // === Ports and directions ===
    Input,
    Output,
    Inout,
    Ref,
    Modport,
    Clocking,
    Endclocking,

    // === Processes and items ===
    Always,
    AlwaysComb,
    AlwaysFf,
    AlwaysLatch,
    Initial,
    Final,
    Assign,
    Generate,
    Endgenerate,
    Bind,
    Function,
    Endfunction,
    Task,
    Endtask,
    Return,
    Break,
    Continue,

    // === Statements ===
    Begin,
    End,
    Fork,
    Join,
    JoinAny,
    JoinNone,
    If,
    Else,
    Case,
    Casex,
    Casez,
    Endcase,
    Unique,
    Priority,
    Default,
    For,
    Foreach,
    While,
    Do,
    Repeat,
    Forever,
    Wait,
    Disable,
    Posedge,
    Negedge,
    Edge,
    Or,
    Inside,
    Dist,

    // === Assertions ===
    Assert,
    Assume,
    Cover,
    Property,
    Endproperty,
    Sequence,
    Endsequence,
    Constraint,
    Covergroup,
    Endgroup,

    // === Literals ===
    /// Plain decimal literal (e.g., `42`).
    IntLiteral,
    /// Based literal, sized or not (e.g., `4'b1010`, `'hFF`).
    BasedLiteral,
    /// Real literal (e.g., `3.5`, `1.0e-3`).
    RealLiteral,
    /// String literal.
    StringLiteral,
    /// Unbased unsized literal (`'0`, `'1`, `'x`, `'z`).
    UnbasedUnsized,

    // === Punctuation ===
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Colon,
    ColonColon,
    Dot,
    DotStar,
    Hash,
    At,
    Apostrophe,
    ApostropheBrace,
    Dollar,
    QuestionMark,

    // === Operators ===
    Equals,
    DoubleEquals,
    BangEquals,
    TripleEquals,
    BangDoubleEquals,
    WildcardEq,
    WildcardNeq,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    DoubleStar,
    ShiftLeft,
    ShiftRight,
    AShiftLeft,
    AShiftRight,
    AmpAmp,
    PipePipe,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    TildeAmp,
    TildePipe,
    TildeCaret,
    PlusPlus,
    MinusMinus,
    PlusEquals,
    MinusEquals,
    StarEquals,
    SlashEquals,
    PercentEquals,
    AmpEquals,
    PipeEquals,
    CaretEquals,
    ShiftLeftEquals,
    ShiftRightEquals,
    AShiftLeftEquals,
    AShiftRightEquals,
    Arrow,
    PlusColon,
    MinusColon,

    // === Identifiers ===
    Identifier,
    EscapedIdentifier,
    /// System task/function identifier (e.g., `$clog2`).
    SystemIdentifier,

    // === Preprocessor markers ===
    /// Opening marker spliced by the preprocessor.
    PpMarkerBegin,
    /// Closing marker spliced by the preprocessor.
    PpMarkerEnd,

    // === Special ===
    /// A token the lexer could not recognize.
    Error,
    /// End of input.
    Eof,
}

/// A token paired with its source span.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Token {
    /// The token kind.
    pub kind: SvToken,
    /// The token's span in the preprocessed stream.
    pub span: Span,
}

/// Looks up a keyword token for an identifier-shaped string.
///
/// Returns `None` when the string is a plain identifier.
pub fn lookup_keyword(text: &str) -> Option<SvToken> {
    let tok = match text {
        "module" | "macromodule" => SvToken::Module,
        "endmodule" => SvToken::Endmodule,
        "interface" => SvToken::Interface,
        "endinterface" => SvToken::Endinterface,
        "package" => SvToken::Package,
        "endpackage" => SvToken::Endpackage,
        "program" => SvToken::Program,
        "endprogram" => SvToken::Endprogram,
        "class" => SvToken::Class,
        "endclass" => SvToken::Endclass,
        "primitive" => SvToken::Primitive,
        "endprimitive" => SvToken::Endprimitive,
        "table" => SvToken::Table,
        "endtable" => SvToken::Endtable,
        "parameter" => SvToken::Parameter,
        "localparam" => SvToken::Localparam,
        "defparam" => SvToken::Defparam,
        "typedef" => SvToken::Typedef,
        "enum" => SvToken::Enum,
        "struct" => SvToken::Struct,
        "union" => SvToken::Union,
        "packed" => SvToken::Packed,
        "signed" => SvToken::Signed,
        "unsigned" => SvToken::Unsigned,
        "const" => SvToken::Const,
        "var" => SvToken::Var,
        "static" => SvToken::Static,
        "automatic" => SvToken::Automatic,
        "genvar" => SvToken::Genvar,
        "import" => SvToken::Import,
        "export" => SvToken::Export,
        "extends" => SvToken::Extends,
        "virtual" => SvToken::Virtual,
        "extern" => SvToken::Extern,
        "pure" => SvToken::Pure,
        "local" => SvToken::Local,
        "protected" => SvToken::Protected,
        "new" => SvToken::New,
        "this" => SvToken::This,
        "super" => SvToken::Super,
        "null" => SvToken::Null,
        "tagged" => SvToken::Tagged,
        "wire" => SvToken::Wire,
        "tri" => SvToken::Tri,
        "tri0" => SvToken::Tri0,
        "tri1" => SvToken::Tri1,
        "wand" => SvToken::Wand,
        "wor" => SvToken::Wor,
        "trireg" => SvToken::Trireg,
        "supply0" => SvToken::Supply0,
        "supply1" => SvToken::Supply1,
        "uwire" => SvToken::Uwire,
        "logic" => SvToken::Logic,
        "bit" => SvToken::Bit,
        "byte" => SvToken::Byte,
        "shortint" => SvToken::Shortint,
        "int" => SvToken::Int,
        "longint" => SvToken::Longint,
        "integer" => SvToken::Integer,
        "time" => SvToken::Time,
        "real" => SvToken::Real,
        "shortreal" => SvToken::Shortreal,
        "realtime" => SvToken::Realtime,
        "string" => SvToken::StringKw,
        "chandle" => SvToken::Chandle,
        "void" => SvToken::Void,
        "event" => SvToken::Event,
        "reg" => SvToken::Reg,
        "input" => SvToken::Input,
        "output" => SvToken::Output,
        "inout" => SvToken::Inout,
        "ref" => SvToken::Ref,
        "modport" => SvToken::Modport,
        "clocking" => SvToken::Clocking,
        "endclocking" => SvToken::Endclocking,
        "always" => SvToken::Always,
        "always_comb" => SvToken::AlwaysComb,
        "always_ff" => SvToken::AlwaysFf,
        "always_latch" => SvToken::AlwaysLatch,
        "initial" => SvToken::Initial,
        "final" => SvToken::Final,
        "assign" => SvToken::Assign,
        "generate" => SvToken::Generate,
        "endgenerate" => SvToken::Endgenerate,
        "bind" => SvToken::Bind,
        "function" => SvToken::Function,
        "endfunction" => SvToken::Endfunction,
        "task" => SvToken::Task,
        "endtask" => SvToken::Endtask,
        "return" => SvToken::Return,
        "break" => SvToken::Break,
        "continue" => SvToken::Continue,
        "begin" => SvToken::Begin,
        "end" => SvToken::End,
        "fork" => SvToken::Fork,
        "join" => SvToken::Join,
        "join_any" => SvToken::JoinAny,
        "join_none" => SvToken::JoinNone,
        "if" => SvToken::If,
        "else" => SvToken::Else,
        "case" => SvToken::Case,
        "casex" => SvToken::Casex,
        "casez" => SvToken::Casez,
        "endcase" => SvToken::Endcase,
        "unique" => SvToken::Unique,
        "priority" => SvToken::Priority,
        "default" => SvToken::Default,
        "for" => SvToken::For,
        "foreach" => SvToken::Foreach,
        "while" => SvToken::While,
        "do" => SvToken::Do,
        "repeat" => SvToken::Repeat,
        "forever" => SvToken::Forever,
        "wait" => SvToken::Wait,
        "disable" => SvToken::Disable,
        "posedge" => SvToken::Posedge,
        "negedge" => SvToken::Negedge,
        "edge" => SvToken::Edge,
        "or" => SvToken::Or,
        "inside" => SvToken::Inside,
        "dist" => SvToken::Dist,
        "assert" => SvToken::Assert,
        "assume" => SvToken::Assume,
        "cover" => SvToken::Cover,
        "property" => SvToken::Property,
        "endproperty" => SvToken::Endproperty,
        "sequence" => SvToken::Sequence,
        "endsequence" => SvToken::Endsequence,
        "constraint" => SvToken::Constraint,
        "covergroup" => SvToken::Covergroup,
        "endgroup" => SvToken::Endgroup,
        _ => return None,
    };
    Some(tok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_resolve() {
        assert_eq!(lookup_keyword("module"), Some(SvToken::Module));
        assert_eq!(lookup_keyword("always_ff"), Some(SvToken::AlwaysFf));
        assert_eq!(lookup_keyword("endprimitive"), Some(SvToken::Endprimitive));
        assert_eq!(lookup_keyword("string"), Some(SvToken::StringKw));
    }

    #[test]
    fn identifiers_do_not_resolve() {
        assert_eq!(lookup_keyword("my_module"), None);
        assert_eq!(lookup_keyword("Module"), None, "keywords are case-sensitive");
        assert_eq!(lookup_keyword(""), None);
    }

    #[test]
    fn macromodule_aliases_module() {
        assert_eq!(lookup_keyword("macromodule"), Some(SvToken::Module));
    }
}
