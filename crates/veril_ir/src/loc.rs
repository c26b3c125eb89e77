//! Source locations carried by IR entities.

use serde::{Deserialize, Serialize};
use veril_source::FileId;

/// A line/column source range attached to an IR entity.
///
/// Coordinates are 1-indexed and refer to the file registered in the
/// session's source database.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SourceLoc {
    /// The source file.
    pub file: FileId,
    /// Start line.
    pub line: u32,
    /// Start column.
    pub col: u16,
    /// End line (inclusive).
    pub end_line: u32,
    /// End column (exclusive).
    pub end_col: u16,
}

impl SourceLoc {
    /// A placeholder location for synthesized entities.
    pub const UNKNOWN: SourceLoc = SourceLoc {
        file: FileId::DUMMY,
        line: 0,
        col: 0,
        end_line: 0,
        end_col: 0,
    };

    /// Builds a location from an AST node's coordinate fields.
    pub fn of_node(node: &veril_ast::VObject) -> Self {
        Self {
            file: node.file,
            line: node.line,
            col: node.column,
            end_line: node.end_line,
            end_col: node.end_column,
        }
    }

    /// Returns `true` if this is the placeholder location.
    pub fn is_unknown(&self) -> bool {
        self.file == FileId::DUMMY
    }

    /// Returns `true` if the range is ordered (start before or at end).
    pub fn is_ordered(&self) -> bool {
        self.line < self.end_line || (self.line == self.end_line && self.col <= self.end_col)
    }

    /// Returns `true` if `other` starts at or after this location's start
    /// and ends at or before its end.
    pub fn encloses(&self, other: &SourceLoc) -> bool {
        if self.file != other.file {
            return false;
        }
        let starts_ok =
            self.line < other.line || (self.line == other.line && self.col <= other.col);
        let ends_ok = other.end_line < self.end_line
            || (other.end_line == self.end_line && other.end_col <= self.end_col);
        starts_ok && ends_ok
    }
}
