//! The origin map: bidirectional mapping between preprocessed text and
//! original source locations.
//!
//! Every transformed region (include splice, macro expansion) contributes a
//! paired Push/Pop record. Records are indexed; the inline markers in the
//! preprocessed text and downstream IR store record indices so later passes
//! can reconstruct true source spans.

use serde::{Deserialize, Serialize};
use veril_common::Symbol;
use veril_source::FileId;

/// What kind of transformation produced a region.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OriginContext {
    /// An `include splice.
    Include,
    /// A macro expansion.
    Macro,
    /// No transformation (reserved for synthetic regions).
    None,
}

/// Whether a record opens or closes a region.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum OriginAction {
    /// Region start.
    Push,
    /// Region end.
    Pop,
}

/// One origin-map record.
///
/// For a Push record, `section_line` is the 1-indexed line of the
/// preprocessed stream where the region's text begins; for a Pop record it
/// is the first line after the region. `section_file` is the file the
/// region's text comes from (the included file, or the file that defined
/// the macro). The `source_*` fields locate the causing construct (the
/// `include directive or macro instance) in the file being preprocessed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OriginRecord {
    /// The transformation kind.
    pub context: OriginContext,
    /// Open or close.
    pub action: OriginAction,
    /// File supplying the region's text.
    pub section_file: FileId,
    /// Line in the preprocessed stream (start for Push, one-past-end for Pop).
    pub section_line: u32,
    /// The include target or macro name.
    pub section_symbol: Symbol,
    /// Start line of the causing construct in original source.
    pub source_line: u32,
    /// Start column of the causing construct in original source.
    pub source_col: u32,
    /// End line of the causing construct in original source.
    pub source_end_line: u32,
    /// End column of the causing construct in original source.
    pub source_end_col: u32,
    /// Index of the paired record (Pop for a Push, Push for a Pop).
    pub paired_index: Option<u32>,
}

/// A source location recovered from the origin map.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OriginalLoc {
    /// The true source file.
    pub file: FileId,
    /// The 1-indexed line within that file.
    pub line: u32,
}

/// The indexed record list stored alongside a file's preprocessed text.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OriginMap {
    records: Vec<OriginRecord>,
}

impl OriginMap {
    /// Creates an empty origin map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, returning its index.
    pub fn push_record(&mut self, record: OriginRecord) -> u32 {
        let idx = self.records.len() as u32;
        self.records.push(record);
        idx
    }

    /// Links a Push and Pop record to each other.
    pub fn pair(&mut self, push_idx: u32, pop_idx: u32) {
        self.records[push_idx as usize].paired_index = Some(pop_idx);
        self.records[pop_idx as usize].paired_index = Some(push_idx);
    }

    /// Returns the record at `idx`.
    pub fn get(&self, idx: u32) -> &OriginRecord {
        &self.records[idx as usize]
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[OriginRecord] {
        &self.records
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the map has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Splices a nested map (from an included file) into this one.
    ///
    /// The nested map's stream lines are shifted by `line_offset` (the line
    /// in this stream where the included text starts, minus one) and its
    /// pair indices are rebased past the records already present.
    pub fn append_shifted(&mut self, inner: &OriginMap, line_offset: u32) {
        let base = self.records.len() as u32;
        for rec in &inner.records {
            let mut rec = rec.clone();
            rec.section_line += line_offset;
            rec.paired_index = rec.paired_index.map(|i| i + base);
            self.records.push(rec);
        }
    }

    /// Maps a line of the preprocessed stream back to its true source.
    ///
    /// Lines inside an include region map to the included file; lines inside
    /// a macro expansion map to the macro instance's source line; all other
    /// lines map to `base_file` with the insertion-adjusted line number.
    pub fn resolve_line(&self, pp_line: u32, base_file: FileId) -> OriginalLoc {
        // Innermost enclosing region wins, so scan pushes in order and keep
        // the last one whose region contains the line.
        let mut result: Option<OriginalLoc> = None;
        let mut inserted_before: u32 = 0;

        for (idx, rec) in self.records.iter().enumerate() {
            if rec.action != OriginAction::Push {
                continue;
            }
            let Some(pop_idx) = rec.paired_index else {
                continue;
            };
            let end_line = self.records[pop_idx as usize].section_line;
            if end_line <= pp_line && rec.section_line <= end_line {
                // Region fully before this line: its extra lines shift the
                // base file's numbering. Only top-level regions count; a
                // nested region's lines are already inside its parent.
                if !self.is_nested(idx as u32) {
                    inserted_before += end_line - rec.section_line;
                }
                continue;
            }
            if rec.section_line <= pp_line && pp_line < end_line {
                result = Some(match rec.context {
                    OriginContext::Include => OriginalLoc {
                        file: rec.section_file,
                        line: pp_line - rec.section_line + 1,
                    },
                    OriginContext::Macro | OriginContext::None => OriginalLoc {
                        file: rec.section_file,
                        line: rec.source_line,
                    },
                });
            }
        }

        result.unwrap_or(OriginalLoc {
            file: base_file,
            line: pp_line - inserted_before,
        })
    }

    /// Returns `true` if the Push record at `idx` lies inside another region.
    fn is_nested(&self, idx: u32) -> bool {
        let rec = &self.records[idx as usize];
        for (i, other) in self.records.iter().enumerate() {
            if i as u32 == idx || other.action != OriginAction::Push {
                continue;
            }
            let Some(pop_idx) = other.paired_index else {
                continue;
            };
            let other_end = self.records[pop_idx as usize].section_line;
            let Some(my_pop) = rec.paired_index else {
                continue;
            };
            let my_end = self.records[my_pop as usize].section_line;
            if other.section_line <= rec.section_line && my_end <= other_end {
                // Identical bounds mean the same region, not nesting.
                if other.section_line == rec.section_line && my_end == other_end {
                    continue;
                }
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(ctx: OriginContext, file: u32, line: u32) -> OriginRecord {
        OriginRecord {
            context: ctx,
            action: OriginAction::Push,
            section_file: FileId::from_raw(file),
            section_line: line,
            section_symbol: Symbol::BAD,
            source_line: 1,
            source_col: 1,
            source_end_line: 1,
            source_end_col: 1,
            paired_index: None,
        }
    }

    fn pop(ctx: OriginContext, file: u32, line: u32) -> OriginRecord {
        OriginRecord {
            action: OriginAction::Pop,
            ..push(ctx, file, line)
        }
    }

    #[test]
    fn pairing_links_both_directions() {
        let mut map = OriginMap::new();
        let a = map.push_record(push(OriginContext::Include, 1, 3));
        let b = map.push_record(pop(OriginContext::Include, 1, 7));
        map.pair(a, b);
        assert_eq!(map.get(a).paired_index, Some(b));
        assert_eq!(map.get(b).paired_index, Some(a));
    }

    #[test]
    fn resolve_outside_any_region() {
        let map = OriginMap::new();
        let base = FileId::from_raw(0);
        assert_eq!(
            map.resolve_line(5, base),
            OriginalLoc {
                file: base,
                line: 5
            }
        );
    }

    #[test]
    fn resolve_inside_include_region() {
        let mut map = OriginMap::new();
        // Include of file 1 occupying pp lines [3, 7): included lines 1..=4.
        let a = map.push_record(push(OriginContext::Include, 1, 3));
        let b = map.push_record(pop(OriginContext::Include, 1, 7));
        map.pair(a, b);

        let base = FileId::from_raw(0);
        assert_eq!(
            map.resolve_line(3, base),
            OriginalLoc {
                file: FileId::from_raw(1),
                line: 1
            }
        );
        assert_eq!(
            map.resolve_line(6, base),
            OriginalLoc {
                file: FileId::from_raw(1),
                line: 4
            }
        );
    }

    #[test]
    fn resolve_after_include_region_adjusts() {
        let mut map = OriginMap::new();
        // The `include sat on original line 3; region spans pp lines [3, 7),
        // so pp line 8 is original line 4.
        let mut p = push(OriginContext::Include, 1, 3);
        p.source_line = 3;
        let a = map.push_record(p);
        let b = map.push_record(pop(OriginContext::Include, 1, 7));
        map.pair(a, b);

        let base = FileId::from_raw(0);
        assert_eq!(
            map.resolve_line(8, base),
            OriginalLoc {
                file: base,
                line: 4
            }
        );
    }

    #[test]
    fn resolve_inside_macro_region_points_at_instance() {
        let mut map = OriginMap::new();
        let mut p = push(OriginContext::Macro, 0, 10);
        p.source_line = 9;
        let a = map.push_record(p);
        let b = map.push_record(pop(OriginContext::Macro, 0, 12));
        map.pair(a, b);

        let base = FileId::from_raw(0);
        assert_eq!(
            map.resolve_line(11, base),
            OriginalLoc {
                file: base,
                line: 9
            }
        );
    }

    #[test]
    fn append_shifted_rebases_lines_and_pairs() {
        let mut inner = OriginMap::new();
        let a = inner.push_record(push(OriginContext::Macro, 2, 1));
        let b = inner.push_record(pop(OriginContext::Macro, 2, 2));
        inner.pair(a, b);

        let mut outer = OriginMap::new();
        let x = outer.push_record(push(OriginContext::Include, 1, 5));
        let y = outer.push_record(pop(OriginContext::Include, 1, 9));
        outer.pair(x, y);

        outer.append_shifted(&inner, 4);
        assert_eq!(outer.len(), 4);
        assert_eq!(outer.get(2).section_line, 5);
        assert_eq!(outer.get(2).paired_index, Some(3));
        assert_eq!(outer.get(3).paired_index, Some(2));
    }

    #[test]
    fn serde_roundtrip() {
        let mut map = OriginMap::new();
        let a = map.push_record(push(OriginContext::Include, 1, 1));
        let b = map.push_record(pop(OriginContext::Include, 1, 2));
        map.pair(a, b);
        let json = serde_json::to_string(&map).unwrap();
        let back: OriginMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(0).paired_index, Some(1));
    }
}
