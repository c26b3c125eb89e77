//! Process-wide compilation-unit state.
//!
//! A compilation unit is a scope, at least one file wide, over which macro
//! definitions, `timescale, and `default_nettype share state. Directive
//! values are recorded as `(file, line)`-keyed regions; a lookup returns
//! the most recent entry in the same file whose line precedes the query.

use crate::macros::MacroTable;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use veril_source::FileId;

/// A time magnitude/unit pair as written in `timescale.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Femtoseconds.
    Fs,
    /// Picoseconds.
    Ps,
    /// Nanoseconds.
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
}

impl TimeUnit {
    /// Parses a unit suffix (`fs`, `ps`, `ns`, `us`, `ms`, `s`).
    pub fn parse(s: &str) -> Option<TimeUnit> {
        match s {
            "fs" => Some(TimeUnit::Fs),
            "ps" => Some(TimeUnit::Ps),
            "ns" => Some(TimeUnit::Ns),
            "us" => Some(TimeUnit::Us),
            "ms" => Some(TimeUnit::Ms),
            "s" => Some(TimeUnit::S),
            _ => None,
        }
    }
}

/// A parsed `timescale value: `<unit_mag><unit> / <prec_mag><prec>`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Timescale {
    /// Time-unit magnitude (1, 10, or 100).
    pub unit_mag: u16,
    /// Time unit.
    pub unit: TimeUnit,
    /// Precision magnitude (1, 10, or 100).
    pub prec_mag: u16,
    /// Precision unit.
    pub prec: TimeUnit,
}

impl Timescale {
    /// Parses the operand of a `timescale directive, e.g. `1ns / 1ps`.
    ///
    /// Returns `None` on any malformed component; magnitudes other than
    /// 1, 10, 100 are rejected.
    pub fn parse(text: &str) -> Option<Timescale> {
        let (unit_part, prec_part) = text.split_once('/')?;
        let (unit_mag, unit) = parse_time_value(unit_part.trim())?;
        let (prec_mag, prec) = parse_time_value(prec_part.trim())?;
        Some(Timescale {
            unit_mag,
            unit,
            prec_mag,
            prec,
        })
    }
}

fn parse_time_value(s: &str) -> Option<(u16, TimeUnit)> {
    let digit_end = s.find(|c: char| !c.is_ascii_digit())?;
    let mag: u16 = s[..digit_end].parse().ok()?;
    if !matches!(mag, 1 | 10 | 100) {
        return None;
    }
    let unit = TimeUnit::parse(s[digit_end..].trim())?;
    Some((mag, unit))
}

/// Net types accepted by `default_nettype.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NetType {
    /// `wire` (the power-on default).
    Wire,
    /// `tri`
    Tri,
    /// `tri0`
    Tri0,
    /// `tri1`
    Tri1,
    /// `wand`
    Wand,
    /// `wor`
    Wor,
    /// `trireg`
    Trireg,
    /// `uwire`
    Uwire,
    /// `none`: implicit nets are disallowed.
    None,
}

impl NetType {
    /// Parses a `default_nettype operand.
    pub fn parse(s: &str) -> Option<NetType> {
        match s {
            "wire" => Some(NetType::Wire),
            "tri" => Some(NetType::Tri),
            "tri0" => Some(NetType::Tri0),
            "tri1" => Some(NetType::Tri1),
            "wand" => Some(NetType::Wand),
            "wor" => Some(NetType::Wor),
            "trireg" => Some(NetType::Trireg),
            "uwire" => Some(NetType::Uwire),
            "none" => Some(NetType::None),
            _ => None,
        }
    }
}

/// A directive value recorded at a `(file, line)` position.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct Region<T> {
    from_file: FileId,
    from_line: u32,
    value: T,
}

/// Process-wide textual state shared by every file of a compilation unit.
///
/// Thread-safe: the per-file preprocessing workers record and look up
/// directive regions concurrently. In file-unit mode each file is handed
/// its own `CompilationUnit`.
pub struct CompilationUnit {
    /// Whether each file is its own compilation unit.
    file_unit: bool,
    /// Macro storage shared across the unit.
    pub macros: MacroTable,
    timescales: Mutex<Vec<Region<Timescale>>>,
    net_types: Mutex<Vec<Region<NetType>>>,
    next_design_elem_id: AtomicU32,
    next_node_id: AtomicU32,
}

impl CompilationUnit {
    /// Creates a new compilation unit.
    pub fn new(file_unit: bool) -> Self {
        Self {
            file_unit,
            macros: MacroTable::new(),
            timescales: Mutex::new(Vec::new()),
            net_types: Mutex::new(Vec::new()),
            next_design_elem_id: AtomicU32::new(1),
            next_node_id: AtomicU32::new(1),
        }
    }

    /// Returns `true` if this unit covers exactly one file.
    pub fn is_file_unit(&self) -> bool {
        self.file_unit
    }

    /// Records a `timescale region starting at `(file, line)`.
    pub fn record_timescale(&self, file: FileId, line: u32, value: Timescale) {
        self.timescales.lock().unwrap().push(Region {
            from_file: file,
            from_line: line,
            value,
        });
    }

    /// Looks up the `timescale in effect at `(file, line)`.
    ///
    /// Returns the most recent entry in the same file whose line precedes
    /// the query; `None` when the file has no earlier entry.
    pub fn timescale_at(&self, file: FileId, line: u32) -> Option<Timescale> {
        let entries = self.timescales.lock().unwrap();
        entries
            .iter()
            .filter(|r| r.from_file == file && r.from_line <= line)
            .max_by_key(|r| r.from_line)
            .map(|r| r.value)
    }

    /// Records a `default_nettype region starting at `(file, line)`.
    pub fn record_default_nettype(&self, file: FileId, line: u32, value: NetType) {
        self.net_types.lock().unwrap().push(Region {
            from_file: file,
            from_line: line,
            value,
        });
    }

    /// Looks up the `default_nettype in effect at `(file, line)`.
    ///
    /// Strictly last-before-line within the same file; files without a
    /// recorded region get `wire`.
    pub fn default_nettype_at(&self, file: FileId, line: u32) -> NetType {
        let entries = self.net_types.lock().unwrap();
        entries
            .iter()
            .filter(|r| r.from_file == file && r.from_line <= line)
            .max_by_key(|r| r.from_line)
            .map(|r| r.value)
            .unwrap_or(NetType::Wire)
    }

    /// Allocates a unit-unique design-element number (used to name
    /// generated scopes deterministically).
    pub fn next_design_elem_id(&self) -> u32 {
        self.next_design_elem_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Allocates a unit-unique node number.
    pub fn next_node_id(&self) -> u32 {
        self.next_node_id.fetch_add(1, Ordering::Relaxed)
    }
}
