//! Interned path handles.
//!
//! The pipeline never passes paths around: a file is registered once in the
//! [`SourceDb`](crate::SourceDb) and referenced everywhere else by its
//! `FileId`. Originals, included headers, preprocessed streams, and chunk
//! files all draw from the same numbering, so a single handle space covers
//! every span in the run.

use serde::{Deserialize, Serialize};

/// Opaque handle for one registered file or stream.
///
/// Handles are dense and assigned in registration order, which makes them
/// usable as the primary key when diagnostics are sorted for deterministic
/// output. `DUMMY` marks entities with no backing text at all: predefined
/// macros, the seeded builtin classes, and session-level diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct FileId(u32);

impl FileId {
    /// The no-file handle for synthesized entities.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Reconstructs a handle from its raw index (registration order).
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw registration index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn raw_index_is_stable() {
        let handle = FileId::from_raw(5);
        assert_eq!(handle.as_raw(), 5);
        assert_eq!(handle, FileId::from_raw(5));
    }

    #[test]
    fn registration_order_drives_diagnostic_sorting() {
        // top.sv loaded first, defs.svh pulled in by its `include later,
        // preprocessed stream registered last: diagnostics keyed by handle
        // keep that order.
        let top_sv = FileId::from_raw(0);
        let defs_svh = FileId::from_raw(1);
        let top_stream = FileId::from_raw(2);
        assert!(top_sv < defs_svh);
        assert!(defs_svh < top_stream);
    }

    #[test]
    fn dummy_marks_synthesized_entities() {
        // Builtin classes and predefined macros carry no text; they must
        // never collide with a registered file.
        assert!(FileId::DUMMY > FileId::from_raw(1_000_000));
        assert_ne!(FileId::DUMMY, FileId::from_raw(0));
    }

    #[test]
    fn usable_as_parsed_file_key() {
        // The driver keys FileContent maps by handle.
        let mut parsed: HashMap<FileId, &str> = HashMap::new();
        parsed.insert(FileId::from_raw(0), "top.sv contents");
        parsed.insert(FileId::from_raw(1), "defs.svh contents");
        assert_eq!(parsed.get(&FileId::from_raw(1)), Some(&"defs.svh contents"));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn survives_serialization() {
        let handle = FileId::from_raw(11);
        let json = serde_json::to_string(&handle).unwrap();
        let back: FileId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
