//! Named libraries grouping file contents.

use serde::{Deserialize, Serialize};
use veril_common::Symbol;
use veril_source::FileId;

/// A named set of parsed files.
///
/// The library name forms the first segment of every qualified design
/// component name (`lib@Name`). A default run compiles everything into the
/// `work` library.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Library {
    /// The library name.
    pub name: Symbol,
    /// Files compiled into this library, in compilation order.
    pub files: Vec<FileId>,
}

impl Library {
    /// Creates an empty library.
    pub fn new(name: Symbol) -> Self {
        Self {
            name,
            files: Vec::new(),
        }
    }

    /// Adds a file to this library.
    pub fn add_file(&mut self, file: FileId) {
        self.files.push(file);
    }

    /// Returns `true` if the library contains `file`.
    pub fn contains(&self, file: FileId) -> bool {
        self.files.contains(&file)
    }
}
