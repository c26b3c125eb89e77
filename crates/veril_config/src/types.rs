//! Configuration types deserialized from `veril.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default chunk threshold: files larger than this are split and parsed
/// as independent chunk files (4 MiB).
pub const DEFAULT_CHUNK_THRESHOLD: u64 = 4 * 1024 * 1024;

/// The top-level compilation configuration parsed from `veril.toml`.
#[derive(Debug, Deserialize)]
pub struct CompileConfig {
    /// Core project metadata (name, source list, top modules).
    pub project: ProjectMeta,
    /// Macro definitions predefined for every compilation unit
    /// (equivalent to `+define+NAME=VALUE` on traditional tools).
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
    /// Directories searched for `include targets, in order.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Preprocessor and compilation behavior switches.
    #[serde(default)]
    pub options: Options,
}

/// Core project metadata required in every `veril.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Source files to compile, in command-line order.
    pub sources: Vec<PathBuf>,
    /// Library the sources are compiled into. Defaults to `work`.
    #[serde(default = "default_library")]
    pub library: String,
    /// Explicit top modules. When empty, tops are computed as the set of
    /// components not instantiated anywhere else.
    #[serde(default)]
    pub top: Vec<String>,
}

fn default_library() -> String {
    "work".to_string()
}

/// Behavior switches for preprocessing and compilation.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Options {
    /// When true, use of an undefined macro is an error instead of a warning.
    pub complain_undefined_macro: bool,
    /// When true, each file is its own compilation unit (fresh macro table
    /// per file); otherwise macros accumulate across the whole job.
    pub file_unit: bool,
    /// Files larger than this many bytes are split into chunk files that
    /// are preprocessed and parsed independently.
    pub chunk_threshold: u64,
    /// Number of worker threads for the per-file phases. Zero means one
    /// worker per available core.
    pub workers: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            complain_undefined_macro: false,
            file_unit: false,
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            workers: 0,
        }
    }
}

impl CompileConfig {
    /// Builds a minimal in-memory configuration, used by tests and by API
    /// callers that bypass `veril.toml`.
    pub fn from_sources(sources: Vec<PathBuf>) -> Self {
        Self {
            project: ProjectMeta {
                name: "design".to_string(),
                sources,
                library: default_library(),
                top: Vec::new(),
            },
            defines: BTreeMap::new(),
            include_dirs: Vec::new(),
            options: Options::default(),
        }
    }
}
