//! The compilation pipeline driver.
//!
//! Runs preprocess → parse → compile → bind → elaborate → check.
//! Preprocessing and parsing are per-file and run on a rayon pool; the
//! design registry takes an exclusive lock for the per-file compile
//! inserts; binding and elaboration are single-threaded; the integrity
//! pass fans out again over disjoint top subtrees. A fatal flag set by any
//! worker stops new work at phase boundaries while letting in-flight tasks
//! finish, so diagnostics stay coherent.

use crate::session::Session;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use veril_ast::FileContent;
use veril_common::{InternalError, Symbol, VerilResult};
use veril_ir::Design;
use veril_preproc::{CompilationUnit, PreprocOptions, PreprocOutput};
use veril_source::FileId;

/// End keywords that close a top-level design element; chunk boundaries
/// fall after them.
const CHUNK_BOUNDARIES: &[&str] = &[
    "endmodule",
    "endpackage",
    "endinterface",
    "endprogram",
    "endclass",
    "endprimitive",
];

/// The compiled state produced by [`start_compiler`].
pub struct Compiler {
    /// The design database (registry + instance tree).
    pub design: Design,
    /// Parsed file contents by (preprocessed) file ID.
    pub files: HashMap<FileId, FileContent>,
    /// The library the run compiled into, with its member files.
    pub library: veril_ast::Library,
    /// The compilation unit(s) used for the run.
    pub units: Vec<Arc<CompilationUnit>>,
}

impl Compiler {
    /// The elaborated design database.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// The elaborated instance tree.
    pub fn instance_tree(&self) -> &veril_ir::InstanceTree {
        &self.design.instances
    }
}

/// Releases a compiler's arenas.
///
/// Everything is owned, so this is a drop; the explicit function marks the
/// lifecycle boundary after which no IR from the run may be used.
pub fn shutdown_compiler(compiler: Compiler) {
    drop(compiler);
}

/// One file's worth of pipeline work, threaded through the phases.
struct WorkItem {
    /// The original (or chunk) source file.
    file: FileId,
    /// The parent file for chunk files.
    parent: Option<FileId>,
    /// The compilation unit this file preprocesses under.
    unit: Arc<CompilationUnit>,
}

/// Runs the full pipeline over the session's sources.
///
/// Only catastrophic conditions (input file I/O failure) abort the run
/// with `Err`; everything else is reported through the session sink and
/// compilation continues.
pub fn start_compiler(session: &Session) -> VerilResult<Compiler> {
    let fatal = AtomicBool::new(false);

    // Input loading. A missing input file is catastrophic.
    let mut file_ids: Vec<FileId> = session.in_memory.lock().unwrap().clone();
    for path in &session.config.project.sources {
        let mut db = session.source_db.write().unwrap();
        match db.load_file(path) {
            Ok(id) => file_ids.push(id),
            Err(e) => {
                return Err(InternalError::new(format!(
                    "cannot read input `{}`: {e}",
                    path.display()
                )))
            }
        }
    }

    // Chunking: oversized files split at design-element boundaries into
    // independent chunk files sharing a parent.
    let chunk_threshold = session.config.options.chunk_threshold;
    let file_unit = session.config.options.file_unit;
    let shared_unit = Arc::new(CompilationUnit::new(false));
    let mut units: Vec<Arc<CompilationUnit>> = vec![shared_unit.clone()];
    let mut work: Vec<WorkItem> = Vec::new();

    let mut push_work = |file: FileId, parent: Option<FileId>, units: &mut Vec<Arc<CompilationUnit>>| {
        let unit = if file_unit {
            let u = Arc::new(CompilationUnit::new(true));
            units.push(u.clone());
            u
        } else {
            shared_unit.clone()
        };
        work.push(WorkItem { file, parent, unit });
    };

    for id in file_ids {
        let (len, path, content) = {
            let db = session.source_db.read().unwrap();
            let f = db.get_file(id);
            (f.content.len() as u64, f.path.clone(), f.content.clone())
        };
        if len <= chunk_threshold {
            push_work(id, None, &mut units);
            continue;
        }
        let chunks = split_chunks(&content, chunk_threshold);
        let chunk_ids: Vec<FileId> = {
            let mut db = session.source_db.write().unwrap();
            chunks
                .into_iter()
                .enumerate()
                .map(|(i, chunk)| {
                    let name = format!("{}#chunk{}", path.display(), i);
                    db.add_source(name, chunk)
                })
                .collect()
        };
        for cid in chunk_ids {
            push_work(cid, Some(id), &mut units);
        }
    }

    seed_predefined_macros(session, &units);

    let options = PreprocOptions::from_config(&session.config);
    let library = session.symbols.register(&session.config.project.library);

    // Phase: preprocess (parallel, per file). Failures drop the file.
    let preprocessed: Vec<(usize, PreprocOutput)> = work
        .par_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if fatal.load(Ordering::Relaxed) {
                return None;
            }
            match veril_preproc::preprocess_file(
                item.file,
                &session.source_db,
                &session.symbols,
                &item.unit,
                &options,
                &session.sink,
            ) {
                Ok(out) => Some((i, out)),
                Err(err) => {
                    session.sink.emit(err.to_diagnostic());
                    None
                }
            }
        })
        .collect();

    // Phase: parse (parallel, per file). The preprocessed stream is
    // registered as its own file (same display path) and parsed; parser
    // diagnostics are remapped through the origin map to true source.
    let parsed: Vec<(usize, FileId, FileContent)> = preprocessed
        .into_par_iter()
        .filter_map(|(i, out)| {
            if fatal.load(Ordering::Relaxed) {
                return None;
            }
            let pp_file = {
                let mut db = session.source_db.write().unwrap();
                let path = db.get_file(out.file).path.clone();
                db.add_source(path, out.text.clone())
            };
            let local_sink = veril_diagnostics::DiagnosticSink::new();
            let fc = {
                let db = session.source_db.read().unwrap();
                veril_parser::parse_file(pp_file, &db, library, &session.symbols, &local_sink)
            };
            remap_parse_diagnostics(session, &out, pp_file, &local_sink);
            Some((i, pp_file, fc))
        })
        .collect();

    // Phase: component compile. Workers contend on the registry's
    // exclusive insert path; the whole mutation sits behind one lock taken
    // per file.
    let design = Mutex::new(Design::new());
    let mut files: HashMap<FileId, FileContent> = HashMap::new();
    let mut compile_order: Vec<(usize, FileId)> = Vec::new();
    let mut parsed_map: HashMap<FileId, FileContent> = HashMap::new();
    for (i, pp_file, mut fc) in parsed {
        fc.parent_file = work[i].parent;
        compile_order.push((i, pp_file));
        parsed_map.insert(pp_file, fc);
    }
    // Deterministic registry order regardless of parse completion order.
    compile_order.sort_by_key(|(i, _)| *i);

    compile_order.par_iter().for_each(|(i, pp_file)| {
        if fatal.load(Ordering::Relaxed) {
            return;
        }
        let Some(fc) = parsed_map.get(pp_file) else {
            return;
        };
        let db = session.source_db.read().unwrap();
        let mut design = design.lock().unwrap();
        veril_compile::compile_file(
            fc,
            &mut design,
            &work[*i].unit,
            &session.symbols,
            &db,
            &session.sink,
        );
    });

    let mut design = design.into_inner().unwrap();
    let mut lib = veril_ast::Library::new(library);
    for (pp_file, fc) in parsed_map {
        lib.add_file(pp_file);
        files.insert(pp_file, fc);
    }

    // Phase: bind (single-threaded).
    {
        let db = session.source_db.read().unwrap();
        veril_elaborate::bind_design(&mut design, &session.symbols, &db, &session.sink);
    }

    // Phase: elaborate (single-threaded, deterministic order).
    let tops: Vec<Symbol> = session
        .config
        .project
        .top
        .iter()
        .map(|t| session.symbols.register(t))
        .collect();
    {
        let db = session.source_db.read().unwrap();
        let inputs = veril_elaborate::ElabInputs {
            files: &files,
            symbols: &session.symbols,
            source_db: &db,
            unit: &shared_unit,
            sink: &session.sink,
            tops: &tops,
        };
        veril_elaborate::elaborate(&mut design, &inputs);
    }

    // Phase: integrity check (parallel over disjoint top subtrees). Runs
    // only after every elaboration task has completed.
    {
        let db = session.source_db.read().unwrap();
        let tops = design.instances.tops.clone();
        tops.par_iter().for_each(|&top| {
            veril_check::check_subtree(&design, top, &session.symbols, &db, &session.sink);
        });
    }

    Ok(Compiler {
        design,
        files,
        library: lib,
        units,
    })
}

/// Seeds `+define+`-style predefined macros into every compilation unit.
fn seed_predefined_macros(session: &Session, units: &[Arc<CompilationUnit>]) {
    for (name, value) in &session.config.defines {
        let def = veril_preproc::MacroDef {
            name: session.symbols.register(name),
            params: Vec::new(),
            body: value.clone(),
            def_span: veril_source::Span::DUMMY,
        };
        for u in units {
            u.macros.register(def.clone());
        }
    }
}

/// Remaps per-file parser diagnostics through the origin map so they point
/// at true source, then forwards them to the session sink.
fn remap_parse_diagnostics(
    session: &Session,
    out: &PreprocOutput,
    pp_file: FileId,
    local: &veril_diagnostics::DiagnosticSink,
) {
    let diags = local.take_all();
    let db = session.source_db.read().unwrap();
    for mut d in diags {
        if d.primary_span.file == pp_file {
            let (line, _) = db.get_file(pp_file).line_col(d.primary_span.start);
            let orig = out.origin.resolve_line(line, out.file);
            let file = db.get_file(orig.file);
            if let Some(offset) = file.line_offset(orig.line) {
                d.primary_span = veril_source::Span::new(orig.file, offset, offset + 1);
            }
        }
        session.sink.emit(d);
    }
}

/// Splits oversized content at design-element boundaries, keeping each
/// chunk at or above roughly `threshold` bytes.
fn split_chunks(content: &str, threshold: u64) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in content.split_inclusive('\n') {
        current.push_str(line);
        let first_word = line.trim_start().split_whitespace().next().unwrap_or("");
        let first_word = first_word.trim_end_matches(':');
        let at_boundary = CHUNK_BOUNDARIES.contains(&first_word);
        if at_boundary && current.len() as u64 >= threshold {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
