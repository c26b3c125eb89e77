//! The preprocessing engine.
//!
//! Scans source text byte-by-byte in the same style as the lexer: strings
//! and comments are passed through verbatim, directives are consumed and
//! acted on, and everything suppressed by a false conditional is dropped
//! while its newlines are preserved so line counts stay attributable.
//!
//! The engine is single-threaded per file; the driver runs one call per
//! file on its worker pool. The shared [`CompilationUnit`] and the source
//! database are internally synchronized.

use std::path::PathBuf;
use std::sync::RwLock;

use veril_common::{Symbol, SymbolTable};
use veril_config::CompileConfig;
use veril_diagnostics::DiagnosticSink;
use veril_source::{locate, sibling, FileId, SourceDb, Span};

use crate::cond::CondStack;
use crate::errors::{self, PreprocError};
use crate::macros::{MacroDef, MacroTable};
use crate::origin::{OriginAction, OriginContext, OriginMap, OriginRecord};
use crate::unit::{CompilationUnit, NetType, Timescale};

/// Opening byte of an inline preprocessor marker. Cannot occur in valid
/// SystemVerilog tokens.
pub const MARKER_BEGIN: char = '\u{1}';
/// Closing byte of an inline preprocessor marker.
pub const MARKER_END: char = '\u{2}';

/// Options controlling a preprocessing run.
#[derive(Debug, Clone, Default)]
pub struct PreprocOptions {
    /// Directories searched for `include targets, in order.
    pub include_dirs: Vec<PathBuf>,
    /// When true, use of an undefined macro is an error instead of a warning.
    pub complain_undefined_macro: bool,
}

impl PreprocOptions {
    /// Extracts the preprocessor-relevant options from a [`CompileConfig`].
    pub fn from_config(config: &CompileConfig) -> Self {
        Self {
            include_dirs: config.include_dirs.clone(),
            complain_undefined_macro: config.options.complain_undefined_macro,
        }
    }
}

/// The result of preprocessing one file.
#[derive(Debug)]
pub struct PreprocOutput {
    /// The file that was preprocessed.
    pub file: FileId,
    /// The preprocessed token stream, sparsely annotated with inline markers.
    pub text: String,
    /// The origin map for this file's stream.
    pub origin: OriginMap,
}

/// Preprocesses one source file.
///
/// Fails with [`PreprocError`] on unresolved or recursive includes, macro
/// recursion, or an unterminated conditional; the caller records the error
/// and drops the file from downstream passes. Recoverable problems are
/// reported to `sink` and preprocessing continues.
pub fn preprocess_file(
    file: FileId,
    sources: &RwLock<SourceDb>,
    symbols: &SymbolTable,
    unit: &CompilationUnit,
    options: &PreprocOptions,
    sink: &DiagnosticSink,
) -> Result<PreprocOutput, PreprocError> {
    let mut include_stack = Vec::new();
    preprocess_inner(file, sources, symbols, unit, options, sink, &mut include_stack)
}

fn preprocess_inner(
    file: FileId,
    sources: &RwLock<SourceDb>,
    symbols: &SymbolTable,
    unit: &CompilationUnit,
    options: &PreprocOptions,
    sink: &DiagnosticSink,
    include_stack: &mut Vec<PathBuf>,
) -> Result<PreprocOutput, PreprocError> {
    let (content, path) = {
        let db = sources.read().unwrap();
        let f = db.get_file(file);
        (f.content.clone(), f.path.clone())
    };
    include_stack.push(path.clone());

    let mut scanner = Scanner {
        src: content.as_bytes(),
        pos: 0,
        line: 1,
        line_start: 0,
        out: String::with_capacity(content.len()),
        out_line: 1,
        origin: OriginMap::new(),
        cond: CondStack::new(),
        file,
        path,
        sources,
        symbols,
        unit,
        options,
        sink,
        include_stack,
        expansion_stack: Vec::new(),
    };

    let result = scanner.run();
    scanner.include_stack.pop();

    result.map(|()| PreprocOutput {
        file,
        text: scanner.out,
        origin: scanner.origin,
    })
}

struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    /// Current 1-indexed line in the source file.
    line: u32,
    /// Byte offset where the current source line starts.
    line_start: usize,
    out: String,
    /// Current 1-indexed line in the output stream.
    out_line: u32,
    origin: OriginMap,
    cond: CondStack,
    file: FileId,
    path: PathBuf,
    sources: &'a RwLock<SourceDb>,
    symbols: &'a SymbolTable,
    unit: &'a CompilationUnit,
    options: &'a PreprocOptions,
    sink: &'a DiagnosticSink,
    include_stack: &'a mut Vec<PathBuf>,
    /// Names currently being expanded, for loop detection.
    expansion_stack: Vec<Symbol>,
}

impl Scanner<'_> {
    fn run(&mut self) -> Result<(), PreprocError> {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            match b {
                b'\n' => {
                    self.emit_newline();
                    self.pos += 1;
                }
                b'"' if self.cond.active() => self.copy_string(),
                b'"' => self.skip_string(),
                b'/' if self.peek_at(1) == b'/' => self.handle_line_comment(),
                b'/' if self.peek_at(1) == b'*' => self.handle_block_comment(),
                b'`' => self.handle_directive()?,
                _ => {
                    if self.cond.active() {
                        self.out.push(b as char);
                    }
                    self.pos += 1;
                }
            }
        }
        if let Some((directive, span)) = self.cond.dangling() {
            return Err(PreprocError::UnterminatedConditional {
                directive: directive.to_string(),
                span,
            });
        }
        Ok(())
    }

    // -- low-level helpers --

    fn peek_at(&self, offset: usize) -> u8 {
        let idx = self.pos + offset;
        if idx < self.src.len() {
            self.src[idx]
        } else {
            0
        }
    }

    fn emit_newline(&mut self) {
        self.out.push('\n');
        self.out_line += 1;
        self.line += 1;
        self.line_start = self.pos + 1;
    }

    fn col_of(&self, pos: usize) -> u32 {
        (pos - self.line_start + 1) as u32
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn copy_string(&mut self) {
        self.out.push('"');
        self.pos += 1;
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b == b'\\' && self.pos + 1 < self.src.len() {
                self.out.push('\\');
                self.out.push(self.src[self.pos + 1] as char);
                self.pos += 2;
                continue;
            }
            self.out.push(b as char);
            self.pos += 1;
            if b == b'"' {
                return;
            }
            if b == b'\n' {
                // Unterminated string; line bookkeeping still applies.
                self.out_line += 1;
                self.line += 1;
                self.line_start = self.pos;
                return;
            }
        }
    }

    fn skip_string(&mut self) {
        self.pos += 1;
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b == b'\\' {
                self.pos += 2;
                continue;
            }
            self.pos += 1;
            if b == b'"' {
                return;
            }
            if b == b'\n' {
                self.emit_newline_only();
                return;
            }
        }
    }

    /// Emits a newline for suppressed text (the byte was already consumed).
    fn emit_newline_only(&mut self) {
        self.out.push('\n');
        self.out_line += 1;
        self.line += 1;
        self.line_start = self.pos;
    }

    fn handle_line_comment(&mut self) {
        let active = self.cond.active();
        if active {
            self.out.push_str("//");
        }
        self.pos += 2;
        while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
            if active {
                self.out.push(self.src[self.pos] as char);
            }
            self.pos += 1;
        }
    }

    fn handle_block_comment(&mut self) {
        let active = self.cond.active();
        if active {
            self.out.push_str("/*");
        }
        self.pos += 2;
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b == b'*' && self.peek_at(1) == b'/' {
                if active {
                    self.out.push_str("*/");
                }
                self.pos += 2;
                return;
            }
            if b == b'\n' {
                self.emit_newline();
                self.pos += 1;
                continue;
            }
            if active {
                self.out.push(b as char);
            }
            self.pos += 1;
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.src[start..self.pos]).into_owned()
    }

    fn skip_inline_ws(&mut self) {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b == b' ' || b == b'\t' || b == b'\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Consumes the rest of the current line without emitting it.
    /// The newline itself is left for the main loop.
    fn consume_to_eol(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.src[start..self.pos])
            .trim()
            .to_string()
    }

    // -- directive dispatch --

    fn handle_directive(&mut self) -> Result<(), PreprocError> {
        let tick_pos = self.pos;
        self.pos += 1;
        let name = self.read_identifier();
        let name_span = self.span_from(tick_pos);

        match name.as_str() {
            "ifdef" | "ifndef" => {
                self.skip_inline_ws();
                let macro_name = self.read_identifier();
                let sym = self.symbols.register(&macro_name);
                let defined = self.unit.macros.is_defined(sym);
                self.cond
                    .enter_if(sym, defined, name == "ifndef", name_span);
            }
            "elsif" => {
                self.skip_inline_ws();
                let macro_name = self.read_identifier();
                let sym = self.symbols.register(&macro_name);
                let defined = self.unit.macros.is_defined(sym);
                if !self.cond.enter_elsif(sym, defined, name_span) {
                    self.sink
                        .emit(errors::error_stray_conditional("elsif", name_span));
                }
            }
            "else" => {
                if !self.cond.enter_else(name_span) {
                    self.sink
                        .emit(errors::error_stray_conditional("else", name_span));
                }
            }
            "endif" => {
                if !self.cond.exit_endif() {
                    self.sink
                        .emit(errors::error_stray_conditional("endif", name_span));
                }
            }
            _ if !self.cond.active() => {
                // Every other directive is inert in dead text.
            }
            "define" => self.handle_define(),
            "undef" => {
                self.skip_inline_ws();
                let macro_name = self.read_identifier();
                self.unit.macros.undefine(self.symbols.register(&macro_name));
            }
            "undefineall" => self.unit.macros.clear(),
            "resetall" => {
                // Directive state reverts to power-on defaults.
                self.unit
                    .record_default_nettype(self.file, self.line, NetType::Wire);
            }
            "include" => self.handle_include(tick_pos)?,
            "timescale" => self.handle_timescale(tick_pos),
            "default_nettype" => self.handle_default_nettype(tick_pos),
            "unconnected_drive" => {
                self.skip_inline_ws();
                let value = self.read_identifier();
                if value != "pull0" && value != "pull1" {
                    self.sink.emit(errors::warn_bad_drive_value(
                        "unconnected_drive",
                        &value,
                        self.span_from(tick_pos),
                    ));
                }
            }
            "nounconnected_drive" | "celldefine" | "endcelldefine" | "line" => {
                self.consume_to_eol();
            }
            _ => self.handle_macro_instance(&name, tick_pos)?,
        }
        Ok(())
    }

    // -- `define --

    fn handle_define(&mut self) {
        self.skip_inline_ws();
        let name_start = self.pos;
        let name = self.read_identifier();
        let def_span = self.span_from(name_start);
        if name.is_empty() {
            self.consume_to_eol();
            return;
        }

        // Parameters only when '(' immediately follows the name.
        let mut params = Vec::new();
        if self.pos < self.src.len() && self.src[self.pos] == b'(' {
            self.pos += 1;
            loop {
                self.skip_inline_ws();
                let p = self.read_identifier();
                if !p.is_empty() {
                    params.push(p);
                }
                self.skip_inline_ws();
                match self.src.get(self.pos) {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => break,
                }
            }
        }

        // Body: rest of line, with backslash continuations joined by newlines.
        // The consumed newlines are re-emitted so line counts are preserved.
        let mut body = String::new();
        self.skip_inline_ws();
        loop {
            let chunk_start = self.pos;
            while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                self.pos += 1;
            }
            let raw = String::from_utf8_lossy(&self.src[chunk_start..self.pos]).into_owned();
            let trimmed = raw.trim_end();
            match trimmed.strip_suffix('\\') {
                Some(stripped) if self.pos < self.src.len() => {
                    body.push_str(stripped);
                    body.push('\n');
                    self.emit_newline();
                    self.pos += 1;
                }
                Some(stripped) => {
                    body.push_str(stripped);
                    break;
                }
                None => {
                    body.push_str(trimmed);
                    break;
                }
            }
        }

        self.unit.macros.register(MacroDef {
            name: self.symbols.register(&name),
            params,
            body,
            def_span,
        });
    }

    // -- macro instances --

    fn handle_macro_instance(&mut self, name: &str, tick_pos: usize) -> Result<(), PreprocError> {
        let sym = self.symbols.register(name);
        let instance_span = self.span_from(tick_pos);
        let start_line = self.line;
        let start_col = self.col_of(tick_pos);

        let Some(def) = self.unit.macros.get(sym) else {
            self.sink.emit(errors::undefined_macro(
                name,
                self.options.complain_undefined_macro,
                instance_span,
            ));
            return Ok(());
        };

        let mut args = Vec::new();
        if def.requires_parens() {
            if self.src.get(self.pos) != Some(&b'(') {
                self.sink.emit(errors::error_macro_needs_parens(
                    name,
                    instance_span,
                    def.def_span,
                ));
                return Ok(());
            }
            args = self.read_macro_args();
            if args.len() != def.params.len() {
                self.sink.emit(errors::error_macro_arity(
                    name,
                    def.params.len(),
                    args.len(),
                    self.span_from(tick_pos),
                ));
                return Ok(());
            }
        }

        let expanded = self.expand_macro(&def, &args, instance_span)?;

        let push_idx = self.origin.push_record(OriginRecord {
            context: OriginContext::Macro,
            action: OriginAction::Push,
            section_file: def.def_span.file,
            section_line: self.out_line,
            section_symbol: sym,
            source_line: start_line,
            source_col: start_col,
            source_end_line: self.line,
            source_end_col: self.col_of(self.pos),
            paired_index: None,
        });
        self.out
            .push_str(&format!("{MARKER_BEGIN}B:{push_idx}{MARKER_END}"));
        let newlines = expanded.bytes().filter(|&b| b == b'\n').count() as u32;
        self.out.push_str(&expanded);
        self.out_line += newlines;
        let pop_idx = self.origin.push_record(OriginRecord {
            context: OriginContext::Macro,
            action: OriginAction::Pop,
            section_file: def.def_span.file,
            section_line: self.out_line,
            section_symbol: sym,
            source_line: self.line,
            source_col: self.col_of(self.pos),
            source_end_line: self.line,
            source_end_col: self.col_of(self.pos),
            paired_index: None,
        });
        self.origin.pair(push_idx, pop_idx);
        self.out
            .push_str(&format!("{MARKER_BEGIN}E:{push_idx}{MARKER_END}"));
        Ok(())
    }

    /// Reads a balanced parenthesized argument list, splitting on top-level
    /// commas. The opening '(' is at the current position.
    fn read_macro_args(&mut self) -> Vec<String> {
        self.pos += 1;
        let mut args = Vec::new();
        let mut current = String::new();
        let mut depth = 1u32;
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            match b {
                b'(' => {
                    depth += 1;
                    current.push('(');
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        break;
                    }
                    current.push(')');
                }
                b',' if depth == 1 => {
                    args.push(current.trim().to_string());
                    current = String::new();
                }
                b'\n' => {
                    // Multi-line instances keep their newlines in the argument.
                    self.emit_newline();
                    current.push(' ');
                }
                _ => current.push(b as char),
            }
            self.pos += 1;
        }
        if !current.trim().is_empty() || !args.is_empty() {
            args.push(current.trim().to_string());
        }
        args
    }

    /// Expands a macro body with textual parameter substitution, recursing
    /// into nested instances. Re-entering a macro already on the expansion
    /// stack is a fatal error.
    fn expand_macro(
        &mut self,
        def: &MacroDef,
        args: &[String],
        instance_span: Span,
    ) -> Result<String, PreprocError> {
        if self.expansion_stack.contains(&def.name) {
            return Err(PreprocError::MacroRecursion {
                name: self.symbols.lookup(def.name).to_string(),
                span: instance_span,
            });
        }
        self.expansion_stack.push(def.name);

        let substituted = substitute_params(&def.body, &def.params, args);
        let result = self.expand_nested(&substituted, instance_span);

        self.expansion_stack.pop();
        result
    }

    /// Expands nested macro instances within already-substituted text.
    fn expand_nested(&mut self, text: &str, instance_span: Span) -> Result<String, PreprocError> {
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'`' {
                let mut j = i + 1;
                while j < bytes.len()
                    && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_' || bytes[j] == b'$')
                {
                    j += 1;
                }
                let name = &text[i + 1..j];
                if name.is_empty() {
                    out.push('`');
                    i += 1;
                    continue;
                }
                let sym = self.symbols.register(name);
                if let Some(def) = self.unit.macros.get(sym) {
                    let mut args = Vec::new();
                    if def.requires_parens() {
                        if bytes.get(j) != Some(&b'(') {
                            self.sink.emit(errors::error_macro_needs_parens(
                                name,
                                instance_span,
                                def.def_span,
                            ));
                            i = j;
                            continue;
                        }
                        let (parsed, next) = read_args_from(text, j);
                        args = parsed;
                        if args.len() != def.params.len() {
                            self.sink.emit(errors::error_macro_arity(
                                name,
                                def.params.len(),
                                args.len(),
                                instance_span,
                            ));
                            i = next;
                            continue;
                        }
                        let expanded = self.expand_macro(&def, &args, instance_span)?;
                        out.push_str(&expanded);
                        i = next;
                        continue;
                    }
                    let expanded = self.expand_macro(&def, &args, instance_span)?;
                    out.push_str(&expanded);
                    i = j;
                } else {
                    self.sink.emit(errors::undefined_macro(
                        name,
                        self.options.complain_undefined_macro,
                        instance_span,
                    ));
                    i = j;
                }
            } else {
                out.push(bytes[i] as char);
                i += 1;
            }
        }
        Ok(out)
    }

    // -- `include --

    fn handle_include(&mut self, tick_pos: usize) -> Result<(), PreprocError> {
        self.skip_inline_ws();
        let close = match self.src.get(self.pos) {
            Some(b'"') => b'"',
            Some(b'<') => b'>',
            _ => {
                self.sink
                    .emit(errors::error_invalid_include_filename(self.span_from(tick_pos)));
                self.consume_to_eol();
                return Ok(());
            }
        };
        self.pos += 1;
        let name_start = self.pos;
        while self.pos < self.src.len()
            && self.src[self.pos] != close
            && self.src[self.pos] != b'\n'
        {
            self.pos += 1;
        }
        if self.src.get(self.pos) != Some(&close) {
            self.sink
                .emit(errors::error_invalid_include_filename(self.span_from(tick_pos)));
            return Ok(());
        }
        let name = String::from_utf8_lossy(&self.src[name_start..self.pos]).into_owned();
        self.pos += 1;
        let directive_span = self.span_from(tick_pos);
        let start_line = self.line;
        let start_col = self.col_of(tick_pos);

        // Resolve: next to the including file first, then the include dirs.
        let candidate = sibling(&self.path, &name);
        let resolved = if candidate.is_file() {
            Some(candidate)
        } else {
            locate(&name, &self.options.include_dirs)
        };
        let Some(resolved) = resolved else {
            return Err(PreprocError::UnresolvedInclude {
                name,
                span: directive_span,
            });
        };

        if self.include_stack.contains(&resolved) {
            return Err(PreprocError::RecursiveInclude {
                name,
                span: directive_span,
            });
        }

        let inc_file = {
            let mut db = self.sources.write().unwrap();
            match db.find_by_path(&resolved) {
                Some(id) => id,
                None => db
                    .load_file(&resolved)
                    .map_err(|e| PreprocError::IncludeIo {
                        name: name.clone(),
                        message: e.to_string(),
                        span: directive_span,
                    })?,
            }
        };

        let inner = preprocess_inner(
            inc_file,
            self.sources,
            self.symbols,
            self.unit,
            self.options,
            self.sink,
            self.include_stack,
        )?;

        let push_idx = self.origin.push_record(OriginRecord {
            context: OriginContext::Include,
            action: OriginAction::Push,
            section_file: inc_file,
            section_line: self.out_line,
            section_symbol: self.symbols.register(&name),
            source_line: start_line,
            source_col: start_col,
            source_end_line: self.line,
            source_end_col: self.col_of(self.pos),
            paired_index: None,
        });
        self.out
            .push_str(&format!("{MARKER_BEGIN}B:{push_idx}{MARKER_END}"));
        self.origin.append_shifted(&inner.origin, self.out_line - 1);
        let newlines = inner.text.bytes().filter(|&b| b == b'\n').count() as u32;
        self.out.push_str(&inner.text);
        self.out_line += newlines;
        let pop_idx = self.origin.push_record(OriginRecord {
            context: OriginContext::Include,
            action: OriginAction::Pop,
            section_file: inc_file,
            section_line: self.out_line,
            section_symbol: self.symbols.register(&name),
            source_line: self.line,
            source_col: self.col_of(self.pos),
            source_end_line: self.line,
            source_end_col: self.col_of(self.pos),
            paired_index: None,
        });
        self.origin.pair(push_idx, pop_idx);
        self.out
            .push_str(&format!("{MARKER_BEGIN}E:{push_idx}{MARKER_END}"));
        Ok(())
    }

    // -- `timescale / `default_nettype --

    fn handle_timescale(&mut self, tick_pos: usize) {
        let text = self.consume_to_eol();
        match Timescale::parse(&text) {
            Some(ts) => self.unit.record_timescale(self.file, self.line, ts),
            None => self
                .sink
                .emit(errors::error_invalid_timescale(&text, self.span_from(tick_pos))),
        }
    }

    fn handle_default_nettype(&mut self, tick_pos: usize) {
        self.skip_inline_ws();
        let value = self.read_identifier();
        match NetType::parse(&value) {
            Some(nt) => self.unit.record_default_nettype(self.file, self.line, nt),
            None => self.sink.emit(errors::warn_bad_drive_value(
                "default_nettype",
                &value,
                self.span_from(tick_pos),
            )),
        }
    }
}

/// Substitutes formal parameters with argument text, identifier-wise.
fn substitute_params(body: &str, params: &[String], args: &[String]) -> String {
    if params.is_empty() {
        return body.to_string();
    }
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
            {
                i += 1;
            }
            let ident = &body[start..i];
            match params.iter().position(|p| p == ident) {
                Some(idx) => out.push_str(&args[idx]),
                None => out.push_str(ident),
            }
        } else {
            out.push(b as char);
            i += 1;
        }
    }
    out
}

/// Reads a balanced argument list from `text` starting at the '(' at `open`.
/// Returns the arguments and the position just past the closing ')'.
fn read_args_from(text: &str, open: usize) -> (Vec<String>, usize) {
    let bytes = text.as_bytes();
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 1u32;
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                depth += 1;
                current.push('(');
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
                current.push(')');
            }
            b',' if depth == 1 => {
                args.push(current.trim().to_string());
                current = String::new();
            }
            c => current.push(c as char),
        }
        i += 1;
    }
    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    (args, i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use veril_diagnostics::Severity;

    struct Harness {
        sources: RwLock<SourceDb>,
        symbols: SymbolTable,
        unit: CompilationUnit,
        sink: DiagnosticSink,
        options: PreprocOptions,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                sources: RwLock::new(SourceDb::new()),
                symbols: SymbolTable::new(),
                unit: CompilationUnit::new(false),
                sink: DiagnosticSink::new(),
                options: PreprocOptions::default(),
            }
        }

        fn add(&self, name: &str, content: &str) -> FileId {
            self.sources
                .write()
                .unwrap()
                .add_source(name, content.to_string())
        }

        fn run(&self, file: FileId) -> Result<PreprocOutput, PreprocError> {
            preprocess_file(
                file,
                &self.sources,
                &self.symbols,
                &self.unit,
                &self.options,
                &self.sink,
            )
        }
    }

    fn strip_markers(text: &str) -> String {
        let mut out = String::new();
        let mut in_marker = false;
        for c in text.chars() {
            match c {
                MARKER_BEGIN => in_marker = true,
                MARKER_END => in_marker = false,
                _ if !in_marker => out.push(c),
                _ => {}
            }
        }
        out
    }

    fn line_count(s: &str) -> usize {
        let mut n = s.matches('\n').count();
        if !s.ends_with('\n') && !s.is_empty() {
            n += 1;
        }
        n
    }

    #[test]
    fn ifdef_selects_then_branch() {
        let h = Harness::new();
        let src = "`define FOO\n`ifdef FOO\nmodule m; endmodule\n`else\nmodule n; endmodule\n`endif\n";
        let f = h.add("a.sv", src);
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(text.contains("module m"));
        assert!(!text.contains("module n"));
        assert_eq!(line_count(&text), line_count(src), "line counts preserved");
    }

    #[test]
    fn ifndef_selects_else_branch() {
        let h = Harness::new();
        let f = h.add("a.sv", "`ifndef FOO\nkept\n`else\ndropped\n`endif\n");
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(text.contains("kept"));
        assert!(!text.contains("dropped"));
    }

    #[test]
    fn elsif_chain() {
        let h = Harness::new();
        let src = "`define B\n`ifdef A\na\n`elsif B\nb\n`elsif C\nc\n`else\nd\n`endif\n";
        let f = h.add("a.sv", src);
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(!text.contains('a'));
        assert!(text.contains('b'));
        assert!(!text.contains('c'));
        assert!(!text.contains('d'));
    }

    #[test]
    fn unterminated_conditional_is_fatal() {
        let h = Harness::new();
        let f = h.add("a.sv", "`ifdef FOO\nx\n");
        let err = h.run(f).unwrap_err();
        assert!(matches!(err, PreprocError::UnterminatedConditional { .. }));
    }

    #[test]
    fn stray_endif_diagnosed_not_fatal() {
        let h = Harness::new();
        let f = h.add("a.sv", "`endif\nmodule m; endmodule\n");
        let out = h.run(f).unwrap();
        assert!(h.sink.has_errors());
        assert!(strip_markers(&out.text).contains("module m"));
    }

    #[test]
    fn object_macro_expands() {
        let h = Harness::new();
        let f = h.add("a.sv", "`define WIDTH 8\nwire [`WIDTH-1:0] w;\n");
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(text.contains("wire [8-1:0] w;"));
        // Push/Pop pair recorded for the expansion.
        assert_eq!(out.origin.len(), 2);
        assert_eq!(out.origin.get(0).paired_index, Some(1));
    }

    #[test]
    fn parametric_macro_expands() {
        let h = Harness::new();
        let f = h.add(
            "a.sv",
            "`define MAX(a, b) ((a) > (b) ? (a) : (b))\nassign y = `MAX(p, q);\n",
        );
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(text.contains("assign y = ((p) > (q) ? (p) : (q));"));
    }

    #[test]
    fn nested_macro_expansion() {
        let h = Harness::new();
        let f = h.add(
            "a.sv",
            "`define INNER 4\n`define OUTER (`INNER + 1)\nlocalparam x = `OUTER;\n",
        );
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(text.contains("localparam x = (4 + 1);"));
    }

    #[test]
    fn macro_recursion_is_fatal() {
        let h = Harness::new();
        let f = h.add("a.sv", "`define LOOP `LOOP\n`LOOP\n");
        let err = h.run(f).unwrap_err();
        assert!(matches!(err, PreprocError::MacroRecursion { .. }));
    }

    #[test]
    fn mutual_macro_recursion_is_fatal() {
        let h = Harness::new();
        let f = h.add("a.sv", "`define A `B\n`define B `A\n`A\n");
        let err = h.run(f).unwrap_err();
        assert!(matches!(err, PreprocError::MacroRecursion { .. }));
    }

    #[test]
    fn arity_mismatch_diagnosed() {
        let h = Harness::new();
        let f = h.add("a.sv", "`define ADD(a, b) (a + b)\nx = `ADD(1);\n");
        h.run(f).unwrap();
        let diags = h.sink.diagnostics();
        assert!(diags.iter().any(|d| d.message.contains("expects 2")));
    }

    #[test]
    fn missing_parens_points_at_definition() {
        let h = Harness::new();
        let f = h.add("a.sv", "`define ADD(a, b) (a + b)\nx = `ADD;\n");
        h.run(f).unwrap();
        let diags = h.sink.diagnostics();
        let d = diags
            .iter()
            .find(|d| d.message.contains("without parentheses"))
            .unwrap();
        assert_eq!(d.labels.len(), 1, "definition label attached");
    }

    #[test]
    fn undefined_macro_warns_by_default() {
        let h = Harness::new();
        let f = h.add("a.sv", "x = `NOPE;\n");
        h.run(f).unwrap();
        let diags = h.sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn undefined_macro_errors_when_complaining() {
        let mut h = Harness::new();
        h.options.complain_undefined_macro = true;
        let f = h.add("a.sv", "x = `NOPE;\n");
        h.run(f).unwrap();
        assert!(h.sink.has_errors());
    }

    #[test]
    fn undef_removes_definition() {
        let h = Harness::new();
        let f = h.add(
            "a.sv",
            "`define FOO\n`undef FOO\n`ifdef FOO\nyes\n`else\nno\n`endif\n",
        );
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(!text.contains("yes"));
        assert!(text.contains("no"));
    }

    #[test]
    fn multiline_define_preserves_line_count() {
        let h = Harness::new();
        let src = "`define BODY first \\\n  second\nx `BODY y\n";
        let f = h.add("a.sv", src);
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        // Expansion carries the embedded newline; total attributable lines
        // equal source lines plus the newline the expansion contributes.
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }

    #[test]
    fn definition_is_scope_based_not_value_based() {
        let h = Harness::new();
        // An empty-bodied macro still counts as defined.
        let f = h.add("a.sv", "`define EMPTY\n`ifdef EMPTY\nkept\n`endif\n");
        let out = h.run(f).unwrap();
        assert!(strip_markers(&out.text).contains("kept"));
    }

    #[test]
    fn timescale_recorded() {
        let h = Harness::new();
        let f = h.add("a.sv", "`timescale 1ns / 1ps\nmodule m; endmodule\n");
        h.run(f).unwrap();
        let ts = h.unit.timescale_at(f, 2).unwrap();
        assert_eq!(ts.unit, TimeUnit::Ns);
        assert_eq!(ts.prec, TimeUnit::Ps);
    }

    use crate::unit::TimeUnit;

    #[test]
    fn invalid_timescale_diagnosed() {
        let h = Harness::new();
        let f = h.add("a.sv", "`timescale 3ns / 1ps\n");
        h.run(f).unwrap();
        assert!(h.sink.has_errors());
        assert!(h.unit.timescale_at(f, 2).is_none());
    }

    #[test]
    fn default_nettype_recorded() {
        let h = Harness::new();
        let f = h.add("a.sv", "`default_nettype none\nmodule m; endmodule\n");
        h.run(f).unwrap();
        assert_eq!(h.unit.default_nettype_at(f, 2), NetType::None);
    }

    #[test]
    fn bad_unconnected_drive_warns() {
        let h = Harness::new();
        let f = h.add("a.sv", "`unconnected_drive pullx\n");
        h.run(f).unwrap();
        assert_eq!(h.sink.warning_count(), 1);
    }

    #[test]
    fn include_splices_and_maps_origin() {
        let h = Harness::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let inc_path = tmp.path().join("defs.svh");
        std::fs::write(&inc_path, "`define W 4\nwire shared;\n").unwrap();
        let main_path = tmp.path().join("top.sv");
        std::fs::write(&main_path, "`include \"defs.svh\"\nmodule m; endmodule\n").unwrap();

        let f = {
            let mut db = h.sources.write().unwrap();
            db.load_file(&main_path).unwrap()
        };
        let out = h.run(f).unwrap();
        let text = strip_markers(&out.text);
        assert!(text.contains("wire shared;"));
        assert!(text.contains("module m; endmodule"));

        // Origin map: the spliced region resolves to the included file and
        // lines after the region map back to the includer.
        let inc_id = h
            .sources
            .read()
            .unwrap()
            .find_by_path(&inc_path)
            .expect("include registered in source db");
        let loc = out.origin.resolve_line(2, f);
        assert_eq!(loc.file, inc_id);
        assert_eq!(loc.line, 2);
        let after = out.origin.resolve_line(4, f);
        assert_eq!(after.file, f);
        assert_eq!(after.line, 2);
    }

    #[test]
    fn include_macros_visible_to_includer() {
        let h = Harness::new();
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("w.svh"), "`define W 16\n").unwrap();
        let main_path = tmp.path().join("top.sv");
        std::fs::write(&main_path, "`include \"w.svh\"\nwire [`W-1:0] d;\n").unwrap();

        let f = {
            let mut db = h.sources.write().unwrap();
            db.load_file(&main_path).unwrap()
        };
        let out = h.run(f).unwrap();
        assert!(strip_markers(&out.text).contains("wire [16-1:0] d;"));
    }

    #[test]
    fn unresolved_include_is_fatal() {
        let h = Harness::new();
        let f = h.add("a.sv", "`include \"no_such_file.svh\"\n");
        let err = h.run(f).unwrap_err();
        assert!(matches!(err, PreprocError::UnresolvedInclude { .. }));
    }

    #[test]
    fn recursive_include_is_fatal() {
        let h = Harness::new();
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("x.svh"), "`include \"y.svh\"\n").unwrap();
        std::fs::write(tmp.path().join("y.svh"), "`include \"x.svh\"\n").unwrap();
        let main_path = tmp.path().join("top.sv");
        std::fs::write(&main_path, "`include \"x.svh\"\n").unwrap();

        let f = {
            let mut db = h.sources.write().unwrap();
            db.load_file(&main_path).unwrap()
        };
        let err = h.run(f).unwrap_err();
        match err {
            PreprocError::RecursiveInclude { name, .. } => assert_eq!(name, "x.svh"),
            other => panic!("expected RecursiveInclude, got {other:?}"),
        }
    }

    #[test]
    fn invalid_include_filename_diagnosed() {
        let h = Harness::new();
        let f = h.add("a.sv", "`include foo\nmodule m; endmodule\n");
        let out = h.run(f).unwrap();
        assert!(h.sink.has_errors());
        assert!(strip_markers(&out.text).contains("module m"));
    }

    #[test]
    fn directives_inside_comments_ignored() {
        let h = Harness::new();
        let f = h.add("a.sv", "// `define FOO\n/* `ifdef BAR */\nx;\n");
        let out = h.run(f).unwrap();
        assert!(!h.unit.macros.is_defined(h.symbols.register("FOO")));
        assert!(h.sink.diagnostics().is_empty());
        assert!(strip_markers(&out.text).contains("x;"));
    }

    #[test]
    fn directive_only_file_keeps_line_count() {
        let h = Harness::new();
        let src = "`define A 1\n`define B 2\n`undef A\n";
        let f = h.add("a.sv", src);
        let out = h.run(f).unwrap();
        assert_eq!(line_count(&strip_markers(&out.text)), line_count(src));
    }

    #[test]
    fn strings_pass_through_untouched() {
        let h = Harness::new();
        let f = h.add("a.sv", "`define FOO bar\ninitial $display(\"`FOO\");\n");
        let out = h.run(f).unwrap();
        assert!(strip_markers(&out.text).contains("\"`FOO\""));
    }
}
