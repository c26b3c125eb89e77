//! Lexical analyzer for preprocessed SystemVerilog-2017 text.
//!
//! Converts preprocessed text into a sequence of [`Token`]s, handling
//! case-sensitive keywords, sized/based literals (`4'b1010`), string literals
//! with C-style escapes, line and block comments, escaped identifiers, system
//! identifiers, and the inline markers spliced by the preprocessor (which
//! become [`SvToken::PpMarkerBegin`]/[`SvToken::PpMarkerEnd`] tokens).
//! Errors are reported to the [`DiagnosticSink`] and produce
//! [`SvToken::Error`] tokens.

use crate::token::{lookup_keyword, SvToken, Token};
use veril_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use veril_source::{FileId, Span};

/// Lexer-stage diagnostic code.
const E200: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 200,
};

/// Lexes preprocessed SystemVerilog text into a vector of tokens.
///
/// Whitespace and comments are skipped. The returned vector always ends with
/// an [`SvToken::Eof`] token.
pub fn lex(source: &str, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source: source.as_bytes(),
        pos: 0,
        file,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.source.len() {
                tokens.push(Token {
                    kind: SvToken::Eof,
                    span: Span::new(self.file, self.pos as u32, self.pos as u32),
                });
                break;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn peek(&self) -> u8 {
        if self.pos < self.source.len() {
            self.source[self.pos]
        } else {
            0
        }
    }

    fn peek_at(&self, offset: usize) -> u8 {
        let idx = self.pos + offset;
        if idx < self.source.len() {
            self.source[idx]
        } else {
            0
        }
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn token(&self, kind: SvToken, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn error(&self, msg: &str, span: Span) {
        self.sink.emit(Diagnostic::error(E200, msg, span));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.pos >= self.source.len() {
                return;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'/' {
                self.pos += 2;
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.source.len() {
                        self.error("unterminated block comment", self.span_from(start));
                        break;
                    }
                    if self.source[self.pos] == b'*' && self.peek_at(1) == b'/' {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        // Preprocessor marker: \u{1} ... \u{2}
        if b == 0x01 {
            return self.lex_pp_marker(start);
        }

        // Identifiers and keywords
        if is_ident_start(b) {
            return self.lex_identifier_or_keyword(start);
        }

        // Escaped identifier: \...whitespace
        if b == b'\\' {
            self.pos += 1;
            while self.pos < self.source.len() && !self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            return self.token(SvToken::EscapedIdentifier, start);
        }

        // System identifier: $name
        if b == b'$' && is_ident_start(self.peek_at(1)) {
            self.pos += 1;
            while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
                self.pos += 1;
            }
            return self.token(SvToken::SystemIdentifier, start);
        }

        // Numbers
        if b.is_ascii_digit() {
            return self.lex_number(start);
        }

        // Based literal without size: 'b1010, or unbased unsized '0/'1/'x/'z,
        // or assignment pattern opener '{
        if b == b'\'' {
            return self.lex_apostrophe(start);
        }

        // String literal
        if b == b'"' {
            return self.lex_string(start);
        }

        self.lex_operator(start)
    }

    fn lex_pp_marker(&mut self, start: usize) -> Token {
        // \u{1}B:<idx>\u{2} or \u{1}E:<idx>\u{2}
        self.pos += 1;
        let kind = match self.peek() {
            b'B' => SvToken::PpMarkerBegin,
            b'E' => SvToken::PpMarkerEnd,
            _ => {
                self.pos += 1;
                self.error("malformed preprocessor marker", self.span_from(start));
                return self.token(SvToken::Error, start);
            }
        };
        while self.pos < self.source.len() && self.source[self.pos] != 0x02 {
            self.pos += 1;
        }
        if self.pos < self.source.len() {
            self.pos += 1;
        }
        self.token(kind, start)
    }

    fn lex_identifier_or_keyword(&mut self, start: usize) -> Token {
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("");
        let kind = lookup_keyword(text).unwrap_or(SvToken::Identifier);
        self.token(kind, start)
    }

    fn lex_number(&mut self, start: usize) -> Token {
        // Leading decimal digits (possibly a size prefix or plain literal).
        while self.pos < self.source.len()
            && (self.source[self.pos].is_ascii_digit() || self.source[self.pos] == b'_')
        {
            self.pos += 1;
        }

        // Sized based literal: 8'hFF (whitespace between size and base allowed)
        let mut lookahead = self.pos;
        while lookahead < self.source.len() && self.source[lookahead] == b' ' {
            lookahead += 1;
        }
        if lookahead < self.source.len()
            && self.source[lookahead] == b'\''
            && is_base_char(byte_at(self.source, lookahead + 1))
        {
            self.pos = lookahead + 2;
            // Optional signed marker consumed as part of the base.
            if is_base_char(byte_at(self.source, self.pos)) {
                self.pos += 1;
            }
            while self.pos < self.source.len() && is_based_digit(self.source[self.pos]) {
                self.pos += 1;
            }
            return self.token(SvToken::BasedLiteral, start);
        }

        // Real literal: 3.14, 1e9, 2.5e-3
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            self.pos += 1;
            while self.pos < self.source.len()
                && (self.source[self.pos].is_ascii_digit() || self.source[self.pos] == b'_')
            {
                self.pos += 1;
            }
            self.maybe_exponent();
            return self.token(SvToken::RealLiteral, start);
        }
        if self.peek() == b'e' || self.peek() == b'E' {
            if self.maybe_exponent() {
                return self.token(SvToken::RealLiteral, start);
            }
        }

        self.token(SvToken::IntLiteral, start)
    }

    fn maybe_exponent(&mut self) -> bool {
        if self.peek() != b'e' && self.peek() != b'E' {
            return false;
        }
        let mut ahead = self.pos + 1;
        if byte_at(self.source, ahead) == b'+' || byte_at(self.source, ahead) == b'-' {
            ahead += 1;
        }
        if !byte_at(self.source, ahead).is_ascii_digit() {
            return false;
        }
        self.pos = ahead;
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        true
    }

    fn lex_apostrophe(&mut self, start: usize) -> Token {
        // '{ assignment pattern
        if self.peek_at(1) == b'{' {
            self.pos += 2;
            return self.token(SvToken::ApostropheBrace, start);
        }
        // 'b1010 / 'hFF unsized based literal
        if is_base_char(self.peek_at(1)) && is_based_digit(self.peek_at(2)) {
            self.pos += 2;
            while self.pos < self.source.len() && is_based_digit(self.source[self.pos]) {
                self.pos += 1;
            }
            return self.token(SvToken::BasedLiteral, start);
        }
        // '0 '1 'x 'z
        let next = self.peek_at(1);
        if matches!(next, b'0' | b'1' | b'x' | b'X' | b'z' | b'Z') {
            self.pos += 2;
            return self.token(SvToken::UnbasedUnsized, start);
        }
        self.pos += 1;
        self.token(SvToken::Apostrophe, start)
    }

    fn lex_string(&mut self, start: usize) -> Token {
        self.pos += 1;
        loop {
            if self.pos >= self.source.len() || self.source[self.pos] == b'\n' {
                self.error("unterminated string literal", self.span_from(start));
                return self.token(SvToken::Error, start);
            }
            let b = self.source[self.pos];
            if b == b'\\' && self.pos + 1 < self.source.len() {
                self.pos += 2;
                continue;
            }
            self.pos += 1;
            if b == b'"' {
                return self.token(SvToken::StringLiteral, start);
            }
        }
    }

    fn lex_operator(&mut self, start: usize) -> Token {
        let b = self.peek();
        let b1 = self.peek_at(1);
        let b2 = self.peek_at(2);
        let b3 = self.peek_at(3);

        // Longest match first.
        let (kind, len) = match (b, b1, b2, b3) {
            (b'<', b'<', b'<', b'=') => (SvToken::AShiftLeftEquals, 4),
            (b'>', b'>', b'>', b'=') => (SvToken::AShiftRightEquals, 4),
            (b'=', b'=', b'=', _) => (SvToken::TripleEquals, 3),
            (b'!', b'=', b'=', _) => (SvToken::BangDoubleEquals, 3),
            (b'=', b'=', b'?', _) => (SvToken::WildcardEq, 3),
            (b'!', b'=', b'?', _) => (SvToken::WildcardNeq, 3),
            (b'<', b'<', b'<', _) => (SvToken::AShiftLeft, 3),
            (b'>', b'>', b'>', _) => (SvToken::AShiftRight, 3),
            (b'<', b'<', b'=', _) => (SvToken::ShiftLeftEquals, 3),
            (b'>', b'>', b'=', _) => (SvToken::ShiftRightEquals, 3),
            (b'=', b'=', _, _) => (SvToken::DoubleEquals, 2),
            (b'!', b'=', _, _) => (SvToken::BangEquals, 2),
            (b'<', b'=', _, _) => (SvToken::LessEquals, 2),
            (b'>', b'=', _, _) => (SvToken::GreaterEquals, 2),
            (b'<', b'<', _, _) => (SvToken::ShiftLeft, 2),
            (b'>', b'>', _, _) => (SvToken::ShiftRight, 2),
            (b'&', b'&', _, _) => (SvToken::AmpAmp, 2),
            (b'|', b'|', _, _) => (SvToken::PipePipe, 2),
            (b'*', b'*', _, _) => (SvToken::DoubleStar, 2),
            (b'+', b'+', _, _) => (SvToken::PlusPlus, 2),
            (b'-', b'-', _, _) => (SvToken::MinusMinus, 2),
            (b'+', b'=', _, _) => (SvToken::PlusEquals, 2),
            (b'-', b'=', _, _) => (SvToken::MinusEquals, 2),
            (b'*', b'=', _, _) => (SvToken::StarEquals, 2),
            (b'/', b'=', _, _) => (SvToken::SlashEquals, 2),
            (b'%', b'=', _, _) => (SvToken::PercentEquals, 2),
            (b'&', b'=', _, _) => (SvToken::AmpEquals, 2),
            (b'|', b'=', _, _) => (SvToken::PipeEquals, 2),
            (b'^', b'=', _, _) => (SvToken::CaretEquals, 2),
            (b'-', b'>', _, _) => (SvToken::Arrow, 2),
            (b'+', b':', _, _) => (SvToken::PlusColon, 2),
            (b'-', b':', _, _) => (SvToken::MinusColon, 2),
            (b'~', b'&', _, _) => (SvToken::TildeAmp, 2),
            (b'~', b'|', _, _) => (SvToken::TildePipe, 2),
            (b'~', b'^', _, _) => (SvToken::TildeCaret, 2),
            (b'^', b'~', _, _) => (SvToken::TildeCaret, 2),
            (b':', b':', _, _) => (SvToken::ColonColon, 2),
            (b'.', b'*', _, _) => (SvToken::DotStar, 2),
            (b'(', _, _, _) => (SvToken::LeftParen, 1),
            (b')', _, _, _) => (SvToken::RightParen, 1),
            (b'[', _, _, _) => (SvToken::LeftBracket, 1),
            (b']', _, _, _) => (SvToken::RightBracket, 1),
            (b'{', _, _, _) => (SvToken::LeftBrace, 1),
            (b'}', _, _, _) => (SvToken::RightBrace, 1),
            (b',', _, _, _) => (SvToken::Comma, 1),
            (b';', _, _, _) => (SvToken::Semicolon, 1),
            (b':', _, _, _) => (SvToken::Colon, 1),
            (b'.', _, _, _) => (SvToken::Dot, 1),
            (b'#', _, _, _) => (SvToken::Hash, 1),
            (b'@', _, _, _) => (SvToken::At, 1),
            (b'$', _, _, _) => (SvToken::Dollar, 1),
            (b'?', _, _, _) => (SvToken::QuestionMark, 1),
            (b'=', _, _, _) => (SvToken::Equals, 1),
            (b'<', _, _, _) => (SvToken::LessThan, 1),
            (b'>', _, _, _) => (SvToken::GreaterThan, 1),
            (b'+', _, _, _) => (SvToken::Plus, 1),
            (b'-', _, _, _) => (SvToken::Minus, 1),
            (b'*', _, _, _) => (SvToken::Star, 1),
            (b'/', _, _, _) => (SvToken::Slash, 1),
            (b'%', _, _, _) => (SvToken::Percent, 1),
            (b'!', _, _, _) => (SvToken::Bang, 1),
            (b'&', _, _, _) => (SvToken::Amp, 1),
            (b'|', _, _, _) => (SvToken::Pipe, 1),
            (b'^', _, _, _) => (SvToken::Caret, 1),
            (b'~', _, _, _) => (SvToken::Tilde, 1),
            _ => {
                self.pos += 1;
                self.error(
                    &format!("unrecognized character `{}`", b as char),
                    self.span_from(start),
                );
                return self.token(SvToken::Error, start);
            }
        };
        self.pos += len;
        self.token(kind, start)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_base_char(b: u8) -> bool {
    matches!(b, b'b' | b'B' | b'o' | b'O' | b'd' | b'D' | b'h' | b'H' | b's' | b'S')
}

fn is_based_digit(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'?'
}

fn byte_at(source: &[u8], idx: usize) -> u8 {
    if idx < source.len() {
        source[idx]
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veril_diagnostics::DiagnosticSink;

    fn lex_kinds(source: &str) -> Vec<SvToken> {
        let sink = DiagnosticSink::new();
        lex(source, FileId::from_raw(0), &sink)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        let kinds = lex_kinds("module counter endmodule");
        assert_eq!(
            kinds,
            vec![
                SvToken::Module,
                SvToken::Identifier,
                SvToken::Endmodule,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn sized_based_literal() {
        let kinds = lex_kinds("4'b1010 16'hFF_00 8'o77 32'd255");
        assert_eq!(
            kinds,
            vec![
                SvToken::BasedLiteral,
                SvToken::BasedLiteral,
                SvToken::BasedLiteral,
                SvToken::BasedLiteral,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn unsized_based_and_unbased() {
        let kinds = lex_kinds("'hFF '0 '1 'x 'z");
        assert_eq!(
            kinds,
            vec![
                SvToken::BasedLiteral,
                SvToken::UnbasedUnsized,
                SvToken::UnbasedUnsized,
                SvToken::UnbasedUnsized,
                SvToken::UnbasedUnsized,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn real_literals() {
        let kinds = lex_kinds("3.14 1e9 2.5e-3");
        assert_eq!(
            kinds,
            vec![
                SvToken::RealLiteral,
                SvToken::RealLiteral,
                SvToken::RealLiteral,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn int_vs_real() {
        let kinds = lex_kinds("42 1_000");
        assert_eq!(
            kinds,
            vec![SvToken::IntLiteral, SvToken::IntLiteral, SvToken::Eof]
        );
    }

    #[test]
    fn sv_operators() {
        let kinds = lex_kinds("==? !=? === <<< >>> :: ++ +=");
        assert_eq!(
            kinds,
            vec![
                SvToken::WildcardEq,
                SvToken::WildcardNeq,
                SvToken::TripleEquals,
                SvToken::AShiftLeft,
                SvToken::AShiftRight,
                SvToken::ColonColon,
                SvToken::PlusPlus,
                SvToken::PlusEquals,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn part_select_operators() {
        let kinds = lex_kinds("[7 +: 8] [15 -: 8]");
        assert!(kinds.contains(&SvToken::PlusColon));
        assert!(kinds.contains(&SvToken::MinusColon));
    }

    #[test]
    fn comments_skipped() {
        let kinds = lex_kinds("wire // line comment\n/* block */ logic");
        assert_eq!(kinds, vec![SvToken::Wire, SvToken::Logic, SvToken::Eof]);
    }

    #[test]
    fn string_literal_with_escape() {
        let kinds = lex_kinds(r#""hello \"world\"""#);
        assert_eq!(kinds, vec![SvToken::StringLiteral, SvToken::Eof]);
    }

    #[test]
    fn unterminated_string_is_error() {
        let sink = DiagnosticSink::new();
        let tokens = lex("\"oops\n", FileId::from_raw(0), &sink);
        assert_eq!(tokens[0].kind, SvToken::Error);
        assert!(sink.has_errors());
    }

    #[test]
    fn escaped_identifier() {
        let kinds = lex_kinds("\\bus+width rest");
        assert_eq!(
            kinds,
            vec![
                SvToken::EscapedIdentifier,
                SvToken::Identifier,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn system_identifier() {
        let kinds = lex_kinds("$clog2(WIDTH)");
        assert_eq!(
            kinds,
            vec![
                SvToken::SystemIdentifier,
                SvToken::LeftParen,
                SvToken::Identifier,
                SvToken::RightParen,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn pp_markers() {
        let src = "\u{1}B:0\u{2}wire w;\u{1}E:0\u{2}";
        let kinds = lex_kinds(src);
        assert_eq!(
            kinds,
            vec![
                SvToken::PpMarkerBegin,
                SvToken::Wire,
                SvToken::Identifier,
                SvToken::Semicolon,
                SvToken::PpMarkerEnd,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn assignment_pattern_opener() {
        let kinds = lex_kinds("'{1, 2}");
        assert_eq!(
            kinds,
            vec![
                SvToken::ApostropheBrace,
                SvToken::IntLiteral,
                SvToken::Comma,
                SvToken::IntLiteral,
                SvToken::RightBrace,
                SvToken::Eof
            ]
        );
    }

    #[test]
    fn spans_cover_token_text() {
        let sink = DiagnosticSink::new();
        let tokens = lex("module m;", FileId::from_raw(0), &sink);
        assert_eq!(tokens[0].span.start, 0);
        assert_eq!(tokens[0].span.end, 6);
        assert_eq!(tokens[1].span.start, 7);
        assert_eq!(tokens[1].span.end, 8);
    }
}
