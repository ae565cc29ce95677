use crate::ast::{Expr, FStringPart};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter, Position, Span};
use crate::lexer::{Lexer, Token, TokenKind};

use super::{describe, Parser};

fn decode_escape(ch: char, out: &mut String) {
    match ch {
        'n' => out.push('\n'),
        't' => out.push('\t'),
        'r' => out.push('\r'),
        '0' => out.push('\0'),
        '\\' | '\'' | '"' => out.push(ch),
        other => {
            out.push('\\');
            out.push(other);
        }
    }
}

/// Decodes a string token, including a partial one left by an unterminated literal.
pub(super) fn decode_string(text: &str) -> String {
    let mut chars = text.chars();
    let quote = chars.next().unwrap_or('"');
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped) => decode_escape(escaped, &mut out),
                None => out.push('\\'),
            },
            ch if ch == quote => break,
            ch => out.push(ch),
        }
    }
    out
}

fn shift_span(span: Span, line: usize, column: usize) -> Span {
    let shift = |position: Position| Position {
        line,
        column: position.column + column - 1,
    };
    Span {
        start: shift(span.start),
        end: shift(span.end),
    }
}

/// Splits `value:.2f` at the first top-level `:`.
fn split_format_spec(source: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (index, ch) in source.char_indices() {
        match (quote, ch) {
            (Some(open), ch) if ch == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ':') if depth == 0 => return (&source[..index], Some(&source[index + 1..])),
            _ => {}
        }
    }
    (source, None)
}

impl Parser<'_> {
    /// Splits an f-string token into text and parsed placeholder expressions.
    pub(super) fn parse_fstring(&mut self, token: &Token) -> Vec<FStringPart> {
        let chars: Vec<char> = token.text.chars().collect();
        let quote = chars.get(1).copied().unwrap_or('"');
        let line = token.line();
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut index = 2usize;
        while index < chars.len() {
            let ch = chars[index];
            match ch {
                '\\' if index + 1 < chars.len() => {
                    decode_escape(chars[index + 1], &mut text);
                    index += 2;
                }
                ch if ch == quote => break,
                '{' | '}' if chars.get(index + 1) == Some(&ch) => {
                    text.push(ch);
                    index += 2;
                }
                '{' => {
                    let Some(close) = (index + 1..chars.len()).find(|&i| chars[i] == '}') else {
                        break;
                    };
                    if !text.is_empty() {
                        parts.push(FStringPart::Text(std::mem::take(&mut text)));
                    }
                    let source: String = chars[index + 1..close].iter().collect();
                    let column = token.column() + index + 1;
                    if let Some(expr) = self.parse_placeholder(&source, line, column) {
                        parts.push(FStringPart::Expr(expr));
                    }
                    index = close + 1;
                }
                '}' => index += 1,
                ch => {
                    text.push(ch);
                    index += 1;
                }
            }
        }
        if !text.is_empty() {
            parts.push(FStringPart::Text(text));
        }
        parts
    }

    /// Lexes and parses one placeholder in place, with spans mapped back onto the
    /// f-string's line.
    fn parse_placeholder(&mut self, raw: &str, line: usize, column: usize) -> Option<Expr> {
        let leading = raw.chars().take_while(|ch| ch.is_whitespace()).count();
        let (source, spec) = split_format_spec(raw.trim());
        let source = source.trim_end();
        if source.is_empty() {
            return None;
        }
        let base = column + leading;
        if let Some(spec) = spec {
            let span = Span::single(line, base + source.chars().count(), spec.chars().count() + 1);
            self.reporter.add(
                Diagnostic::warning(
                    DiagnosticKind::Syntactic,
                    "W2001",
                    format!("format specification ':{spec}' is ignored"),
                    span,
                )
                .with_suggestion("format the value before interpolating it"),
            );
        }

        let mut scratch = ErrorReporter::new(source);
        let tokens = Lexer::new(source, &mut scratch).tokenize();
        for mut diagnostic in scratch.into_diagnostics() {
            diagnostic.span = shift_span(diagnostic.span, line, base);
            diagnostic.source_line.clear();
            self.reporter.add(diagnostic);
        }
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|token| !matches!(token.kind, TokenKind::Comment | TokenKind::Error))
            .map(|token| Token {
                span: shift_span(token.span, line, base),
                ..token
            })
            .collect();

        let saved_tokens = std::mem::replace(&mut self.tokens, tokens);
        let saved_pos = std::mem::replace(&mut self.pos, 0);
        let expr = self.parse_value();
        if expr.is_some() && !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            let token = self.peek().clone();
            self.syntax_error(
                "E2003",
                format!("unexpected {} in f-string placeholder", describe(&token)),
                token.span,
            );
        }
        self.tokens = saved_tokens;
        self.pos = saved_pos;
        expr
    }
}
