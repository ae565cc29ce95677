use std::collections::HashSet;

use crate::ast::*;
use crate::checker;
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter, Span};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::symbols::{ParamSig, Signature, Symbol, SymbolTable};
use crate::syntax;

mod brackets;
mod expressions;
mod literals;
mod statements;
#[cfg(test)]
mod tests;

use statements::FunctionHeader;

/// Parses `source` with a private reporter; lexical diagnostics are included.
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    let mut reporter = ErrorReporter::new(source);
    let tokens = Lexer::new(source, &mut reporter).tokenize();
    let program = parse_tokens(tokens, &mut reporter);
    (program, reporter.into_diagnostics())
}

pub fn parse_tokens(tokens: Vec<Token>, reporter: &mut ErrorReporter) -> Program {
    Parser::new(tokens, reporter).parse_program()
}

struct FunctionContext {
    name: String,
    return_type: Option<String>,
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    reporter: &'a mut ErrorReporter,
    symbols: SymbolTable,
    functions: Vec<FunctionContext>,
    loop_depth: usize,
    bracket_lines: HashSet<usize>,
    prescanned: HashSet<usize>,
    quiet: usize,
}

fn is_name(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Identifier | TokenKind::TypeHint)
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Newline => "end of line".to_string(),
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Indent => "indentation".to_string(),
        TokenKind::Dedent => "end of block".to_string(),
        _ => format!("'{}'", token.text),
    }
}

fn signature_of(header: &FunctionHeader) -> Signature {
    Signature {
        params: header
            .params
            .iter()
            .map(|param| ParamSig {
                name: param.name.name.clone(),
                ty: param
                    .annotation
                    .as_ref()
                    .map_or_else(|| checker::ANY.to_string(), TypeHint::display),
                optional: false,
            })
            .collect(),
        variadic: false,
        return_type: header
            .return_type
            .as_ref()
            .map_or_else(|| checker::ANY.to_string(), TypeHint::display),
    }
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, reporter: &'a mut ErrorReporter) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|token| !matches!(token.kind, TokenKind::Comment | TokenKind::Error))
            .collect();
        if tokens.last().map(|token| token.kind) != Some(TokenKind::Eof) {
            let (span, offset) = tokens
                .last()
                .map_or((Span::single(1, 1, 0), 0), |token| (token.span, token.offset));
            tokens.push(Token {
                kind: TokenKind::Eof,
                text: String::new(),
                span,
                offset,
            });
        }
        let bracket_lines = brackets::check_brackets(&tokens, reporter);
        Self {
            tokens,
            pos: 0,
            reporter,
            symbols: SymbolTable::new(),
            functions: Vec::new(),
            loop_depth: 0,
            bracket_lines,
            prescanned: HashSet::new(),
            quiet: 0,
        }
    }

    fn parse_program(&mut self) -> Program {
        self.register_functions();
        let start = self.peek().span;
        let mut statements = Vec::new();
        while !self.at_eof() {
            if self.check(TokenKind::Newline)
                || self.check(TokenKind::Dedent)
                || self.check_delim(";")
            {
                self.pos += 1;
                continue;
            }
            self.parse_statement_into(&mut statements);
        }
        Program {
            statements,
            span: start.merge(self.peek().span),
        }
    }

    /// Registers every `def` signature globally before the main pass, so forward,
    /// recursive and mutually recursive calls resolve.
    fn register_functions(&mut self) {
        let defs: Vec<usize> = self
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is(TokenKind::Keyword, "def"))
            .map(|(index, _)| index)
            .collect();
        for index in defs {
            self.pos = index + 1;
            if let Some(header) = self.parse_function_header() {
                let symbol = Symbol::function(
                    &header.name.name,
                    signature_of(&header),
                    Some(header.name.span),
                );
                self.symbols.define(symbol, self.reporter);
                self.prescanned.insert(index);
            }
        }
        self.pos = 0;
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_delim(&self, delim: &str) -> bool {
        self.peek().is(TokenKind::Delimiter, delim)
    }

    fn check_op(&self, op: &str) -> bool {
        self.peek().is(TokenKind::Operator, op)
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        self.peek().is(TokenKind::Keyword, keyword)
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn match_delim(&mut self, delim: &str) -> bool {
        if self.check_delim(delim) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn match_op(&mut self, op: &str) -> bool {
        if self.check_op(op) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.check_keyword(keyword) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
        ) || self.check_delim(";")
    }

    fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|index| self.tokens.get(index)) {
            Some(token) => token.span,
            None => Span::single(1, 1, 0),
        }
    }

    /// Where a missing token belongs: right after the previous one on its line.
    fn missing_span(&self) -> Span {
        let token = self.peek();
        if matches!(
            token.kind,
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent | TokenKind::Indent
        ) && self.pos > 0
        {
            let end = self.previous_span().end;
            return Span::single(end.line, end.column + 1, 1);
        }
        token.span
    }

    fn expect_delim(&mut self, delim: &str, message: &str) -> Option<Span> {
        if self.match_delim(delim) {
            return Some(self.previous_span());
        }
        let found = describe(self.peek());
        let span = self.missing_span();
        self.syntax_error("E2001", format!("{message}, found {found}"), span);
        None
    }

    fn expect_colon(&mut self, after: &str) -> Option<Span> {
        if self.match_delim(":") {
            return Some(self.previous_span());
        }
        let found = describe(self.peek());
        let span = self.missing_span();
        self.syntax_error_with(
            "E2002",
            format!("expected ':' after {after}, found {found}"),
            span,
            "add ':' at the end of the line",
        );
        None
    }

    fn syntax_error(&mut self, code: &str, message: impl Into<String>, span: Span) {
        if self.bracket_lines.contains(&span.line()) {
            return;
        }
        self.reporter
            .error(DiagnosticKind::Syntactic, code, message, span);
    }

    fn syntax_error_with(
        &mut self,
        code: &str,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        if self.bracket_lines.contains(&span.line()) {
            return;
        }
        self.reporter
            .error_with(DiagnosticKind::Syntactic, code, message, span, suggestion);
    }

    fn semantic_error(
        &mut self,
        code: &str,
        message: impl Into<String>,
        span: Span,
        suggestion: Option<String>,
    ) {
        if self.quiet > 0 {
            return;
        }
        let mut diagnostic = Diagnostic::error(DiagnosticKind::Semantic, code, message, span);
        diagnostic.suggestion = suggestion;
        self.reporter.add(diagnostic);
    }

    fn type_error(&mut self, code: &str, message: impl Into<String>, span: Span) {
        if self.quiet > 0 {
            return;
        }
        self.reporter.error(DiagnosticKind::Type, code, message, span);
    }

    fn define(&mut self, symbol: Symbol) -> bool {
        if self.quiet > 0 {
            let mut scratch = ErrorReporter::default();
            return self.symbols.define(symbol, &mut scratch);
        }
        self.symbols.define(symbol, self.reporter)
    }

    fn infer(&self, expr: &Expr) -> String {
        checker::infer_type(expr, &self.symbols)
    }

    /// Skips the rest of a failed statement: up to a consumed newline, a block
    /// boundary or a statement keyword. An indented block left behind by a failed
    /// header is parsed without semantic reporting and dropped.
    fn synchronize(&mut self, start: usize) {
        if self.pos == start && !self.at_eof() && !self.check(TokenKind::Dedent) {
            self.pos += 1;
        }
        loop {
            let kind = self.peek().kind;
            let statement_start = kind == TokenKind::Keyword
                && syntax::STATEMENT_KEYWORDS.contains(&self.peek().text.as_str());
            match kind {
                TokenKind::Eof | TokenKind::Dedent => return,
                TokenKind::Newline => {
                    self.pos += 1;
                    break;
                }
                _ if statement_start => return,
                _ => self.pos += 1,
            }
        }
        if self.check(TokenKind::Indent) {
            self.pos += 1;
            self.quiet += 1;
            let mut discarded = Vec::new();
            self.parse_block_body(&mut discarded);
            self.quiet -= 1;
        }
    }

    fn skip_line(&mut self) {
        while !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
            self.pos += 1;
        }
        self.match_kind(TokenKind::Newline);
    }
}
