use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorReporter, Span};
use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    TypeHint,
    Number,
    String,
    FString,
    Operator,
    Delimiter,
    Comment,
    Decorator,
    Newline,
    Indent,
    Dedent,
    Eof,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub offset: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Indentation,
    Identifier,
    Number,
    String,
    FString,
    Comment,
    Decorator,
}

const TAB_WIDTH: usize = 4;

pub struct Lexer<'a> {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    start_index: usize,
    start_col: usize,
    indent_stack: Vec<usize>,
    indent_step: Option<usize>,
    line_has_tokens: bool,
    tokens: Vec<Token>,
    reporter: &'a mut ErrorReporter,
}

/// Tokenizes `source` with a private reporter; convenient for tooling and tests.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut reporter = ErrorReporter::new(source);
    let tokens = Lexer::new(source, &mut reporter).tokenize();
    (tokens, reporter.into_diagnostics())
}

impl<'a> Lexer<'a> {
    pub fn new(source: &str, reporter: &'a mut ErrorReporter) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            start_index: 0,
            start_col: 1,
            indent_stack: vec![0],
            indent_step: None,
            line_has_tokens: false,
            tokens: Vec::new(),
            reporter,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut state = State::Indentation;
        loop {
            state = match state {
                State::Indentation => self.scan_indentation(),
                State::Start => match self.peek() {
                    Some(ch) => self.scan_start(ch),
                    None => break,
                },
                State::Identifier => self.scan_identifier(),
                State::Number => self.scan_number(),
                State::String => self.scan_string(),
                State::FString => self.scan_fstring(),
                State::Comment => self.scan_comment(),
                State::Decorator => self.scan_decorator(),
            };
        }
        self.finish();
        self.tokens
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn bump(&mut self) {
        self.index += 1;
        self.col += 1;
    }

    fn begin(&mut self) {
        self.start_index = self.index;
        self.start_col = self.col;
    }

    fn lexeme(&self) -> String {
        self.chars[self.start_index..self.index].iter().collect()
    }

    fn lexeme_span(&self) -> Span {
        Span::single(self.line, self.start_col, self.index - self.start_index)
    }

    fn push(&mut self, kind: TokenKind, text: String, span: Span, offset: usize) {
        if !matches!(
            kind,
            TokenKind::Comment | TokenKind::Indent | TokenKind::Dedent | TokenKind::Newline
        ) {
            self.line_has_tokens = true;
        }
        self.tokens.push(Token {
            kind,
            text,
            span,
            offset,
        });
    }

    fn push_lexeme(&mut self, kind: TokenKind) {
        let text = self.lexeme();
        let span = self.lexeme_span();
        self.push(kind, text, span, self.start_index);
    }

    fn lexical(&mut self, code: &str, message: impl Into<String>, span: Span) {
        self.reporter
            .add(Diagnostic::error(DiagnosticKind::Lexical, code, message, span));
    }

    fn lexical_with(
        &mut self,
        code: &str,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        self.reporter.error_with(
            DiagnosticKind::Lexical,
            code,
            message,
            span,
            suggestion,
        );
    }

    fn scan_indentation(&mut self) -> State {
        let mut width = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                _ => break,
            }
            self.bump();
        }
        match self.peek() {
            // Blank and comment-only lines never open or close a block.
            None | Some('\n') | Some('\r') | Some('#') => {}
            Some(_) => self.apply_indentation(width),
        }
        State::Start
    }

    fn apply_indentation(&mut self, width: usize) {
        let span = Span::single(self.line, 1, 0);
        let top = self.indent_stack.last().copied().unwrap_or(0);
        let mut reported = false;
        if width > top {
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, String::new(), span, self.index);
            self.indent_step.get_or_insert(width);
        } else if width < top {
            while self.indent_stack.last().is_some_and(|&level| level > width) {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, String::new(), span, self.index);
            }
            let level = self.indent_stack.last().copied().unwrap_or(0);
            if level != width {
                let known = self
                    .indent_stack
                    .iter()
                    .map(|level| level.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                self.lexical_with(
                    "E1004",
                    format!(
                        "inconsistent indentation: {width} spaces does not match any enclosing block"
                    ),
                    Span::single(self.line, 1, width.max(1)),
                    format!("indent this line to one of the open levels ({known})"),
                );
                reported = true;
            }
        }
        if let Some(step) = self.indent_step {
            if !reported && width % step != 0 {
                self.lexical_with(
                    "E1004",
                    format!(
                        "inconsistent indentation: {width} spaces is not a multiple of the indentation step ({step})"
                    ),
                    Span::single(self.line, 1, width.max(1)),
                    format!("use multiples of {step} spaces for every block"),
                );
            }
        }
    }

    fn scan_start(&mut self, ch: char) -> State {
        match ch {
            '\n' => {
                if self.line_has_tokens {
                    let span = Span::single(self.line, self.col, 1);
                    self.push(TokenKind::Newline, "\n".to_string(), span, self.index);
                }
                self.index += 1;
                self.line += 1;
                self.col = 1;
                self.line_has_tokens = false;
                State::Indentation
            }
            ' ' | '\t' | '\r' => {
                self.bump();
                State::Start
            }
            '#' => {
                self.begin();
                State::Comment
            }
            '@' => {
                self.begin();
                State::Decorator
            }
            'f' | 'F' if matches!(self.peek_at(1), Some('"') | Some('\'')) => {
                self.begin();
                State::FString
            }
            '"' | '\'' => {
                self.begin();
                State::String
            }
            ch if ch.is_alphabetic() || ch == '_' => {
                self.begin();
                State::Identifier
            }
            ch if ch.is_ascii_digit() => {
                self.begin();
                State::Number
            }
            ch => {
                self.begin();
                if let Some(len) = self.match_operator(ch) {
                    for _ in 0..len {
                        self.bump();
                    }
                    self.push_lexeme(TokenKind::Operator);
                } else if syntax::DELIMITERS.contains(&ch) {
                    self.bump();
                    self.push_lexeme(TokenKind::Delimiter);
                } else {
                    self.bump();
                    let span = self.lexeme_span();
                    self.lexical("E1000", format!("unrecognized character '{ch}'"), span);
                    self.push_lexeme(TokenKind::Error);
                }
                State::Start
            }
        }
    }

    /// Length of the operator starting at the cursor; two-character operators win.
    fn match_operator(&self, ch: char) -> Option<usize> {
        if let (Some(second), Some(third)) = (self.peek_at(1), self.peek_at(2)) {
            if syntax::SYMBOLS_3
                .iter()
                .any(|(triple, _)| *triple == [ch, second, third])
            {
                return Some(3);
            }
        }
        if let Some(next) = self.peek_at(1) {
            if syntax::SYMBOLS_2
                .iter()
                .any(|(pair, _)| pair[0] == ch && pair[1] == next)
            {
                return Some(2);
            }
        }
        syntax::OPERATORS_1.contains(&ch).then_some(1)
    }

    fn scan_identifier(&mut self) -> State {
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        let text = self.lexeme();
        let kind = if syntax::is_keyword(&text) {
            TokenKind::Keyword
        } else if syntax::is_type_hint(&text) {
            TokenKind::TypeHint
        } else {
            TokenKind::Identifier
        };
        if kind == TokenKind::Identifier {
            if let Some(fix) = syntax::typo_for(&text) {
                let span = self.lexeme_span();
                self.reporter.add(
                    Diagnostic::warning(
                        DiagnosticKind::Lexical,
                        "W1001",
                        format!("possible typo '{text}', did you mean '{fix}'?"),
                        span,
                    )
                    .with_suggestion(format!("replace '{text}' with '{fix}'")),
                );
            }
        }
        self.push_lexeme(kind);
        State::Start
    }

    fn scan_number(&mut self) -> State {
        let mut fractions = 0usize;
        loop {
            match self.peek() {
                Some(ch) if ch.is_ascii_digit() => self.bump(),
                Some('.') if self.peek_at(1).is_some_and(|ch| ch.is_ascii_digit()) => {
                    fractions += 1;
                    self.bump();
                }
                _ => break,
            }
        }
        if fractions > 1 {
            let span = self.lexeme_span();
            let text = self.lexeme();
            self.lexical_with(
                "E1006",
                format!("malformed number literal '{text}'"),
                span,
                "a number can contain at most one decimal point",
            );
        }
        self.push_lexeme(TokenKind::Number);
        State::Start
    }

    fn scan_string(&mut self) -> State {
        let quote = self.peek().unwrap_or('"');
        self.bump();
        let closed = self.scan_quoted_body(quote, |_, _| {});
        if !closed {
            let span = Span::single(self.line, self.start_col, 1);
            self.lexical_with(
                "E1001",
                "unterminated string literal",
                span,
                format!("close the string with a matching {quote}"),
            );
        }
        self.push_lexeme(TokenKind::String);
        State::Start
    }

    /// Consumes up to and including the closing `quote`; stops before a newline.
    /// `on_char` sees every unescaped body character with its column.
    fn scan_quoted_body(&mut self, quote: char, mut on_char: impl FnMut(&mut Self, char)) -> bool {
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => return false,
                '\\' if self.peek_at(1).is_some_and(|next| next != '\n') => {
                    self.bump();
                    self.bump();
                }
                ch if ch == quote => {
                    self.bump();
                    return true;
                }
                ch => {
                    on_char(self, ch);
                    self.bump();
                }
            }
        }
        false
    }

    fn scan_fstring(&mut self) -> State {
        self.bump();
        let quote = self.peek().unwrap_or('"');
        self.bump();

        let mut placeholder: Option<(usize, bool)> = None;
        let mut skip_next = false;
        let closed = self.scan_quoted_body(quote, |lexer, ch| {
            if skip_next {
                skip_next = false;
                return;
            }
            let col = lexer.col;
            match ch {
                '{' => match placeholder {
                    Some(_) => lexer.lexical(
                        "E1005",
                        "nested '{' inside an f-string placeholder",
                        Span::single(lexer.line, col, 1),
                    ),
                    None if lexer.peek_at(1) == Some('{') => skip_next = true,
                    None => placeholder = Some((col, true)),
                },
                '}' => match placeholder.take() {
                    Some((start, true)) => lexer.lexical_with(
                        "E1005",
                        "empty expression in f-string placeholder",
                        Span::single(lexer.line, start, col - start + 1),
                        "put an expression between the braces or write '{{' for a literal brace",
                    ),
                    Some(_) => {}
                    None if lexer.peek_at(1) == Some('}') => skip_next = true,
                    None => lexer.lexical_with(
                        "E1005",
                        "single '}' is not allowed in an f-string",
                        Span::single(lexer.line, col, 1),
                        "write '}}' for a literal brace",
                    ),
                },
                ch if !ch.is_whitespace() => {
                    if let Some((_, empty)) = placeholder.as_mut() {
                        *empty = false;
                    }
                }
                _ => {}
            }
        });

        if closed {
            if let Some((start, _)) = placeholder {
                self.lexical_with(
                    "E1005",
                    "unclosed '{' in f-string",
                    Span::single(self.line, start, 1),
                    "close the placeholder with '}'",
                );
            }
        } else {
            let span = Span::single(self.line, self.start_col, 2);
            self.lexical_with(
                "E1001",
                "unterminated f-string literal",
                span,
                format!("close the f-string with a matching {quote}"),
            );
        }
        self.push_lexeme(TokenKind::FString);
        State::Start
    }

    fn scan_comment(&mut self) -> State {
        while self.peek().is_some_and(|ch| ch != '\n') {
            self.bump();
        }
        self.push_lexeme(TokenKind::Comment);
        State::Start
    }

    fn scan_decorator(&mut self) -> State {
        self.bump();
        while self
            .peek()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
        {
            self.bump();
        }
        if self.index - self.start_index == 1 {
            let span = self.lexeme_span();
            self.lexical("E1007", "expected a decorator name after '@'", span);
            self.push_lexeme(TokenKind::Error);
        } else {
            self.push_lexeme(TokenKind::Decorator);
        }
        State::Start
    }

    fn finish(&mut self) {
        let span = Span::single(self.line, self.col, 0);
        if self.line_has_tokens {
            self.push(TokenKind::Newline, "\n".to_string(), span, self.index);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, String::new(), span, self.index);
        }
        self.push(TokenKind::Eof, String::new(), span, self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    fn diag_codes(diags: &[Diagnostic]) -> Vec<String> {
        let mut codes: Vec<String> = diags.iter().map(|d| d.code.clone()).collect();
        codes.sort();
        codes
    }

    #[test]
    fn classifies_keywords_type_hints_and_identifiers() {
        let (tokens, diags) = tokenize("def f(x: int) -> str:\n    return x\n");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[5].kind, TokenKind::TypeHint);
        assert!(tokens[7].is(TokenKind::Operator, "->"));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Indent));
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn emits_balanced_indent_and_dedent() {
        let src = "def f():\n    if x:\n        y = 1\n    z = 2\nw = 3\n";
        let (tokens, _) = tokenize(src);
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, 2);
        assert_eq!(dedents, 2);
    }

    #[test]
    fn closes_open_blocks_at_end_of_input() {
        let (tokens, _) = tokenize("while x:\n    while y:\n        z = 1");
        let tail: Vec<TokenKind> = kinds(&tokens).into_iter().rev().take(4).collect();
        assert_eq!(
            tail,
            vec![
                TokenKind::Eof,
                TokenKind::Dedent,
                TokenKind::Dedent,
                TokenKind::Newline
            ]
        );
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_touch_indentation() {
        let src = "if x:\n    a = 1\n\n# note\n    b = 2\n";
        let (tokens, diags) = tokenize(src);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count(),
            1
        );
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Comment && t.text == "# note"));
    }

    #[test]
    fn dedent_to_unknown_width_is_reported() {
        let src = "if x:\n        a = 1\n    b = 2\n";
        let (_, diags) = tokenize(src);
        assert_eq!(diag_codes(&diags), vec!["E1004".to_string()]);
        assert_eq!(diags[0].line(), 3);
    }

    #[test]
    fn width_off_the_indentation_step_is_reported() {
        let src = "if x:\n    if y:\n      a = 1\n";
        let (_, diags) = tokenize(src);
        assert_eq!(diag_codes(&diags), vec!["E1004".to_string()]);
        assert_eq!(diags[0].line(), 3);
    }

    #[test]
    fn unterminated_string_reports_once_and_resumes() {
        let (tokens, diags) = tokenize("nombre = \"abc\nedad = 30\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "E1001");
        assert_eq!(diags[0].line(), 1);
        assert_eq!(diags[0].column(), 10);
        assert!(tokens.iter().any(|t| t.is(TokenKind::String, "\"abc")));
        assert!(tokens.iter().any(|t| t.is(TokenKind::Identifier, "edad")));
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let (tokens, diags) = tokenize("s = 'it\\'s'\n");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        assert!(tokens.iter().any(|t| t.is(TokenKind::String, "'it\\'s'")));
    }

    #[test]
    fn fstring_is_a_single_token() {
        let (tokens, diags) = tokenize("msg = f\"hola {nombre}, {{ok}}\"\n");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        let fstrings: Vec<&Token> = tokens.iter().filter(|t| t.kind == TokenKind::FString).collect();
        assert_eq!(fstrings.len(), 1);
        assert_eq!(fstrings[0].text, "f\"hola {nombre}, {{ok}}\"");
    }

    #[test]
    fn fstring_brace_errors_are_lexical() {
        for src in ["f\"{a{b}}\"\n", "f\"a } b\"\n", "f\"{a\"\n", "f\"{}\"\n"] {
            let (_, diags) = tokenize(src);
            assert!(
                diag_codes(&diags).contains(&"E1005".to_string()),
                "expected E1005 for {src:?}, got {:?}",
                diag_codes(&diags)
            );
        }
    }

    #[test]
    fn longest_operator_wins() {
        let (tokens, _) = tokenize("a ** 2 // 3 != b <= c\nn //= 2\n");
        let ops: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["**", "//", "!=", "<=", "//="]);
    }

    #[test]
    fn unrecognized_character_is_skipped() {
        let (tokens, diags) = tokenize("x = 1 $ 2\n");
        assert_eq!(diag_codes(&diags), vec!["E1000".to_string()]);
        assert_eq!(diags[0].column(), 7);
        assert!(tokens.iter().any(|t| t.is(TokenKind::Number, "2")));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn typo_dictionary_warns_but_keeps_identifier() {
        let (tokens, diags) = tokenize("pritn(1)\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "W1001");
        assert!(!diags[0].is_error());
        assert!(diags[0].message.contains("'print'"));
        assert!(tokens[0].is(TokenKind::Identifier, "pritn"));
    }

    #[test]
    fn malformed_number_is_reported() {
        let (tokens, diags) = tokenize("x = 1.2.3\n");
        assert_eq!(diag_codes(&diags), vec!["E1006".to_string()]);
        assert!(tokens.iter().any(|t| t.is(TokenKind::Number, "1.2.3")));
    }

    #[test]
    fn decorator_token_keeps_name() {
        let (tokens, diags) = tokenize("@cache\ndef f():\n    pass\n");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        assert!(tokens[0].is(TokenKind::Decorator, "@cache"));
    }

    #[test]
    fn offsets_and_positions_are_tracked() {
        let (tokens, _) = tokenize("a = 1\nbb = 2\n");
        let bb = tokens
            .iter()
            .find(|t| t.text == "bb")
            .expect("bb token");
        assert_eq!(bb.offset, 6);
        assert_eq!(bb.line(), 2);
        assert_eq!(bb.column(), 1);
    }
}
