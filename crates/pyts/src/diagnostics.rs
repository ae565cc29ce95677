use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::config::CompileOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn single(line: usize, column: usize, len: usize) -> Self {
        Self {
            start: Position { line, column },
            end: Position {
                line,
                column: if len == 0 { column } else { column + len - 1 },
            },
        }
    }

    pub fn merge(self, end: Span) -> Self {
        Self {
            start: self.start,
            end: end.end,
        }
    }

    pub fn line(&self) -> usize {
        self.start.line
    }

    pub fn column(&self) -> usize {
        self.start.column
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Lexical,
    Syntactic,
    Semantic,
    Type,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 4] = [
        DiagnosticKind::Lexical,
        DiagnosticKind::Syntactic,
        DiagnosticKind::Semantic,
        DiagnosticKind::Type,
    ];

    pub fn heading(self) -> &'static str {
        match self {
            DiagnosticKind::Lexical => "Lexical errors",
            DiagnosticKind::Syntactic => "Syntax errors",
            DiagnosticKind::Semantic => "Semantic errors",
            DiagnosticKind::Type => "Type errors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub span: Span,
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, code: &str, message: impl Into<String>, span: Span) -> Self {
        Self {
            code: code.to_string(),
            kind,
            severity: DiagnosticSeverity::Error,
            message: message.into(),
            span,
            source_line: String::new(),
            suggestion: None,
        }
    }

    pub fn warning(
        kind: DiagnosticKind,
        code: &str,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            ..Self::error(kind, code, message, span)
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

// Two diagnostics are the same report when kind, position and message agree; the code,
// severity and suggestion are derived from those.
impl PartialEq for Diagnostic {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.line() == other.line()
            && self.column() == other.column()
            && self.message == other.message
    }
}

impl Eq for Diagnostic {}

impl Hash for Diagnostic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.line().hash(state);
        self.column().hash(state);
        self.message.hash(state);
    }
}

/// Per-compilation diagnostic sink shared (by `&mut`) between the lexer, parser and
/// code generator.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    lines: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    seen: HashSet<Diagnostic>,
}

impl ErrorReporter {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            diagnostics: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Records `diagnostic` unless a structurally equal one is already present.
    pub fn add(&mut self, mut diagnostic: Diagnostic) -> bool {
        if self.seen.contains(&diagnostic) {
            return false;
        }
        if diagnostic.source_line.is_empty() {
            diagnostic.source_line = self.source_line(diagnostic.line()).to_string();
        }
        self.seen.insert(diagnostic.clone());
        self.diagnostics.push(diagnostic);
        true
    }

    pub fn error(
        &mut self,
        kind: DiagnosticKind,
        code: &str,
        message: impl Into<String>,
        span: Span,
    ) -> bool {
        self.add(Diagnostic::error(kind, code, message, span))
    }

    pub fn error_with(
        &mut self,
        kind: DiagnosticKind,
        code: &str,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) -> bool {
        self.add(Diagnostic::error(kind, code, message, span).with_suggestion(suggestion))
    }

    pub fn source_line(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn by_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == kind && d.is_error())
            .count()
    }

    /// Whether the recorded errors prevent code generation under `options`.
    pub fn has_blocking(&self, options: &CompileOptions) -> bool {
        diagnostics_block(&self.diagnostics, options)
    }

    pub fn format_all(&self) -> String {
        format_diagnostics(&self.diagnostics)
    }
}

pub fn diagnostics_block(diagnostics: &[Diagnostic], options: &CompileOptions) -> bool {
    diagnostics.iter().filter(|d| d.is_error()).any(|d| match d.kind {
        DiagnosticKind::Lexical | DiagnosticKind::Syntactic => true,
        DiagnosticKind::Semantic | DiagnosticKind::Type => options.block_on_semantic,
    })
}

const FUNCTION_TIP: &str = "tip: check that all functions are defined before they are used";

/// Renders diagnostics grouped by kind, each with its source excerpt and caret.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut sorted: Vec<&Diagnostic> = diagnostics.iter().collect();
    sorted.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.line().cmp(&b.line()))
            .then(a.column().cmp(&b.column()))
            .then(a.message.cmp(&b.message))
    });

    let mut sections = Vec::new();
    for kind in DiagnosticKind::ALL {
        let group: Vec<&&Diagnostic> = sorted.iter().filter(|d| d.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        let mut section = format!("{} ({}):\n", kind.heading(), group.len());
        for diagnostic in group {
            section.push_str(&render_diagnostic(diagnostic));
        }
        sections.push(section.trim_end().to_string());
    }

    let mentions_function = diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Semantic && d.message.contains("function"));
    if mentions_function {
        sections.push(FUNCTION_TIP.to_string());
    }

    sections.join("\n\n")
}

pub fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let label = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    let mut output = format!(
        "  {label}[{}] {}:{} {}\n",
        diagnostic.code,
        diagnostic.line(),
        diagnostic.column(),
        diagnostic.message
    );
    output.push_str("    ");
    output.push_str(&diagnostic.source_line);
    output.push('\n');
    output.push_str("    ");
    output.push_str(&caret_padding(&diagnostic.source_line, diagnostic.column()));
    output.push_str("^\n");
    if let Some(suggestion) = &diagnostic.suggestion {
        output.push_str(&format!("    help: {suggestion}\n"));
    }
    output
}

// Tabs are kept so the caret lines up with the excerpt in any terminal.
fn caret_padding(line: &str, column: usize) -> String {
    let mut chars = line.chars();
    (1..column)
        .map(|_| match chars.next() {
            Some('\t') => '\t',
            _ => ' ',
        })
        .collect()
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Closest candidate within edit distance 2 (and less than half of `name`), if any.
pub fn closest_name<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let limit = 2.min(name.chars().count().saturating_sub(1) / 2 + 1);
    candidates
        .into_iter()
        .filter(|candidate| *candidate != name)
        .map(|candidate| (levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= limit)
        .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(b.1)))
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: usize, column: usize) -> Span {
        Span::single(line, column, 1)
    }

    #[test]
    fn add_deduplicates_structurally_equal_diagnostics() {
        let mut reporter = ErrorReporter::new("x = 1\n");
        assert!(reporter.error(DiagnosticKind::Semantic, "E3001", "boom", span(1, 1)));
        assert!(!reporter.error(DiagnosticKind::Semantic, "E3009", "boom", span(1, 1)));
        assert!(reporter.error(DiagnosticKind::Semantic, "E3001", "boom", span(1, 2)));
        assert_eq!(reporter.diagnostics().len(), 2);
    }

    #[test]
    fn add_fills_source_line() {
        let mut reporter = ErrorReporter::new("a = 1\nb = $\n");
        reporter.error(DiagnosticKind::Lexical, "E1000", "bad", span(2, 5));
        assert_eq!(reporter.diagnostics()[0].source_line, "b = $");
    }

    #[test]
    fn format_all_groups_by_kind_and_places_caret() {
        let mut reporter = ErrorReporter::new("x = y\nz = \"a\n");
        reporter.error(DiagnosticKind::Semantic, "E3001", "name 'y' is not defined", span(1, 5));
        reporter.error_with(
            DiagnosticKind::Lexical,
            "E1001",
            "unterminated string literal",
            span(2, 5),
            "close the string",
        );
        let text = reporter.format_all();
        let lexical = text.find("Lexical errors (1):").expect("lexical header");
        let semantic = text.find("Semantic errors (1):").expect("semantic header");
        assert!(lexical < semantic);
        assert!(text.contains("    z = \"a\n        ^\n    help: close the string"));
        assert!(!text.contains(FUNCTION_TIP));
    }

    #[test]
    fn format_all_is_idempotent_and_adds_tip_once() {
        let mut reporter = ErrorReporter::new("f()\ng()\n");
        reporter.error(DiagnosticKind::Semantic, "E3001", "function 'f' is not defined", span(1, 1));
        reporter.error(DiagnosticKind::Semantic, "E3001", "function 'g' is not defined", span(2, 1));
        let first = reporter.format_all();
        let second = reporter.format_all();
        assert_eq!(first, second);
        assert_eq!(first.matches(FUNCTION_TIP).count(), 1);
    }

    #[test]
    fn caret_keeps_tabs() {
        assert_eq!(caret_padding("\tx = 1", 3), "\t ");
    }

    #[test]
    fn closest_name_respects_distance() {
        let names = ["print", "len", "range"];
        assert_eq!(closest_name("pritn", names.iter().copied()), Some("print"));
        assert_eq!(closest_name("rnage", names.iter().copied()), Some("range"));
        assert_eq!(closest_name("banana", names.iter().copied()), None);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }
}
