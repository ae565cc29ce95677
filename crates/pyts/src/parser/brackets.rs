use std::collections::HashSet;

use crate::diagnostics::{DiagnosticKind, ErrorReporter};
use crate::lexer::{Token, TokenKind};

fn closer_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Per-line bracket balance. Returns the lines that received a diagnostic, so the
/// parser can stay quiet about the same problem.
pub(super) fn check_brackets(tokens: &[Token], reporter: &mut ErrorReporter) -> HashSet<usize> {
    let mut flagged = HashSet::new();
    let mut open: Vec<&Token> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::Delimiter => match token.text.as_str() {
                "(" | "[" | "{" => open.push(token),
                ")" | "]" | "}" => match open.pop() {
                    None => {
                        reporter.error_with(
                            DiagnosticKind::Syntactic,
                            "E2007",
                            format!("unmatched closing '{}'", token.text),
                            token.span,
                            "remove it or add the matching opening bracket",
                        );
                        flagged.insert(token.line());
                    }
                    Some(opener) if closer_for(&opener.text) != token.text => {
                        reporter.error_with(
                            DiagnosticKind::Syntactic,
                            "E2008",
                            format!(
                                "mismatched brackets: '{}' closed by '{}'",
                                opener.text, token.text
                            ),
                            token.span,
                            format!("close '{}' with '{}'", opener.text, closer_for(&opener.text)),
                        );
                        flagged.insert(token.line());
                    }
                    Some(_) => {}
                },
                _ => {}
            },
            TokenKind::Newline | TokenKind::Eof => {
                for opener in open.drain(..) {
                    reporter.error_with(
                        DiagnosticKind::Syntactic,
                        "E2009",
                        format!("unclosed '{}'", opener.text),
                        opener.span,
                        format!(
                            "add '{}' before the end of the line",
                            closer_for(&opener.text)
                        ),
                    );
                    flagged.insert(opener.line());
                }
            }
            _ => {}
        }
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn codes(source: &str) -> (Vec<String>, HashSet<usize>) {
        let (tokens, _) = tokenize(source);
        let mut reporter = ErrorReporter::new(source);
        let lines = check_brackets(&tokens, &mut reporter);
        let codes = reporter
            .diagnostics()
            .iter()
            .map(|d| d.code.clone())
            .collect();
        (codes, lines)
    }

    #[test]
    fn balanced_lines_are_clean() {
        let (found, lines) = codes("print((1 + 2) * [3][0])\n");
        assert!(found.is_empty());
        assert!(lines.is_empty());
    }

    #[test]
    fn reports_each_kind_of_imbalance() {
        assert_eq!(codes("x = 1)\n").0, vec!["E2007"]);
        assert_eq!(codes("x = (1]\n").0, vec!["E2008"]);
        let (found, lines) = codes("x = 1\ny = (2\nz = 3\n");
        assert_eq!(found, vec!["E2009"]);
        assert!(lines.contains(&2));
    }

    #[test]
    fn fstring_braces_are_not_brackets() {
        assert!(codes("s = f\"{a}\"\n").0.is_empty());
    }
}
