//! `pyts` translates a small, optionally typed Python subset into TypeScript.
//!
//! The pipeline is tokenizer, parser (with symbol table and type checks), and
//! code generator. Every stage records into one [`ErrorReporter`] per compilation
//! and keeps going, so a single run reports as many problems as it can find.

use serde::Serialize;

pub mod ast;
pub mod checker;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod symbols;
mod syntax;
mod trace;

pub use ast::{Expr, Program, Stmt};
pub use codegen::generate;
pub use config::{discover_config, parse_config, read_config, CompileOptions, CONFIG_FILE_NAME};
pub use diagnostics::{
    format_diagnostics, render_diagnostic, Diagnostic, DiagnosticKind, DiagnosticSeverity,
    ErrorReporter, Position, Span,
};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse;
pub use trace::{set_trace_override, trace_enabled};

use trace::trace;

#[derive(Debug, thiserror::Error)]
pub enum PytsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("code generation failed: {0}")]
    Codegen(String),
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    /// Diagnostics were already rendered; only the exit status is left to report.
    #[error("compilation failed")]
    Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    pub success: bool,
    pub ast: Option<Program>,
    pub generated_code: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn render_diagnostics(&self) -> String {
        format_diagnostics(&self.diagnostics)
    }
}

pub fn compile(source: &str) -> Result<CompileResult, PytsError> {
    compile_with(source, &CompileOptions::default())
}

pub fn compile_with(source: &str, options: &CompileOptions) -> Result<CompileResult, PytsError> {
    let mut reporter = ErrorReporter::new(source);

    let tokens = lexer::Lexer::new(source, &mut reporter).tokenize();
    trace("lexer", || {
        format!(
            "{} tokens, {} lexical errors",
            tokens.len(),
            reporter.error_count(DiagnosticKind::Lexical)
        )
    });

    let program = parser::parse_tokens(tokens, &mut reporter);
    trace("parser", || {
        format!(
            "{} top-level statements, {} syntax / {} semantic / {} type errors",
            program.statements.len(),
            reporter.error_count(DiagnosticKind::Syntactic),
            reporter.error_count(DiagnosticKind::Semantic),
            reporter.error_count(DiagnosticKind::Type)
        )
    });

    let generated_code = if reporter.has_blocking(options) {
        trace("codegen", || "skipped: blocking diagnostics".to_string());
        None
    } else {
        let code = codegen::generate(&program, options)?;
        trace("codegen", || format!("{} bytes of TypeScript", code.len()));
        Some(code)
    };

    Ok(CompileResult {
        success: generated_code.is_some(),
        ast: Some(program),
        generated_code,
        diagnostics: reporter.into_diagnostics(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_source_generates_code() {
        let result = compile("x = 1\nprint(x)\n").expect("compile");
        assert!(result.success);
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            result.generated_code.as_deref(),
            Some("let x: number = 1;\nconsole.log(x);\n")
        );
    }

    #[test]
    fn semantic_errors_block_by_default_only() {
        let source = "print(nombre)\n";
        let blocked = compile(source).expect("compile");
        assert!(!blocked.success);
        assert!(blocked.generated_code.is_none());
        assert!(blocked.ast.is_some());

        let options = CompileOptions {
            block_on_semantic: false,
            ..CompileOptions::default()
        };
        let lenient = compile_with(source, &options).expect("compile");
        assert!(lenient.success);
        assert_eq!(lenient.diagnostics_of(DiagnosticKind::Semantic).len(), 1);
    }

    #[test]
    fn warnings_do_not_block() {
        let result = compile("msg = f\"{1:.2f}\"\n").expect("compile");
        assert!(result.success);
        assert_eq!(result.diagnostics[0].code, "W2001");
    }

    #[test]
    fn serializes_for_tooling() {
        let result = compile("x = (1\n").expect("compile");
        let json = serde_json::to_value(&result).expect("json");
        assert_eq!(json["success"], false);
        assert_eq!(json["diagnostics"][0]["code"], "E2009");
    }

    #[test]
    fn trace_override_is_thread_local() {
        set_trace_override(Some(true));
        assert!(trace_enabled());
        let result = compile("x = 1\n").expect("compile");
        assert!(result.success);
        set_trace_override(Some(false));
        assert!(!trace_enabled());
        set_trace_override(None);
    }
}
