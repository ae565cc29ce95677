use crate::ast::*;
use crate::checker;
use crate::diagnostics::{closest_name, Span};
use crate::lexer::TokenKind;
use crate::symbols::{ScopeKind, Symbol, SymbolKind};

use super::{describe, is_name, signature_of, FunctionContext, Parser};

pub(super) struct FunctionHeader {
    pub(super) name: SpannedName,
    pub(super) params: Vec<Param>,
    pub(super) return_type: Option<TypeHint>,
}

impl Parser<'_> {
    pub(super) fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) {
        if self.check(TokenKind::Indent) {
            let span = self.peek_at(1).span;
            self.syntax_error_with(
                "E2005",
                "unexpected indent",
                span,
                "remove the extra indentation",
            );
            self.pos += 1;
            self.parse_block_body(out);
            return;
        }
        if self.check_keyword("class") {
            self.skip_class();
            return;
        }
        let start = self.pos;
        match self.parse_statement() {
            Some(stmt) => out.push(stmt),
            None => self.synchronize(start),
        }
    }

    /// Statements up to the closing `Dedent`, which is consumed.
    pub(super) fn parse_block_body(&mut self, out: &mut Vec<Stmt>) {
        while !self.at_eof() && !self.check(TokenKind::Dedent) {
            if self.match_kind(TokenKind::Newline) || self.match_delim(";") {
                continue;
            }
            self.parse_statement_into(out);
        }
        self.match_kind(TokenKind::Dedent);
    }

    fn parse_block(&mut self) -> Vec<Stmt> {
        let mut body = Vec::new();
        if !self.check(TokenKind::Newline) {
            // Single-line suite: `if ready: go()`.
            if self.at_eof() || self.check(TokenKind::Dedent) {
                let span = self.missing_span();
                self.syntax_error_with(
                    "E2004",
                    "expected an indented block",
                    span,
                    "indent the body of the block",
                );
            } else {
                self.parse_statement_into(&mut body);
            }
            return body;
        }
        self.pos += 1;
        if !self.match_kind(TokenKind::Indent) {
            let token = self.peek().clone();
            let span = match token.kind {
                TokenKind::Eof | TokenKind::Dedent => self.missing_span(),
                _ => token.span,
            };
            self.syntax_error_with(
                "E2004",
                format!("expected an indented block, found {}", describe(&token)),
                span,
                "indent the body of the block",
            );
            return body;
        }
        self.parse_block_body(&mut body);
        body
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Decorator => self.parse_decorated(),
            TokenKind::Keyword => match token.text.as_str() {
                "def" => self.parse_function(Vec::new()),
                "if" => self.parse_if(),
                "while" => self.parse_while(),
                "for" => self.parse_for(),
                "return" => self.parse_return(),
                "pass" | "break" | "continue" => self.parse_jump(),
                "elif" | "else" => {
                    self.syntax_error(
                        "E2003",
                        format!("'{}' without a matching 'if'", token.text),
                        token.span,
                    );
                    None
                }
                _ => self.parse_simple_statement(),
            },
            _ => self.parse_simple_statement(),
        }
    }

    fn skip_class(&mut self) {
        let token = self.advance();
        self.syntax_error_with(
            "E2010",
            "class definitions are not supported",
            token.span,
            "use functions and plain variables instead",
        );
        self.skip_line();
        if !self.check(TokenKind::Indent) {
            return;
        }
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn parse_decorated(&mut self) -> Option<Stmt> {
        let mut decorators = Vec::new();
        while self.check(TokenKind::Decorator) {
            let token = self.advance();
            decorators.push(SpannedName {
                name: token.text.trim_start_matches('@').to_string(),
                span: token.span,
            });
            if !self.match_kind(TokenKind::Newline) {
                let span = self.peek().span;
                self.syntax_error_with(
                    "E2012",
                    "decorator arguments are not supported",
                    span,
                    "put the decorator name alone on its line",
                );
                self.skip_line();
            }
        }
        if self.check_keyword("def") {
            return self.parse_function(decorators);
        }
        if let Some(last) = decorators.last() {
            self.syntax_error_with(
                "E2012",
                format!("decorator '@{}' must be followed by a function definition", last.name),
                last.span,
                "move the decorator directly above a 'def'",
            );
        }
        if self.at_eof() || self.check(TokenKind::Dedent) {
            return None;
        }
        self.parse_statement()
    }

    pub(super) fn parse_function_header(&mut self) -> Option<FunctionHeader> {
        let token = self.peek().clone();
        if !is_name(&token) {
            let span = self.missing_span();
            self.syntax_error(
                "E2003",
                format!("expected a function name after 'def', found {}", describe(&token)),
                span,
            );
            return None;
        }
        self.pos += 1;
        let name = SpannedName {
            name: token.text,
            span: token.span,
        };
        self.expect_delim("(", "expected '(' after the function name")?;
        let mut params = Vec::new();
        while !self.check_delim(")") {
            let token = self.peek().clone();
            if !is_name(&token) {
                let span = self.missing_span();
                self.syntax_error(
                    "E2003",
                    format!("expected a parameter name, found {}", describe(&token)),
                    span,
                );
                return None;
            }
            self.pos += 1;
            let annotation = if self.match_delim(":") {
                Some(self.parse_type_hint()?)
            } else {
                None
            };
            if self.check_op("=") {
                let span = self.peek().span;
                self.syntax_error_with(
                    "E2015",
                    format!("default value for parameter '{}' is not supported", token.text),
                    span,
                    "remove the default and pass the value at every call",
                );
                return None;
            }
            params.push(Param {
                name: SpannedName {
                    name: token.text,
                    span: token.span,
                },
                annotation,
                span: token.span.merge(self.previous_span()),
            });
            if !self.match_delim(",") {
                break;
            }
            if self.check_delim(")") {
                self.trailing_comma();
            }
        }
        self.expect_delim(")", "expected ')' to close the parameter list")?;
        let return_type = if self.match_op("->") {
            Some(self.parse_type_hint()?)
        } else {
            None
        };
        Some(FunctionHeader {
            name,
            params,
            return_type,
        })
    }

    pub(super) fn trailing_comma(&mut self) {
        let span = self.previous_span();
        self.syntax_error_with(
            "E2006",
            "trailing comma in argument list",
            span,
            "remove the comma or add another argument",
        );
    }

    pub(super) fn parse_type_hint(&mut self) -> Option<TypeHint> {
        let token = self.peek().clone();
        let accepted = is_name(&token) || token.is(TokenKind::Keyword, "None");
        if !accepted {
            let span = self.missing_span();
            self.syntax_error(
                "E2003",
                format!("expected a type, found {}", describe(&token)),
                span,
            );
            return None;
        }
        self.pos += 1;
        let mut args = Vec::new();
        if self.match_delim("[") {
            loop {
                args.push(self.parse_type_hint()?);
                if !self.match_delim(",") {
                    break;
                }
            }
            self.expect_delim("]", "expected ']' to close the type arguments")?;
        }
        Some(TypeHint {
            name: token.text,
            args,
            span: token.span.merge(self.previous_span()),
        })
    }

    fn parse_function(&mut self, decorators: Vec<SpannedName>) -> Option<Stmt> {
        let def_index = self.pos;
        let keyword = self.advance();
        let header = self.parse_function_header()?;
        if !self.prescanned.contains(&def_index) {
            let symbol = Symbol::function(
                &header.name.name,
                signature_of(&header),
                Some(header.name.span),
            );
            self.define(symbol);
        }
        self.expect_colon("the function signature")?;

        self.symbols.enter_scope(ScopeKind::Function);
        self.functions.push(FunctionContext {
            name: header.name.name.clone(),
            return_type: header.return_type.as_ref().map(TypeHint::display),
        });
        let saved_loops = std::mem::take(&mut self.loop_depth);
        for param in &header.params {
            let ty = param
                .annotation
                .as_ref()
                .map_or_else(|| checker::ANY.to_string(), TypeHint::display);
            self.define(Symbol::parameter(&param.name.name, &ty, param.name.span));
        }
        let body = self.parse_block();
        self.loop_depth = saved_loops;
        self.functions.pop();
        self.symbols.exit_scope();

        let start = decorators.first().map_or(keyword.span, |d| d.span);
        Some(Stmt::FunctionDecl {
            decorators,
            name: header.name,
            params: header.params,
            return_type: header.return_type,
            body,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let keyword = self.advance();
        let condition = self.parse_value()?;
        self.expect_colon(&format!("the '{}' condition", keyword.text))?;
        let then_branch = self.parse_block();
        let else_branch = if self.check_keyword("elif") {
            Some(vec![self.parse_if()?])
        } else if self.match_keyword("else") {
            self.expect_colon("'else'")?;
            Some(self.parse_block())
        } else {
            None
        };
        Some(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: keyword.span.merge(self.previous_span()),
        })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let keyword = self.advance();
        let condition = self.parse_value()?;
        self.expect_colon("the 'while' condition")?;
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        Some(Stmt::While {
            condition,
            body,
            span: keyword.span.merge(self.previous_span()),
        })
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        let keyword = self.advance();
        let token = self.peek().clone();
        if !is_name(&token) {
            let span = self.missing_span();
            self.syntax_error(
                "E2003",
                format!("expected a loop variable after 'for', found {}", describe(&token)),
                span,
            );
            return None;
        }
        self.pos += 1;
        if !self.match_keyword("in") {
            let found = describe(self.peek());
            let span = self.missing_span();
            self.syntax_error(
                "E2001",
                format!("expected 'in' after the loop variable, found {found}"),
                span,
            );
            return None;
        }
        let iterable = self.parse_value()?;
        self.expect_colon("the 'for' clause")?;

        let target = SpannedName {
            name: token.text,
            span: token.span,
        };
        match self.symbols.resolve_local(&target.name).map(|s| s.kind) {
            None => {
                let element = checker::element_type(&iterable, &self.symbols);
                self.define(Symbol::variable(&target.name, &element, target.span));
            }
            Some(SymbolKind::Function) => self.semantic_error(
                "E3002",
                format!("'{}' is already defined as a function", target.name),
                target.span,
                Some("choose a different name for the loop variable".to_string()),
            ),
            Some(_) => {}
        }

        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        Some(Stmt::For {
            target,
            iterable,
            body,
            span: keyword.span.merge(self.previous_span()),
        })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let keyword = self.advance();
        if self.functions.is_empty() {
            self.semantic_error(
                "E3003",
                "'return' outside function",
                keyword.span,
                Some("move this statement into a function body".to_string()),
            );
        }
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_value()?)
        };
        let declared = self
            .functions
            .last()
            .and_then(|context| Some((context.name.clone(), context.return_type.clone()?)));
        if let (Some(value), Some((function, declared))) = (&value, declared) {
            let actual = self.infer(value);
            if !checker::compatible(&declared, &actual) {
                self.type_error(
                    "E4003",
                    format!(
                        "function '{function}' returns '{actual}' but is declared to return '{declared}'"
                    ),
                    value.span(),
                );
            }
        }
        self.end_statement();
        let end = value.as_ref().map_or(keyword.span, Expr::span);
        Some(Stmt::Return {
            value,
            span: keyword.span.merge(end),
        })
    }

    fn parse_jump(&mut self) -> Option<Stmt> {
        let keyword = self.advance();
        let span = keyword.span;
        let stmt = match keyword.text.as_str() {
            "pass" => Stmt::Pass { span },
            "break" => Stmt::Break { span },
            _ => Stmt::Continue { span },
        };
        if !matches!(stmt, Stmt::Pass { .. }) && self.loop_depth == 0 {
            self.semantic_error(
                "E3006",
                format!("'{}' outside loop", keyword.text),
                span,
                None,
            );
        }
        self.end_statement();
        Some(stmt)
    }

    fn parse_simple_statement(&mut self) -> Option<Stmt> {
        if is_name(self.peek()) && self.peek_at(1).is(TokenKind::Delimiter, ":") {
            return self.parse_annotated_declaration();
        }
        let expr = self.parse_expression()?;
        let stmt = self.bind_statement(expr);
        self.end_statement();
        Some(stmt)
    }

    fn parse_annotated_declaration(&mut self) -> Option<Stmt> {
        let token = self.advance();
        self.pos += 1;
        let annotation = self.parse_type_hint()?;
        if !self.match_op("=") {
            let found = describe(self.peek());
            let span = self.missing_span();
            self.syntax_error_with(
                "E2001",
                format!("expected '=' after the type annotation, found {found}"),
                span,
                "give the variable an initial value",
            );
            return None;
        }
        let value = self.parse_value()?;
        let declared_type = annotation.display();
        let actual = self.infer(&value);
        if !checker::compatible(&declared_type, &actual) {
            self.type_error(
                "E4002",
                format!(
                    "cannot assign a value of type '{actual}' to '{}' declared as '{declared_type}'",
                    token.text
                ),
                value.span(),
            );
        }
        let name = SpannedName {
            name: token.text,
            span: token.span,
        };
        self.define(Symbol::variable(&name.name, &declared_type, name.span));
        self.end_statement();
        let span = name.span.merge(value.span());
        Some(Stmt::VarDecl {
            name,
            annotation: Some(annotation),
            value,
            declared_type,
            span,
        })
    }

    /// The first plain assignment to a name in the current scope declares it.
    fn bind_statement(&mut self, expr: Expr) -> Stmt {
        let span = expr.span();
        let (target, op, value, assign_span) = match expr {
            Expr::Assign {
                target,
                op,
                value,
                span,
            } => (target, op, value, span),
            other => return Stmt::ExpressionStmt { expr: other, span },
        };
        if op == "=" {
            if let Expr::Identifier(name) = target.as_ref() {
                let existing = self
                    .symbols
                    .resolve_local(&name.name)
                    .map(|symbol| (symbol.kind, symbol.declared_type.clone()));
                match existing {
                    None => {
                        let declared_type = self.infer(&value);
                        self.define(Symbol::variable(&name.name, &declared_type, name.span));
                        return Stmt::VarDecl {
                            name: name.clone(),
                            annotation: None,
                            value: *value,
                            declared_type,
                            span,
                        };
                    }
                    Some((SymbolKind::Function, _)) => self.semantic_error(
                        "E3002",
                        format!("'{}' is already defined as a function", name.name),
                        name.span,
                        Some("choose a different name for the variable".to_string()),
                    ),
                    Some((_, old)) => {
                        let new = self.infer(&value);
                        if !checker::compatible(&old, &new) {
                            self.symbols.refine_type(&name.name, checker::ANY);
                        }
                    }
                }
            }
        }
        Stmt::ExpressionStmt {
            expr: Expr::Assign {
                target,
                op,
                value,
                span: assign_span,
            },
            span,
        }
    }

    pub(super) fn end_statement(&mut self) {
        if self.match_kind(TokenKind::Newline) || self.match_delim(";") {
            return;
        }
        if self.at_eof() || self.check(TokenKind::Dedent) {
            return;
        }
        let token = self.peek().clone();
        self.syntax_error(
            "E2013",
            format!("unexpected {} after the end of the statement", describe(&token)),
            token.span,
        );
        self.skip_line();
    }

    pub(super) fn report_undefined(&mut self, name: &str, span: Span, is_call: bool) {
        let suggestion = closest_name(name, self.symbols.visible_names())
            .map(|candidate| format!("did you mean '{candidate}'?"));
        let message = if is_call {
            format!("function '{name}' is not defined")
        } else {
            format!("name '{name}' is not defined")
        };
        self.semantic_error("E3001", message, span, suggestion);
    }
}
