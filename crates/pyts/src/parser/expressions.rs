use crate::ast::*;
use crate::checker;
use crate::diagnostics::Span;
use crate::lexer::{Token, TokenKind};
use crate::symbols::SymbolKind;
use crate::syntax;

use super::{describe, is_name, Parser};

fn is_assign_op(token: &Token) -> bool {
    token.kind == TokenKind::Operator
        && (token.text == "=" || syntax::AUGMENTED_ASSIGN.contains(&token.text.as_str()))
}

impl Parser<'_> {
    pub(super) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    /// Any expression except an assignment.
    pub(super) fn parse_value(&mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn parse_assignment(&mut self) -> Option<Expr> {
        if is_name(self.peek()) && is_assign_op(self.peek_at(1)) {
            let name = self.advance();
            let op = self.advance();
            let value = self.parse_value()?;
            let target = SpannedName {
                name: name.text,
                span: name.span,
            };
            if op.text != "=" {
                self.check_augmented_target(&target, &op, &value);
            }
            let span = target.span.merge(value.span());
            return Some(Expr::Assign {
                target: Box::new(Expr::Identifier(target)),
                op: op.text,
                value: Box::new(value),
                span,
            });
        }

        let expr = self.parse_or()?;
        if !is_assign_op(self.peek()) {
            return Some(expr);
        }
        let op = self.advance();
        let value = self.parse_value()?;
        if !matches!(expr, Expr::Index { .. } | Expr::Attribute { .. }) {
            self.syntax_error_with(
                "E2011",
                "invalid assignment target",
                expr.span(),
                "only names, list items and attributes can be assigned to",
            );
            return Some(expr);
        }
        let span = expr.span().merge(value.span());
        Some(Expr::Assign {
            target: Box::new(expr),
            op: op.text,
            value: Box::new(value),
            span,
        })
    }

    fn check_augmented_target(&mut self, target: &SpannedName, op: &Token, value: &Expr) {
        let Some(current) = self
            .symbols
            .resolve(&target.name)
            .map(|symbol| symbol.declared_type.clone())
        else {
            let suggestion = format!("assign '{}' before using '{}'", target.name, op.text);
            self.semantic_error(
                "E3001",
                format!("name '{}' is not defined", target.name),
                target.span,
                Some(suggestion),
            );
            return;
        };
        let operator = op.text.trim_end_matches('=');
        let value_type = self.infer(value);
        if let Some(message) = checker::check_binary(operator, &current, &value_type) {
            self.type_error("E4001", message, op.span);
        }
    }

    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.check_keyword("or") {
            let op = self.advance();
            let right = self.parse_and()?;
            left = logical(op, left, right);
        }
        Some(left)
    }

    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_not()?;
        while self.check_keyword("and") {
            let op = self.advance();
            let right = self.parse_not()?;
            left = logical(op, left, right);
        }
        Some(left)
    }

    fn parse_not(&mut self) -> Option<Expr> {
        if !self.check_keyword("not") {
            return self.parse_equality();
        }
        let op = self.advance();
        let operand = self.parse_not()?;
        let span = op.span.merge(operand.span());
        Some(Expr::Unary {
            op: op.text,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> Option<Expr>,
    ) -> Option<Expr> {
        let mut left = next(self)?;
        while self.check(TokenKind::Operator) && ops.contains(&self.peek().text.as_str()) {
            let op = self.advance();
            let right = next(self)?;
            left = self.binary(op.text, op.span, left, right);
        }
        Some(left)
    }

    fn parse_equality(&mut self) -> Option<Expr> {
        self.parse_binary_level(&["==", "!="], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let token = self.peek().clone();
            let op = match token.kind {
                TokenKind::Operator if matches!(token.text.as_str(), "<" | ">" | "<=" | ">=") => {
                    self.pos += 1;
                    token.text.clone()
                }
                TokenKind::Keyword if token.text == "in" => {
                    self.pos += 1;
                    "in".to_string()
                }
                TokenKind::Keyword
                    if token.text == "not" && self.peek_at(1).is(TokenKind::Keyword, "in") =>
                {
                    self.pos += 2;
                    "not in".to_string()
                }
                _ => return Some(left),
            };
            let right = self.parse_additive()?;
            left = self.binary(op, token.span, left, right);
        }
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        self.parse_binary_level(&["*", "/", "//", "%"], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        if token.kind != TokenKind::Operator || !matches!(token.text.as_str(), "-" | "+" | "!") {
            return self.parse_power();
        }
        self.pos += 1;
        let operand = self.parse_unary()?;
        let operand_type = self.infer(&operand);
        if let Some(message) = checker::check_unary(&token.text, &operand_type) {
            self.type_error("E4001", message, token.span);
        }
        let span = token.span.merge(operand.span());
        Some(Expr::Unary {
            op: token.text,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_power(&mut self) -> Option<Expr> {
        let base = self.parse_postfix()?;
        if !self.check_op("**") {
            return Some(base);
        }
        let op = self.advance();
        let exponent = self.parse_unary()?;
        Some(self.binary(op.text, op.span, base, exponent))
    }

    fn binary(&mut self, op: String, op_span: Span, left: Expr, right: Expr) -> Expr {
        let (left_type, right_type) = (self.infer(&left), self.infer(&right));
        if let Some(message) = checker::check_binary(&op, &left_type, &right_type) {
            self.type_error("E4001", message, op_span);
        }
        let repeat = checker::repeat_side(&op, &left_type, &right_type);
        let span = left.span().merge(right.span());
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            repeat,
            span,
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check_delim("(") {
                expr = self.finish_call(expr)?;
            } else if self.match_delim(".") {
                let token = self.peek().clone();
                if !is_name(&token) {
                    let span = self.missing_span();
                    self.syntax_error(
                        "E2003",
                        format!("expected an attribute name after '.', found {}", describe(&token)),
                        span,
                    );
                    return None;
                }
                self.pos += 1;
                let span = expr.span().merge(token.span);
                expr = Expr::Attribute {
                    object: Box::new(expr),
                    name: SpannedName {
                        name: token.text,
                        span: token.span,
                    },
                    span,
                };
            } else if self.match_delim("[") {
                let index = self.parse_value()?;
                if self.check_delim(":") {
                    let span = self.peek().span;
                    self.syntax_error_with(
                        "E2016",
                        "slices are not supported",
                        span,
                        "index a single element instead",
                    );
                    return None;
                }
                self.expect_delim("]", "expected ']' after the index")?;
                let span = expr.span().merge(self.previous_span());
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else {
                return Some(expr);
            }
        }
    }

    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        self.pos += 1;
        let mut args = Vec::new();
        while !self.check_delim(")") {
            if is_name(self.peek()) && self.peek_at(1).is(TokenKind::Operator, "=") {
                let keyword = self.advance();
                self.pos += 1;
                self.syntax_error_with(
                    "E2014",
                    format!("keyword argument '{}' is not supported", keyword.text),
                    keyword.span,
                    "pass the value positionally",
                );
            }
            args.push(self.parse_value()?);
            if !self.match_delim(",") {
                break;
            }
            if self.check_delim(")") {
                self.trailing_comma();
            }
        }
        self.expect_delim(")", "expected ')' to close the call")?;
        let span = callee.span().merge(self.previous_span());
        self.check_call(&callee, &args);
        Some(Expr::Call {
            callee: Box::new(callee),
            args,
            span,
        })
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr]) {
        let Some(name) = callee.as_identifier() else {
            return;
        };
        let Some(symbol) = self.symbols.resolve(name).cloned() else {
            return;
        };
        let signature = match (symbol.kind, symbol.signature) {
            (SymbolKind::Function, Some(signature)) => signature,
            _ => {
                if checker::is_known_non_callable(&symbol.declared_type) {
                    self.semantic_error(
                        "E3005",
                        format!("'{name}' is not a function (it has type '{}')", symbol.declared_type),
                        callee.span(),
                        None,
                    );
                }
                return;
            }
        };
        if !signature.accepts(args.len()) {
            self.semantic_error(
                "E3004",
                format!(
                    "function '{name}' expects {} but got {}",
                    signature.describe_arity(),
                    args.len()
                ),
                callee.span(),
                None,
            );
        } else {
            for (index, (arg, param)) in args.iter().zip(&signature.params).enumerate() {
                let actual = self.infer(arg);
                if !checker::compatible(&param.ty, &actual) {
                    self.type_error(
                        "E4004",
                        format!(
                            "argument {} of '{name}' has type '{actual}' but parameter '{}' expects '{}'",
                            index + 1,
                            param.name,
                            param.ty
                        ),
                        arg.span(),
                    );
                }
            }
        }
        if name == "range" && symbol.span.is_none() {
            if let Some(step) = args.get(2).filter(|step| step.as_int() == Some(0)) {
                self.semantic_error(
                    "E3007",
                    "range() step must not be zero",
                    step.span(),
                    Some("use a positive or a negative step".to_string()),
                );
            }
        }
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.pos += 1;
                Some(number_literal(&token))
            }
            TokenKind::String => {
                self.pos += 1;
                Some(Expr::Literal(Literal {
                    value: LiteralValue::Str(super::literals::decode_string(&token.text)),
                    ty: LiteralType::String,
                    span: token.span,
                }))
            }
            TokenKind::FString => {
                self.pos += 1;
                let parts = self.parse_fstring(&token);
                Some(Expr::Literal(Literal {
                    value: LiteralValue::FString(parts),
                    ty: LiteralType::FString,
                    span: token.span,
                }))
            }
            TokenKind::Keyword if matches!(token.text.as_str(), "True" | "False" | "None") => {
                self.pos += 1;
                let (value, ty) = match token.text.as_str() {
                    "True" => (LiteralValue::Bool(true), LiteralType::Boolean),
                    "False" => (LiteralValue::Bool(false), LiteralType::Boolean),
                    _ => (LiteralValue::None, LiteralType::Null),
                };
                Some(Expr::Literal(Literal {
                    value,
                    ty,
                    span: token.span,
                }))
            }
            TokenKind::Identifier | TokenKind::TypeHint => {
                self.pos += 1;
                if self.symbols.resolve(&token.text).is_none() {
                    let is_call = self.check_delim("(");
                    self.report_undefined(&token.text, token.span, is_call);
                }
                Some(Expr::Identifier(SpannedName {
                    name: token.text,
                    span: token.span,
                }))
            }
            TokenKind::Delimiter if token.text == "(" => {
                self.pos += 1;
                let inner = self.parse_value()?;
                self.expect_delim(")", "expected ')' to close the parenthesis")?;
                Some(Expr::Grouping {
                    inner: Box::new(inner),
                    span: token.span.merge(self.previous_span()),
                })
            }
            TokenKind::Delimiter if token.text == "[" => {
                self.pos += 1;
                let mut items = Vec::new();
                while !self.check_delim("]") {
                    items.push(self.parse_value()?);
                    if !self.match_delim(",") {
                        break;
                    }
                }
                self.expect_delim("]", "expected ']' to close the list")?;
                Some(Expr::ListLiteral {
                    items,
                    span: token.span.merge(self.previous_span()),
                })
            }
            _ => {
                let span = self.missing_span();
                self.syntax_error_with(
                    "E2003",
                    format!("expected an expression, found {}", describe(&token)),
                    span,
                    "complete the expression",
                );
                None
            }
        }
    }
}

fn logical(op: Token, left: Expr, right: Expr) -> Expr {
    let span = left.span().merge(right.span());
    Expr::Logical {
        op: op.text,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

fn number_literal(token: &Token) -> Expr {
    let value = if token.text.contains('.') {
        LiteralValue::Float(token.text.parse().unwrap_or(0.0))
    } else {
        match token.text.parse::<i64>() {
            Ok(value) => LiteralValue::Int(value),
            Err(_) => LiteralValue::Float(token.text.parse().unwrap_or(f64::MAX)),
        }
    };
    Expr::Literal(Literal {
        value,
        ty: LiteralType::Number,
        span: token.span,
    })
}
