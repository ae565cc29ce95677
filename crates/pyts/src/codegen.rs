//! TypeScript emission from a checked [`Program`].
//!
//! The generator assumes the tree came out of a compilation without blocking
//! diagnostics; shapes it still cannot express surface as [`PytsError::Codegen`].

use crate::ast::*;
use crate::config::CompileOptions;
use crate::PytsError;

mod builtins;
mod hoist;
mod types;

use hoist::{LoopBinding, ScopePlan};
use types::map_type_hint;

pub fn generate(program: &Program, options: &CompileOptions) -> Result<String, PytsError> {
    let mut generator = Generator {
        unit: " ".repeat(options.indent),
        level: 0,
        out: String::new(),
        scopes: Vec::new(),
        infer_types: options.infer_types,
    };
    generator.emit_scope(&program.statements, &[], true)?;
    Ok(generator.out)
}

struct Generator {
    unit: String,
    level: usize,
    out: String,
    scopes: Vec<ScopePlan>,
    infer_types: bool,
}

/// Operands that need parentheses before `.member`, `!` or unary minus.
fn needs_parens(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary { .. } | Expr::Logical { .. } | Expr::Unary { .. } | Expr::Assign { .. }
    )
}

fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            ch => out.push(ch),
        }
    }
    out
}

fn float_literal(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "Infinity".to_string()
    }
}

impl Generator {
    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(&self.unit);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn plan(&self) -> Option<&ScopePlan> {
        self.scopes.last()
    }

    /// Emits a function or program body: hoisted declarations first, then the
    /// statements.
    fn emit_scope(
        &mut self,
        body: &[Stmt],
        params: &[Param],
        top_level: bool,
    ) -> Result<(), PytsError> {
        let plan = hoist::plan_scope(body, params, self.infer_types);
        let hoisted: Vec<String> = plan
            .hoisted()
            .map(|(name, ty)| match ty {
                Some(ty) => format!("let {name}: {ty};"),
                None => format!("let {name};"),
            })
            .collect();
        for declaration in &hoisted {
            self.line(declaration);
        }
        self.scopes.push(plan);
        let result = self.emit_statements(body, top_level);
        self.scopes.pop();
        result
    }

    fn emit_statements(&mut self, body: &[Stmt], top_level: bool) -> Result<(), PytsError> {
        for (index, stmt) in body.iter().enumerate() {
            self.emit_stmt(stmt)?;
            let is_function = matches!(stmt, Stmt::FunctionDecl { .. });
            if top_level && is_function && index + 1 < body.len() {
                self.out.push('\n');
            }
        }
        Ok(())
    }

    fn emit_block(&mut self, body: &[Stmt]) -> Result<(), PytsError> {
        self.level += 1;
        let result = self.emit_statements(body, false);
        self.level -= 1;
        result
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), PytsError> {
        match stmt {
            Stmt::VarDecl { name, value, .. } => {
                let value = self.expr(value)?;
                let name = name.name.as_str();
                let declaration = match self.plan() {
                    Some(plan) if plan.is_hoisted(name) => format!("{name} = {value};"),
                    Some(plan) => match plan.type_of(name) {
                        Some(ty) => format!("let {name}: {ty} = {value};"),
                        None => format!("let {name} = {value};"),
                    },
                    None => format!("let {name} = {value};"),
                };
                self.line(&declaration);
            }
            Stmt::FunctionDecl {
                decorators,
                name,
                params,
                return_type,
                body,
                ..
            } => {
                for decorator in decorators {
                    self.line(&format!("// @{}", decorator.name));
                }
                let signature: Vec<String> = params
                    .iter()
                    .map(|param| {
                        let ty = param
                            .annotation
                            .as_ref()
                            .map_or_else(|| "any".to_string(), map_type_hint);
                        format!("{}: {ty}", param.name.name)
                    })
                    .collect();
                let returns = match return_type {
                    Some(hint) => map_type_hint(hint),
                    None if hoist::returns_value(body) => "any".to_string(),
                    None => "void".to_string(),
                };
                self.line(&format!(
                    "function {}({}): {returns} {{",
                    name.name,
                    signature.join(", ")
                ));
                self.level += 1;
                self.emit_scope(body, params, false)?;
                self.level -= 1;
                self.line("}");
            }
            Stmt::ExpressionStmt { expr, .. } => {
                let code = match expr {
                    Expr::Assign {
                        target, op, value, ..
                    } => self.assignment(target, op, value)?,
                    other => self.expr(other)?,
                };
                self.line(&format!("{code};"));
            }
            Stmt::Return { value, .. } => match value {
                Some(value) => {
                    let value = self.expr(value)?;
                    self.line(&format!("return {value};"));
                }
                None => self.line("return;"),
            },
            Stmt::If { .. } => self.emit_if(stmt)?,
            Stmt::While {
                condition, body, ..
            } => {
                let condition = self.expr(condition)?;
                self.line(&format!("while ({condition}) {{"));
                self.emit_block(body)?;
                self.line("}");
            }
            Stmt::For {
                target,
                iterable,
                body,
                ..
            } => {
                let binding = self
                    .plan()
                    .map_or(LoopBinding::Let, |plan| plan.loop_binding(target));
                let header = match hoist::counted_range(iterable) {
                    Some(args) => self.range_header(&target.name, binding, args)?,
                    None => format!(
                        "for ({}{} of {})",
                        binding.declarator(),
                        target.name,
                        self.expr(iterable)?
                    ),
                };
                self.line(&format!("{header} {{"));
                self.emit_block(body)?;
                self.line("}");
            }
            Stmt::Pass { .. } => {}
            Stmt::Break { .. } => self.line("break;"),
            Stmt::Continue { .. } => self.line("continue;"),
        }
        Ok(())
    }

    /// `if`/`elif`/`else` chains become one `} else if (...) {` ladder.
    fn emit_if(&mut self, stmt: &Stmt) -> Result<(), PytsError> {
        let mut current = stmt;
        let mut opener = "if";
        loop {
            let Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } = current
            else {
                return Err(PytsError::Codegen("expected an if statement".to_string()));
            };
            let condition = self.expr(condition)?;
            self.line(&format!("{opener} ({condition}) {{"));
            self.emit_block(then_branch)?;
            match else_branch.as_deref() {
                Some([nested @ Stmt::If { .. }]) => {
                    current = nested;
                    opener = "} else if";
                }
                Some(else_branch) => {
                    self.line("} else {");
                    self.emit_block(else_branch)?;
                    self.line("}");
                    return Ok(());
                }
                None => {
                    self.line("}");
                    return Ok(());
                }
            }
        }
    }

    fn range_header(
        &mut self,
        target: &str,
        binding: LoopBinding,
        args: &[Expr],
    ) -> Result<String, PytsError> {
        let (start, stop, step) = match args {
            [stop] => ("0".to_string(), self.comparison_operand(stop)?, None),
            [start, stop] => (self.expr(start)?, self.comparison_operand(stop)?, None),
            [start, stop, step] => (
                self.expr(start)?,
                self.comparison_operand(stop)?,
                Some(step),
            ),
            _ => {
                return Err(PytsError::Codegen(format!(
                    "range() takes 1 to 3 arguments, got {}",
                    args.len()
                )))
            }
        };
        let (condition, update) = match step.map(|step| (step, step.as_int())) {
            None | Some((_, Some(1))) => (format!("{target} < {stop}"), format!("{target}++")),
            Some((_, Some(-1))) => (format!("{target} > {stop}"), format!("{target}--")),
            Some((_, Some(step))) if step > 0 => {
                (format!("{target} < {stop}"), format!("{target} += {step}"))
            }
            Some((_, Some(step))) => (
                format!("{target} > {stop}"),
                format!("{target} -= {}", step.unsigned_abs()),
            ),
            Some((step, None)) => {
                let step = self.operand(step)?;
                (
                    format!("{step} > 0 ? {target} < {stop} : {target} > {stop}"),
                    format!("{target} += {step}"),
                )
            }
        };
        let declarator = binding.declarator();
        Ok(format!(
            "for ({declarator}{target} = {start}; {condition}; {update})"
        ))
    }

    fn assignment(&mut self, target: &Expr, op: &str, value: &Expr) -> Result<String, PytsError> {
        let target = self.expr(target)?;
        let value_code = self.expr(value)?;
        Ok(match op {
            "//=" => format!("{target} = Math.floor({target} / {})", self.operand(value)?),
            _ => format!("{target} {op} {value_code}"),
        })
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<Vec<String>, PytsError> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    /// An expression in a position that binds tighter than any binary operator.
    fn operand(&mut self, expr: &Expr) -> Result<String, PytsError> {
        let code = self.expr(expr)?;
        Ok(if needs_parens(expr) {
            format!("({code})")
        } else {
            code
        })
    }

    /// An expression followed by `.member`; numeric literals need parentheses there.
    fn receiver(&mut self, expr: &Expr) -> Result<String, PytsError> {
        match expr {
            Expr::Literal(Literal {
                value: LiteralValue::Int(_) | LiteralValue::Float(_),
                ..
            }) => Ok(format!("({})", self.expr(expr)?)),
            other => self.operand(other),
        }
    }

    /// An operand of `<`/`>`: arithmetic binds tighter and stays bare.
    fn comparison_operand(&mut self, expr: &Expr) -> Result<String, PytsError> {
        match expr {
            Expr::Binary { op, .. }
                if matches!(op.as_str(), "+" | "-" | "*" | "/" | "%" | "**" | "//") =>
            {
                self.expr(expr)
            }
            Expr::Unary { op, .. } if op == "-" => self.expr(expr),
            other => self.operand(other),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Result<String, PytsError> {
        Ok(match expr {
            Expr::Literal(literal) => self.literal(literal)?,
            Expr::Identifier(name) => name.name.clone(),
            Expr::Assign { .. } => {
                return Err(PytsError::Codegen(
                    "assignment cannot be used as an expression".to_string(),
                ))
            }
            Expr::Binary {
                op,
                left,
                right,
                repeat,
                ..
            } => self.binary(op, left, right, *repeat)?,
            Expr::Logical {
                op, left, right, ..
            } => {
                let op = if op == "and" { "&&" } else { "||" };
                format!("{} {op} {}", self.expr(left)?, self.expr(right)?)
            }
            Expr::Unary { op, operand, .. } => {
                let op = if op == "not" { "!" } else { op.as_str() };
                format!("{op}{}", self.operand(operand)?)
            }
            Expr::Grouping { inner, .. } => format!("({})", self.expr(inner)?),
            Expr::Call { callee, args, .. } => self.call(callee, args)?,
            Expr::ListLiteral { items, .. } => format!("[{}]", self.exprs(items)?.join(", ")),
            Expr::Attribute { object, name, .. } => {
                format!("{}.{}", self.receiver(object)?, name.name)
            }
            Expr::Index { object, index, .. } => match index.as_int() {
                Some(position) if position < 0 => {
                    format!("{}.at({position})", self.receiver(object)?)
                }
                _ => format!("{}[{}]", self.operand(object)?, self.expr(index)?),
            },
        })
    }

    fn binary(
        &mut self,
        op: &str,
        left: &Expr,
        right: &Expr,
        repeat: Option<Repeat>,
    ) -> Result<String, PytsError> {
        if let Some(side) = repeat {
            let (text, count) = match side {
                Repeat::Left => (left, right),
                Repeat::Right => (right, left),
            };
            return Ok(format!("{}.repeat({})", self.receiver(text)?, self.expr(count)?));
        }
        Ok(match op {
            "==" => format!("{} === {}", self.expr(left)?, self.expr(right)?),
            "!=" => format!("{} !== {}", self.expr(left)?, self.expr(right)?),
            "//" => format!("Math.floor({} / {})", self.operand(left)?, self.operand(right)?),
            "in" => format!("{}.includes({})", self.receiver(right)?, self.expr(left)?),
            "not in" => format!("!{}.includes({})", self.receiver(right)?, self.expr(left)?),
            _ => format!("{} {op} {}", self.expr(left)?, self.expr(right)?),
        })
    }

    fn literal(&mut self, literal: &Literal) -> Result<String, PytsError> {
        Ok(match &literal.value {
            LiteralValue::Int(value) => value.to_string(),
            LiteralValue::Float(value) => float_literal(*value),
            LiteralValue::Str(text) => serde_json::to_string(text).map_err(|err| {
                PytsError::Codegen(format!("failed to encode string literal: {err}"))
            })?,
            LiteralValue::Bool(value) => value.to_string(),
            LiteralValue::None => "null".to_string(),
            LiteralValue::FString(parts) => {
                let mut out = String::from("`");
                for part in parts {
                    match part {
                        FStringPart::Text(text) => out.push_str(&escape_template(text)),
                        FStringPart::Expr(expr) => {
                            out.push_str("${");
                            out.push_str(&self.expr(expr)?);
                            out.push('}');
                        }
                    }
                }
                out.push('`');
                out
            }
        })
    }
}
