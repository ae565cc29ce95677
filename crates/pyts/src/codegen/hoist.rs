use std::collections::{HashMap, HashSet};

use crate::ast::{Expr, FStringPart, LiteralValue, Param, SpannedName, Stmt};
use crate::diagnostics::Span;

use super::types::{literal_shape, map_type_hint};

/// Declarations of one function (or the program): the TypeScript type of every
/// name it binds and the names that must be declared up front because their
/// first binding sits inside a nested block.
#[derive(Debug, Default)]
pub(super) struct ScopePlan {
    types: HashMap<String, Option<String>>,
    hoisted: Vec<String>,
    loops: HashMap<Span, LoopBinding>,
}

/// How a `for` header binds its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LoopBinding {
    Let,
    /// A `for-of` target the body never reassigns.
    Const,
    /// Declared by the enclosing scope; the header only assigns it.
    Shared,
}

impl LoopBinding {
    pub(super) fn declarator(self) -> &'static str {
        match self {
            LoopBinding::Let => "let ",
            LoopBinding::Const => "const ",
            LoopBinding::Shared => "",
        }
    }
}

impl ScopePlan {
    pub(super) fn is_hoisted(&self, name: &str) -> bool {
        self.hoisted.iter().any(|hoisted| hoisted == name)
    }

    pub(super) fn type_of(&self, name: &str) -> Option<&str> {
        self.types.get(name).and_then(|ty| ty.as_deref())
    }

    pub(super) fn hoisted(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.hoisted
            .iter()
            .map(|name| (name.as_str(), self.type_of(name)))
    }

    pub(super) fn loop_binding(&self, target: &SpannedName) -> LoopBinding {
        self.loops
            .get(&target.span)
            .copied()
            .unwrap_or(LoopBinding::Let)
    }
}

struct Planner<'a> {
    plan: ScopePlan,
    root: &'a [Stmt],
    params: HashSet<&'a str>,
    annotated: HashSet<String>,
    infer_types: bool,
}

/// Plans a function body (or the program, with no parameters).
pub(super) fn plan_scope(body: &[Stmt], params: &[Param], infer_types: bool) -> ScopePlan {
    let mut planner = Planner {
        plan: ScopePlan::default(),
        root: body,
        params: params.iter().map(|param| param.name.name.as_str()).collect(),
        annotated: HashSet::new(),
        infer_types,
    };
    planner.visit(body, 0);
    planner.plan
}

/// The arguments of a `range(...)` iterable that becomes a counted loop.
pub(super) fn counted_range(iterable: &Expr) -> Option<&[Expr]> {
    match iterable {
        Expr::Call { callee, args, .. }
            if callee.as_identifier() == Some("range") && (1..=3).contains(&args.len()) =>
        {
            Some(args)
        }
        _ => None,
    }
}

impl Planner<'_> {
    fn visit(&mut self, body: &[Stmt], depth: usize) {
        for stmt in body {
            match stmt {
                Stmt::VarDecl {
                    name,
                    annotation,
                    value,
                    ..
                } => {
                    if self.plan.types.contains_key(&name.name) {
                        self.widen(&name.name, value);
                        continue;
                    }
                    let ty = match annotation {
                        Some(hint) => {
                            self.annotated.insert(name.name.clone());
                            Some(map_type_hint(hint))
                        }
                        None if self.infer_types => {
                            Some(literal_shape(value).unwrap_or_else(|| "any".to_string()))
                        }
                        None => None,
                    };
                    self.plan.types.insert(name.name.clone(), ty);
                    if depth > 0 {
                        self.plan.hoisted.push(name.name.clone());
                    }
                }
                Stmt::ExpressionStmt {
                    expr: Expr::Assign {
                        target, op, value, ..
                    },
                    ..
                } if op == "=" => {
                    if let Some(name) = target.as_identifier() {
                        self.widen(name, value);
                    }
                }
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.visit(then_branch, depth + 1);
                    if let Some(else_branch) = else_branch {
                        self.visit(else_branch, depth + 1);
                    }
                }
                Stmt::While { body, .. } => self.visit(body, depth + 1),
                Stmt::For {
                    target,
                    iterable,
                    body,
                    ..
                } => {
                    self.plan_loop(stmt, target, iterable, body);
                    self.visit(body, depth + 1);
                }
                Stmt::FunctionDecl { .. }
                | Stmt::ExpressionStmt { .. }
                | Stmt::Return { .. }
                | Stmt::Pass { .. }
                | Stmt::Break { .. }
                | Stmt::Continue { .. } => {}
            }
        }
    }

    /// Python loop variables outlive the loop. A target the rest of the scope
    /// also touches is declared with the scope; otherwise the header owns it.
    fn plan_loop(&mut self, stmt: &Stmt, target: &SpannedName, iterable: &Expr, body: &[Stmt]) {
        let name = target.name.as_str();
        let binding = if self.params.contains(name) || self.plan.types.contains_key(name) {
            LoopBinding::Shared
        } else if mentioned_outside(self.root, stmt, name) {
            let ty = self.infer_types.then(|| self.element_type(iterable));
            self.plan.types.insert(name.to_string(), ty);
            self.plan.hoisted.push(name.to_string());
            LoopBinding::Shared
        } else if counted_range(iterable).is_some() || reassigns(body, name) {
            LoopBinding::Let
        } else {
            LoopBinding::Const
        };
        self.plan.loops.insert(target.span, binding);
    }

    fn element_type(&self, iterable: &Expr) -> String {
        if counted_range(iterable).is_some() {
            return "number".to_string();
        }
        let shape = match iterable {
            Expr::Identifier(name) => self.plan.type_of(&name.name).map(str::to_string),
            other => literal_shape(other),
        };
        let Some(shape) = shape else {
            return "any".to_string();
        };
        if shape == "string" {
            return shape;
        }
        match shape.strip_suffix("[]") {
            Some(item) => {
                let item = item
                    .strip_prefix('(')
                    .and_then(|inner| inner.strip_suffix(')'))
                    .unwrap_or(item);
                item.to_string()
            }
            None => "any".to_string(),
        }
    }

    /// A later assignment of a different literal shape turns the declaration into `any`.
    fn widen(&mut self, name: &str, value: &Expr) {
        if self.annotated.contains(name) {
            return;
        }
        let Some(Some(current)) = self.plan.types.get_mut(name) else {
            return;
        };
        if let Some(shape) = literal_shape(value) {
            if *current != shape && current.as_str() != "any" {
                *current = "any".to_string();
            }
        }
    }
}

/// Whether `name` is read or bound in `body` outside the loop `skip`. Other
/// loops over the same name rebind it first and do not count.
fn mentioned_outside(body: &[Stmt], skip: &Stmt, name: &str) -> bool {
    body.iter().any(|stmt| {
        if std::ptr::eq(stmt, skip) {
            return false;
        }
        match stmt {
            Stmt::VarDecl {
                name: bound, value, ..
            } => bound.name == name || mentions(value, name),
            Stmt::ExpressionStmt { expr, .. } => mentions(expr, name),
            Stmt::Return { value, .. } => value.as_ref().is_some_and(|value| mentions(value, name)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                mentions(condition, name)
                    || mentioned_outside(then_branch, skip, name)
                    || else_branch
                        .as_deref()
                        .is_some_and(|branch| mentioned_outside(branch, skip, name))
            }
            Stmt::While {
                condition, body, ..
            } => mentions(condition, name) || mentioned_outside(body, skip, name),
            Stmt::For {
                target,
                iterable,
                body,
                ..
            } => {
                mentions(iterable, name)
                    || (target.name != name && mentioned_outside(body, skip, name))
            }
            Stmt::FunctionDecl { .. }
            | Stmt::Pass { .. }
            | Stmt::Break { .. }
            | Stmt::Continue { .. } => false,
        }
    })
}

fn mentions(expr: &Expr, name: &str) -> bool {
    match expr {
        Expr::Identifier(ident) => ident.name == name,
        Expr::Literal(literal) => match &literal.value {
            LiteralValue::FString(parts) => parts.iter().any(|part| match part {
                FStringPart::Expr(expr) => mentions(expr, name),
                FStringPart::Text(_) => false,
            }),
            _ => false,
        },
        Expr::Assign { target, value, .. } => mentions(target, name) || mentions(value, name),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            mentions(left, name) || mentions(right, name)
        }
        Expr::Unary { operand, .. } => mentions(operand, name),
        Expr::Grouping { inner, .. } => mentions(inner, name),
        Expr::Call { callee, args, .. } => {
            mentions(callee, name) || args.iter().any(|arg| mentions(arg, name))
        }
        Expr::ListLiteral { items, .. } => items.iter().any(|item| mentions(item, name)),
        Expr::Attribute { object, .. } => mentions(object, name),
        Expr::Index { object, index, .. } => mentions(object, name) || mentions(index, name),
    }
}

/// Whether `body` assigns to `name` (plain or augmented).
fn reassigns(body: &[Stmt], name: &str) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::ExpressionStmt {
            expr: Expr::Assign { target, .. },
            ..
        } => target.as_identifier() == Some(name),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            reassigns(then_branch, name)
                || else_branch
                    .as_deref()
                    .is_some_and(|branch| reassigns(branch, name))
        }
        Stmt::While { body, .. } | Stmt::For { body, .. } => reassigns(body, name),
        _ => false,
    })
}

/// Whether any `return` in `body` (outside nested functions) carries a value.
pub(super) fn returns_value(body: &[Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        Stmt::Return { value, .. } => value.is_some(),
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => returns_value(then_branch) || else_branch.as_deref().is_some_and(returns_value),
        Stmt::While { body, .. } | Stmt::For { body, .. } => returns_value(body),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn plan(source: &str) -> ScopePlan {
        let (program, _) = parse(source);
        plan_scope(&program.statements, &[], true)
    }

    #[test]
    fn names_first_bound_in_blocks_are_hoisted() {
        let plan = plan("x = 1\nif x > 0:\n    y = \"a\"\nelse:\n    y = \"b\"\nprint(y)\n");
        assert!(!plan.is_hoisted("x"));
        assert!(plan.is_hoisted("y"));
        assert_eq!(plan.hoisted().collect::<Vec<_>>(), vec![("y", Some("string"))]);
    }

    #[test]
    fn conflicting_reassignment_widens_to_any() {
        let plan = plan("x = 1\nx = \"a\"\nz = 1\nz = 2.5\n");
        assert_eq!(plan.type_of("x"), Some("any"));
        assert_eq!(plan.type_of("z"), Some("number"));
    }

    #[test]
    fn annotations_are_never_widened() {
        let plan = plan("x: float = 1\nx = \"a\"\n");
        assert_eq!(plan.type_of("x"), Some("number"));
    }

    #[test]
    fn nested_functions_plan_separately() {
        let plan = plan("def f():\n    w = 1\n    return w\n");
        assert_eq!(plan.type_of("w"), None);
    }

    #[test]
    fn loop_targets_used_after_the_loop_are_hoisted() {
        let plan = plan("for i in range(3):\n    pass\ni = 5\nprint(i)\n");
        assert_eq!(plan.hoisted().collect::<Vec<_>>(), vec![("i", Some("number"))]);

        let plan = self::plan("xs = [\"a\", \"b\"]\nfor x in xs:\n    pass\nprint(x)\n");
        assert_eq!(plan.hoisted().collect::<Vec<_>>(), vec![("x", Some("string"))]);
    }

    #[test]
    fn loop_targets_local_to_the_loop_stay_in_the_header() {
        let (program, _) = parse("xs = [1, 2]\nfor x in xs:\n    x = x + 1\nfor y in xs:\n    print(y)\n");
        let plan = plan_scope(&program.statements, &[], true);
        assert!(!plan.is_hoisted("x"));
        let targets: Vec<LoopBinding> = program
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::For { target, .. } => Some(plan.loop_binding(target)),
                _ => None,
            })
            .collect();
        assert_eq!(targets, vec![LoopBinding::Let, LoopBinding::Const]);
    }

    #[test]
    fn sibling_loops_over_one_name_stay_independent() {
        let plan = plan("for i in range(2):\n    print(i)\nfor i in range(3):\n    print(i)\n");
        assert!(!plan.is_hoisted("i"));
    }

    #[test]
    fn detects_value_returns() {
        let (program, _) = parse("def f(x):\n    if x:\n        return 1\n    return\n");
        let Stmt::FunctionDecl { body, .. } = &program.statements[0] else {
            panic!("expected function");
        };
        assert!(returns_value(body));
        let (program, _) = parse("def g():\n    print(1)\n    return\n");
        let Stmt::FunctionDecl { body, .. } = &program.statements[0] else {
            panic!("expected function");
        };
        assert!(!returns_value(body));
    }
}
