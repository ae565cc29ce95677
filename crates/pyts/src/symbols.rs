use std::collections::HashMap;

use serde::Serialize;

use crate::diagnostics::{DiagnosticKind, ErrorReporter, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSig {
    pub name: String,
    pub ty: String,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signature {
    pub params: Vec<ParamSig>,
    pub variadic: bool,
    pub return_type: String,
}

impl Signature {
    pub fn required(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    pub fn total(&self) -> usize {
        self.params.len()
    }

    pub fn accepts(&self, count: usize) -> bool {
        if self.variadic {
            count >= self.required()
        } else {
            (self.required()..=self.total()).contains(&count)
        }
    }

    /// Human readable expectation, e.g. `1 to 3 arguments`.
    pub fn describe_arity(&self) -> String {
        let (required, total) = (self.required(), self.total());
        let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
        if self.variadic {
            format!("at least {required} {}", plural(required))
        } else if required == total {
            format!("{required} {}", plural(required))
        } else {
            format!("{required} to {total} arguments")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub declared_type: String,
    pub kind: SymbolKind,
    pub signature: Option<Signature>,
    /// `None` for builtins.
    pub span: Option<Span>,
}

impl Symbol {
    pub fn variable(name: &str, declared_type: &str, span: Span) -> Self {
        Self {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            kind: SymbolKind::Variable,
            signature: None,
            span: Some(span),
        }
    }

    pub fn parameter(name: &str, declared_type: &str, span: Span) -> Self {
        Self {
            kind: SymbolKind::Parameter,
            ..Self::variable(name, declared_type, span)
        }
    }

    pub fn function(name: &str, signature: Signature, span: Option<Span>) -> Self {
        Self {
            name: name.to_string(),
            declared_type: "function".to_string(),
            kind: SymbolKind::Function,
            signature: Some(signature),
            span,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.span.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<usize>,
    symbols: HashMap<String, Symbol>,
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

const GLOBAL: usize = 0;

fn param(name: &str, ty: &str) -> ParamSig {
    ParamSig {
        name: name.to_string(),
        ty: ty.to_string(),
        optional: false,
    }
}

fn optional(name: &str, ty: &str) -> ParamSig {
    ParamSig {
        optional: true,
        ..param(name, ty)
    }
}

fn builtin(params: Vec<ParamSig>, variadic: bool, return_type: &str) -> Signature {
    Signature {
        params,
        variadic,
        return_type: return_type.to_string(),
    }
}

fn builtins() -> Vec<(&'static str, Signature)> {
    vec![
        ("print", builtin(vec![], true, "None")),
        ("input", builtin(vec![optional("prompt", "str")], false, "str")),
        ("len", builtin(vec![param("obj", "any")], false, "int")),
        (
            "int",
            builtin(vec![optional("value", "any"), optional("base", "int")], false, "int"),
        ),
        ("str", builtin(vec![optional("value", "any")], false, "str")),
        ("float", builtin(vec![optional("value", "any")], false, "float")),
        ("bool", builtin(vec![optional("value", "any")], false, "bool")),
        (
            "range",
            builtin(
                vec![param("start", "int"), optional("stop", "int"), optional("step", "int")],
                false,
                "list[int]",
            ),
        ),
        ("sum", builtin(vec![param("iterable", "list")], false, "float")),
        ("max", builtin(vec![param("value", "any")], true, "any")),
        ("min", builtin(vec![param("value", "any")], true, "any")),
        ("abs", builtin(vec![param("x", "float")], false, "float")),
        (
            "round",
            builtin(vec![param("x", "float"), optional("ndigits", "int")], false, "float"),
        ),
        ("list", builtin(vec![optional("iterable", "any")], false, "list")),
    ]
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut global = Scope {
            kind: ScopeKind::Global,
            parent: None,
            symbols: HashMap::new(),
        };
        for (name, signature) in builtins() {
            global
                .symbols
                .insert(name.to_string(), Symbol::function(name, signature, None));
        }
        Self {
            scopes: vec![global],
        }
    }

    fn current(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) {
        let parent = self.current();
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            symbols: HashMap::new(),
        });
    }

    /// Pops the innermost scope; the global scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes[self.current()].kind
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `symbol`; functions always go to the global scope.
    pub fn define(&mut self, symbol: Symbol, reporter: &mut ErrorReporter) -> bool {
        let target = match symbol.kind {
            SymbolKind::Function => GLOBAL,
            SymbolKind::Variable | SymbolKind::Parameter => self.current(),
        };
        if let Some(existing) = self.scopes[target].symbols.get(&symbol.name) {
            if let Some(span) = symbol.span {
                let message = if existing.is_builtin() {
                    format!("cannot redefine builtin function '{}'", symbol.name)
                } else {
                    format!("'{}' is already defined", symbol.name)
                };
                let help = match existing.span {
                    Some(first) => format!(
                        "'{}' was first defined on line {}; choose a different name",
                        symbol.name,
                        first.line()
                    ),
                    None => "choose a different name".to_string(),
                };
                reporter.error_with(DiagnosticKind::Semantic, "E3002", message, span, help);
            }
            return false;
        }
        self.scopes[target]
            .symbols
            .insert(symbol.name.clone(), symbol);
        true
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        let mut index = Some(self.current());
        while let Some(scope) = index.map(|i| &self.scopes[i]) {
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            index = scope.parent;
        }
        None
    }

    pub fn resolve_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current()].symbols.get(name)
    }

    /// Updates the type of an already bound variable, innermost binding first.
    pub fn refine_type(&mut self, name: &str, declared_type: &str) {
        let mut index = Some(self.current());
        while let Some(i) = index {
            if let Some(symbol) = self.scopes[i].symbols.get_mut(name) {
                if symbol.kind != SymbolKind::Function {
                    symbol.declared_type = declared_type.to_string();
                }
                return;
            }
            index = self.scopes[i].parent;
        }
    }

    /// Every name visible from the current scope, innermost first.
    pub fn visible_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut index = Some(self.current());
        while let Some(scope) = index.map(|i| &self.scopes[i]) {
            let mut local: Vec<&str> = scope.symbols.keys().map(String::as_str).collect();
            local.sort_unstable();
            names.extend(local);
            index = scope.parent;
        }
        names
    }
}
