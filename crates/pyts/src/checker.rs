//! Type inference over parsed expressions and the compatibility rules behind the
//! `E40xx` diagnostics.
//!
//! Types are the source-level spellings (`int`, `list[str]`, `dict[str, int]`),
//! with `any` standing for "unknown". Every rule is lenient towards `any` and
//! towards names outside the builtin vocabulary, so only provable conflicts are
//! reported.

use crate::ast::{Expr, Literal, LiteralValue, Repeat};
use crate::symbols::{SymbolKind, SymbolTable};

pub const ANY: &str = "any";

const KNOWN: &[&str] = &[
    "int", "float", "str", "bool", "list", "dict", "tuple", "set", "None", "function",
];

/// `list[int]` -> `list`.
pub fn base(ty: &str) -> &str {
    ty.split('[').next().unwrap_or(ty).trim()
}

/// Top-level type arguments: `dict[str, list[int]]` -> `["str", "list[int]"]`.
pub fn type_args(ty: &str) -> Vec<&str> {
    let Some(open) = ty.find('[') else {
        return Vec::new();
    };
    let inner = ty[open + 1..].strip_suffix(']').unwrap_or(&ty[open + 1..]);
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (index, ch) in inner.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        args.push(last);
    }
    args
}

pub fn is_known(ty: &str) -> bool {
    KNOWN.contains(&base(ty))
}

fn is_numeric(ty: &str) -> bool {
    matches!(ty, "int" | "float" | "bool")
}

fn is_int_like(ty: &str) -> bool {
    matches!(ty, "int" | "bool")
}

pub fn is_known_non_callable(ty: &str) -> bool {
    is_known(ty) && ty != "function"
}

pub fn infer_type(expr: &Expr, symbols: &SymbolTable) -> String {
    match expr {
        Expr::Literal(Literal { value, .. }) => match value {
            LiteralValue::Int(_) => "int",
            LiteralValue::Float(_) => "float",
            LiteralValue::Str(_) | LiteralValue::FString(_) => "str",
            LiteralValue::Bool(_) => "bool",
            LiteralValue::None => "None",
        }
        .to_string(),
        Expr::ListLiteral { items, .. } => {
            let types: Vec<String> = items.iter().map(|item| infer_type(item, symbols)).collect();
            list_of(&types)
        }
        Expr::Identifier(name) => symbols
            .resolve(&name.name)
            .map(|symbol| symbol.declared_type.clone())
            .unwrap_or_else(|| ANY.to_string()),
        Expr::Grouping { inner, .. } => infer_type(inner, symbols),
        Expr::Assign { value, .. } => infer_type(value, symbols),
        Expr::Unary { op, operand, .. } => match op.as_str() {
            "not" | "!" => "bool".to_string(),
            _ => match infer_type(operand, symbols).as_str() {
                "bool" | "int" => "int".to_string(),
                "float" => "float".to_string(),
                _ => ANY.to_string(),
            },
        },
        Expr::Logical { left, right, .. } => {
            let (left, right) = (infer_type(left, symbols), infer_type(right, symbols));
            if left == right {
                left
            } else {
                ANY.to_string()
            }
        }
        Expr::Binary {
            op, left, right, ..
        } => binary_result(op, &infer_type(left, symbols), &infer_type(right, symbols)),
        Expr::Call { callee, .. } => match callee.as_ref() {
            Expr::Identifier(name) => match symbols.resolve(&name.name) {
                Some(symbol) if symbol.kind == SymbolKind::Function => symbol
                    .signature
                    .as_ref()
                    .map(|sig| sig.return_type.clone())
                    .unwrap_or_else(|| ANY.to_string()),
                _ => ANY.to_string(),
            },
            Expr::Attribute { object, name, .. } => {
                method_result(&infer_type(object, symbols), &name.name)
            }
            _ => ANY.to_string(),
        },
        Expr::Index { object, .. } => {
            let ty = infer_type(object, symbols);
            let args = type_args(&ty);
            match base(&ty) {
                "str" => "str".to_string(),
                "list" | "tuple" => args.first().map_or(ANY, |arg| *arg).to_string(),
                "dict" => args.get(1).map_or(ANY, |arg| *arg).to_string(),
                _ => ANY.to_string(),
            }
        }
        Expr::Attribute { .. } => ANY.to_string(),
    }
}

/// Element type produced by iterating over `iterable`.
pub fn element_type(iterable: &Expr, symbols: &SymbolTable) -> String {
    let ty = infer_type(iterable, symbols);
    match base(&ty) {
        "str" => "str".to_string(),
        "list" | "tuple" | "set" | "dict" => type_args(&ty)
            .first()
            .map_or(ANY, |arg| *arg)
            .to_string(),
        _ => ANY.to_string(),
    }
}

fn list_of(types: &[String]) -> String {
    let Some(first) = types.first() else {
        return "list".to_string();
    };
    if !types.iter().all(|ty| is_known(ty)) {
        return "list".to_string();
    }
    if types.iter().all(|ty| ty == first) {
        return format!("list[{first}]");
    }
    if types.iter().all(|ty| is_numeric(ty)) {
        return "list[float]".to_string();
    }
    "list".to_string()
}

fn numeric_result(left: &str, right: &str) -> String {
    if !is_numeric(left) || !is_numeric(right) {
        ANY.to_string()
    } else if left == "float" || right == "float" {
        "float".to_string()
    } else {
        "int".to_string()
    }
}

fn binary_result(op: &str, left: &str, right: &str) -> String {
    if check_binary(op, left, right).is_some() {
        return ANY.to_string();
    }
    match op {
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "in" | "not in" => "bool".to_string(),
        "+" if left == "str" && right == "str" => "str".to_string(),
        "+" if base(left) == "list" && base(right) == "list" => {
            if left == right {
                left.to_string()
            } else {
                "list".to_string()
            }
        }
        "*" if matches!(base(left), "str" | "list") => left.to_string(),
        "*" if matches!(base(right), "str" | "list") => right.to_string(),
        "%" if left == "str" => "str".to_string(),
        "/" if is_numeric(left) && is_numeric(right) => "float".to_string(),
        "+" | "-" | "*" | "%" | "**" | "//" => numeric_result(left, right),
        _ => ANY.to_string(),
    }
}

fn method_result(receiver: &str, method: &str) -> String {
    match (base(receiver), method) {
        (
            "str",
            "upper" | "lower" | "strip" | "lstrip" | "rstrip" | "replace" | "capitalize"
            | "title" | "join",
        ) => "str".to_string(),
        ("str", "split") => "list[str]".to_string(),
        ("str", "startswith" | "endswith" | "isdigit" | "isalpha" | "isspace") => {
            "bool".to_string()
        }
        ("str", "find" | "count" | "index") | ("list", "count" | "index") => "int".to_string(),
        ("list", "pop") => type_args(receiver)
            .first()
            .map_or(ANY, |arg| *arg)
            .to_string(),
        ("list", "append" | "extend" | "insert" | "sort" | "reverse" | "clear") => {
            "None".to_string()
        }
        _ => ANY.to_string(),
    }
}

/// Message for an operator applied to operands of known, conflicting types.
pub fn check_binary(op: &str, left: &str, right: &str) -> Option<String> {
    if !is_known(left) || !is_known(right) {
        return None;
    }
    let (lb, rb) = (base(left), base(right));
    let numeric = is_numeric(left) && is_numeric(right);
    let ok = match op {
        "+" => numeric || (lb == rb && matches!(lb, "str" | "list" | "tuple")),
        "-" | "/" | "//" | "**" => numeric,
        "*" => {
            numeric
                || (matches!(lb, "str" | "list") && is_int_like(right))
                || (is_int_like(left) && matches!(rb, "str" | "list"))
        }
        "%" => numeric || lb == "str",
        "<" | ">" | "<=" | ">=" => numeric || (lb == rb && matches!(lb, "str" | "list")),
        "in" | "not in" => {
            matches!(rb, "str" | "list" | "dict" | "tuple" | "set") && (rb != "str" || lb == "str")
        }
        _ => true,
    };
    if ok {
        return None;
    }
    Some(match op {
        "<" | ">" | "<=" | ">=" => {
            format!("'{op}' is not supported between '{left}' and '{right}'")
        }
        "in" | "not in" if rb == "str" => {
            format!("'in <string>' requires a string as left operand, not '{left}'")
        }
        "in" | "not in" => format!("argument of type '{right}' is not iterable"),
        _ => format!("unsupported operand types for {op}: '{left}' and '{right}'"),
    })
}

/// Which operand of `op` is a string repeated by the other, unknown counts included.
pub fn repeat_side(op: &str, left: &str, right: &str) -> Option<Repeat> {
    if op != "*" {
        return None;
    }
    let count = |ty: &str| is_int_like(ty) || !is_known(ty);
    if left == "str" && count(right) {
        Some(Repeat::Left)
    } else if right == "str" && count(left) {
        Some(Repeat::Right)
    } else {
        None
    }
}

pub fn check_unary(op: &str, operand: &str) -> Option<String> {
    match op {
        "-" | "+" if is_known(operand) && !is_numeric(operand) => {
            Some(format!("bad operand type for unary {op}: '{operand}'"))
        }
        _ => None,
    }
}

/// Whether a value of type `actual` may flow where `expected` is declared.
pub fn compatible(expected: &str, actual: &str) -> bool {
    if expected == actual || !is_known(expected) || !is_known(actual) {
        return true;
    }
    let (eb, ab) = (base(expected), base(actual));
    if is_numeric(eb) && is_numeric(ab) {
        return eb != "bool" || ab == "bool";
    }
    if eb != ab {
        return false;
    }
    let (expected_args, actual_args) = (type_args(expected), type_args(actual));
    if expected_args.is_empty() || actual_args.is_empty() {
        return true;
    }
    expected_args.len() == actual_args.len()
        && expected_args
            .iter()
            .zip(&actual_args)
            .all(|(e, a)| compatible(e, a))
}
