use crate::ast::{Expr, LiteralType, TypeHint};

/// TypeScript spelling of a source type hint; unknown names pass through.
pub(super) fn map_type_hint(hint: &TypeHint) -> String {
    match (hint.name.as_str(), hint.args.as_slice()) {
        ("int" | "float", _) => "number".to_string(),
        ("str", _) => "string".to_string(),
        ("bool", _) => "boolean".to_string(),
        ("None", _) => "void".to_string(),
        ("any" | "Any" | "object", _) => "any".to_string(),
        ("list" | "tuple", [item]) => format!("Array<{}>", value_type(item)),
        ("list" | "tuple", _) => "Array<any>".to_string(),
        ("dict", [key, value]) => {
            format!("Record<{}, {}>", key_type(key), value_type(value))
        }
        ("dict", _) => "Record<string, any>".to_string(),
        ("set", [item]) => format!("Set<{}>", value_type(item)),
        ("set", _) => "Set<any>".to_string(),
        (other, []) => other.to_string(),
        (other, args) => {
            let args: Vec<String> = args.iter().map(value_type).collect();
            format!("{other}<{}>", args.join(", "))
        }
    }
}

/// Inside a generic, `None` is a value (`null`), not a return type.
fn value_type(hint: &TypeHint) -> String {
    if hint.name == "None" {
        return "null".to_string();
    }
    map_type_hint(hint)
}

fn key_type(hint: &TypeHint) -> String {
    match hint.name.as_str() {
        "int" | "float" => "number".to_string(),
        _ => "string".to_string(),
    }
}

/// Declared type for an unannotated binding, read off the literal it is
/// initialised with.
pub(super) fn literal_shape(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Literal(literal) => match literal.ty {
            LiteralType::Number => Some("number".to_string()),
            LiteralType::String | LiteralType::FString => Some("string".to_string()),
            LiteralType::Boolean => Some("boolean".to_string()),
            LiteralType::Null | LiteralType::List => None,
        },
        Expr::Unary { op, operand, .. } if op == "-" || op == "+" => {
            literal_shape(operand).filter(|shape| shape == "number")
        }
        Expr::Grouping { inner, .. } => literal_shape(inner),
        Expr::ListLiteral { items, .. } => Some(array_shape(items)),
        _ => None,
    }
}

fn array_shape(items: &[Expr]) -> String {
    let mut shapes: Vec<String> = Vec::new();
    for item in items {
        let Some(shape) = literal_shape(item) else {
            return "any[]".to_string();
        };
        if !shapes.contains(&shape) {
            shapes.push(shape);
        }
    }
    match shapes.as_slice() {
        [] => "any[]".to_string(),
        [single] => format!("{single}[]"),
        many => format!("({})[]", many.join(" | ")),
    }
}
