use serde::Serialize;

use crate::diagnostics::Span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpannedName {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeHint {
    pub name: String,
    pub args: Vec<TypeHint>,
    pub span: Span,
}

impl TypeHint {
    /// Source spelling, e.g. `dict[str, int]`.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = self.args.iter().map(TypeHint::display).collect();
        format!("{}[{}]", self.name, args.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: SpannedName,
    pub annotation: Option<TypeHint>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum Stmt {
    VarDecl {
        name: SpannedName,
        annotation: Option<TypeHint>,
        value: Expr,
        declared_type: String,
        span: Span,
    },
    FunctionDecl {
        decorators: Vec<SpannedName>,
        name: SpannedName,
        params: Vec<Param>,
        return_type: Option<TypeHint>,
        body: Vec<Stmt>,
        span: Span,
    },
    ExpressionStmt {
        expr: Expr,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// `elif` chains are nested `If`s in `else_branch`.
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    For {
        target: SpannedName,
        iterable: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Pass {
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::FunctionDecl { span, .. }
            | Stmt::ExpressionStmt { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Pass { span }
            | Stmt::Break { span }
            | Stmt::Continue { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node")]
pub enum Expr {
    /// `op` is `=` or an augmented operator such as `+=`.
    Assign {
        target: Box<Expr>,
        op: String,
        value: Box<Expr>,
        span: Span,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
        /// Set on `*` when one operand is text repeated by the other.
        #[serde(skip_serializing_if = "Option::is_none")]
        repeat: Option<Repeat>,
        span: Span,
    },
    Logical {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
        span: Span,
    },
    Grouping {
        inner: Box<Expr>,
        span: Span,
    },
    Literal(Literal),
    Identifier(SpannedName),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    ListLiteral {
        items: Vec<Expr>,
        span: Span,
    },
    Attribute {
        object: Box<Expr>,
        name: SpannedName,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(literal) => literal.span,
            Expr::Identifier(name) => name.span,
            Expr::Assign { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logical { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Grouping { span, .. }
            | Expr::Call { span, .. }
            | Expr::ListLiteral { span, .. }
            | Expr::Attribute { span, .. }
            | Expr::Index { span, .. } => *span,
        }
    }

    pub fn literal_type(&self) -> Option<LiteralType> {
        match self {
            Expr::Literal(literal) => Some(literal.ty),
            Expr::ListLiteral { .. } => Some(LiteralType::List),
            Expr::Grouping { inner, .. } => inner.literal_type(),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier(name) => Some(&name.name),
            _ => None,
        }
    }

    /// Integer value of a literal such as `3` or `-1`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::Literal(Literal {
                value: LiteralValue::Int(value),
                ..
            }) => Some(*value),
            Expr::Unary { op, operand, .. } if op == "-" => operand.as_int().map(|v| -v),
            Expr::Grouping { inner, .. } => inner.as_int(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Repeat {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    pub value: LiteralValue,
    pub ty: LiteralType,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    FString(Vec<FStringPart>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiteralType {
    Number,
    String,
    Boolean,
    Null,
    List,
    FString,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FStringPart {
    Text(String),
    Expr(Expr),
}
