//! AST node types for Ramattra source.

use serde::Serialize;

/// Source span (byte offsets) for error reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// A parsed source file: top-level declarations in source order.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Item {
    Function(FunctionDecl),
    Event(EventDecl),
    Type(TypeDecl),
}

/// `function clamp<T: number>(value: T, max: T): T { ... }`
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub generics: Vec<GenericParam>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenericParam {
    pub name: String,
    pub bound: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `event playerDied(victim, attacker) { ... }`
#[derive(Debug, Clone, Serialize)]
pub struct EventDecl {
    pub name: String,
    pub args: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `type Players = player | player[];`
#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A type annotation as written. The analyzer resolves it against aliases
/// and generics in scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExprKind {
    Named(String),
    Array(Box<TypeExpr>),
    Function {
        params: Vec<TypeExpr>,
        ret: Option<Box<TypeExpr>>,
    },
    Variadic(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    /// `let x: T = e` or `const x = e`.
    Let {
        name: String,
        ty: Option<TypeExpr>,
        value: Option<Expr>,
        constant: bool,
    },
    Assign {
        name: String,
        value: Expr,
    },
    /// `player.field = value`
    IndexAssign {
        object: Expr,
        field: String,
        value: Expr,
    },
    If {
        condition: Expr,
        body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    /// `for i in start..end { ... }`
    For {
        marker: String,
        start: Expr,
        end: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ExprKind {
    Number(f64),
    String(String),
    Boolean(bool),
    Ident(String),
    /// `[a, b]` or `<number>[a, b]`
    Array {
        item: Option<TypeExpr>,
        items: Vec<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    TypeOf(Box<Expr>),
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}
