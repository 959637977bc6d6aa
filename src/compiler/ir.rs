//! Typed intermediate representation produced by the analyzer.

use serde::Serialize;

use super::ast::BinOp;
use super::types::Type;

/// Index into the single global variable array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Slot(pub u32);

/// One analyzed event declaration, lowered to one target rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrEvent {
    pub name: String,
    /// Target trigger text, e.g. `Ongoing - Global`.
    pub trigger: String,
    pub body: Vec<IrStmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IrStmt {
    Block(Vec<IrStmt>),
    If {
        condition: IrExpr,
        body: Vec<IrStmt>,
    },
    While {
        condition: IrExpr,
        body: Vec<IrStmt>,
    },
    Let {
        slot: Slot,
        ty: Type,
        value: IrExpr,
    },
    Assign {
        slot: Slot,
        value: IrExpr,
    },
    IndexAssign {
        object: IrExpr,
        field: String,
        value: IrExpr,
    },
    /// Call to a target action by its target name.
    Call {
        name: String,
        args: Vec<IrExpr>,
    },
    Break,
    Continue,
    Noop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrExpr {
    pub ty: Type,
    pub kind: IrExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IrExprKind {
    Binary {
        op: BinOp,
        lhs: Box<IrExpr>,
        rhs: Box<IrExpr>,
    },
    Not(Box<IrExpr>),
    Index {
        array: Box<IrExpr>,
        index: Box<IrExpr>,
    },
    /// Call to a target value by its target name.
    Call {
        name: String,
        args: Vec<IrExpr>,
    },
    /// Target literal text such as `Victim` or `Color(Red)`.
    Constant(String),
    Variable(Slot),
    Number(f64),
    String(String),
    /// Format template of a `Custom String`, printed as bare quoted text.
    Template(String),
    Boolean(bool),
    Array(Vec<IrExpr>),
}

impl IrExpr {
    pub fn new(ty: Type, kind: IrExprKind) -> Self {
        Self { ty, kind }
    }

    pub fn number(value: f64) -> Self {
        Self::new(Type::number(), IrExprKind::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(Type::boolean(), IrExprKind::Boolean(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Type::string(), IrExprKind::String(value.into()))
    }

    pub fn constant(ty: Type, text: impl Into<String>) -> Self {
        Self::new(ty, IrExprKind::Constant(text.into()))
    }

    pub fn variable(ty: Type, slot: Slot) -> Self {
        Self::new(ty, IrExprKind::Variable(slot))
    }

    pub fn binary(ty: Type, op: BinOp, lhs: IrExpr, rhs: IrExpr) -> Self {
        Self::new(
            ty,
            IrExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn not(operand: IrExpr) -> Self {
        Self::new(Type::boolean(), IrExprKind::Not(Box::new(operand)))
    }
}

impl IrStmt {
    /// Count statements in the tree, nested blocks included.
    pub fn count(stmts: &[IrStmt]) -> usize {
        stmts
            .iter()
            .map(|stmt| match stmt {
                IrStmt::Block(body) | IrStmt::If { body, .. } | IrStmt::While { body, .. } => {
                    1 + IrStmt::count(body)
                }
                _ => 1,
            })
            .sum()
    }
}
