use tracing::debug;

use super::ast::BinOp;
use super::ir::{IrEvent, IrExpr, IrExprKind, IrStmt};
use super::types::Type;

// ── Constant folding on IR ──────────────────────────────────────────

/// Fold literal subexpressions and drop no-op statements.
///
/// Folding is bottom-up, so one pass reaches a fixed point and running the
/// pass again changes nothing.
pub fn optimize(events: Vec<IrEvent>) -> Vec<IrEvent> {
    let events: Vec<IrEvent> = events
        .into_iter()
        .map(|event| IrEvent {
            body: fold_block(event.body),
            ..event
        })
        .collect();
    debug!(
        statements = events.iter().map(|e| IrStmt::count(&e.body)).sum::<usize>(),
        "optimized events"
    );
    events
}

fn fold_block(stmts: Vec<IrStmt>) -> Vec<IrStmt> {
    stmts
        .into_iter()
        .map(fold_stmt)
        .filter(|s| *s != IrStmt::Noop)
        .collect()
}

fn fold_stmt(stmt: IrStmt) -> IrStmt {
    match stmt {
        IrStmt::Block(stmts) => {
            let stmts = fold_block(stmts);
            if stmts.is_empty() {
                IrStmt::Noop
            } else {
                IrStmt::Block(stmts)
            }
        }
        IrStmt::If { condition, body } => IrStmt::If {
            condition: fold_expr(condition),
            body: fold_block(body),
        },
        IrStmt::While { condition, body } => IrStmt::While {
            condition: fold_expr(condition),
            body: fold_block(body),
        },
        IrStmt::Let { slot, ty, value } => IrStmt::Let {
            slot,
            ty,
            value: fold_expr(value),
        },
        IrStmt::Assign { slot, value } => IrStmt::Assign {
            slot,
            value: fold_expr(value),
        },
        IrStmt::IndexAssign { object, field, value } => IrStmt::IndexAssign {
            object: fold_expr(object),
            field,
            value: fold_expr(value),
        },
        IrStmt::Call { name, args } => IrStmt::Call {
            name,
            args: args.into_iter().map(fold_expr).collect(),
        },
        IrStmt::Break | IrStmt::Continue | IrStmt::Noop => stmt,
    }
}

fn fold_expr(expr: IrExpr) -> IrExpr {
    let ty = expr.ty;
    match expr.kind {
        IrExprKind::Binary { op, lhs, rhs } => fold_binop(op, fold_expr(*lhs), fold_expr(*rhs), ty),
        IrExprKind::Not(operand) => {
            let folded = fold_expr(*operand);
            match folded.kind {
                IrExprKind::Boolean(value) => IrExpr::boolean(!value),
                _ => IrExpr::not(folded),
            }
        }
        IrExprKind::Index { array, index } => IrExpr::new(
            ty,
            IrExprKind::Index {
                array: Box::new(fold_expr(*array)),
                index: Box::new(fold_expr(*index)),
            },
        ),
        IrExprKind::Call { name, args } => IrExpr::new(
            ty,
            IrExprKind::Call {
                name,
                args: args.into_iter().map(fold_expr).collect(),
            },
        ),
        IrExprKind::Array(items) => {
            IrExpr::new(ty, IrExprKind::Array(items.into_iter().map(fold_expr).collect()))
        }
        kind @ (IrExprKind::Constant(_)
        | IrExprKind::Variable(_)
        | IrExprKind::Number(_)
        | IrExprKind::String(_)
        | IrExprKind::Template(_)
        | IrExprKind::Boolean(_)) => IrExpr::new(ty, kind),
    }
}

fn fold_binop(op: BinOp, lhs: IrExpr, rhs: IrExpr, ty: Type) -> IrExpr {
    match (&lhs.kind, &rhs.kind) {
        // Number × Number
        (IrExprKind::Number(a), IrExprKind::Number(b)) => {
            if let Some(folded) = eval_number_binop(op, *a, *b) {
                return folded;
            }
        }
        // Bool × Bool
        (IrExprKind::Boolean(a), IrExprKind::Boolean(b)) => {
            let folded = match op {
                BinOp::And => Some(*a && *b),
                BinOp::Or => Some(*a || *b),
                BinOp::Eq => Some(a == b),
                BinOp::Ne => Some(a != b),
                _ => None,
            };
            if let Some(value) = folded {
                return IrExpr::boolean(value);
            }
        }
        // String × String: equality only. Concatenation is left to the
        // target's string formatting.
        (IrExprKind::String(a), IrExprKind::String(b)) => match op {
            BinOp::Eq => return IrExpr::boolean(a == b),
            BinOp::Ne => return IrExpr::boolean(a != b),
            _ => {}
        },
        _ => {}
    }
    IrExpr::binary(ty, op, lhs, rhs)
}

/// Evaluate a number operation at compile time. Division by zero and
/// results that overflow are left for the target to evaluate.
#[allow(clippy::float_cmp)]
fn eval_number_binop(op: BinOp, a: f64, b: f64) -> Option<IrExpr> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div if b == 0.0 => return None,
        BinOp::Div => a / b,
        BinOp::Eq => return Some(IrExpr::boolean(a == b)),
        BinOp::Ne => return Some(IrExpr::boolean(a != b)),
        BinOp::Lt => return Some(IrExpr::boolean(a < b)),
        BinOp::Le => return Some(IrExpr::boolean(a <= b)),
        BinOp::Gt => return Some(IrExpr::boolean(a > b)),
        BinOp::Ge => return Some(IrExpr::boolean(a >= b)),
        BinOp::And | BinOp::Or => return None,
    };
    value.is_finite().then(|| IrExpr::number(value))
}
