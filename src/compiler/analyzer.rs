use std::collections::HashMap;
use std::mem;

use tracing::{debug, trace};

use super::ast::*;
use super::builtins::{self, BuiltinFn};
use super::error::CompileError;
use super::ir::{IrEvent, IrExpr, IrExprKind, IrStmt, Slot};
use super::scope::{Binding, BindingValue, ScopeKind, ScopeStack, SlotInterner};
use super::types::{SolveError, Type, TypeSolver};
use crate::options::Options;

const RETURN_SLOT: &str = "__returnval__";
const CONDITION_SLOT: &str = "__condition__";

/// Type-check a program and lower every event to IR.
pub fn analyze(program: &Program, options: &Options) -> Result<Vec<IrEvent>, CompileError> {
    let mut analyzer = Analyzer::new(options);
    analyzer.collect(program)?;

    let mut events = Vec::new();
    for item in &program.items {
        if let Item::Event(event) = item {
            events.push(analyzer.analyze_event(event)?);
        }
    }
    debug!(
        events = events.len(),
        slots = analyzer.slots.len(),
        "analyzed program"
    );
    Ok(events)
}

struct Analyzer<'a> {
    options: &'a Options,
    functions: HashMap<&'a str, &'a FunctionDecl>,
    aliases: HashMap<&'a str, &'a TypeDecl>,
    scopes: ScopeStack,
    slots: SlotInterner,
    /// Functions currently being inlined, outermost first.
    inlining: Vec<String>,
    /// Aliases currently being expanded, to catch cycles.
    expanding: Vec<String>,
    /// Statements that must run before the statement being analyzed:
    /// inlined function bodies and their parameter bindings.
    prelude: Vec<IrStmt>,
}

impl<'a> Analyzer<'a> {
    fn new(options: &'a Options) -> Self {
        Self {
            options,
            functions: HashMap::new(),
            aliases: HashMap::new(),
            scopes: ScopeStack::new(),
            slots: SlotInterner::new(options.max_slots),
            inlining: Vec::new(),
            expanding: Vec::new(),
            prelude: Vec::new(),
        }
    }

    // ── Declarations ────────────────────────────────────────────

    fn collect(&mut self, program: &'a Program) -> Result<(), CompileError> {
        for item in &program.items {
            match item {
                Item::Function(decl) => {
                    if self.functions.insert(&decl.name, decl).is_some() {
                        return Err(CompileError::scope(
                            format!("Function {} is already declared", decl.name),
                            decl.span,
                        ));
                    }
                }
                Item::Type(decl) => {
                    if self.aliases.insert(&decl.name, decl).is_some() {
                        return Err(CompileError::scope(
                            format!("Type {} is already declared", decl.name),
                            decl.span,
                        ));
                    }
                }
                Item::Event(_) => {}
            }
        }
        debug!(
            functions = self.functions.len(),
            aliases = self.aliases.len(),
            "collected declarations"
        );
        Ok(())
    }

    fn analyze_event(&mut self, event: &EventDecl) -> Result<IrEvent, CompileError> {
        let def = builtins::lookup_event(&event.name).ok_or_else(|| {
            CompileError::scope(format!("Event {} does not exist.", event.name), event.span)
        })?;
        if event.args.len() != def.args.len() {
            return Err(CompileError::type_error(
                format!("Event {} has {} arguments.", event.name, def.args.len()),
                event.span,
            ));
        }

        let body = self.in_scope(ScopeKind::Block, |this| {
            for (name, (ty, target)) in event.args.iter().zip(def.args) {
                if this.scopes.declared_here(name) {
                    return Err(CompileError::scope(
                        format!("Cannot redeclare existing variable {name}"),
                        event.span,
                    ));
                }
                let ty = registry_type(ty, event.span)?;
                this.scopes.declare(
                    name.as_str(),
                    Binding {
                        ty,
                        mutable: false,
                        value: BindingValue::Constant((*target).to_string()),
                    },
                );
            }
            this.analyze_stmts(&event.body)
        })?;

        debug!(event = %event.name, statements = IrStmt::count(&body), "analyzed event");
        Ok(IrEvent {
            name: event.name.clone(),
            trigger: def.ow.to_string(),
            body,
        })
    }

    // ── Scopes ──────────────────────────────────────────────────

    fn in_scope<T>(
        &mut self,
        kind: ScopeKind,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        self.scopes.push(kind);
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn declare_slot(
        &mut self,
        name: &str,
        ty: Type,
        mutable: bool,
        span: Span,
    ) -> Result<Slot, CompileError> {
        let slot = self.slots.intern(name, self.scopes.depth(), span)?;
        self.scopes.declare(
            name,
            Binding {
                ty,
                mutable,
                value: BindingValue::Slot(slot),
            },
        );
        Ok(slot)
    }

    // ── Types ───────────────────────────────────────────────────

    fn resolve_type(&mut self, expr: &TypeExpr) -> Result<Type, CompileError> {
        Ok(match &expr.kind {
            TypeExprKind::Named(name) => {
                if let Some(ty) = self.scopes.type_named(name) {
                    return Ok(ty.clone());
                }
                let Some(alias) = self.aliases.get(name.as_str()).copied() else {
                    return Ok(Type::native(name.as_str()));
                };
                if self.expanding.contains(name) {
                    return Err(CompileError::type_error(
                        format!("Type {name} refers to itself"),
                        expr.span,
                    ));
                }
                self.expanding.push(name.clone());
                let resolved = self.resolve_type(&alias.ty);
                self.expanding.pop();
                resolved?
            }
            TypeExprKind::Array(item) => Type::array(self.resolve_type(item)?),
            TypeExprKind::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.resolve_type(p))
                    .collect::<Result<_, _>>()?;
                let ret = ret.as_deref().map(|r| self.resolve_type(r)).transpose()?;
                Type::function(params, ret)
            }
            TypeExprKind::Variadic(inner) => Type::variadic(self.resolve_type(inner)?),
            TypeExprKind::Union(members) => Type::Union(
                members
                    .iter()
                    .map(|m| self.resolve_type(m))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    // ── Statements ──────────────────────────────────────────────

    fn analyze_stmts(&mut self, stmts: &[Stmt]) -> Result<Vec<IrStmt>, CompileError> {
        stmts.iter().map(|s| self.analyze_stmt(s)).collect()
    }

    fn analyze_block(&mut self, stmts: &[Stmt], kind: ScopeKind) -> Result<Vec<IrStmt>, CompileError> {
        self.in_scope(kind, |this| this.analyze_stmts(stmts))
    }

    /// Lower one statement, placing any prelude its expressions produced in
    /// front of it.
    fn analyze_stmt(&mut self, stmt: &Stmt) -> Result<IrStmt, CompileError> {
        let outer = mem::take(&mut self.prelude);
        let lowered = self.lower_stmt(stmt);
        let mut prelude = mem::replace(&mut self.prelude, outer);
        let lowered = lowered?;
        if prelude.is_empty() {
            return Ok(lowered);
        }
        prelude.push(lowered);
        Ok(IrStmt::Block(prelude))
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<IrStmt, CompileError> {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Block(stmts) => Ok(IrStmt::Block(self.analyze_block(stmts, ScopeKind::Block)?)),

            StmtKind::Let { name, ty, value, constant } => {
                self.lower_let(name, ty.as_ref(), value.as_ref(), *constant, span)
            }

            StmtKind::Assign { name, value } => {
                let Some(binding) = self.scopes.variable(name).cloned() else {
                    return Err(CompileError::scope(
                        format!("Variable {name} has not been declared. Maybe you meant let {name}?"),
                        span,
                    ));
                };
                let slot = match binding.value {
                    BindingValue::Slot(slot) if binding.mutable => slot,
                    _ => {
                        return Err(CompileError::type_error(
                            format!("Cannot assign to constant {name}"),
                            span,
                        ))
                    }
                };
                let value = self.analyze_expr(value)?;
                if !self.satisfies(&binding.ty, &value.ty, span)? {
                    return Err(CompileError::type_error(
                        format!(
                            "Cannot assign expression of type {} to variable {name} of type {}",
                            value.ty, binding.ty
                        ),
                        span,
                    ));
                }
                Ok(IrStmt::Assign { slot, value })
            }

            StmtKind::IndexAssign { object, field, value } => {
                let object = self.analyze_expr(object)?;
                if !self.satisfies(&Type::native("player"), &object.ty, span)? {
                    return Err(CompileError::type_error(
                        format!("Cannot assign field .{field} on non-player type {}", object.ty),
                        span,
                    ));
                }
                let value = self.analyze_expr(value)?;
                Ok(IrStmt::IndexAssign {
                    object,
                    field: field.clone(),
                    value,
                })
            }

            StmtKind::If { condition, body, else_body } => {
                let condition = self.analyze_condition(condition, "if")?;
                let Some(else_body) = else_body else {
                    let body = self.analyze_block(body, ScopeKind::Block)?;
                    return Ok(IrStmt::If { condition, body });
                };

                // Both branches test the condition; save it first so the
                // then-branch cannot change which way the else-branch goes.
                let mut lowered = Vec::new();
                let condition = if is_literal(&condition) {
                    condition
                } else {
                    let slot = self.slots.fresh(CONDITION_SLOT, span)?;
                    lowered.push(IrStmt::Let {
                        slot,
                        ty: Type::boolean(),
                        value: condition,
                    });
                    IrExpr::variable(Type::boolean(), slot)
                };
                let then_body = self.analyze_block(body, ScopeKind::Block)?;
                let else_body = self.analyze_block(else_body, ScopeKind::Block)?;
                lowered.push(IrStmt::If {
                    condition: condition.clone(),
                    body: then_body,
                });
                lowered.push(IrStmt::If {
                    condition: IrExpr::not(condition),
                    body: else_body,
                });
                Ok(IrStmt::Block(lowered))
            }

            StmtKind::While { condition, body } => {
                let outer = mem::take(&mut self.prelude);
                let condition = self.analyze_condition(condition, "while");
                let check = mem::replace(&mut self.prelude, outer);
                let condition = condition?;
                let body = self.analyze_block(body, ScopeKind::Loop { step: None })?;
                Ok(lower_loop(condition, check, body))
            }

            StmtKind::For { marker, start, end, body } => {
                self.in_scope(ScopeKind::Block, |this| this.lower_for(marker, start, end, body, span))
            }

            StmtKind::Return(value) => {
                let Some((function, ret)) = self.scopes.enclosing_function() else {
                    return Err(CompileError::scope("Cannot return outside of a function", span));
                };
                let function = function.to_string();
                let ret = ret.cloned();
                let Some(value) = value else {
                    return Ok(IrStmt::Noop);
                };
                let Some((slot, ret_ty)) = ret else {
                    return Err(CompileError::type_error(
                        format!("Function {function} has no return type"),
                        span,
                    ));
                };
                let value = self.analyze_expr(value)?;
                if !self.satisfies(&ret_ty, &value.ty, span)? {
                    return Err(CompileError::type_error(
                        format!(
                            "Function {function} returns {ret_ty} but was given {}",
                            value.ty
                        ),
                        span,
                    ));
                }
                Ok(IrStmt::Assign { slot, value })
            }

            StmtKind::Break => match self.scopes.enclosing_loop() {
                Some(_) => Ok(IrStmt::Break),
                None => Err(CompileError::scope("Cannot break outside of a loop", span)),
            },

            StmtKind::Continue => match self.scopes.enclosing_loop() {
                Some(Some(step)) => Ok(IrStmt::Block(vec![step.clone(), IrStmt::Continue])),
                Some(None) => Ok(IrStmt::Continue),
                None => Err(CompileError::scope("Cannot continue outside of a loop", span)),
            },

            StmtKind::Call { name, args } => {
                if let Some(decl) = self.functions.get(name.as_str()).copied() {
                    self.inline_call(decl, args, span, false)?;
                    return Ok(IrStmt::Noop);
                }
                if let Some(def) = builtins::lookup_function(name) {
                    let (args, _) = self.builtin_args(def, args, span)?;
                    return Ok(IrStmt::Call {
                        name: def.ow.to_string(),
                        args,
                    });
                }
                Err(self.no_such_function(name, args, span))
            }
        }
    }

    fn lower_let(
        &mut self,
        name: &str,
        ty: Option<&TypeExpr>,
        value: Option<&Expr>,
        constant: bool,
        span: Span,
    ) -> Result<IrStmt, CompileError> {
        if self.scopes.declared_here(name) {
            return Err(CompileError::scope(
                format!("Cannot redeclare existing variable {name}"),
                span,
            ));
        }
        if constant && value.is_none() {
            return Err(CompileError::type_error(
                format!("Constant {name} must be initialized"),
                span,
            ));
        }

        let declared = ty.map(|t| self.resolve_type(t)).transpose()?;
        let value = value.map(|v| self.analyze_expr(v)).transpose()?;
        let ty = match (declared, &value) {
            (None, None) => {
                return Err(CompileError::type_error(
                    "Cannot declare variable without type annotation or expression",
                    span,
                ))
            }
            (Some(declared), Some(value)) => {
                if !self.satisfies(&declared, &value.ty, span)? {
                    return Err(CompileError::type_error(
                        format!(
                            "Declaration annotated as type {declared} given expression of type {}",
                            value.ty
                        ),
                        span,
                    ));
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(value)) => value.ty.clone(),
        };

        let slot = self.declare_slot(name, ty.clone(), !constant, span)?;
        Ok(match value {
            Some(value) => IrStmt::Let { slot, ty, value },
            None => IrStmt::Noop,
        })
    }

    /// `for i in a..b { body }` becomes
    /// `let i = a; while i < b { body; i = i + 1 }`.
    fn lower_for(
        &mut self,
        marker: &str,
        start: &Expr,
        end: &Expr,
        body: &[Stmt],
        span: Span,
    ) -> Result<IrStmt, CompileError> {
        let start = self.analyze_expr(start)?;
        let outer = mem::take(&mut self.prelude);
        let end = self.analyze_expr(end);
        let check = mem::replace(&mut self.prelude, outer);
        let end = end?;
        for bound in [&start, &end] {
            if !bound.ty.is_native("number") {
                return Err(CompileError::type_error(
                    format!("For loop bounds must be numbers, got {}", bound.ty),
                    span,
                ));
            }
        }

        let slot = self.declare_slot(marker, Type::number(), true, span)?;
        let counter = IrExpr::variable(Type::number(), slot);
        let condition = IrExpr::binary(Type::boolean(), BinOp::Lt, counter.clone(), end);
        let step = IrStmt::Assign {
            slot,
            value: IrExpr::binary(Type::number(), BinOp::Add, counter, IrExpr::number(1.0)),
        };

        let mut body = self.analyze_block(body, ScopeKind::Loop { step: Some(step.clone()) })?;
        body.push(step);
        Ok(IrStmt::Block(vec![
            IrStmt::Let {
                slot,
                ty: Type::number(),
                value: start,
            },
            lower_loop(condition, check, body),
        ]))
    }

    // ── Expressions ─────────────────────────────────────────────

    fn analyze_condition(&mut self, expr: &Expr, construct: &str) -> Result<IrExpr, CompileError> {
        let condition = self.analyze_expr(expr)?;
        if !condition.ty.is_native("boolean") {
            return Err(CompileError::type_error(
                format!("Condition of {construct} must be boolean, got {}", condition.ty),
                expr.span,
            ));
        }
        Ok(condition)
    }

    fn analyze_expr(&mut self, expr: &Expr) -> Result<IrExpr, CompileError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Number(value) => Ok(IrExpr::number(*value)),
            ExprKind::String(value) => {
                // The target reads `{0}` inside any string as a placeholder.
                if value.contains(|c: char| c == '{' || c == '}') {
                    return Err(CompileError::type_error(
                        format!("String literal \"{value}\" cannot contain braces; use format to insert values"),
                        span,
                    ));
                }
                Ok(IrExpr::string(value.as_str()))
            }
            ExprKind::Boolean(value) => Ok(IrExpr::boolean(*value)),

            ExprKind::Ident(name) => {
                if let Some(binding) = self.scopes.variable(name) {
                    return Ok(match &binding.value {
                        BindingValue::Slot(slot) => IrExpr::variable(binding.ty.clone(), *slot),
                        BindingValue::Constant(text) => {
                            IrExpr::constant(binding.ty.clone(), text.as_str())
                        }
                    });
                }
                if let Some(constant) = builtins::lookup_constant(name) {
                    return Ok(IrExpr::constant(registry_type(constant.ty, span)?, constant.ow));
                }
                Err(CompileError::scope(format!("Undefined identifier {name}"), span))
            }

            ExprKind::Array { item, items } => {
                let explicit = item.as_ref().map(|t| self.resolve_type(t)).transpose()?;
                let items = items
                    .iter()
                    .map(|i| self.analyze_expr(i))
                    .collect::<Result<Vec<_>, _>>()?;
                let item_ty = match (explicit, items.first()) {
                    (Some(ty), _) => ty,
                    (None, Some(first)) => first.ty.clone(),
                    (None, None) => {
                        return Err(CompileError::type_error("Cannot infer type of empty array", span))
                    }
                };
                let mut solver = TypeSolver::new();
                for element in &items {
                    if !solve(&mut solver, &item_ty, &element.ty, span)? {
                        return Err(CompileError::type_error(
                            format!(
                                "Array element of type {} does not match item type {item_ty}",
                                element.ty
                            ),
                            span,
                        ));
                    }
                }
                Ok(IrExpr::new(Type::array(item_ty), IrExprKind::Array(items)))
            }

            ExprKind::Binary { op, left, right } => {
                let lhs = self.analyze_expr(left)?;
                let rhs = self.analyze_expr(right)?;
                self.analyze_binary(*op, lhs, rhs, span)
            }

            ExprKind::Not(operand) => {
                let operand = self.analyze_expr(operand)?;
                if !operand.ty.is_native("boolean") {
                    return Err(CompileError::type_error(
                        format!("Operator ! requires a boolean, got {}", operand.ty),
                        span,
                    ));
                }
                Ok(IrExpr::not(operand))
            }

            ExprKind::TypeOf(operand) => {
                // Only the static type is used; nothing the operand would
                // have run is kept.
                let outer = mem::take(&mut self.prelude);
                let operand = self.analyze_expr(operand);
                self.prelude = outer;
                Ok(IrExpr::string(operand?.ty.to_string()))
            }

            ExprKind::Index { object, index } => {
                let array = self.analyze_expr(object)?;
                let Some(item) = array.ty.item().cloned() else {
                    return Err(CompileError::type_error(
                        format!("Cannot index non-array type {}", array.ty),
                        span,
                    ));
                };
                let index = self.analyze_expr(index)?;
                if !index.ty.is_native("number") {
                    return Err(CompileError::type_error(
                        "Can only index an array with a number",
                        span,
                    ));
                }
                Ok(IrExpr::new(
                    item,
                    IrExprKind::Index {
                        array: Box::new(array),
                        index: Box::new(index),
                    },
                ))
            }

            ExprKind::Call { name, args } => {
                if let Some(decl) = self.functions.get(name.as_str()).copied() {
                    return self
                        .inline_call(decl, args, span, true)?
                        .ok_or_else(|| no_return_value(name, span));
                }
                if let Some(def) = builtins::lookup_function(name) {
                    let (args, ret) = self.builtin_args(def, args, span)?;
                    let ret = ret.ok_or_else(|| no_return_value(name, span))?;
                    return Ok(IrExpr::new(
                        ret,
                        IrExprKind::Call {
                            name: def.ow.to_string(),
                            args,
                        },
                    ));
                }
                Err(self.no_such_function(name, args, span))
            }
        }
    }

    fn analyze_binary(
        &mut self,
        op: BinOp,
        lhs: IrExpr,
        rhs: IrExpr,
        span: Span,
    ) -> Result<IrExpr, CompileError> {
        let symbol = op.symbol();
        let ty = match op {
            BinOp::Add => {
                if lhs.ty != rhs.ty {
                    return Err(CompileError::type_error(
                        format!(
                            "Cannot perform {symbol} operation on expressions of differing types ({} and {})",
                            lhs.ty, rhs.ty
                        ),
                        span,
                    ));
                }
                if !lhs.ty.is_native("number") && !lhs.ty.is_native("string") {
                    return Err(CompileError::type_error(
                        format!("Cannot perform {symbol} operation on type {}", lhs.ty),
                        span,
                    ));
                }
                lhs.ty.clone()
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if !lhs.ty.is_native("number") || !rhs.ty.is_native("number") {
                    return Err(CompileError::type_error(
                        format!(
                            "Cannot perform {symbol} operation on types {} and {}",
                            lhs.ty, rhs.ty
                        ),
                        span,
                    ));
                }
                Type::number()
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let mut solver = TypeSolver::new();
                let comparable = solve(&mut solver, &lhs.ty, &rhs.ty, span)?
                    && solve(&mut solver, &rhs.ty, &lhs.ty, span)?;
                if !comparable {
                    return Err(CompileError::type_error(
                        format!("Cannot compare {} with {} using {symbol}", lhs.ty, rhs.ty),
                        span,
                    ));
                }
                Type::boolean()
            }
            BinOp::And | BinOp::Or => {
                if !lhs.ty.is_native("boolean") || !rhs.ty.is_native("boolean") {
                    return Err(CompileError::type_error(
                        format!(
                            "Cannot perform {symbol} operation on types {} and {}",
                            lhs.ty, rhs.ty
                        ),
                        span,
                    ));
                }
                Type::boolean()
            }
        };
        Ok(IrExpr::binary(ty, op, lhs, rhs))
    }

    // ── Calls ───────────────────────────────────────────────────

    /// Check builtin arguments positionally, filling omitted trailing
    /// arguments from their defaults.
    fn builtin_args(
        &mut self,
        def: &BuiltinFn,
        args: &[Expr],
        span: Span,
    ) -> Result<(Vec<IrExpr>, Option<Type>), CompileError> {
        let mut given = args.iter();
        let mut solver = TypeSolver::new();
        let mut lowered = Vec::new();
        let mut variadic = false;

        for (i, param) in def.params.iter().enumerate() {
            let ty = registry_type(param.ty, span)?;
            if matches!(ty, Type::Variadic(_)) {
                for arg in given.by_ref() {
                    let arg = self.analyze_expr(arg)?;
                    check_argument(&mut solver, def.name, i, &ty, &arg.ty, span)?;
                    lowered.push(arg);
                }
                variadic = true;
                break;
            }
            match (given.next(), param.default) {
                (Some(arg), _) if param.template => lowered.push(template(def.name, i, arg)?),
                (Some(arg), _) => {
                    let arg = self.analyze_expr(arg)?;
                    check_argument(&mut solver, def.name, i, &ty, &arg.ty, span)?;
                    lowered.push(arg);
                }
                (None, Some(default)) => lowered.push(IrExpr::constant(ty, default)),
                (None, None) => return Err(arity(def.name, def.params.len(), args.len(), span)),
            }
        }
        if !variadic && given.next().is_some() {
            return Err(arity(def.name, def.params.len(), args.len(), span));
        }

        let ret = def.ret.map(|r| registry_type(r, span)).transpose()?;
        Ok((lowered, ret))
    }

    /// Splice a user function into the prelude. Returns a read of the call's
    /// return slot when `wants_value` is set.
    fn inline_call(
        &mut self,
        decl: &'a FunctionDecl,
        args: &[Expr],
        span: Span,
        wants_value: bool,
    ) -> Result<Option<IrExpr>, CompileError> {
        if self.inlining.iter().any(|f| *f == decl.name) {
            return Err(CompileError::type_error(
                format!("Recursive call to {} is not supported", decl.name),
                span,
            ));
        }
        if self.inlining.len() >= self.options.max_inline_depth {
            return Err(CompileError::type_error(
                format!(
                    "Inlining {} exceeds the maximum depth of {}",
                    decl.name, self.options.max_inline_depth
                ),
                span,
            ));
        }
        if wants_value && decl.ret.is_none() {
            return Err(no_return_value(&decl.name, span));
        }
        if args.len() != decl.params.len() {
            return Err(arity(&decl.name, decl.params.len(), args.len(), span));
        }

        // Arguments see the caller's variables, so they are lowered before
        // the function scope opens.
        let args = args
            .iter()
            .map(|a| self.analyze_expr(a))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(function = %decl.name, depth = self.inlining.len(), "inlining call");
        self.inlining.push(decl.name.clone());
        let kind = ScopeKind::Function {
            name: decl.name.clone(),
            ret: None,
        };
        let result = self.in_scope(kind, |this| this.inline_body(decl, args, span));
        self.inlining.pop();

        let (body, ret) = result?;
        self.prelude.push(IrStmt::Block(body));
        Ok(ret.map(|(slot, ty)| IrExpr::variable(ty, slot)))
    }

    fn inline_body(
        &mut self,
        decl: &FunctionDecl,
        args: Vec<IrExpr>,
        span: Span,
    ) -> Result<(Vec<IrStmt>, Option<(Slot, Type)>), CompileError> {
        for generic in &decl.generics {
            let bound = generic
                .bound
                .as_ref()
                .map(|b| self.resolve_type(b))
                .transpose()?;
            self.scopes
                .declare_type(generic.name.as_str(), Type::generic(generic.name.as_str(), bound));
        }

        let mut solver = TypeSolver::new();
        for (i, (param, arg)) in decl.params.iter().zip(&args).enumerate() {
            let ty = self.resolve_type(&param.ty)?;
            check_argument(&mut solver, &decl.name, i, &ty, &arg.ty, span)?;
        }
        // Inferred generics become aliases for the rest of the body.
        for generic in &decl.generics {
            if let Some(bound) = solver.generic(&generic.name) {
                self.scopes.declare_type(generic.name.as_str(), bound.clone());
            }
        }

        let ret = match &decl.ret {
            Some(ret) => {
                let ty = self.resolve_type(ret)?;
                if has_generic(&ty) {
                    return Err(CompileError::type_error(
                        format!("Cannot infer return type {ty} of {}", decl.name),
                        span,
                    ));
                }
                let slot = self.slots.fresh(RETURN_SLOT, span)?;
                self.scopes.declare(
                    RETURN_SLOT,
                    Binding {
                        ty: ty.clone(),
                        mutable: false,
                        value: BindingValue::Slot(slot),
                    },
                );
                Some((slot, ty))
            }
            None => None,
        };
        if let Some(scope) = self.scopes.current_mut() {
            scope.kind = ScopeKind::Function {
                name: decl.name.clone(),
                ret: ret.clone(),
            };
        }

        let mut body = Vec::new();
        for (param, arg) in decl.params.iter().zip(args) {
            if self.scopes.declared_here(&param.name) {
                return Err(CompileError::scope(
                    format!("Cannot redeclare existing variable {}", param.name),
                    param.span,
                ));
            }
            let ty = self.resolve_type(&param.ty)?;
            let slot = self.declare_slot(&param.name, ty.clone(), false, param.span)?;
            body.push(IrStmt::Let { slot, ty, value: arg });
        }
        body.extend(self.analyze_stmts(&decl.body)?);
        Ok((body, ret))
    }

    fn no_such_function(&mut self, name: &str, args: &[Expr], span: Span) -> CompileError {
        let outer = mem::take(&mut self.prelude);
        let types: Result<Vec<String>, CompileError> = args
            .iter()
            .map(|a| self.analyze_expr(a).map(|e| e.ty.to_string()))
            .collect();
        self.prelude = outer;
        match types {
            Ok(types) => CompileError::scope(
                format!("No such function {name}({})", types.join(", ")),
                span,
            ),
            Err(err) => err,
        }
    }

    fn satisfies(&self, constraint: &Type, candidate: &Type, span: Span) -> Result<bool, CompileError> {
        solve(&mut TypeSolver::new(), constraint, candidate, span)
    }
}

// ── Helpers ─────────────────────────────────────────────────────

fn solve(
    solver: &mut TypeSolver,
    constraint: &Type,
    candidate: &Type,
    span: Span,
) -> Result<bool, CompileError> {
    solver
        .satisfies(constraint, candidate)
        .map_err(|e: SolveError| CompileError::type_error(e.to_string(), span))
}

fn check_argument(
    solver: &mut TypeSolver,
    function: &str,
    index: usize,
    expected: &Type,
    given: &Type,
    span: Span,
) -> Result<(), CompileError> {
    if solve(solver, expected, given, span)? {
        return Ok(());
    }
    Err(CompileError::type_error(
        format!(
            "Argument {} of {function} expects {expected} but was given {given}",
            index + 1
        ),
        span,
    ))
}

/// A template argument: a string literal kept verbatim, braces included.
fn template(function: &str, index: usize, arg: &Expr) -> Result<IrExpr, CompileError> {
    match &arg.kind {
        ExprKind::String(text) => Ok(IrExpr::new(
            Type::string(),
            IrExprKind::Template(text.clone()),
        )),
        _ => Err(CompileError::type_error(
            format!("Argument {} of {function} must be a string literal", index + 1),
            arg.span,
        )),
    }
}

fn arity(function: &str, expected: usize, given: usize, span: Span) -> CompileError {
    CompileError::type_error(
        format!("{function} expects {expected} arguments but was given {given}"),
        span,
    )
}

fn no_return_value(function: &str, span: Span) -> CompileError {
    CompileError::type_error(format!("Function {function} has no return value"), span)
}

fn registry_type(ty: &str, span: Span) -> Result<Type, CompileError> {
    builtins::registry_type(ty)
        .map_err(|e| CompileError::type_error(format!("Invalid built-in type {ty}: {e}"), span))
}

fn is_literal(expr: &IrExpr) -> bool {
    matches!(
        expr.kind,
        IrExprKind::Number(_) | IrExprKind::String(_) | IrExprKind::Boolean(_)
    )
}

fn has_generic(ty: &Type) -> bool {
    match ty {
        Type::Generic { .. } => true,
        Type::Native(_) => false,
        Type::Array(inner) | Type::Variadic(inner) => has_generic(inner),
        Type::Function { params, ret } => {
            params.iter().any(has_generic) || ret.as_deref().is_some_and(has_generic)
        }
        Type::Union(members) => members.iter().any(has_generic),
    }
}

/// Build a loop. When evaluating the condition needs statements of its own
/// they run at the top of every iteration.
fn lower_loop(condition: IrExpr, check: Vec<IrStmt>, body: Vec<IrStmt>) -> IrStmt {
    if check.is_empty() {
        return IrStmt::While { condition, body };
    }
    let mut looped = check;
    looped.push(IrStmt::If {
        condition: IrExpr::not(condition),
        body: vec![IrStmt::Break],
    });
    looped.extend(body);
    IrStmt::While {
        condition: IrExpr::boolean(true),
        body: looped,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::compiler::error::ErrorKind;
    use crate::compiler::lexer::lex;
    use crate::compiler::parser::parse;

    fn analyze_ok(src: &str) -> Vec<IrEvent> {
        let program = parse(lex(src).unwrap()).unwrap();
        analyze(&program, &Options::default()).unwrap()
    }

    fn analyze_err(src: &str) -> CompileError {
        let program = parse(lex(src).unwrap()).unwrap();
        analyze(&program, &Options::default()).unwrap_err()
    }

    /// Body of the single `server` event in `body`.
    fn server(body: &str) -> Vec<IrStmt> {
        let mut events = analyze_ok(&format!("event server() {{\n{body}\n}}"));
        assert_eq!(events.len(), 1);
        events.remove(0).body
    }

    fn server_err(body: &str) -> CompileError {
        analyze_err(&format!("event server() {{\n{body}\n}}"))
    }

    fn flatten(stmts: &[IrStmt]) -> Vec<&IrStmt> {
        let mut out = Vec::new();
        for stmt in stmts {
            match stmt {
                IrStmt::Block(inner) => out.extend(flatten(inner)),
                other => out.push(other),
            }
        }
        out
    }

    #[test]
    fn event_arguments_bind_to_target_text() {
        let events = analyze_ok(
            "event playerDied(victim, attacker, damage, crit, ability, dir) { kill(attacker) }",
        );
        assert_eq!(events[0].trigger, "Player Died");
        let IrStmt::Call { name, args } = &events[0].body[0] else {
            panic!("expected call, got {:?}", events[0].body[0]);
        };
        assert_eq!(name, "Kill");
        assert_eq!(args[0].kind, IrExprKind::Constant("Attacker".into()));
        // Omitted killer filled from its default.
        assert_eq!(args[1].kind, IrExprKind::Constant("Null".into()));
    }

    #[test]
    fn unknown_event() {
        let err = analyze_err("event nope() {}");
        assert_eq!(err.kind, ErrorKind::Scope);
        assert_eq!(err.message, "Event nope does not exist.");
    }

    #[test]
    fn event_argument_count() {
        let err = analyze_err("event client() {}");
        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(err.message, "Event client has 1 arguments.");
    }

    #[test]
    fn event_arguments_are_constant() {
        let err = analyze_err("event client(p) { p = eventPlayer() }");
        assert_eq!(err.message, "Cannot assign to constant p");
    }

    #[test]
    fn events_keep_source_order() {
        let events = analyze_ok("event server() {}\nevent client(p) {}\nevent server() {}");
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["server", "client", "server"]);
    }

    #[test]
    fn let_infers_and_checks_types() {
        let body = server("let x = 1\nlet y: number = x\nlet z: string");
        let IrStmt::Let { slot, ty, .. } = &body[0] else { panic!() };
        assert_eq!(*ty, Type::number());
        let IrStmt::Let { value, .. } = &body[1] else { panic!() };
        assert_eq!(value.kind, IrExprKind::Variable(*slot));
        assert_eq!(body[2], IrStmt::Noop);

        let err = server_err("let x: string = 1");
        assert_eq!(
            err.message,
            "Declaration annotated as type string given expression of type number"
        );
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let err = server_err("let x = 1\nlet x = 2");
        assert_eq!(err.kind, ErrorKind::Scope);
        assert_eq!(err.message, "Cannot redeclare existing variable x");
    }

    #[test]
    fn shadowing_in_nested_scope() {
        let body = server("let x = 1\n{ let x = \"a\" }");
        let IrStmt::Let { slot: outer, .. } = &body[0] else { panic!() };
        let IrStmt::Block(inner) = &body[1] else { panic!() };
        let IrStmt::Let { slot: shadow, ty, .. } = &inner[0] else { panic!() };
        assert_ne!(outer, shadow);
        assert_eq!(*ty, Type::string());
    }

    #[test]
    fn let_without_type_or_value() {
        let err = server_err("let x");
        assert_eq!(err.message, "Cannot declare variable without type annotation or expression");
    }

    #[test]
    fn assignment_rules() {
        let err = server_err("const x = 1\nx = 2");
        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(err.message, "Cannot assign to constant x");

        let err = server_err("y = 2");
        assert_eq!(err.kind, ErrorKind::Scope);
        assert_eq!(err.message, "Variable y has not been declared. Maybe you meant let y?");

        let err = server_err("let x = 1\nx = \"a\"");
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn compound_assignment() {
        let body = server("let x = 1\nx += 2");
        let IrStmt::Assign { value, .. } = &body[1] else { panic!() };
        assert!(matches!(value.kind, IrExprKind::Binary { op: BinOp::Add, .. }));
    }

    #[test]
    fn operator_rules() {
        assert_eq!(
            server_err("let x = 1 + \"a\"").message,
            "Cannot perform + operation on expressions of differing types (number and string)"
        );
        assert_eq!(server_err("let x = true + true").kind, ErrorKind::Type);
        assert_eq!(server_err("let x = \"a\" - \"b\"").kind, ErrorKind::Type);
        assert_eq!(server_err("let x = 1 && true").kind, ErrorKind::Type);
        assert_eq!(server_err("let x = !1").kind, ErrorKind::Type);
        assert_eq!(server_err("let x = 1 == \"a\"").kind, ErrorKind::Type);

        let body = server("let s = \"a\" + \"b\"\nlet c = 1 < 2");
        let IrStmt::Let { ty, .. } = &body[0] else { panic!() };
        assert_eq!(*ty, Type::string());
        let IrStmt::Let { ty, .. } = &body[1] else { panic!() };
        assert_eq!(*ty, Type::boolean());
    }

    #[test]
    fn indexing() {
        let body = server("let a = [1, 2]\nlet b = a[0]");
        let IrStmt::Let { ty, .. } = &body[1] else { panic!() };
        assert_eq!(*ty, Type::number());

        let err = server_err("let a = 1\nlet b = a[0]");
        assert_eq!(err.kind, ErrorKind::Type);
        assert_eq!(err.message, "Cannot index non-array type number");

        let err = server_err("let a = [1]\nlet b = a[\"x\"]");
        assert_eq!(err.message, "Can only index an array with a number");
    }

    #[test]
    fn array_literals() {
        let body = server("let a = <any>[1, \"x\"]");
        let IrStmt::Let { ty, .. } = &body[0] else { panic!() };
        assert_eq!(*ty, Type::array(Type::any()));

        assert_eq!(server_err("let a = []").message, "Cannot infer type of empty array");
        assert_eq!(server_err("let a = [1, \"x\"]").kind, ErrorKind::Type);
        assert!(server("let a = <number>[]").len() == 1);
    }

    #[test]
    fn typeof_is_static() {
        let body = server("let a = [1]\nlet t = typeof a");
        let IrStmt::Let { value, .. } = &body[1] else { panic!() };
        assert_eq!(value.kind, IrExprKind::String("number[]".into()));
    }

    #[test]
    fn for_desugars_to_while() {
        let body = server("for i in 0..5 { }");
        let IrStmt::Block(lowered) = &body[0] else { panic!() };
        let IrStmt::Let { slot, value, .. } = &lowered[0] else { panic!() };
        assert_eq!(value.kind, IrExprKind::Number(0.0));
        let IrStmt::While { condition, body } = &lowered[1] else { panic!() };
        let IrExprKind::Binary { op, lhs, rhs } = &condition.kind else { panic!() };
        assert_eq!(*op, BinOp::Lt);
        assert_eq!(lhs.kind, IrExprKind::Variable(*slot));
        assert_eq!(rhs.kind, IrExprKind::Number(5.0));

        let Some(IrStmt::Assign { slot: stepped, value }) = body.last() else { panic!() };
        assert_eq!(stepped, slot);
        let IrExprKind::Binary { op: BinOp::Add, rhs, .. } = &value.kind else { panic!() };
        assert_eq!(rhs.kind, IrExprKind::Number(1.0));
    }

    #[test]
    fn continue_in_for_runs_the_step() {
        let body = server("for i in 0..5 { continue }");
        let IrStmt::Block(lowered) = &body[0] else { panic!() };
        let IrStmt::While { body, .. } = &lowered[1] else { panic!() };
        let IrStmt::Block(cont) = &body[0] else { panic!() };
        assert!(matches!(cont[0], IrStmt::Assign { .. }));
        assert_eq!(cont[1], IrStmt::Continue);
    }

    #[test]
    fn continue_in_while() {
        let body = server("while true { continue }");
        let IrStmt::While { body, .. } = &body[0] else { panic!() };
        assert_eq!(body[0], IrStmt::Continue);
    }

    #[test]
    fn break_and_continue_need_a_loop() {
        let err = server_err("break");
        assert_eq!(err.kind, ErrorKind::Scope);
        assert_eq!(err.message, "Cannot break outside of a loop");
        assert_eq!(server_err("continue").message, "Cannot continue outside of a loop");
        assert_eq!(server("while true { if true { break } }").len(), 1);
    }

    #[test]
    fn loops_do_not_leak_into_functions() {
        let err = analyze_err("function f() { break }\nevent server() { while true { f() } }");
        assert_eq!(err.message, "Cannot break outside of a loop");
    }

    #[test]
    fn return_needs_a_function() {
        let err = server_err("return 1");
        assert_eq!(err.kind, ErrorKind::Scope);
        assert_eq!(err.message, "Cannot return outside of a function");
    }

    #[test]
    fn conditions_must_be_boolean() {
        assert_eq!(server_err("if 1 { }").message, "Condition of if must be boolean, got number");
        assert_eq!(server_err("while \"x\" { }").kind, ErrorKind::Type);
    }

    #[test]
    fn if_else_saves_the_condition() {
        let body = server("let x = 1\nif x < 2 { x = 3 } else { x = 4 }");
        let IrStmt::Block(lowered) = &body[1] else { panic!() };
        let IrStmt::Let { slot, ty, .. } = &lowered[0] else { panic!() };
        assert_eq!(*ty, Type::boolean());
        let IrStmt::If { condition, .. } = &lowered[1] else { panic!() };
        assert_eq!(condition.kind, IrExprKind::Variable(*slot));
        let IrStmt::If { condition, .. } = &lowered[2] else { panic!() };
        let IrExprKind::Not(inner) = &condition.kind else { panic!() };
        assert_eq!(inner.kind, IrExprKind::Variable(*slot));
    }

    #[test]
    fn if_else_on_literal_reuses_it() {
        let body = server("if true { } else { }");
        let IrStmt::Block(lowered) = &body[0] else { panic!() };
        assert_eq!(lowered.len(), 2);
    }

    #[test]
    fn undeclared_function_names_argument_types() {
        let err = server_err("foo(1, \"a\")");
        assert_eq!(err.kind, ErrorKind::Scope);
        assert_eq!(err.message, "No such function foo(number, string)");
    }

    #[test]
    fn builtin_defaults_and_unions() {
        let body = server("disableGameModeHUD(allPlayers())");
        let IrStmt::Call { name, args } = &body[0] else { panic!() };
        assert_eq!(name, "Disable Game Mode HUD");
        let IrExprKind::Call { name, args } = &args[0].kind else { panic!() };
        assert_eq!(name, "All Players");
        assert_eq!(args[0].kind, IrExprKind::Constant("All Teams".into()));

        let err = server_err("disableGameModeHUD(1)");
        assert_eq!(
            err.message,
            "Argument 1 of disableGameModeHUD expects player | player[] but was given number"
        );
        let err = server_err("disableGameModeHUD()");
        assert_eq!(err.message, "disableGameModeHUD expects 1 arguments but was given 0");
    }

    #[test]
    fn variadic_builtin() {
        let body = server("let s = format(\"{0} {1}\", 1, \"a\")\nlet t = format(\"x\")");
        let IrStmt::Let { value, .. } = &body[0] else { panic!() };
        let IrExprKind::Call { args, .. } = &value.kind else { panic!() };
        assert_eq!(args.len(), 3);
        assert_eq!(args[0].kind, IrExprKind::Template("{0} {1}".into()));
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn format_template_must_be_a_literal() {
        let err = server_err("let t = \"x\"\nlet s = format(t, 1)");
        assert_eq!(err.message, "Argument 1 of format must be a string literal");
        let err = server_err("let s = format(1)");
        assert_eq!(err.message, "Argument 1 of format must be a string literal");
    }

    #[test]
    fn plain_strings_reject_braces() {
        let err = server_err("let s = \"{0}\"");
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("cannot contain braces"));
        let err = server_err("let s = format(\"{0}\", \"}\")");
        assert!(err.message.contains("cannot contain braces"));
    }

    #[test]
    fn statement_only_builtins() {
        let err = server_err("let x = wait(1)");
        assert_eq!(err.message, "Function wait has no return value");
    }

    #[test]
    fn method_call_sugar() {
        let body = server("allPlayers().disableMessages()");
        let IrStmt::Call { name, .. } = &body[0] else { panic!() };
        assert_eq!(name, "Disable Messages");
    }

    #[test]
    fn index_assign_needs_a_player() {
        let events = analyze_ok("event client(p) { p.score = 1 }");
        assert!(matches!(events[0].body[0], IrStmt::IndexAssign { .. }));
        let err = server_err("let x = 1\nx.score = 1");
        assert_eq!(err.message, "Cannot assign field .score on non-player type number");
    }

    #[test]
    fn inlining_splices_body_before_statement() {
        let src = "function double(x: number): number { return x * 2 }\n\
                   event server() { let y = double(3) }";
        let events = analyze_ok(src);
        let IrStmt::Block(stmts) = &events[0].body[0] else { panic!() };
        let IrStmt::Block(inlined) = &stmts[0] else { panic!() };
        let IrStmt::Let { value, .. } = &inlined[0] else { panic!() };
        assert_eq!(value.kind, IrExprKind::Number(3.0));
        let IrStmt::Assign { slot: ret, .. } = &inlined[1] else { panic!() };
        let IrStmt::Let { value, ty, .. } = &stmts[1] else { panic!() };
        assert_eq!(*ty, Type::number());
        assert_eq!(value.kind, IrExprKind::Variable(*ret));
    }

    #[test]
    fn nested_calls_use_distinct_return_slots() {
        let src = "function inc(x: number): number { return x + 1 }\n\
                   event server() { let y = inc(inc(1)) }";
        let events = analyze_ok(src);
        let returns: Vec<Slot> = flatten(&events[0].body)
            .into_iter()
            .filter_map(|s| match s {
                IrStmt::Assign { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(returns.len(), 2);
        assert_ne!(returns[0], returns[1]);
    }

    #[test]
    fn functions_cannot_see_caller_locals() {
        let err = analyze_err("function f() { let y = x }\nevent server() { let x = 1\nf() }");
        assert_eq!(err.message, "Undefined identifier x");
    }

    #[test]
    fn function_arguments_are_checked() {
        let err = analyze_err("function f(x: number) { }\nevent server() { f(\"a\") }");
        assert_eq!(err.message, "Argument 1 of f expects number but was given string");
        let err = analyze_err("function f(x: number) { }\nevent server() { f() }");
        assert_eq!(err.message, "f expects 1 arguments but was given 0");
    }

    #[test]
    fn functions_without_return_type_are_statements() {
        let err = analyze_err("function f() { }\nevent server() { let y = f() }");
        assert_eq!(err.message, "Function f has no return value");
    }

    #[test]
    fn return_type_is_checked() {
        let err = analyze_err("function f(): number { return \"a\" }\nevent server() { f() }");
        assert_eq!(err.message, "Function f returns number but was given string");
    }

    #[test]
    fn generic_inference() {
        let src = "function first<T>(items: T[]): T { return items[0] }\n\
                   event server() { let a = first([\"x\"])\nlet b = first([1]) }";
        let events = analyze_ok(src);
        let lets: Vec<&Type> = events[0]
            .body
            .iter()
            .filter_map(|s| match s {
                IrStmt::Block(stmts) => stmts.last(),
                _ => None,
            })
            .filter_map(|s| match s {
                IrStmt::Let { ty, .. } => Some(ty),
                _ => None,
            })
            .collect();
        assert_eq!(lets, [&Type::string(), &Type::number()]);
    }

    #[test]
    fn generic_bounds_are_enforced() {
        let err = analyze_err(
            "function f<T: number>(x: T): T { return x }\nevent server() { let y = f(\"a\") }",
        );
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn generic_binding_is_per_call_site() {
        let src = "function id<T>(x: T): T { return x }\n\
                   event server() { let a = id(1)\nlet b = id(\"s\") }";
        assert_eq!(analyze_ok(src)[0].body.len(), 2);
    }

    #[test]
    fn recursion_is_rejected() {
        let err = analyze_err("function f() { f() }\nevent server() { f() }");
        assert_eq!(err.message, "Recursive call to f is not supported");
        let err = analyze_err("function a() { b() }\nfunction b() { a() }\nevent server() { a() }");
        assert_eq!(err.message, "Recursive call to a is not supported");
    }

    #[test]
    fn inline_depth_is_limited() {
        let src = "function a() { b() }\nfunction b() { c() }\nfunction c() { }\n\
                   event server() { a() }";
        let program = parse(lex(src).unwrap()).unwrap();
        let options = Options {
            max_inline_depth: 2,
            ..Options::default()
        };
        let err = analyze(&program, &options).unwrap_err();
        assert_eq!(err.message, "Inlining c exceeds the maximum depth of 2");
    }

    #[test]
    fn while_condition_with_call_is_reevaluated() {
        let src = "function ready(): boolean { return true }\n\
                   event server() { while ready() { wait(1) } }";
        let events = analyze_ok(src);
        let IrStmt::While { condition, body } = &events[0].body[0] else { panic!() };
        assert_eq!(condition.kind, IrExprKind::Boolean(true));
        assert!(matches!(body[0], IrStmt::Block(_)));
        let IrStmt::If { body: exit, .. } = &body[1] else { panic!() };
        assert_eq!(exit[0], IrStmt::Break);
    }

    #[test]
    fn type_aliases() {
        let body = analyze_ok("type Players = player | player[]\n\
                               function hide(p: Players) { setInvisible(p) }\n\
                               event server() { hide(allPlayers()) }");
        assert_eq!(body.len(), 1);
        let err = analyze_err("type A = A[]\nevent server() { let x: A = [] }");
        assert_eq!(err.message, "Type A refers to itself");
    }

    #[test]
    fn slot_capacity() {
        let program = parse(lex("event server() { let a = 1\nlet b = 2\nlet c = 3 }").unwrap()).unwrap();
        let options = Options {
            max_slots: 2,
            ..Options::default()
        };
        let err = analyze(&program, &options).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Capacity);
    }

    #[test]
    fn constants_resolve_from_registry() {
        let body = server("let h = HERO_LUCIO");
        let IrStmt::Let { ty, value, .. } = &body[0] else { panic!() };
        assert_eq!(*ty, Type::native("hero"));
        assert_eq!(value.kind, IrExprKind::Constant("Lúcio".into()));
        assert_eq!(server_err("let h = NOPE").message, "Undefined identifier NOPE");
    }
}
