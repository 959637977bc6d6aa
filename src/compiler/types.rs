//! Type representation and the `satisfies` unification used by the analyzer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use super::ast::{TypeExpr, TypeExprKind};
use super::error::CompileError;
use super::{lexer, parser};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Type {
    /// Primitive (`number`, `string`, `boolean`, `any`, `never`) or an opaque
    /// target type such as `player` or `vector`.
    Native(String),
    Array(Box<Type>),
    Function {
        params: Vec<Type>,
        ret: Option<Box<Type>>,
    },
    Variadic(Box<Type>),
    Generic {
        name: String,
        bound: Option<Box<Type>>,
    },
    Union(Vec<Type>),
}

impl Type {
    pub fn native(name: impl Into<String>) -> Self {
        Type::Native(name.into())
    }

    pub fn any() -> Self {
        Self::native("any")
    }

    pub fn number() -> Self {
        Self::native("number")
    }

    pub fn string() -> Self {
        Self::native("string")
    }

    pub fn boolean() -> Self {
        Self::native("boolean")
    }

    pub fn array(item: Type) -> Self {
        Type::Array(Box::new(item))
    }

    pub fn function(params: Vec<Type>, ret: Option<Type>) -> Self {
        Type::Function {
            params,
            ret: ret.map(Box::new),
        }
    }

    pub fn variadic(inner: Type) -> Self {
        Type::Variadic(Box::new(inner))
    }

    pub fn generic(name: impl Into<String>, bound: Option<Type>) -> Self {
        Type::Generic {
            name: name.into(),
            bound: bound.map(Box::new),
        }
    }

    /// True if this is `native(name)`.
    pub fn is_native(&self, name: &str) -> bool {
        matches!(self, Type::Native(n) if n == name)
    }

    /// Item type of an array type.
    pub fn item(&self) -> Option<&Type> {
        match self {
            Type::Array(item) => Some(item),
            _ => None,
        }
    }

    /// Convert an annotation with no alias or generic context: every name
    /// becomes a native type.
    pub fn from_annotation(expr: &TypeExpr) -> Type {
        match &expr.kind {
            TypeExprKind::Named(name) => Type::native(name.as_str()),
            TypeExprKind::Array(item) => Type::array(Type::from_annotation(item)),
            TypeExprKind::Function { params, ret } => Type::function(
                params.iter().map(Type::from_annotation).collect(),
                ret.as_deref().map(Type::from_annotation),
            ),
            TypeExprKind::Variadic(inner) => Type::variadic(Type::from_annotation(inner)),
            TypeExprKind::Union(members) => {
                Type::Union(members.iter().map(Type::from_annotation).collect())
            }
        }
    }

    fn variant_tag(&self) -> u8 {
        match self {
            Type::Native(_) => 0,
            Type::Array(_) => 1,
            Type::Function { .. } => 2,
            Type::Variadic(_) => 3,
            Type::Generic { .. } => 4,
            Type::Union(_) => 5,
        }
    }
}

impl FromStr for Type {
    type Err = CompileError;

    /// Parse source type syntax such as `player | player[]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens = lexer::lex(s)?;
        let expr = parser::parse_type(tokens)?;
        Ok(Type::from_annotation(&expr))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Native(name) => write!(f, "{name}"),
            Type::Array(item) => match item.as_ref() {
                Type::Union(_) | Type::Function { .. } => write!(f, "({item})[]"),
                _ => write!(f, "{item}[]"),
            },
            Type::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ")")?;
                if let Some(ret) = ret {
                    write!(f, ": {ret}")?;
                }
                Ok(())
            }
            Type::Variadic(inner) => write!(f, "...{inner}"),
            Type::Generic { name, bound: Some(bound) } => write!(f, "<{name}: {bound}>"),
            Type::Generic { name, bound: None } => write!(f, "<{name}>"),
            Type::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("Undefined generic {0} while solving")]
    UndefinedGeneric(String),
}

/// Unification context: generic name -> bound type.
///
/// Bindings are one-shot. Once `T` is bound it stays bound for the lifetime
/// of the solver, so callers create one solver per call site or check.
#[derive(Debug, Default)]
pub struct TypeSolver {
    generics: HashMap<String, Type>,
}

impl TypeSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generic(&self, name: &str) -> Option<&Type> {
        self.generics.get(name)
    }

    pub fn set_generic(&mut self, name: impl Into<String>, ty: Type) {
        self.generics.insert(name.into(), ty);
    }

    /// Does `candidate` meet `constraint`?
    ///
    /// May bind generics in `constraint` as a side effect.
    pub fn satisfies(&mut self, constraint: &Type, candidate: &Type) -> Result<bool, SolveError> {
        if constraint.is_native("any") {
            return Ok(true);
        }

        match (constraint, candidate) {
            (
                Type::Function { params: c_params, ret: c_ret },
                Type::Function { params: k_params, ret: k_ret },
            ) => {
                // Both parameter lists are walked, so arity must match exactly.
                for (i, c_param) in c_params.iter().enumerate() {
                    match k_params.get(i) {
                        Some(k_param) if self.satisfies(c_param, k_param)? => {}
                        _ => return Ok(false),
                    }
                }
                for (i, k_param) in k_params.iter().enumerate() {
                    match c_params.get(i) {
                        Some(c_param) if self.satisfies(c_param, k_param)? => {}
                        _ => return Ok(false),
                    }
                }
                match (c_ret, k_ret) {
                    (None, None) => Ok(true),
                    (Some(c_ret), Some(k_ret)) => self.satisfies(c_ret, k_ret),
                    _ => Ok(false),
                }
            }
            (Type::Variadic(inner), _) => self.satisfies(inner, candidate),
            (Type::Array(c_item), Type::Array(k_item)) => self.satisfies(c_item, k_item),
            (
                Type::Generic { name, bound },
                Type::Generic { name: k_name, bound: k_bound },
            ) => {
                if name != k_name {
                    return Ok(false);
                }
                if let Some(bound) = bound {
                    let bound_to = self
                        .generics
                        .get(k_name)
                        .cloned()
                        .ok_or_else(|| SolveError::UndefinedGeneric(k_name.clone()))?;
                    if !self.satisfies(bound, &bound_to)? {
                        return Ok(false);
                    }
                }
                if let Some(k_bound) = k_bound {
                    let bound_to = self
                        .generics
                        .get(name)
                        .cloned()
                        .ok_or_else(|| SolveError::UndefinedGeneric(name.clone()))?;
                    if !self.satisfies(k_bound, &bound_to)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Type::Generic { name, bound }, _) => {
                if let Some(bound_to) = self.generics.get(name).cloned() {
                    return self.satisfies(&bound_to, candidate);
                }
                if let Some(bound) = bound {
                    if !self.satisfies(bound, candidate)? {
                        return Ok(false);
                    }
                }
                self.generics.insert(name.clone(), candidate.clone());
                Ok(true)
            }
            (Type::Union(members), Type::Union(k_members)) => {
                for k_member in k_members {
                    if !self.any_satisfies(members, k_member)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Type::Union(members), _) => self.any_satisfies(members, candidate),
            (Type::Native(c_name), Type::Native(k_name)) => Ok(c_name == k_name),
            _ => Ok(constraint.variant_tag() == candidate.variant_tag()),
        }
    }

    fn any_satisfies(&mut self, members: &[Type], candidate: &Type) -> Result<bool, SolveError> {
        for member in members {
            if self.satisfies(member, candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
