//! Scope stack and storage-slot interner used by the analyzer.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::trace;

use super::ast::Span;
use super::error::CompileError;
use super::ir::{IrStmt, Slot};
use super::types::Type;

/// What a scope was opened for. `break`, `continue` and `return` search
/// outward for the nearest matching tag.
#[derive(Debug, Clone)]
pub enum ScopeKind {
    Block,
    /// Loop body. `step` is the increment of a desugared `for`, re-emitted
    /// before every `continue`.
    Loop { step: Option<IrStmt> },
    /// Inlined function body. Variable and type lookups stop here.
    Function {
        name: String,
        ret: Option<(Slot, Type)>,
    },
}

#[derive(Debug, Clone)]
pub enum BindingValue {
    Slot(Slot),
    /// Target text, used for event arguments.
    Constant(String),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub ty: Type,
    pub mutable: bool,
    pub value: BindingValue,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub variables: HashMap<String, Binding>,
    pub types: HashMap<String, Type>,
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            variables: HashMap::new(),
            types: HashMap::new(),
        });
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Number of open scopes; the nesting depth used for slot interning.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> Option<&Scope> {
        self.scopes.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Scope> {
        self.scopes.last_mut()
    }

    /// True if `name` is bound in the innermost scope.
    pub fn declared_here(&self, name: &str) -> bool {
        self.current().is_some_and(|s| s.variables.contains_key(name))
    }

    pub fn declare(&mut self, name: impl Into<String>, binding: Binding) {
        if let Some(scope) = self.current_mut() {
            scope.variables.insert(name.into(), binding);
        }
    }

    pub fn declare_type(&mut self, name: impl Into<String>, ty: Type) {
        if let Some(scope) = self.current_mut() {
            scope.types.insert(name.into(), ty);
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Binding> {
        self.visible().find_map(|s| s.variables.get(name))
    }

    pub fn type_named(&self, name: &str) -> Option<&Type> {
        self.visible().find_map(|s| s.types.get(name))
    }

    /// Innermost loop, not crossing a function boundary. Yields the loop's
    /// step statement, if any.
    pub fn enclosing_loop(&self) -> Option<Option<&IrStmt>> {
        for scope in self.scopes.iter().rev() {
            match &scope.kind {
                ScopeKind::Loop { step } => return Some(step.as_ref()),
                ScopeKind::Function { .. } => return None,
                ScopeKind::Block => {}
            }
        }
        None
    }

    /// Innermost inlined function: its name and return slot.
    pub fn enclosing_function(&self) -> Option<(&str, Option<&(Slot, Type)>)> {
        self.scopes.iter().rev().find_map(|scope| match &scope.kind {
            ScopeKind::Function { name, ret } => Some((name.as_str(), ret.as_ref())),
            _ => None,
        })
    }

    /// Scopes visible from the innermost one, innermost first, up to and
    /// including the nearest function scope.
    fn visible(&self) -> impl Iterator<Item = &Scope> {
        let barrier = self
            .scopes
            .iter()
            .rposition(|s| matches!(s.kind, ScopeKind::Function { .. }))
            .unwrap_or(0);
        self.scopes.iter().skip(barrier).rev()
    }
}

/// Assigns storage slots: one per `(name, depth)` pair, plus one fresh slot
/// per hidden temporary.
#[derive(Debug)]
pub struct SlotInterner {
    slots: IndexMap<(String, usize), Slot>,
    hidden: usize,
    max: usize,
}

impl SlotInterner {
    pub fn new(max: usize) -> Self {
        Self {
            slots: IndexMap::new(),
            hidden: 0,
            max,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn intern(&mut self, name: &str, depth: usize, span: Span) -> Result<Slot, CompileError> {
        if let Some(slot) = self.slots.get(&(name.to_string(), depth)) {
            return Ok(*slot);
        }
        self.allocate((name.to_string(), depth), span)
    }

    /// A slot no other name shares, such as a return value or a saved
    /// condition.
    pub fn fresh(&mut self, label: &str, span: Span) -> Result<Slot, CompileError> {
        self.hidden += 1;
        // Hidden keys use a depth no real scope reaches.
        self.allocate((format!("{label}#{}", self.hidden), usize::MAX), span)
    }

    fn allocate(&mut self, key: (String, usize), span: Span) -> Result<Slot, CompileError> {
        let index = self.slots.len();
        let too_many = || {
            CompileError::capacity(
                format!("Too many variables: limit of {} slots", self.max),
                span,
            )
        };
        if index >= self.max {
            return Err(too_many());
        }
        let slot = Slot(u32::try_from(index).map_err(|_| too_many())?);
        trace!(name = %key.0, depth = key.1, slot = slot.0, "allocated slot");
        self.slots.insert(key, slot);
        Ok(slot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn number(slot: u32) -> Binding {
        Binding {
            ty: Type::number(),
            mutable: true,
            value: BindingValue::Slot(Slot(slot)),
        }
    }

    #[test]
    fn interning_is_per_name_and_depth() {
        let mut slots = SlotInterner::new(10);
        let a = slots.intern("x", 1, Span::default()).unwrap();
        let b = slots.intern("x", 1, Span::default()).unwrap();
        let c = slots.intern("x", 2, Span::default()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(slots.fresh("__returnval__", Span::default()).unwrap(), a);
        assert_eq!(slots.len(), 3);
    }

    #[test]
    fn interner_is_capped() {
        let mut slots = SlotInterner::new(2);
        slots.intern("a", 1, Span::default()).unwrap();
        slots.fresh("tmp", Span::default()).unwrap();
        let err = slots.intern("b", 1, Span::new(4, 5)).unwrap_err();
        assert_eq!(err.kind, crate::compiler::error::ErrorKind::Capacity);
        assert_eq!(err.message, "Too many variables: limit of 2 slots");
        // Existing names still resolve once the cap is reached.
        assert!(slots.intern("a", 1, Span::default()).is_ok());
    }

    #[test]
    fn lookups_stop_at_function_boundary() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Block);
        scopes.declare("outer", number(0));
        scopes.push(ScopeKind::Loop { step: None });
        assert!(scopes.variable("outer").is_some());
        assert!(scopes.enclosing_loop().is_some());

        scopes.push(ScopeKind::Function { name: "f".into(), ret: None });
        scopes.declare("param", number(1));
        scopes.push(ScopeKind::Block);
        assert!(scopes.variable("outer").is_none());
        assert!(scopes.variable("param").is_some());
        assert!(scopes.enclosing_loop().is_none());
        assert_eq!(scopes.enclosing_function().unwrap().0, "f");

        scopes.pop();
        scopes.pop();
        assert!(scopes.variable("outer").is_some());
        assert!(scopes.enclosing_function().is_none());
    }

    #[test]
    fn redeclaration_is_per_scope() {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Block);
        scopes.declare("x", number(0));
        assert!(scopes.declared_here("x"));
        scopes.push(ScopeKind::Block);
        assert!(!scopes.declared_here("x"));
    }
}
