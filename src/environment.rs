//! Chained scope store.
//!
//! Every block and every call gets its own [`Environment`] enclosing the one
//! that was active (or, for calls, the callee's closure).  Environments are
//! shared (`Rc<RefCell<_>>`): a closure holds on to the scope it was declared
//! in, and writes made through one holder are seen by every other.
//!
//! Names may be *declared* without being *initialized*; reading such a name
//! is an error until something assigns to it.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::debug;

use crate::error::RuntimeError;
use crate::value::Value;

/// Shared handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    initialized: HashSet<String>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root (global) environment.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            enclosing: Some(enclosing),
            ..Self::default()
        }
    }

    /// Wrap into a shared handle.
    pub fn shared(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope (overwriting any earlier binding) and mark it
    /// initialized.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
        self.initialized.insert(name.to_string());
    }

    /// Bind `name` in this scope to the uninitialized marker.
    pub fn declare(&mut self, name: &str) {
        self.values.insert(name.to_string(), Value::Nil);
        self.initialized.remove(name);
    }

    /// Mark a locally bound name initialized, keeping its current value.
    /// Returns whether the name is bound here.
    pub fn mark(&mut self, name: &str) -> bool {
        if self.values.contains_key(name) {
            self.initialized.insert(name.to_string());
            true
        } else {
            false
        }
    }

    /// Name-chain lookup.
    pub fn get(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        match self.read_local(name, line) {
            Some(result) => result,
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name, line),
                None => Err(undefined(name, line)),
            },
        }
    }

    /// Name-chain assignment.  Never creates a binding.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            self.mark(name);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Read `name` from the scope exactly `distance` links up the chain.
    pub fn get_at(&self, distance: usize, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if distance == 0 {
            return self
                .read_local(name, line)
                .unwrap_or_else(|| Err(undefined(name, line)));
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(distance - 1, name, line),
            None => Err(undefined(name, line)),
        }
    }

    /// Write `name` into the scope exactly `distance` links up the chain.
    pub fn assign_at(
        &mut self,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), RuntimeError> {
        if distance == 0 {
            debug!("assign_at: '{}' in local scope", name);
            self.values.insert(name.to_string(), value);
            self.initialized.insert(name.to_string());
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing
                .borrow_mut()
                .assign_at(distance - 1, name, value, line),
            None => Err(undefined(name, line)),
        }
    }

    /// `None` when the name is not bound in this scope.
    fn read_local(&self, name: &str, line: usize) -> Option<Result<Value, RuntimeError>> {
        let value = self.values.get(name)?;

        if !self.initialized.contains(name) {
            return Some(Err(RuntimeError::UninitializedVariable {
                name: name.to_string(),
                line,
            }));
        }

        Some(Ok(value.clone()))
    }
}

fn undefined(name: &str, line: usize) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.to_string(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_walks_the_chain() {
        let global = Environment::new().shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(global.clone());

        assert_eq!(inner.get("a", 1).unwrap(), Value::Number(1.0));
        assert!(matches!(
            inner.get("b", 1),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn define_shadows_without_touching_outer() {
        let global = Environment::new().shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(global.clone());
        inner.define("a", Value::Number(2.0));

        assert_eq!(inner.get("a", 1).unwrap(), Value::Number(2.0));
        assert_eq!(global.borrow().get("a", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn redefinition_in_same_scope_is_allowed() {
        let mut env = Environment::new();
        env.define("a", Value::Number(1.0));
        env.define("a", Value::Bool(true));

        assert_eq!(env.get("a", 1).unwrap(), Value::Bool(true));
    }

    #[test]
    fn assign_never_creates_bindings() {
        let mut env = Environment::new();

        assert!(matches!(
            env.assign("x", Value::Nil, 3),
            Err(RuntimeError::UndefinedVariable { line: 3, .. })
        ));
    }

    #[test]
    fn assign_updates_nearest_definition() {
        let global = Environment::new().shared();
        global.borrow_mut().define("a", Value::Number(1.0));

        let mut inner = Environment::with_enclosing(global.clone());
        inner.assign("a", Value::Number(5.0), 1).unwrap();

        assert_eq!(global.borrow().get("a", 1).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn declared_names_are_unreadable_until_assigned() {
        let mut env = Environment::new();
        env.declare("x");

        assert!(matches!(
            env.get("x", 1),
            Err(RuntimeError::UninitializedVariable { .. })
        ));

        env.assign("x", Value::Number(1.0), 1).unwrap();
        assert_eq!(env.get("x", 1).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn mark_initializes_without_changing_value() {
        let mut env = Environment::new();
        env.declare("x");

        assert!(env.mark("x"));
        assert!(!env.mark("y"));
        assert_eq!(env.get("x", 1).unwrap(), Value::Nil);
    }

    #[test]
    fn distance_addressing_skips_nearer_bindings() {
        let global = Environment::new().shared();
        global.borrow_mut().define("a", Value::String("outer".into()));

        let middle = Environment::with_enclosing(global.clone()).shared();
        let mut inner = Environment::with_enclosing(middle.clone());
        inner.define("a", Value::String("inner".into()));

        assert_eq!(
            inner.get_at(2, "a", 1).unwrap(),
            Value::String("outer".into())
        );

        inner.assign_at(2, "a", Value::Number(9.0), 1).unwrap();
        assert_eq!(global.borrow().get("a", 1).unwrap(), Value::Number(9.0));
        assert_eq!(inner.get_at(0, "a", 1).unwrap(), Value::String("inner".into()));
    }

    #[test]
    fn get_at_reports_uninitialized_slots() {
        let global = Environment::new().shared();
        global.borrow_mut().declare("x");
        let inner = Environment::with_enclosing(global.clone());

        assert!(matches!(
            inner.get_at(1, "x", 4),
            Err(RuntimeError::UninitializedVariable { line: 4, .. })
        ));
    }
}
