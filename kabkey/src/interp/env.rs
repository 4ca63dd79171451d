//! Environment for variable bindings

use super::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared reference to an environment
pub type EnvRef = Rc<RefCell<Environment>>;

/// Name-to-value bindings with an optional enclosing scope
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    /// Lexical parent; lookups that miss here continue there
    parent: Option<EnvRef>,
}

impl Environment {
    /// Create a new top-level environment
    pub fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    /// Create a new environment enclosed by `parent`
    pub fn with_parent(parent: EnvRef) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(parent),
        }
    }

    /// Wrap in Rc<RefCell<>>
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Bind `name` in this scope, shadowing any outer binding
    pub fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    /// Look up a name, walking outward through enclosing scopes
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.get(name) {
            return Some(value.clone());
        }
        let mut next = self.parent.clone();
        while let Some(scope_ref) = next {
            let scope = scope_ref.borrow();
            if let Some(value) = scope.bindings.get(name) {
                return Some(value.clone());
            }
            next = scope.parent.clone();
        }
        None
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a child environment from a parent reference
pub fn child_env(parent: &EnvRef) -> EnvRef {
    Environment::with_parent(Rc::clone(parent)).into_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut env = Environment::new();
        env.define("x".to_string(), Value::Integer(42));
        assert_eq!(env.get("x"), Some(Value::Integer(42)));
        assert_eq!(env.get("y"), None);
    }

    #[test]
    fn test_scope_chain() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().define("x".to_string(), Value::Integer(1));

        let child = child_env(&parent);
        child.borrow_mut().define("y".to_string(), Value::Integer(2));

        assert_eq!(child.borrow().get("x"), Some(Value::Integer(1)));
        assert_eq!(child.borrow().get("y"), Some(Value::Integer(2)));
        assert_eq!(parent.borrow().get("y"), None);
    }

    #[test]
    fn test_shadowing_leaves_parent_alone() {
        let parent = Environment::new().into_ref();
        parent.borrow_mut().define("x".to_string(), Value::Integer(1));

        let child = child_env(&parent);
        child.borrow_mut().define("x".to_string(), Value::from("inner"));

        assert_eq!(child.borrow().get("x"), Some(Value::from("inner")));
        assert_eq!(parent.borrow().get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_child_sees_later_parent_bindings() {
        let parent = Environment::new().into_ref();
        let child = child_env(&parent);
        parent.borrow_mut().define("late".to_string(), Value::Boolean(true));
        assert_eq!(child.borrow().get("late"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_lookup_three_levels() {
        let gp = Environment::new().into_ref();
        gp.borrow_mut().define("a".to_string(), Value::Integer(1));
        let p = child_env(&gp);
        p.borrow_mut().define("b".to_string(), Value::Integer(2));
        let c = child_env(&p);

        assert_eq!(c.borrow().get("a"), Some(Value::Integer(1)));
        assert_eq!(c.borrow().get("b"), Some(Value::Integer(2)));
        assert_eq!(c.borrow().get("d"), None);
        assert_eq!(gp.borrow().get("b"), None);
    }

    #[test]
    fn test_define_overwrite() {
        let mut env = Environment::default();
        env.define("x".to_string(), Value::Integer(1));
        env.define("x".to_string(), Value::Null);
        assert_eq!(env.get("x"), Some(Value::Null));
    }

    #[test]
    fn test_siblings_are_independent() {
        let parent = Environment::new().into_ref();
        let first = child_env(&parent);
        let second = child_env(&parent);
        first.borrow_mut().define("x".to_string(), Value::Integer(1));
        assert_eq!(second.borrow().get("x"), None);
    }
}
