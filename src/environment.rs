use crate::error::{QuillError, Result};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, mutable handle to one environment frame. Frames live as long as
/// the longest holder: an active call, a block, or a closure that captured it.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root frame (the globals) with no parent.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            enclosing,
        ))))
    }

    /// Insert or overwrite `name` in *this* frame.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up in this frame only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Look `name` up here, then through the ancestor chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Overwrite the first binding of `name` found from here outwards.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// The frame `distance` hops up from `env` (0 is `env` itself).
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let parent = current.borrow().enclosing.clone()?;
            current = parent;
        }

        Some(current)
    }

    /// Read `name` from exactly the frame `distance` hops up, without
    /// searching.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str, line: usize) -> Result<Value> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| bad_distance(distance, line))?;

        let value = frame.borrow().get_local(name);

        value.ok_or_else(|| undefined(name, line))
    }

    /// Write `name` into exactly the frame `distance` hops up.
    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<()> {
        let frame = Self::ancestor(env, distance).ok_or_else(|| bad_distance(distance, line))?;
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name, line)),
        }
    }
}

fn undefined(name: &str, line: usize) -> QuillError {
    QuillError::runtime(line, format!("Undefined variable '{}'.", name))
}

fn bad_distance(distance: usize, line: usize) -> QuillError {
    QuillError::runtime(line, format!("No environment at distance {}.", distance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn define_and_get() {
        let mut env = Environment::new();
        env.define("v1", num(0.0));
        env.define("v2", Value::from("Foo"));
        env.define("v3", Value::Bool(true));

        assert_eq!(env.get("v1", 1).unwrap(), num(0.0));
        assert_eq!(env.get("v2", 1).unwrap(), Value::from("Foo"));
        assert_eq!(env.get("v3", 1).unwrap(), Value::Bool(true));
        assert!(env.get("v4", 1).is_err());
    }

    #[test]
    fn redefine_overwrites_in_same_frame() {
        let mut env = Environment::new();
        env.define("x", num(1.0));
        env.define("x", num(2.0));

        assert_eq!(env.get("x", 1).unwrap(), num(2.0));
    }

    #[test]
    fn assign_requires_existing_binding() {
        let mut env = Environment::new();
        env.define("v1", num(0.0));
        env.assign("v1", num(1.0), 1).unwrap();

        assert_eq!(env.get("v1", 1).unwrap(), num(1.0));

        let err = env.assign("v2", num(2.0), 7).unwrap_err();
        assert!(matches!(err, QuillError::Runtime { line: 7, .. }));
    }

    #[test]
    fn ancestor_hops() {
        let root: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let c1 = Environment::child_of(&root);
        let c2 = Environment::child_of(&root);
        let c3 = Environment::child_of(&c1);

        assert!(Rc::ptr_eq(&Environment::ancestor(&c1, 1).unwrap(), &root));
        assert!(Rc::ptr_eq(&Environment::ancestor(&c2, 1).unwrap(), &root));
        assert!(Rc::ptr_eq(&Environment::ancestor(&c3, 1).unwrap(), &c1));
        assert!(Rc::ptr_eq(&Environment::ancestor(&c3, 2).unwrap(), &root));
        assert!(Environment::ancestor(&root, 1).is_none());
        assert!(Environment::ancestor(&c1, 2).is_none());
    }

    #[test]
    fn distance_access_does_not_search() {
        let root: EnvRef = Rc::new(RefCell::new(Environment::new()));
        let c1 = Environment::child_of(&root);
        let c2 = Environment::child_of(&root);
        let c3 = Environment::child_of(&c1);

        root.borrow_mut().define("v1", num(1.0));
        root.borrow_mut().define("v2", num(2.0));
        c1.borrow_mut().define("v1", num(11.0));
        c3.borrow_mut().define("v3", num(301.0));

        Environment::assign_at(&c1, 1, "v1", num(12.0), 1).unwrap();
        assert_eq!(root.borrow().get("v1", 1).unwrap(), num(12.0));
        assert_eq!(c1.borrow().get("v1", 1).unwrap(), num(11.0));

        // Undirected assignment walks outwards from c2 and lands in root.
        c2.borrow_mut().assign("v1", num(22.0), 1).unwrap();
        assert_eq!(Environment::get_at(&c2, 1, "v1", 1).unwrap(), num(22.0));
        assert!(Environment::get_at(&c2, 0, "v1", 1).is_err());

        Environment::assign_at(&c3, 2, "v2", num(302.0), 1).unwrap();
        assert_eq!(Environment::get_at(&c3, 2, "v2", 1).unwrap(), num(302.0));
        assert_eq!(Environment::get_at(&c3, 1, "v1", 1).unwrap(), num(11.0));
        assert_eq!(Environment::get_at(&c3, 0, "v3", 1).unwrap(), num(301.0));

        // The frame at the given distance must hold the name itself.
        assert!(Environment::get_at(&c3, 1, "v2", 1).is_err());
        assert!(Environment::assign_at(&c3, 0, "v1", num(0.0), 1).is_err());
    }
}
