use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::class::Class;
use crate::value::Value;

/// An object created by calling a class. Fields are created on first write.
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Property access: a field if one exists, otherwise a method bound to
    /// `this`.
    pub fn get(this: &Rc<Instance>, name: &str) -> Option<Value> {
        if let Some(value) = this.field(name) {
            return Some(value);
        }

        this.class
            .find_method(name)
            .map(|method| Value::Function(Rc::new(method.bind(Rc::clone(this)))))
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class)
    }
}

impl fmt::Debug for Instance {
    // Fields can point back at this instance; print names only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("fields", &self.fields.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
