use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{Callable, Function};
use crate::error::Result;
use crate::instance::Instance;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A class value: name, optional parent, and its own methods.
///
/// The constructor is the method named like the class. A class without one
/// uses the nearest ancestor's constructor.
pub struct Class {
    name: Rc<str>,
    parent: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: Rc<str>,
        parent: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Self {
            name,
            parent,
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look `name` up on this class, then on each ancestor in turn.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.parent.as_ref()?.find_method(name),
        }
    }

    pub fn constructor(&self) -> Option<Rc<Function>> {
        match self.methods.get(&*self.name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.parent.as_ref()?.constructor(),
        }
    }
}

impl Callable for Rc<Class> {
    fn arity(&self) -> usize {
        self.constructor().map_or(0, |ctor| ctor.arity())
    }

    /// Instantiate, run the constructor (if any) on the new instance, and
    /// return the instance regardless of what the constructor returned.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Rc<Instance> = Rc::new(Instance::new(Rc::clone(self)));

        if let Some(ctor) = self.constructor() {
            ctor.bind(Rc::clone(&instance))
                .call(interpreter, arguments, line)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
