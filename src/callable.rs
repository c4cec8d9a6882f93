use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{QuillError, Result};
use crate::instance::Instance;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Anything a call expression can invoke. The interpreter checks the arity
/// before calling, so implementations may assume `arguments.len() ==
/// self.arity()`.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `line` is the line of the call site, for error reporting.
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>, line: usize)
        -> Result<Value>;
}

/// A user‑defined function or method closed over its defining environment.
pub struct Function {
    name: Rc<str>,
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_constructor: bool,
}

impl Function {
    pub fn new(
        name: Rc<str>,
        declaration: Rc<FunctionDecl>,
        closure: EnvRef,
        is_constructor: bool,
    ) -> Self {
        Self {
            name,
            declaration,
            closure,
            is_constructor,
        }
    }

    /// A copy of this method whose closure additionally binds `this` to
    /// `instance`. `self` is left untouched.
    pub fn bind(&self, instance: Rc<Instance>) -> Function {
        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define("this", Value::Instance(instance));

        Function {
            name: Rc::clone(&self.name),
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(env)),
            is_constructor: self.is_constructor,
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        _line: usize,
    ) -> Result<Value> {
        debug!("Calling function '{}'", self.name);

        let env: EnvRef = Environment::child_of(&self.closure);

        {
            let source = interpreter.source();
            let mut frame = env.borrow_mut();

            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(param.lexeme(&source), argument);
            }
        }

        let flow = interpreter.execute_block(&self.declaration.body, env)?;

        // Constructors always hand back the instance they initialised.
        if self.is_constructor {
            return Ok(self.closure.borrow().get_local("this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

impl fmt::Debug for Function {
    // The closure may contain this very function; never print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .field("is_constructor", &self.is_constructor)
            .finish()
    }
}

/// Signature of a built‑in. Errors are plain messages; the interpreter
/// attaches the call‑site line.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>;

/// A function implemented in Rust and exposed as a global.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, &arguments).map_err(|message| QuillError::runtime(line, message))
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
