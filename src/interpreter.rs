//! Tree‑walking evaluator.
//!
//! Runs a resolved [`Program`]. Variable references recorded in the
//! resolver's [`Locals`] table are read at a fixed distance from the current
//! frame; everything else is looked up in the globals. A `return` travels
//! back up through [`Flow`] rather than through the error channel, so a
//! runtime error is always a real error.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, LiteralValue, Program, Stmt};
use crate::callable::{Callable, Function};
use crate::class::Class;
use crate::config::Config;
use crate::environment::{EnvRef, Environment};
use crate::error::{QuillError, Result};
use crate::instance::Instance;
use crate::natives;
use crate::resolver::Locals;
use crate::token::{Token, TokenKind};
use crate::value::Value;

// Each nested call needs this much headroom; below it the stack is extended
// on the heap, so `max_call_depth` holds on small thread stacks too.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    source: Rc<str>,
    output: Box<dyn Write>,
    config: Config,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter that prints to standard output.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// An interpreter whose `print` writes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = fresh_globals();

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            source: Rc::from(""),
            output,
            config: Config::default(),
            depth: 0,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute `program` from a clean global state. Running the same program
    /// twice produces the same output both times.
    pub fn interpret(&mut self, program: &Program, locals: &Locals) -> Result<()> {
        info!(
            "Interpreting {} top-level statement(s)",
            program.statements.len()
        );

        self.globals = fresh_globals();
        self.environment = Rc::clone(&self.globals);
        self.locals = locals.clone();
        self.source = Rc::clone(&program.source);
        self.depth = 0;

        let result = self.run_statements(&program.statements);

        // Whatever was printed before an error stays printed.
        self.output.flush()?;

        result
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> Result<()> {
        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    pub(crate) fn source(&self) -> Rc<str> {
        Rc::clone(&self.source)
    }

    pub(crate) fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Run `statements` in `env`, restoring the previous frame afterwards
    /// whether they finish normally, return, or fail.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous: EnvRef = std::mem::replace(&mut self.environment, env);

        let mut result: Result<Flow> = Ok(Flow::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;

        result
    }

    // ───────────────────────────── statements ─────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Block(statements) => {
                let env = Environment::child_of(&self.environment);
                self.execute_block(statements, env)
            }

            Stmt::Class {
                name,
                base,
                methods,
            } => {
                self.define_class(name, base.as_ref(), methods)?;
                Ok(Flow::Normal)
            }

            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                let source = self.source();
                let name: Rc<str> = Rc::from(decl.name.lexeme(&source));

                debug!("Defining function '{}'", name);

                let function = Function::new(
                    Rc::clone(&name),
                    Rc::clone(decl),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&name, Value::Function(Rc::new(function)));

                Ok(Flow::Normal)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                let source = self.source();
                self.environment
                    .borrow_mut()
                    .define(name.lexeme(&source), value);

                Ok(Flow::Normal)
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }

                Ok(Flow::Normal)
            }
        }
    }

    fn define_class(
        &mut self,
        name: &Token,
        base: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<()> {
        let source = self.source();
        let class_name: Rc<str> = Rc::from(name.lexeme(&source));
        let line = name.line(&source);

        debug!("Defining class '{}'", class_name);

        let parent: Option<Rc<Class>> = match base {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(QuillError::runtime(
                        self.line(expr_token(expr).unwrap_or(name)),
                        "Base class must be a class.",
                    ))
                }
            },
            None => None,
        };

        // The name exists (as nil) while the methods are built, so a method
        // body may refer to its own class.
        self.environment
            .borrow_mut()
            .define(&class_name, Value::Nil);

        // Methods of a derived class close over an extra frame holding `base`.
        let closure: EnvRef = match &parent {
            Some(parent) => {
                let env = Environment::child_of(&self.environment);
                env.borrow_mut()
                    .define("base", Value::Class(Rc::clone(parent)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let mut table: HashMap<String, Rc<Function>> = HashMap::new();

        for decl in methods {
            let method_name: &str = decl.name.lexeme(&source);
            let function = Function::new(
                Rc::from(method_name),
                Rc::clone(decl),
                Rc::clone(&closure),
                method_name == &*class_name,
            );

            table.insert(method_name.to_string(), Rc::new(function));
        }

        let class = Class::new(Rc::clone(&class_name), parent, table);

        self.environment
            .borrow_mut()
            .assign(&class_name, Value::Class(Rc::new(class)), line)
    }

    // ───────────────────────────── expressions ────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                self.unary(operator, right)
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                self.binary(left, operator, right)
            }

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let decided = match operator.kind {
                    TokenKind::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            ExprKind::Variable(name) => self.look_up_variable(name, expr.id),

            ExprKind::Assign { name, value } => {
                let value: Value = self.evaluate(value)?;
                let source = self.source();
                let line = name.line(&source);
                let lexeme = name.lexeme(&source);

                match self.locals.get(&expr.id) {
                    Some(&distance) => Environment::assign_at(
                        &self.environment,
                        distance,
                        lexeme,
                        value.clone(),
                        line,
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(lexeme, value.clone(), line)?,
                }

                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, args, paren)
            }

            ExprKind::Get { object, name } => {
                let object: Value = self.evaluate(object)?;
                let source = self.source();
                let property = name.lexeme(&source);

                match object {
                    Value::Instance(instance) => Instance::get(&instance, property)
                        .ok_or_else(|| self.undefined_property(name, property)),
                    _ => Err(QuillError::runtime(
                        self.line(name),
                        "Only instances have properties.",
                    )),
                }
            }

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(QuillError::runtime(
                        self.line(name),
                        "Only instances have fields.",
                    ));
                };

                let value: Value = self.evaluate(value)?;
                let source = self.source();
                instance.set(name.lexeme(&source), value.clone());

                Ok(value)
            }

            ExprKind::This(keyword) => self.look_up_variable(keyword, expr.id),

            ExprKind::Base { keyword, method } => self.base_property(expr.id, keyword, method),
        }
    }

    fn unary(&self, operator: &Token, right: Value) -> Result<Value> {
        match operator.kind {
            TokenKind::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(QuillError::runtime(
                    self.line(operator),
                    "Operand must be a number.",
                )),
            },
            TokenKind::BANG => Ok(Value::Bool(!right.is_truthy())),
            other => Err(QuillError::runtime(
                self.line(operator),
                format!("Unknown unary operator {}.", other),
            )),
        }
    }

    fn binary(&self, left: Value, operator: &Token, right: Value) -> Result<Value> {
        use TokenKind::*;

        match operator.kind {
            EQUAL_EQUAL => return Ok(Value::Bool(left == right)),
            BANG_EQUAL => return Ok(Value::Bool(left != right)),
            PLUS => {
                return match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    (Value::Str(_), _) | (_, Value::Str(_)) => {
                        Ok(Value::from(format!("{}{}", left, right)))
                    }
                    _ => Err(QuillError::runtime(
                        self.line(operator),
                        "Operands must be two numbers or include a string.",
                    )),
                }
            }
            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
            return Err(QuillError::runtime(
                self.line(operator),
                "Operands must be numbers.",
            ));
        };

        let (a, b) = (*a, *b);

        match operator.kind {
            MINUS => Ok(Value::Number(a - b)),
            STAR => Ok(Value::Number(a * b)),
            SLASH => Ok(Value::Number(a / b)),
            GREATER => Ok(Value::Bool(a > b)),
            GREATER_EQUAL => Ok(Value::Bool(a >= b)),
            LESS => Ok(Value::Bool(a < b)),
            LESS_EQUAL => Ok(Value::Bool(a <= b)),
            other => Err(QuillError::runtime(
                self.line(operator),
                format!("Unknown binary operator {}.", other),
            )),
        }
    }

    fn call_value(&mut self, callee: Value, arguments: Vec<Value>, paren: &Token) -> Result<Value> {
        let line = self.line(paren);

        match callee {
            Value::Function(function) => self.invoke(&*function, arguments, line),
            Value::Native(native) => self.invoke(&*native, arguments, line),
            Value::Class(class) => self.invoke(&class, arguments, line),
            other => Err(QuillError::runtime(
                line,
                format!(
                    "Can only call functions and classes, not {}.",
                    other.type_name()
                ),
            )),
        }
    }

    fn invoke<C: Callable + ?Sized>(
        &mut self,
        callable: &C,
        arguments: Vec<Value>,
        line: usize,
    ) -> Result<Value> {
        if arguments.len() != callable.arity() {
            return Err(QuillError::runtime(
                line,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.depth >= self.config.max_call_depth {
            return Err(QuillError::runtime(line, "Stack overflow."));
        }

        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            callable.call(self, arguments, line)
        });
        self.depth -= 1;

        result
    }

    /// `base.name`: a method found from the parent class upward, bound to
    /// the current `this`, or failing that a field of `this`.
    fn base_property(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let source = self.source();
        let line = keyword.line(&source);
        let name = method.lexeme(&source);

        let distance: usize = self
            .locals
            .get(&id)
            .copied()
            .ok_or_else(|| QuillError::runtime(line, "Can't use 'base' here."))?;

        let parent = Environment::get_at(&self.environment, distance, "base", line)?;
        let this = Environment::get_at(
            &self.environment,
            distance.saturating_sub(1),
            "this",
            line,
        )?;

        let (Value::Class(parent), Value::Instance(instance)) = (parent, this) else {
            return Err(QuillError::runtime(line, "Can't use 'base' here."));
        };

        if let Some(found) = parent.find_method(name) {
            return Ok(Value::Function(Rc::new(found.bind(instance))));
        }

        instance
            .field(name)
            .ok_or_else(|| self.undefined_property(method, name))
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        let source = self.source();
        let line = name.line(&source);
        let lexeme = name.lexeme(&source);

        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, lexeme, line),
            None => self.globals.borrow().get(lexeme, line),
        }
    }

    fn undefined_property(&self, token: &Token, name: &str) -> QuillError {
        QuillError::runtime(self.line(token), format!("Undefined property '{}'.", name))
    }

    #[inline]
    fn line(&self, token: &Token) -> usize {
        token.line(&self.source)
    }
}

fn fresh_globals() -> EnvRef {
    let mut globals = Environment::new();
    natives::define_globals(&mut globals);

    Rc::new(RefCell::new(globals))
}

fn expr_token(expr: &Expr) -> Option<&Token> {
    match &expr.kind {
        ExprKind::Variable(token) => Some(token),
        _ => None,
    }
}
