//! Static resolver pass for the **Quill** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str, bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, read in own initializer, misplaced
//!    `return`, `this`/`base` outside a class, bad inheritance).
//! 3. Record, for each variable‑like expression, how many scopes separate it
//!    from its binding. Expressions left out of the table are globals.
//!
//! Classes inject synthetic scopes: one holding `base` (only with a base
//! class) and, inside it, one holding `this`. Method bodies are then resolved
//! at uniform distances: parameters at 0, `this` at 1, `base` at 2.
//!
//! Errors do not stop the walk; every one is collected and returned together.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, Stmt};
use crate::error::QuillError;
use crate::token::Token;

/// Binding distances keyed by expression identity.
pub type Locals = HashMap<ExprId, usize>;

/// What kind of function body are we in? Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Constructor,
}

/// What kind of class body are we in? Used to validate `this` and `base`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Derived,
}

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances for the interpreter.
pub struct Resolver<'a> {
    source: &'a str,
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    locals: Locals,
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<QuillError>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver for statements parsed from `source`.
    pub fn new(source: &'a str) -> Self {
        info!("Resolver instantiated");

        Resolver {
            source,
            scopes: Vec::new(),
            locals: Locals::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements and return the distance table, or every
    /// static error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Locals, Vec<QuillError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_all(statements);

        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.locals.len());

            Ok(self.locals)
        } else {
            info!("Resolve pass found {} error(s)", self.errors.len());

            Err(self.errors)
        }
    }

    fn resolve_all(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_all(statements);
                self.end_scope();
            }

            Stmt::Class {
                name,
                base,
                methods,
            } => self.resolve_class(name, base.as_ref(), methods),

            Stmt::Expression(expr) => self.resolve_expr(expr),

            Stmt::Function(decl) => {
                // The name is visible inside its own body (recursion).
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Constructor {
                        self.error(keyword, "Can't return a value from a constructor.");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    fn resolve_class(&mut self, name: &Token, base: Option<&Expr>, methods: &[Rc<FunctionDecl>]) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        let class_name: &'a str = self.name(name);

        self.declare(name);
        self.define(name);

        if let Some(base) = base {
            if let ExprKind::Variable(base_name) = &base.kind {
                if self.name(base_name) == class_name {
                    self.error(base_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Derived;
            self.resolve_expr(base);

            self.begin_scope();
            self.insert_synthetic("base");
        }

        self.begin_scope();
        self.insert_synthetic("this");

        for method in methods {
            let kind = if self.name(&method.name) == class_name {
                FunctionType::Constructor
            } else {
                FunctionType::Method
            };

            self.resolve_function(method, kind);
        }

        self.end_scope();

        if base.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assign { name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(expr, name);
            }

            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            ExprKind::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            ExprKind::Get { object, .. } => self.resolve_expr(object),

            ExprKind::Grouping(inner) => self.resolve_expr(inner),

            ExprKind::Literal(_) => {}

            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            ExprKind::Base { keyword, .. } => match self.current_class {
                ClassType::None => self.error(keyword, "Can't use 'base' outside of a class."),
                ClassType::Class => {
                    self.error(keyword, "Can't use 'base' in a class with no base class.")
                }
                ClassType::Derived => self.resolve_local(expr, keyword),
            },

            ExprKind::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                } else {
                    self.resolve_local(expr, keyword);
                }
            }

            ExprKind::Unary { right, .. } => self.resolve_expr(right),

            ExprKind::Variable(name) => {
                let lexeme: &'a str = self.name(name);

                if let Some(scope) = self.scopes.last() {
                    if scope.get(lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }

                self.resolve_local(expr, name);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }

        self.resolve_all(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    #[inline]
    fn name(&self, token: &Token) -> &'a str {
        token.lexeme(self.source)
    }

    fn insert_synthetic(&mut self, name: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    fn declare(&mut self, name: &Token) {
        let lexeme: &'a str = self.name(name);

        let duplicate = match self.scopes.last_mut() {
            Some(scope) => scope.insert(lexeme, false).is_some(),
            None => false,
        };

        if duplicate {
            self.error(name, "Already a variable with this name in this scope.");
        }
    }

    fn define(&mut self, name: &Token) {
        let lexeme: &'a str = self.name(name);

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(lexeme, true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        let err = QuillError::resolve(
            token.line(self.source),
            format!("{} (at '{}')", message, self.name(token)),
        );

        self.errors.push(err);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record `expr` as a local at the depth of the innermost scope holding
    /// `name`, or leave it out of the table when it is a global.
    fn resolve_local(&mut self, expr: &Expr, name: &Token) {
        let lexeme: &'a str = self.name(name);

        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(lexeme) {
                debug!("Resolved '{}' at depth {}", lexeme, depth);

                self.locals.insert(expr.id, depth);

                return;
            }
        }

        debug!("Resolved '{}' as global", lexeme);
    }
}
