//! Abstract syntax tree shared by the parser, resolver and interpreter.
//!
//! Nodes hold tokens (kind + span) rather than text; names are sliced from the
//! program source at the point of use. Every expression carries an [`ExprId`]
//! assigned by the parser, which is the key of the resolver's distance table:
//! two structurally identical expressions at different positions get
//! different ids.

use std::rc::Rc;

use crate::token::Token;

/// Stable identity of an expression node within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// A **literal constant** that appears directly in the source code.
///
/// The parser converts the lexeme once, so the AST does not need the token
/// buffer afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// An expression node together with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self { id, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `name = value`
    Assign { name: Token, value: Box<Expr> },

    /// Infix arithmetic, comparison or equality operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Function, method or class invocation.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    Literal(LiteralValue),

    /// Short‑circuiting `&&` / `||`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `base.method`
    Base { keyword: Token, method: Token },

    This(Token),

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    Variable(Token),
}

/// A function or method declaration. Shared between the statement that
/// declares it and every runtime function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `class Name [: Base] { methods }`. `base` is always a `Variable`.
    Class {
        name: Token,
        base: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },

    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Function(Rc<FunctionDecl>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    Return {
        /// The `return` keyword, for error locations.
        keyword: Token,
        value: Option<Expr>,
    },

    /// `var name [= initializer];`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    While { condition: Expr, body: Box<Stmt> },
}

/// A parsed program: the source text and its top‑level statements. Token
/// spans inside `statements` are only valid against this `source`.
#[derive(Debug, Clone)]
pub struct Program {
    pub source: Rc<str>,
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(source: impl Into<Rc<str>>, statements: Vec<Stmt>) -> Self {
        Self {
            source: source.into(),
            statements,
        }
    }
}
