/*!
Recursive‑descent parser for Quill.

Consumes the scanner's token slice and produces the statement list. A syntax
error aborts the current declaration only: the error is recorded, the
declaration is dropped, and the parser resynchronizes at the next `;`
(consumed) or at a token that starts a declaration (left in place). A program
with N syntax errors therefore parses to the statement list with those
declarations missing, never to a malformed node.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`                | `debug`| High‑level descent into grammar branches. |
| Recovery (`declaration`)     | `warn` | A declaration was discarded.              |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( ":" IDENT )? "{" method* "}" ;
method         → "function"? function ;
funDecl        → "function" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | returnStmt
               | whileStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
returnStmt     → "return" expression? ";" ;
whileStmt      → "while" "(" expression ")" statement ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "||" logic_and )* ;
logic_and      → equality ( "&&" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "base" "." IDENT | "(" expression ")" ;
```

`for` has no node of its own: it is desugared here into `Block`/`While`.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, ExprKind, FunctionDecl, LiteralValue, Stmt};
use crate::error::{QuillError, Result};
use crate::token::{Token, TokenKind};

use log::{debug, info, warn};

const MAX_ARGUMENTS: usize = 255;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    current: usize,
    next_id: u32,
    errors: Vec<QuillError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser. `tokens` must have been scanned from `source`.
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            source,
            tokens,
            current: 0,
            next_id: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program. Never fails: erroneous declarations are
    /// omitted and their errors are available through [`Parser::errors`].
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        statements
    }

    /// Syntax errors recorded so far, in source order.
    pub fn errors(&self) -> &[QuillError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<QuillError> {
        std::mem::take(&mut self.errors)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at token {}", self.current);

        let start = self.current;

        let result = if self.matches(TokenKind::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenKind::FUNCTION) {
            self.function("function").map(|f| Stmt::Function(Rc::new(f)))
        } else if self.matches(TokenKind::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(e) => {
                warn!("Discarding declaration: {}", e);

                self.errors.push(e);
                self.synchronize();

                // Recovery stopped on the very token we started at.
                if self.current == start {
                    self.advance();
                }

                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenKind::IDENTIFIER, "Expect class name.")?;

        let base: Option<Expr> = if self.matches(TokenKind::COLON) {
            let base_name = self.consume(TokenKind::IDENTIFIER, "Expect base class name.")?;

            Some(self.make(ExprKind::Variable(base_name)))
        } else {
            None
        };

        self.consume(TokenKind::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            // The keyword is optional for methods.
            self.matches(TokenKind::FUNCTION);

            methods.push(Rc::new(self.function("method")?));
        }

        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            base,
            methods,
        })
    }

    fn function(&mut self, kind: &str) -> Result<FunctionDecl> {
        let name: Token = self.consume(TokenKind::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenKind::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(self.error_at(
                        self.peek(),
                        "Can't have more than 255 parameters.",
                    ));
                }

                params.push(self.consume(TokenKind::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenKind::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(
            TokenKind::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;

        let body: Vec<Stmt> = self.block()?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenKind::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenKind::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenKind::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenKind::FOR) {
            self.for_statement()
        } else if self.matches(TokenKind::IF) {
            self.if_statement()
        } else if self.matches(TokenKind::WHILE) {
            self.while_statement()
        } else if self.matches(TokenKind::RETURN) {
            self.return_statement()
        } else if self.matches(TokenKind::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`, omitting the pieces that are
    /// absent. A missing condition is `true`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenKind::SEMICOLON) {
            None
        } else if self.matches(TokenKind::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenKind::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let mut body: Stmt = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition: Expr = match condition {
            Some(condition) => condition,
            None => self.make(ExprKind::Literal(LiteralValue::True)),
        };

        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenKind::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenKind::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenKind::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after while condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous();
        let value: Option<Expr> = if !self.check(TokenKind::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    /// Parses the declarations of a block whose `{` was already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenKind::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenKind::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenKind::EQUAL) {
            let equals: Token = self.previous();
            let value: Expr = self.assignment()?;

            return match expr.kind {
                ExprKind::Variable(name) => Ok(self.make(ExprKind::Assign {
                    name,
                    value: Box::new(value),
                })),

                ExprKind::Get { object, name } => Ok(self.make(ExprKind::Set {
                    object,
                    name,
                    value: Box::new(value),
                })),

                _ => Err(self.error_at(equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenKind::OR) {
            let operator: Token = self.previous();
            let right: Expr = self.logical_and()?;

            expr = self.make(ExprKind::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenKind::AND) {
            let operator: Token = self.previous();
            let right: Expr = self.equality()?;

            expr = self.make(ExprKind::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches(TokenKind::BANG_EQUAL) || self.matches(TokenKind::EQUAL_EQUAL) {
            let operator: Token = self.previous();
            let right: Expr = self.comparison()?;

            expr = self.binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.matches(TokenKind::GREATER)
            || self.matches(TokenKind::GREATER_EQUAL)
            || self.matches(TokenKind::LESS)
            || self.matches(TokenKind::LESS_EQUAL)
        {
            let operator: Token = self.previous();
            let right: Expr = self.term()?;

            expr = self.binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches(TokenKind::MINUS) || self.matches(TokenKind::PLUS) {
            let operator: Token = self.previous();
            let right: Expr = self.factor()?;

            expr = self.binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.matches(TokenKind::STAR) || self.matches(TokenKind::SLASH) {
            let operator: Token = self.previous();
            let right: Expr = self.unary()?;

            expr = self.binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenKind::BANG) || self.matches(TokenKind::MINUS) {
            let operator: Token = self.previous();
            let right: Expr = self.unary()?;

            return Ok(self.make(ExprKind::Unary {
                operator,
                right: Box::new(right),
            }));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenKind::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenKind::DOT) {
                let name: Token =
                    self.consume(TokenKind::IDENTIFIER, "Expect property name after '.'.")?;

                expr = self.make(ExprKind::Get {
                    object: Box::new(expr),
                    name,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenKind::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    return Err(self.error_at(self.peek(), "Can't have more than 255 arguments."));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenKind::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(self.make(ExprKind::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        }))
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: Token = self.peek();

        let kind: ExprKind = match token.kind {
            TokenKind::FALSE => ExprKind::Literal(LiteralValue::False),
            TokenKind::TRUE => ExprKind::Literal(LiteralValue::True),
            TokenKind::NIL => ExprKind::Literal(LiteralValue::Nil),

            TokenKind::NUMBER => {
                let lexeme: &str = token.lexeme(self.source);
                let n: f64 = lexeme
                    .parse::<f64>()
                    .map_err(|_| self.error_at(token, format!("Invalid number '{}'.", lexeme)))?;

                ExprKind::Literal(LiteralValue::Number(n))
            }

            TokenKind::STRING => {
                ExprKind::Literal(LiteralValue::Str(token.lexeme(self.source).to_owned()))
            }

            TokenKind::IDENTIFIER => ExprKind::Variable(token),

            TokenKind::THIS => ExprKind::This(token),

            TokenKind::BASE => {
                self.advance();
                self.consume(TokenKind::DOT, "Expect '.' after 'base'.")?;
                let method: Token =
                    self.consume(TokenKind::IDENTIFIER, "Expect base class method name.")?;

                return Ok(self.make(ExprKind::Base {
                    keyword: token,
                    method,
                }));
            }

            TokenKind::LEFT_PAREN => {
                self.advance();
                let expr: Expr = self.expression()?;
                self.consume(TokenKind::RIGHT_PAREN, "Expect ')' after expression.")?;

                return Ok(self.make(ExprKind::Grouping(Box::new(expr))));
            }

            _ => return Err(self.error_at(token, "Expect expression.")),
        };

        self.advance();

        Ok(self.make(kind))
    }

    // ────────────────────── utility helpers ───────────────────────

    /// Wrap `kind` in an expression node with a fresh identity.
    fn make(&mut self, kind: ExprKind) -> Expr {
        let id = ExprId(self.next_id);
        self.next_id += 1;

        Expr::new(id, kind)
    }

    fn binary(&mut self, left: Expr, operator: Token, right: Expr) -> Expr {
        self.make(ExprKind::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn error_at<S: Into<String>>(&self, token: Token, message: S) -> QuillError {
        QuillError::parse(token.line(self.source), message)
    }

    #[inline(always)]
    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }

        Err(self.error_at(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, kind: TokenKind) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().kind == kind
    }

    #[inline(always)]
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::EOF
    }

    /// Current token; a synthetic `EOF` once the slice is exhausted.
    #[inline(always)]
    fn peek(&self) -> Token {
        self.tokens
            .get(self.current)
            .copied()
            .unwrap_or_else(|| Token::eof(self.source.len()))
    }

    #[inline(always)]
    fn previous(&self) -> Token {
        match self.current.checked_sub(1) {
            Some(index) => self.tokens[index],
            None => self.peek(),
        }
    }

    /// Discards tokens until a statement boundary: a `;` (consumed) or a
    /// token that starts a declaration (left for the caller).
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            match self.peek().kind {
                TokenKind::SEMICOLON => {
                    self.advance();

                    return;
                }

                TokenKind::CLASS
                | TokenKind::FUNCTION
                | TokenKind::VAR
                | TokenKind::FOR
                | TokenKind::IF
                | TokenKind::WHILE
                | TokenKind::RETURN => return,

                _ => {}
            }

            self.advance();
        }
    }
}
