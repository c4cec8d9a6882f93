use crate::ast::{Expr, ExprKind, FunctionDecl, LiteralValue, Stmt};
use crate::token::Token;
use crate::value::Value;

/// Renders statements and expressions in a parenthesised prefix form,
/// e.g. `(var x = (+ 1 2))`. Tokens hold spans only, so the printer needs
/// the source they were scanned from.
pub struct AstPrinter<'a> {
    source: &'a str,
}

impl<'a> AstPrinter<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// One line per top-level statement.
    pub fn print_program(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Block(statements) => {
                if statements.is_empty() {
                    "(block)".into()
                } else {
                    format!("(block {})", self.join_stmts(statements))
                }
            }

            Stmt::Class {
                name,
                base,
                methods,
            } => {
                let mut out = format!("(class {}", self.text(name));

                if let Some(base) = base {
                    out.push_str(" : ");
                    out.push_str(&self.print_expr(base));
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&self.print_function(method));
                }

                out.push(')');
                out
            }

            Stmt::Expression(expr) => format!("(; {})", self.print_expr(expr)),

            Stmt::Function(decl) => self.print_function(decl),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    self.print_expr(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print_expr(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", self.print_expr(value)),
                None => "(return)".into(),
            },

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} = {})", self.text(name), self.print_expr(init)),
                None => format!("(var {})", self.text(name)),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print_expr(condition),
                self.print_stmt(body)
            ),
        }
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            // ── literals ────────────────────────────────────────────────
            ExprKind::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => Value::Number(*n).to_string(),
            },

            ExprKind::Grouping(inner) => format!("(group {})", self.print_expr(inner)),

            ExprKind::Unary { operator, right } => {
                format!("({} {})", self.text(operator), self.print_expr(right))
            }

            ExprKind::Binary {
                left,
                operator,
                right,
            }
            | ExprKind::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                self.text(operator),
                self.print_expr(left),
                self.print_expr(right)
            ),

            ExprKind::Variable(name) => self.text(name).into(),

            ExprKind::Assign { name, value } => {
                format!("(= {} {})", self.text(name), self.print_expr(value))
            }

            ExprKind::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print_expr(callee));

                for argument in arguments {
                    out.push(' ');
                    out.push_str(&self.print_expr(argument));
                }

                out.push(')');
                out
            }

            ExprKind::Get { object, name } => {
                format!("(. {} {})", self.print_expr(object), self.text(name))
            }

            ExprKind::Set {
                object,
                name,
                value,
            } => format!(
                "(= {}.{} {})",
                self.print_expr(object),
                self.text(name),
                self.print_expr(value)
            ),

            ExprKind::This(_) => "this".into(),

            ExprKind::Base { method, .. } => format!("(base {})", self.text(method)),
        }
    }

    fn print_function(&self, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| self.text(p)).collect();

        let mut out = format!("(function {}({})", self.text(&decl.name), params.join(" "));

        if !decl.body.is_empty() {
            out.push(' ');
            out.push_str(&self.join_stmts(&decl.body));
        }

        out.push(')');
        out
    }

    fn join_stmts(&self, statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[inline]
    fn text(&self, token: &Token) -> &'a str {
        token.lexeme(self.source)
    }
}
