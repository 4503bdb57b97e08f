// SPDX-License-Identifier: AGPL-3.0-or-later
//! Select-list projection
//!
//! A comma-separated list of `*`, column names, string literals and
//! function calls, e.g. `name, ext(relPath), abs('.')`. Anything beyond
//! projection (filtering, ordering, joins) is left to a real query engine.

use fsrch_core::{EvalContext, FsrchError, FsrchResult, Row, ScalarFunction, Table, Value};
use fsrch_source::Registry;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    Comma,
    Star,
}

fn tokenize(text: &str) -> FsrchResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => literal.push(c),
                        None => {
                            return Err(FsrchError::InvalidSelect(format!(
                                "unterminated string literal: {quote}{literal}"
                            )))
                        }
                    }
                }
                tokens.push(Token::Str(literal));
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(FsrchError::InvalidSelect(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone)]
enum Expr {
    Column { index: usize, name: &'static str },
    Literal(Value),
    Call { function: ScalarFunction, args: Vec<Expr> },
}

impl Expr {
    fn evaluate(&self, row: &Row, ctx: &EvalContext) -> FsrchResult<Option<Value>> {
        match self {
            Expr::Column { index, .. } => Ok(row.values.get(*index).cloned()),
            Expr::Literal(value) => Ok(Some(value.clone())),
            Expr::Call { function, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    // An absent argument makes the whole call absent.
                    match arg.evaluate(row, ctx)? {
                        Some(value) => values.push(value),
                        None => return Ok(None),
                    }
                }
                function.call(ctx, &values)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column { name, .. } => f.write_str(name),
            Expr::Literal(value) => write!(f, "'{value}'"),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    table: &'a Table,
    registry: &'a Registry,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> FsrchResult<()> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(FsrchError::InvalidSelect(format!(
                "expected {expected:?}, found {token:?}"
            ))),
            None => Err(FsrchError::InvalidSelect(format!(
                "expected {expected:?}, found end of input"
            ))),
        }
    }

    fn parse_list(&mut self) -> FsrchResult<Vec<Projection>> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&Token::Star) {
                self.advance();
                for (index, column) in self.table.columns.iter().enumerate() {
                    items.push(Projection::new(Expr::Column { index, name: column.name }));
                }
            } else {
                items.push(Projection::new(self.parse_expr()?));
            }

            match self.advance() {
                Some(Token::Comma) => continue,
                None => break,
                Some(token) => {
                    return Err(FsrchError::InvalidSelect(format!("unexpected {token:?}")));
                }
            }
        }
        Ok(items)
    }

    fn parse_expr(&mut self) -> FsrchResult<Expr> {
        match self.advance() {
            Some(Token::Str(literal)) => Ok(Expr::Literal(Value::Text(literal))),
            Some(Token::Ident(ident)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.parse_call(&ident)
                } else {
                    self.column(&ident)
                }
            }
            Some(token) => Err(FsrchError::InvalidSelect(format!("unexpected {token:?}"))),
            None => Err(FsrchError::InvalidSelect("empty expression".into())),
        }
    }

    fn parse_call(&mut self, name: &str) -> FsrchResult<Expr> {
        let function = *self.registry.function_or_err(name)?;
        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
        } else {
            loop {
                args.push(self.parse_expr()?);
                match self.advance() {
                    Some(Token::Comma) => continue,
                    Some(Token::RParen) => break,
                    Some(token) => {
                        return Err(FsrchError::InvalidSelect(format!(
                            "unexpected {token:?} in arguments to {name}"
                        )))
                    }
                    None => {
                        return Err(FsrchError::InvalidSelect(format!(
                            "unclosed argument list for {name}"
                        )))
                    }
                }
            }
        }

        if args.len() != function.arity {
            return Err(FsrchError::ArityMismatch {
                function: name.to_string(),
                expected: function.arity,
                got: args.len(),
            });
        }
        Ok(Expr::Call { function, args })
    }

    fn column(&self, name: &str) -> FsrchResult<Expr> {
        self.table
            .columns
            .iter()
            .position(|c| c.name == name)
            .map(|index| Expr::Column { index, name: self.table.columns[index].name })
            .ok_or_else(|| FsrchError::ColumnNotFound(name.to_string()))
    }
}

/// One output column
#[derive(Debug, Clone)]
pub struct Projection {
    label: String,
    expr: Expr,
}

impl Projection {
    fn new(expr: Expr) -> Self {
        Self { label: expr.to_string(), expr }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A parsed select list, resolved against a table and a registry
#[derive(Debug, Clone)]
pub struct SelectList {
    items: Vec<Projection>,
}

impl SelectList {
    pub fn parse(text: &str, table: &Table, registry: &Registry) -> FsrchResult<Self> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(FsrchError::InvalidSelect("empty select list".into()));
        }
        let mut parser = Parser { tokens, pos: 0, table, registry };
        let items = parser.parse_list()?;
        Ok(Self { items })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(Projection::label).collect()
    }

    /// Evaluates every projection against `row`; `None` cells are absent.
    pub fn evaluate(&self, row: &Row, ctx: &EvalContext) -> FsrchResult<Vec<Option<Value>>> {
        self.items.iter().map(|p| p.expr.evaluate(row, ctx)).collect()
    }
}
