//! Recursive-descent parser producing the program AST.
//!
//! Every branch point in the grammar is decided by at most one token of
//! lookahead, so the parser never backtracks:
//!
//! ```text
//! program    := function*
//! function   := 'int' ident '(' ')' '{' statement* '}'
//! statement  := 'return' expr ';'
//!             | 'int' ident ['=' expr] ';'
//!             | ident '=' expr ';'
//!             | ident '(' ')' ';'
//! expr       := number | ident '(' ')' | ident
//! ```
//!
//! The first error aborts parsing; there is no recovery.

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token};

/// Right-hand side of a `return`, declaration or assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  Num { value: i64 },
  Var { name: String },
  Call { name: String },
}

impl Expr {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Var { name: name.into() }
  }

  pub fn call(name: impl Into<String>) -> Self {
    Self::Call { name: name.into() }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  VarDecl { name: String, init: Option<Expr> },
  VarAssign { name: String, expr: Expr },
  Call { name: String },
  Return { expr: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
  pub name: String,
  pub body: Vec<Stmt>,
}

/// Root of the tree: functions in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub functions: Vec<Function>,
}

/// Parse a whole translation unit from the token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut stream = TokenStream::new(tokens, source);
  let mut functions = Vec::new();

  while !stream.is_eof() {
    functions.push(parse_function(&mut stream)?);
  }

  Ok(Program { functions })
}

fn parse_function(stream: &mut TokenStream) -> CompileResult<Function> {
  stream.skip(TokenKind::Int)?;
  let name = stream.get_ident("function name")?;
  stream.skip(TokenKind::LParen)?;
  stream.skip(TokenKind::RParen)?;
  stream.skip(TokenKind::LBrace)?;

  let mut body = Vec::new();
  while !stream.at(TokenKind::RBrace) {
    if stream.is_eof() {
      return Err(stream.error_here("expected `}`, but reached end of input"));
    }
    body.push(parse_stmt(stream)?);
  }
  stream.skip(TokenKind::RBrace)?;

  Ok(Function { name, body })
}

fn parse_stmt(stream: &mut TokenStream) -> CompileResult<Stmt> {
  let stmt = match stream.peek_kind(0) {
    Some(TokenKind::Return) => {
      stream.skip(TokenKind::Return)?;
      let expr = parse_expr(stream)?;
      Stmt::Return { expr }
    }
    Some(TokenKind::Int) => {
      stream.skip(TokenKind::Int)?;
      let name = stream.get_ident("variable name")?;
      let init = if stream.equal(TokenKind::Equals) {
        Some(parse_expr(stream)?)
      } else {
        None
      };
      Stmt::VarDecl { name, init }
    }
    Some(TokenKind::Ident) if stream.peek_kind(1) == Some(TokenKind::Equals) => {
      let name = stream.get_ident("variable name")?;
      stream.skip(TokenKind::Equals)?;
      let expr = parse_expr(stream)?;
      Stmt::VarAssign { name, expr }
    }
    Some(TokenKind::Ident) => {
      let name = stream.get_ident("function name")?;
      stream.skip(TokenKind::LParen)?;
      stream.skip(TokenKind::RParen)?;
      Stmt::Call { name }
    }
    _ => {
      let got = describe_token(stream.peek(), stream.source);
      return Err(stream.error_here(format!("expected a statement, but got {got}")));
    }
  };

  stream.skip(TokenKind::Semicolon)?;
  Ok(stmt)
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<Expr> {
  match stream.peek_kind(0) {
    Some(TokenKind::Num) => Ok(Expr::number(stream.get_number()?)),
    Some(TokenKind::Ident) if stream.peek_kind(1) == Some(TokenKind::LParen) => {
      let name = stream.get_ident("function name")?;
      stream.skip(TokenKind::LParen)?;
      stream.skip(TokenKind::RParen)?;
      Ok(Expr::call(name))
    }
    Some(TokenKind::Ident) => Ok(Expr::var(stream.get_ident("variable name")?)),
    _ => {
      let got = describe_token(stream.peek(), stream.source);
      Err(stream.error_here(format!(
        "expected a number, variable or call, but got {got}"
      )))
    }
  }
}

/// Cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_kind(&self, ahead: usize) -> Option<TokenKind> {
    self.tokens.get(self.pos + ahead).map(|token| token.kind)
  }

  fn at(&self, kind: TokenKind) -> bool {
    self.peek_kind(0) == Some(kind)
  }

  /// Consume the current token if it has the given kind.
  fn equal(&mut self, kind: TokenKind) -> bool {
    if self.at(kind) {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, kind: TokenKind) -> CompileResult<()> {
    if self.equal(kind) {
      Ok(())
    } else {
      let got = describe_token(self.peek(), self.source);
      Err(self.error_here(format!("expected {}, but got {got}", kind.describe())))
    }
  }

  /// Build a syntax error pointing at the current token.
  fn error_here(&self, message: impl Into<String>) -> CompileError {
    let loc = self.peek().map_or(self.source.len(), |token| token.loc);
    CompileError::at(self.source, loc, self.pos, message)
  }

  /// Consume an identifier; `what` names the role it plays for diagnostics.
  fn get_ident(&mut self, what: &str) -> CompileResult<String> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Ident
    {
      let Some(name) = token.text.clone() else {
        return Err(self.error_here("internal error: identifier token missing text"));
      };
      self.pos += 1;
      return Ok(name);
    }

    let got = describe_token(self.peek(), self.source);
    Err(self.error_here(format!("expected {what}, but got {got}")))
  }

  /// Consume an integer literal and convert it with decimal parsing.
  fn get_number(&mut self) -> CompileResult<i64> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
    {
      let Some(text) = token.text.as_deref() else {
        return Err(self.error_here("internal error: numeric token missing text"));
      };
      let value = text
        .parse::<i64>()
        .map_err(|err| self.error_here(format!("invalid number `{text}`: {err}")))?;
      self.pos += 1;
      return Ok(value);
    }

    let got = describe_token(self.peek(), self.source);
    Err(self.error_here(format!("expected a number, but got {got}")))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek_kind(0), Some(TokenKind::Eof) | None)
  }
}
