//! Shared error utilities used across the compilation pipeline.
//!
//! Every stage returns a `CompileResult`; nothing below `main` terminates the
//! process. Syntax diagnostics are formatted in a style reminiscent of
//! chibicc, echoing the offending source line with a caret under the token.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Coarse classification of a `CompileError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Io,
  Syntax,
  DuplicateSymbol,
  UndefinedSymbol,
  MalformedNode,
  Assembler,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("cannot read {}: {source}", path.display()))]
  ReadSource { path: PathBuf, source: io::Error },

  #[snafu(display("cannot write {}: {source}", path.display()))]
  WriteOutput { path: PathBuf, source: io::Error },

  #[snafu(display("{line}:{column}: syntax error at token {position}: {message}\n{snippet}"))]
  Syntax {
    message: String,
    position: usize,
    line: usize,
    column: usize,
    snippet: String,
  },

  #[snafu(display("duplicate symbol `{name}`: already declared in this function"))]
  DuplicateSymbol { name: String },

  #[snafu(display("undefined symbol `{name}`"))]
  UndefinedSymbol { name: String },

  #[snafu(display("malformed node: {message}"))]
  MalformedNode { message: String },

  #[snafu(display("cannot run assembler `{program}`: {source}"))]
  SpawnAssembler { program: String, source: io::Error },

  #[snafu(display("assembler `{program}` failed on {}: {status}", path.display()))]
  AssemblerFailed {
    program: String,
    path: PathBuf,
    status: ExitStatus,
  },
}

impl CompileError {
  /// Construct a syntax error anchored at byte offset `loc` of `source`.
  ///
  /// `position` is the index of the offending token in the token stream.
  pub fn at(source: &str, loc: usize, position: usize, message: impl Into<String>) -> Self {
    let mut safe_loc = loc.min(source.len());
    while !source.is_char_boundary(safe_loc) {
      safe_loc -= 1;
    }

    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    let line = source[..line_start].matches('\n').count() + 1;
    let column = source[line_start..safe_loc].chars().count() + 1;

    let text = source[line_start..line_end].trim_end_matches('\r');
    let snippet = format!("{text}\n{}^", " ".repeat(column - 1));

    Self::Syntax {
      message: message.into(),
      position,
      line,
      column,
      snippet,
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::ReadSource { .. } | Self::WriteOutput { .. } => ErrorKind::Io,
      Self::Syntax { .. } => ErrorKind::Syntax,
      Self::DuplicateSymbol { .. } => ErrorKind::DuplicateSymbol,
      Self::UndefinedSymbol { .. } => ErrorKind::UndefinedSymbol,
      Self::MalformedNode { .. } => ErrorKind::MalformedNode,
      Self::SpawnAssembler { .. } | Self::AssemblerFailed { .. } => ErrorKind::Assembler,
    }
  }
}
