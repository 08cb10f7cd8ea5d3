//! Flat per-function symbol table that hands out stack slots.
//!
//! A function body is a single namespace: every local lives in one 8-byte
//! slot addressed as `[rbp - offset]`. Offsets grow by one word per
//! declaration, in declaration order.

use std::collections::HashMap;

use crate::error::{CompileResult, DuplicateSymbolSnafu, UndefinedSymbolSnafu};

/// Size of one stack slot in bytes.
pub const WORD_SIZE: i64 = 8;

/// A local variable and its positive offset below the frame pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
  pub name: String,
  pub offset: i64,
}

#[derive(Debug, Default)]
pub struct Scope {
  symbols: Vec<Symbol>,
  index: HashMap<String, usize>,
  frame_size: i64,
}

impl Scope {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare `name` and return the offset of its freshly allocated slot.
  pub fn add_variable(&mut self, name: &str) -> CompileResult<i64> {
    if self.index.contains_key(name) {
      return DuplicateSymbolSnafu { name }.fail();
    }

    self.frame_size += WORD_SIZE;
    let offset = self.frame_size;
    self.index.insert(name.to_string(), self.symbols.len());
    self.symbols.push(Symbol {
      name: name.to_string(),
      offset,
    });
    Ok(offset)
  }

  pub fn lookup_offset(&self, name: &str) -> CompileResult<i64> {
    match self.index.get(name) {
      Some(&slot) => Ok(self.symbols[slot].offset),
      None => UndefinedSymbolSnafu { name }.fail(),
    }
  }

  /// Forget every symbol; called when moving on to the next function.
  pub fn reset(&mut self) {
    self.symbols.clear();
    self.index.clear();
    self.frame_size = 0;
  }

  /// Bytes of stack needed for all locals declared so far.
  pub fn frame_size(&self) -> i64 {
    self.frame_size
  }

  /// Symbols in declaration order.
  pub fn symbols(&self) -> &[Symbol] {
    &self.symbols
  }
}
