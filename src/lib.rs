//! Crate root: wires together the compilation pipeline.
//!
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the program AST.
//! - `scope` hands out stack slots for the locals of one function.
//! - `codegen` lowers the program into fasm x86-64 assembly.
//! - `driver` reads sources, writes `.asm` files and runs the assembler.
//! - `error` holds the error taxonomy shared by every stage.

pub mod codegen;
pub mod driver;
pub mod error;
pub mod parser;
pub mod scope;
pub mod tokenizer;

use tracing::debug;

pub use driver::{Assembler, compile_file};
pub use error::{CompileError, CompileResult, ErrorKind};

/// Compile a source string into fasm assembly.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source);
  debug!(tokens = tokens.len(), "tokenized source");

  let program = parser::parse(tokens, source)?;
  debug!(functions = program.functions.len(), "parsed program");

  codegen::generate(&program)
}
