//! Code generation: lower the parsed AST into fasm x86-64 assembly.
//!
//! Every expression leaves its value in `rax`; locals live in 8-byte slots
//! addressed relative to `rbp`. Each function is emitted in two passes over
//! its statements:
//!
//! 1. declarations are registered in the scope to size the frame, and their
//!    initializers are evaluated;
//! 2. `return`, call and assignment statements are emitted in order.
//!
//! After all functions, a `start` trampoline calls `main` and hands its
//! result to the Linux `exit` syscall.

use tracing::debug;

use crate::error::{CompileResult, MalformedNodeSnafu};
use crate::parser::{Expr, Function, Program, Stmt};
use crate::scope::Scope;

/// Label of the executable entry point.
pub const ENTRY_LABEL: &str = "start";

const SYS_EXIT: i64 = 60;

/// Emit assembly for a whole program.
pub fn generate(program: &Program) -> CompileResult<String> {
  let mut generator = Generator::new();
  generator.emit_program(program)?;
  Ok(generator.asm)
}

/// Generation state threaded through every function: the output buffer and
/// the single live scope.
struct Generator {
  scope: Scope,
  asm: String,
}

impl Generator {
  fn new() -> Self {
    Self {
      scope: Scope::new(),
      asm: String::new(),
    }
  }

  fn emit_program(&mut self, program: &Program) -> CompileResult<()> {
    self.asm.push_str("format ELF64 executable 3\n");
    self.asm.push_str(&format!("entry {ENTRY_LABEL}\n"));
    self.asm.push_str("segment readable executable\n");

    for func in &program.functions {
      self.emit_function(func)?;
    }

    self.asm.push_str(&format!("{ENTRY_LABEL}:\n"));
    self.asm.push_str("    call main\n");
    self.asm.push_str("    mov rdi, rax\n");
    self.asm.push_str(&format!("    mov rax, {SYS_EXIT}\n"));
    self.asm.push_str("    syscall\n");
    self.asm.push_str("segment readable writable\n");
    Ok(())
  }

  fn emit_function(&mut self, func: &Function) -> CompileResult<()> {
    check_label(&func.name, "function")?;
    if func.name == ENTRY_LABEL {
      return MalformedNodeSnafu {
        message: format!("function name `{ENTRY_LABEL}` is reserved for the entry point"),
      }
      .fail();
    }

    self.scope.reset();
    self.asm.push_str(&format!("{}:\n", func.name));
    self.asm.push_str("    push rbp\n");
    self.asm.push_str("    mov rbp, rsp\n");

    // Initializers are buffered so they land after the stack reservation;
    // otherwise a call in an initializer would clobber slots below rsp.
    let mut inits = String::new();
    for stmt in &func.body {
      if let Stmt::VarDecl { name, init } = stmt {
        check_label(name, "variable")?;
        let offset = self.scope.add_variable(name)?;
        match init {
          Some(expr) => emit_expr(expr, &self.scope, &mut inits)?,
          None => inits.push_str("    xor eax, eax\n"),
        }
        inits.push_str(&format!("    mov qword [rbp - {offset}], rax\n"));
      }
    }

    let frame_size = self.scope.frame_size();
    if frame_size > 0 {
      self.asm.push_str(&format!("    sub rsp, {frame_size}\n"));
    }
    self.asm.push_str(&inits);

    for stmt in &func.body {
      match stmt {
        Stmt::VarDecl { .. } => {}
        Stmt::Return { expr } => {
          emit_expr(expr, &self.scope, &mut self.asm)?;
          if frame_size > 0 {
            self.asm.push_str("    mov rsp, rbp\n");
          }
          self.asm.push_str("    pop rbp\n");
          self.asm.push_str("    ret\n\n");
        }
        Stmt::Call { name } => {
          check_label(name, "call")?;
          self.asm.push_str(&format!("    call {name}\n"));
        }
        Stmt::VarAssign { name, expr } => {
          let offset = self.scope.lookup_offset(name)?;
          emit_expr(expr, &self.scope, &mut self.asm)?;
          self.asm.push_str(&format!("    mov qword [rbp - {offset}], rax\n"));
        }
      }
    }

    debug!(
      function = %func.name,
      frame_size,
      locals = self.scope.symbols().len(),
      "emitted function"
    );
    Ok(())
  }
}

/// Evaluate an expression into `rax`.
fn emit_expr(expr: &Expr, scope: &Scope, asm: &mut String) -> CompileResult<()> {
  match expr {
    Expr::Num { value } => asm.push_str(&format!("    mov rax, {value}\n")),
    Expr::Var { name } => {
      let offset = scope.lookup_offset(name)?;
      asm.push_str(&format!("    mov rax, qword [rbp - {offset}]\n"));
    }
    Expr::Call { name } => {
      check_label(name, "call")?;
      asm.push_str(&format!("    call {name}\n"));
    }
  }
  Ok(())
}

/// Names reach the assembler verbatim, so a hand-built AST must still carry
/// identifiers the tokenizer could have produced.
fn check_label(name: &str, role: &str) -> CompileResult<()> {
  let mut chars = name.chars();
  let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    && chars.all(|c| c.is_ascii_alphanumeric());
  if valid {
    Ok(())
  } else {
    MalformedNodeSnafu {
      message: format!("invalid {role} name `{name}`"),
    }
    .fail()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{CompileError, ErrorKind};

  fn func(name: &str, body: Vec<Stmt>) -> Function {
    Function {
      name: name.into(),
      body,
    }
  }

  fn program(functions: Vec<Function>) -> Program {
    Program { functions }
  }

  fn decl(name: &str, init: Option<Expr>) -> Stmt {
    Stmt::VarDecl {
      name: name.into(),
      init,
    }
  }

  fn ret(expr: Expr) -> Stmt {
    Stmt::Return { expr }
  }

  #[test]
  fn return_literal_without_locals() {
    let asm = generate(&program(vec![func("main", vec![ret(Expr::number(42))])])).unwrap();
    assert_eq!(
      asm,
      "format ELF64 executable 3\n\
       entry start\n\
       segment readable executable\n\
       main:\n    push rbp\n    mov rbp, rsp\n    mov rax, 42\n    pop rbp\n    ret\n\n\
       start:\n    call main\n    mov rdi, rax\n    mov rax, 60\n    syscall\n\
       segment readable writable\n"
    );
  }

  #[test]
  fn locals_get_a_frame_and_slots() {
    let asm = generate(&program(vec![func(
      "main",
      vec![
        decl("a", Some(Expr::number(5))),
        decl("b", Some(Expr::var("a"))),
        ret(Expr::var("b")),
      ],
    )]))
    .unwrap();

    let body = "main:\n    push rbp\n    mov rbp, rsp\n    sub rsp, 16\n\
                \x20   mov rax, 5\n    mov qword [rbp - 8], rax\n\
                \x20   mov rax, qword [rbp - 8]\n    mov qword [rbp - 16], rax\n\
                \x20   mov rax, qword [rbp - 16]\n    mov rsp, rbp\n    pop rbp\n    ret\n\n";
    assert!(asm.contains(body), "{asm}");
  }

  #[test]
  fn call_initializer_is_emitted_before_the_store() {
    let asm = generate(&program(vec![
      func("helper", vec![ret(Expr::number(7))]),
      func("main", vec![decl("x", Some(Expr::call("helper"))), ret(Expr::var("x"))]),
    ]))
    .unwrap();

    let call = asm.find("    call helper\n").unwrap();
    let store = asm.find("    mov qword [rbp - 8], rax\n").unwrap();
    let reserve = asm.find("    sub rsp, 8\n").unwrap();
    assert!(reserve < call && call < store);
    assert!(asm.find("helper:\n").unwrap() < asm.find("main:\n").unwrap());
  }

  #[test]
  fn uninitialised_declaration_is_zeroed() {
    let asm = generate(&program(vec![func(
      "main",
      vec![decl("a", None), ret(Expr::var("a"))],
    )]))
    .unwrap();
    assert!(asm.contains("    xor eax, eax\n    mov qword [rbp - 8], rax\n"));
  }

  #[test]
  fn assignment_and_bare_call_follow_the_declarations() {
    let asm = generate(&program(vec![func(
      "main",
      vec![
        Stmt::Call { name: "tick".into() },
        Stmt::VarAssign {
          name: "a".into(),
          expr: Expr::number(9),
        },
        decl("a", Some(Expr::number(1))),
        ret(Expr::var("a")),
      ],
    )]))
    .unwrap();

    let init = asm.find("    mov rax, 1\n").unwrap();
    let call = asm.find("    call tick\n").unwrap();
    let assign = asm.find("    mov rax, 9\n").unwrap();
    assert!(init < call && call < assign);
  }

  #[test]
  fn duplicate_declaration_fails_with_or_without_initializer() {
    for second in [None, Some(Expr::number(2))] {
      let err = generate(&program(vec![func(
        "main",
        vec![decl("a", Some(Expr::number(1))), decl("a", second), ret(Expr::number(0))],
      )]))
      .unwrap_err();
      assert_eq!(err.kind(), ErrorKind::DuplicateSymbol);
    }
  }

  #[test]
  fn undefined_names_fail_everywhere() {
    let cases = vec![
      vec![ret(Expr::var("x"))],
      vec![
        decl("a", None),
        Stmt::VarAssign {
          name: "a".into(),
          expr: Expr::var("x"),
        },
        ret(Expr::number(0)),
      ],
      vec![
        Stmt::VarAssign {
          name: "x".into(),
          expr: Expr::number(1),
        },
        ret(Expr::number(0)),
      ],
      vec![decl("a", Some(Expr::var("x"))), ret(Expr::number(0))],
    ];

    for body in cases {
      let err = generate(&program(vec![func("main", body)])).unwrap_err();
      assert!(
        matches!(&err, CompileError::UndefinedSymbol { name } if name == "x"),
        "{err:?}"
      );
    }
  }

  #[test]
  fn initializer_cannot_see_later_declarations() {
    let err = generate(&program(vec![func(
      "main",
      vec![decl("a", Some(Expr::var("b"))), decl("b", None), ret(Expr::var("a"))],
    )]))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedSymbol);
  }

  #[test]
  fn scope_is_reset_between_functions() {
    let asm = generate(&program(vec![
      func("first", vec![decl("a", Some(Expr::number(1))), ret(Expr::var("a"))]),
      func("main", vec![decl("a", Some(Expr::number(2))), ret(Expr::var("a"))]),
    ]))
    .unwrap();
    assert_eq!(asm.matches("    sub rsp, 8\n").count(), 2);

    let err = generate(&program(vec![
      func("first", vec![decl("a", None), ret(Expr::number(0))]),
      func("main", vec![ret(Expr::var("a"))]),
    ]))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UndefinedSymbol);
  }

  #[test]
  fn malformed_names_are_rejected() {
    let empty = generate(&program(vec![func("", vec![ret(Expr::number(0))])])).unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::MalformedNode);

    let call = generate(&program(vec![func("main", vec![Stmt::Call { name: "1up".into() }])]))
      .unwrap_err();
    assert_eq!(call.kind(), ErrorKind::MalformedNode);

    let reserved = generate(&program(vec![func("start", vec![ret(Expr::number(0))])])).unwrap_err();
    assert_eq!(reserved.kind(), ErrorKind::MalformedNode);
  }

  #[test]
  fn output_is_deterministic() {
    let prog = program(vec![func(
      "main",
      vec![
        decl("z", Some(Expr::number(3))),
        decl("y", Some(Expr::number(2))),
        decl("x", Some(Expr::number(1))),
        ret(Expr::var("y")),
      ],
    )]);
    assert_eq!(generate(&prog).unwrap(), generate(&prog).unwrap());
  }
}
