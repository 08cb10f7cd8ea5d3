//! Process-boundary glue: source files in, `.asm` files out, and the external
//! assembler that turns them into an executable.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use snafu::ResultExt;
use tracing::info;

use crate::error::{
  AssemblerFailedSnafu, CompileResult, ReadSourceSnafu, SpawnAssemblerSnafu, WriteOutputSnafu,
};
use crate::generate_assembly;

/// Path of the assembly file written for `output_base`: the `.asm` suffix is
/// appended, so `out.v2` becomes `out.v2.asm`.
pub fn asm_path(output_base: &Path) -> PathBuf {
  let mut path = OsString::from(output_base.as_os_str());
  path.push(".asm");
  PathBuf::from(path)
}

/// Compile `input` and write the assembly next to `output_base`.
///
/// Nothing is written unless the whole pipeline succeeds.
pub fn compile_file(input: &Path, output_base: &Path) -> CompileResult<PathBuf> {
  let source = fs::read_to_string(input).context(ReadSourceSnafu { path: input })?;
  let asm = generate_assembly(&source)?;

  let out = asm_path(output_base);
  fs::write(&out, asm).context(WriteOutputSnafu { path: &out })?;
  info!(input = %input.display(), output = %out.display(), "wrote assembly");
  Ok(out)
}

/// External assembler invoked as `<program> <file.asm>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembler {
  program: OsString,
}

impl Default for Assembler {
  fn default() -> Self {
    Self::new("fasm")
  }
}

impl Assembler {
  pub fn new(program: impl AsRef<OsStr>) -> Self {
    Self {
      program: program.as_ref().to_os_string(),
    }
  }

  pub fn program(&self) -> &OsStr {
    &self.program
  }

  pub fn assemble(&self, asm_file: &Path) -> CompileResult<()> {
    let program = self.program.to_string_lossy().into_owned();
    info!(assembler = %program, file = %asm_file.display(), "running assembler");

    let status = Command::new(&self.program)
      .arg(asm_file)
      .status()
      .context(SpawnAssemblerSnafu {
        program: program.as_str(),
      })?;

    if !status.success() {
      return AssemblerFailedSnafu {
        program,
        path: asm_file,
        status,
      }
      .fail();
    }
    Ok(())
  }
}
