use std::path::PathBuf;
use std::process;

use chemist::{Assembler, compile_file};
use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;

/// Compile a tiny C subset into a freestanding x86-64 Linux executable.
#[derive(Debug, Parser)]
#[command(name = "chemist", version)]
struct Cli {
  /// C source file to compile
  input: PathBuf,

  /// Output base name; the assembly is written to `<OUTPUT>.asm`
  output: PathBuf,
}

fn main() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .with_max_level(tracing::Level::INFO)
    .init();

  let cli = match Cli::try_parse() {
    Ok(cli) => cli,
    Err(err) if matches!(err.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
      err.exit()
    }
    Err(err) => {
      let _ = err.print();
      process::exit(1);
    }
  };

  let result =
    compile_file(&cli.input, &cli.output).and_then(|asm| Assembler::default().assemble(&asm));

  if let Err(err) = result {
    eprintln!("error: {err}");
    process::exit(1);
  }
}
