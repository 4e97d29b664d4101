// src/main.rs

// lox_vm
// Command line front end for the bytecode engine: run a script or start a REPL.

use clap::Parser as ClapParser;
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use lox_vm::{compile, disassemble_chunk, InterpretError, Value, Vm, VmConfig};

// sysexits: EX_IOERR
const EXIT_IO_ERROR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The script file to run. If not provided, launches the REPL.
    file: Option<PathBuf>,

    /// Print the compiled bytecode before running it.
    #[arg(short, long)]
    disassemble: bool,

    /// Log every executed instruction together with the value stack.
    #[arg(short, long)]
    trace: bool,

    /// Initial number of value stack slots.
    #[arg(long, default_value_t = lox_vm::vm::DEFAULT_STACK_CAPACITY)]
    stack_capacity: usize,
}

impl Cli {
    fn vm_config(&self) -> VmConfig {
        VmConfig { initial_stack_capacity: self.stack_capacity }
    }
}

fn init_logging(trace: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if trace {
        builder.filter_module("lox_vm::vm", LevelFilter::Trace);
    }
    builder.format_timestamp(None).init();
}

// Compiles and runs one unit of source, dumping the bytecode first when asked.
fn run_source(source: &str, cli: &Cli) -> Result<Value, InterpretError> {
    let chunk = compile(source)?;
    if cli.disassemble {
        disassemble_chunk(&chunk, "code");
    }
    let mut vm = Vm::with_config(&chunk, cli.vm_config());
    Ok(vm.run()?)
}

/// Runs the interpreter on a given script file and exits with the conventional code on failure.
fn run_file(path: &Path, cli: &Cli) {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read file '{}': {}", path.display(), e);
            process::exit(EXIT_IO_ERROR);
        }
    };

    match run_source(&source, cli) {
        Ok(result) => println!("{}", lox_vm::value::format_value(result)),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    }
}

// Simple REPL
fn repl(cli: &Cli) {
    println!("lox_vm REPL");
    println!("Enter expressions, or 'quit' to leave.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return;
        }

        let input = match lines.next() {
            Some(Ok(input)) => input,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                process::exit(EXIT_IO_ERROR);
            }
            None => {
                println!();
                return;
            }
        };
        let input = input.trim();

        if input == "quit" || input == "exit" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        match run_source(input, cli) {
            Ok(result) => println!("{}", lox_vm::value::format_value(result)),
            Err(e) => println!("{}", e),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.trace);

    match &cli.file {
        Some(path) => run_file(path, &cli),
        None => repl(&cli),
    }
}
