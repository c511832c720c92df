//! Lumen command line driver
//!
//! Programs are read as JSON-encoded ASTs.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lumen::feedback::CheckReport;
use lumen::frontend::ast::{Program, TypeExpr};
use lumen::interp::StdoutSink;
use lumen::{CompiledProgram, Options, Session};

/// Lumen toolchain
#[derive(Parser, Debug)]
#[command(name = "lumenc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "Lumen - load, check and run programs given as JSON ASTs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a program and run its entry function
    Run {
        /// Program file (JSON AST)
        input: PathBuf,

        /// Zero-argument entry function
        #[arg(short, long, default_value = "foo")]
        entry: String,
    },
    /// Load a program and report diagnostics
    Check {
        /// Program file (JSON AST)
        input: PathBuf,

        /// Emit a JSON report
        #[arg(long)]
        json: bool,

        /// Treat warnings as errors
        #[arg(long)]
        deny_warnings: bool,
    },
    /// Print the binding a member resolves to
    Resolve {
        /// Program file (JSON AST)
        input: PathBuf,

        /// Receiver type, e.g. `Person` or `Option<Person>`
        #[arg(value_name = "TYPE")]
        receiver: String,

        /// Member name
        member: String,
    },
    /// Print the capability table
    Capabilities {
        /// Program file (JSON AST)
        input: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { input, entry } => run_file(&input, entry),
        Commands::Check { input, json, deny_warnings } => check_file(&input, json, deny_warnings),
        Commands::Resolve { input, receiver, member } => resolve_member(&input, &receiver, &member),
        Commands::Capabilities { input } => {
            load_or_exit(&input, Options::default()).map(|program| println!("{}", program.capabilities_json()))
        }
        Commands::Version => {
            println!("lumenc 0.1.0");
            println!("Lumen language core");
            println!("License: Apache-2.0");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn read_program(input: &Path) -> Result<Program> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    serde_json::from_str(&source).with_context(|| format!("decoding program {}", input.display()))
}

/// Load a program, printing diagnostics and exiting on failure
fn load_or_exit(input: &Path, options: Options) -> Result<CompiledProgram> {
    let program = read_program(input)?;
    match Session::new(options).load(program.items) {
        Ok(compiled) => {
            for warning in compiled.warnings() {
                eprintln!("{}", warning);
            }
            Ok(compiled)
        }
        Err(diagnostics) => {
            for diagnostic in &diagnostics.items {
                eprintln!("{}", diagnostic);
            }
            eprintln!("{}: {}", input.display(), diagnostics);
            process::exit(1);
        }
    }
}

fn run_file(input: &Path, entry: String) -> Result<()> {
    let options = Options { entry, ..Options::default() };
    let session = Session::new(options.clone());
    let program = load_or_exit(input, options)?;

    let mut sink = StdoutSink;
    let value = session
        .run(&program, &mut sink)
        .with_context(|| format!("running {}", session.options().entry))?;
    if !value.is_unit() {
        println!("{}", value);
    }
    Ok(())
}

/// Check a program for errors without running it
fn check_file(input: &Path, json: bool, deny_warnings: bool) -> Result<()> {
    let program = read_program(input)?;
    let source_file = input.display().to_string();
    let session = Session::new(Options { deny_warnings, ..Options::default() });

    match session.load(program.items) {
        Ok(compiled) => {
            if json {
                let report = CheckReport::success(source_file, compiled.warnings(), compiled.stats());
                println!("{}", report.to_json());
            } else {
                for warning in compiled.warnings() {
                    println!("{}", warning);
                }
                println!("✅ No errors found");
            }
            Ok(())
        }
        Err(diagnostics) => {
            if json {
                println!("{}", CheckReport::failure(source_file, &diagnostics).to_json());
            } else {
                for diagnostic in &diagnostics.items {
                    eprintln!("{}", diagnostic);
                }
                eprintln!("{}: {}", source_file, diagnostics);
            }
            process::exit(1);
        }
    }
}

fn resolve_member(input: &Path, receiver: &str, member: &str) -> Result<()> {
    let program = load_or_exit(input, Options::default())?;
    let receiver = TypeExpr::parse(receiver).map_err(anyhow::Error::msg)?;
    let binding = program.resolve_for(&receiver, member)?;
    println!("{}", serde_json::to_string_pretty(&binding)?);
    Ok(())
}
