//! veril CLI — the command-line interface for the veril SystemVerilog
//! front end.
//!
//! `veril compile` runs the full pipeline over a project's sources and
//! prints diagnostics; `veril dump` additionally writes the elaborated
//! design database as JSON for downstream tooling.

#![warn(missing_docs)]

mod compile;

use std::process;

use clap::{Parser, Subcommand};

/// veril — a SystemVerilog-2017 front end.
#[derive(Parser, Debug)]
#[command(name = "veril", version, about = "veril SystemVerilog front end")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a project directory containing `veril.toml`.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and elaborate the project's sources.
    Compile(CompileArgs),
    /// Compile, then dump the elaborated design database as JSON.
    Dump(DumpArgs),
}

/// Arguments for the `veril compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Source files to compile instead of the project configuration.
    #[arg(num_args = 0..)]
    pub sources: Vec<String>,

    /// Explicit top module names.
    #[arg(long, num_args = 1..)]
    pub top: Vec<String>,

    /// Treat undefined macros as errors.
    #[arg(long)]
    pub complain_undefined_macro: bool,
}

/// Arguments for the `veril dump` subcommand.
#[derive(Parser, Debug)]
pub struct DumpArgs {
    /// Compilation arguments.
    #[command(flatten)]
    pub compile: CompileArgs,

    /// Output path for the design JSON (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let code = match &cli.command {
        Command::Compile(args) => compile::run_compile(&cli, args, None),
        Command::Dump(args) => compile::run_compile(&cli, &args.compile, Some(args)),
    };
    process::exit(code);
}
