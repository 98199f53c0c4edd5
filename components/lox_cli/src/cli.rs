//! Command-line arguments

use clap::Parser as ClapParser;

/// Arguments of the `lox` binary
#[derive(Debug, ClapParser)]
#[command(name = "lox", version, about = "Bytecode virtual machine for the Lox language")]
pub struct Cli {
    /// Script to run
    #[arg(value_name = "SCRIPT", conflicts_with_all = ["file", "eval"])]
    pub script: Option<String>,

    /// Script to run
    #[arg(short, long, value_name = "FILE", conflicts_with = "eval")]
    pub file: Option<String>,

    /// Source code to run
    #[arg(short, long, value_name = "CODE")]
    pub eval: Option<String>,

    /// Start the interactive prompt
    #[arg(short, long)]
    pub repl: bool,

    /// Print the disassembled bytecode before running
    #[arg(long)]
    pub print_bytecode: bool,

    /// Collect garbage on every growing allocation
    #[arg(long)]
    pub stress_gc: bool,

    /// Log every executed instruction
    #[arg(long)]
    pub trace: bool,

    /// Log collector activity
    #[arg(long)]
    pub log_gc: bool,
}

impl Cli {
    /// Path of the script to run, given either positionally or with `--file`.
    pub fn script_path(&self) -> Option<&str> {
        self.file.as_deref().or(self.script.as_deref())
    }
}
