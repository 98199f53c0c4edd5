//! Front end of the `lox` binary
//!
//! [`Runtime`] compiles and runs scripts against one persistent VM, from a
//! file, an `--eval` string or the interactive prompt in [`repl`], and can list
//! the bytecode of every compiled function before running it. [`Cli`] holds the
//! parsed flags and [`CliError`] maps failures to process exit codes.
//!
//! # Example
//!
//! ```
//! use clap::Parser as ClapParser;
//! use lox_cli::{Cli, Runtime};
//!
//! let cli = Cli::try_parse_from(["lox", "--print-bytecode", "-e", "print 1 + 2;"]).unwrap();
//! let mut runtime = Runtime::default().with_print_bytecode(cli.print_bytecode);
//!
//! let mut out = Vec::new();
//! runtime.execute_to(cli.eval.as_deref().unwrap(), &mut out).unwrap();
//! let text = String::from_utf8(out).unwrap();
//! assert!(text.starts_with("== <script> =="));
//! assert!(text.ends_with("3\n"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runtime::{listing, Runtime};
