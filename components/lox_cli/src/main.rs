//! Lox command-line entry point
//!
//! Parses CLI arguments, installs logging and delegates to the Runtime.

use clap::Parser as ClapParser;
use lox_cli::{Cli, CliError, Runtime};
use memory_manager::GcConfig;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = GcConfig::default().with_stress(cli.stress_gc);
    let mut runtime = Runtime::new(config).with_print_bytecode(cli.print_bytecode);

    let result = if cli.repl {
        runtime.repl()
    } else if let Some(path) = cli.script_path() {
        runtime.execute_file(path).map(drop)
    } else if let Some(code) = &cli.eval {
        runtime.execute_string(code).map(drop)
    } else {
        runtime.repl()
    };

    if let Err(e) = result {
        match (&e, cli.script_path()) {
            (CliError::Io(io), Some(path)) => {
                eprintln!("Could not read file '{}': {}", path, io)
            }
            _ => eprintln!("{}", e),
        }
        std::process::exit(e.exit_code());
    }
}

/// Install the fmt subscriber on stderr. `RUST_LOG` sets the base filter;
/// `--trace` and `--log-gc` add their targets on top.
fn init_logging(cli: &Cli) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.trace {
        filter = filter.add_directive(tracing_directive("vm::exec=trace"));
    }
    if cli.log_gc {
        filter = filter.add_directive(tracing_directive("gc=trace"));
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn tracing_directive(directive: &str) -> tracing_subscriber::filter::Directive {
    match directive.parse() {
        Ok(directive) => directive,
        Err(e) => unreachable!("built-in filter directive {:?} is invalid: {}", directive, e),
    }
}
