//! REPL (Read-Eval-Print Loop) implementation

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;

/// Run the interactive REPL
///
/// Globals defined on one line stay visible to later lines. Compile and
/// runtime errors are reported and the prompt carries on.
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("Failed to initialize editor: {}", e)))?;

    println!("Lox {}", env!("CARGO_PKG_VERSION"));
    println!("Type .help for commands, .exit to quit.");

    let mut line_buffer = String::new();

    loop {
        let prompt = if line_buffer.is_empty() { "> " } else { "... " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                if line_buffer.is_empty() && trimmed.starts_with('.') {
                    match handle_repl_command(trimmed, runtime) {
                        ReplAction::Continue => continue,
                        ReplAction::Exit => break,
                    }
                }

                if !line_buffer.is_empty() {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                if !is_input_complete(&line_buffer) {
                    continue;
                }

                let _ = editor.add_history_entry(line_buffer.as_str());
                if let Err(e) = runtime.execute_string(&line_buffer) {
                    eprintln!("{}", e);
                }
                line_buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                if line_buffer.is_empty() {
                    println!("Press Ctrl-D or type .exit to quit");
                } else {
                    println!("^C");
                    line_buffer.clear();
                }
            }
            Err(ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                return Err(CliError::Repl(format!("Readline error: {}", err)));
            }
        }
    }

    Ok(())
}

enum ReplAction {
    Continue,
    Exit,
}

/// Handle special REPL commands
fn handle_repl_command(command: &str, runtime: &mut Runtime) -> ReplAction {
    match command {
        ".help" => {
            println!("REPL Commands:");
            println!("  .help     - Show this help message");
            println!("  .gc       - Run the garbage collector and show its counters");
            println!("  .exit     - Exit the REPL");
        }
        ".gc" => {
            let stats = runtime.collect_garbage();
            println!(
                "collections: {}, objects freed: {}, bytes freed: {}",
                stats.collections, stats.objects_freed, stats.bytes_freed
            );
            println!(
                "live objects: {}, bytes allocated: {}, next collection at: {}",
                stats.live_objects, stats.bytes_allocated, stats.next_gc
            );
        }
        ".exit" => return ReplAction::Exit,
        _ => {
            println!("Unknown command: {}", command);
            println!("Type .help for available commands");
        }
    }
    ReplAction::Continue
}

/// Check if the input appears to be complete
///
/// Braces and parentheses must balance outside string literals and
/// comments. Unbalanced closers count as complete so the compiler reports
/// them.
fn is_input_complete(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;

    for line in input.lines() {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if in_string {
                if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '/' if chars.peek() == Some(&'/') => break,
                '{' | '(' => depth += 1,
                '}' | ')' => depth -= 1,
                _ => {}
            }
        }
    }

    depth <= 0 && !in_string
}
