//! Runtime orchestration for Lox execution
//!
//! The Runtime struct ties the compiler to one persistent VM, so globals
//! defined by one call are visible to the next.

use std::io::{self, Write};

use bytecode_system::Disassembler;
use core_types::{ObjRef, Value};
use interpreter::Vm;
use memory_manager::{GcConfig, GcStats, Heap, ObjType};

use crate::error::CliResult;

/// Compiles and runs Lox source against a persistent VM
#[derive(Debug)]
pub struct Runtime {
    /// Whether to print bytecode before execution
    print_bytecode: bool,
    /// Persistent VM instance for maintaining state
    vm: Vm,
}

impl Runtime {
    /// Create a new runtime instance
    ///
    /// # Example
    /// ```
    /// use lox_cli::Runtime;
    /// use memory_manager::GcConfig;
    ///
    /// let runtime = Runtime::new(GcConfig::default().with_stress(true));
    /// ```
    pub fn new(config: GcConfig) -> Self {
        Self {
            print_bytecode: false,
            vm: Vm::with_gc_config(config),
        }
    }

    /// Enable bytecode printing
    pub fn with_print_bytecode(mut self, enabled: bool) -> Self {
        self.print_bytecode = enabled;
        self
    }

    /// Execute a Lox file, printing to stdout.
    ///
    /// # Errors
    /// Returns `CliError` if the file cannot be read or compiling or running
    /// it fails
    ///
    /// # Example
    /// ```no_run
    /// use lox_cli::Runtime;
    ///
    /// let mut runtime = Runtime::default();
    /// runtime.execute_file("example.lox").unwrap();
    /// ```
    pub fn execute_file(&mut self, path: &str) -> CliResult<Value> {
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path, bytes = source.len(), "running script file");
        self.execute_string(&source)
    }

    /// Execute Lox source, printing to stdout.
    pub fn execute_string(&mut self, source: &str) -> CliResult<Value> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let result = self.execute_to(source, &mut out);
        out.flush()?;
        result
    }

    /// Execute Lox source, writing bytecode listings and `print` output to
    /// `out`.
    ///
    /// # Example
    /// ```
    /// use lox_cli::Runtime;
    ///
    /// let mut runtime = Runtime::default();
    /// let mut out = Vec::new();
    /// runtime.execute_to("var a = 1;", &mut out).unwrap();
    /// runtime.execute_to("print a + 1;", &mut out).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), "2\n");
    /// ```
    pub fn execute_to(&mut self, source: &str, out: &mut dyn Write) -> CliResult<Value> {
        let (heap, roots) = self.vm.heap_and_roots();
        let script = parser::compile(source, heap, &roots)?;

        if self.print_bytecode {
            out.write_all(listing(self.vm.heap(), script).as_bytes())?;
        }

        Ok(self.vm.execute(script, out)?)
    }

    /// Run the interactive prompt until the user leaves it.
    pub fn repl(&mut self) -> CliResult<()> {
        crate::repl::run_repl(self)
    }

    /// Run a full collection and report the collector counters.
    pub fn collect_garbage(&mut self) -> GcStats {
        self.vm.collect_garbage();
        self.vm.heap().stats()
    }

    /// The underlying VM.
    pub fn vm(&self) -> &Vm {
        &self.vm
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(GcConfig::default())
    }
}

/// Disassembly of `function` followed by every function nested in its
/// constant pool, depth first.
pub fn listing(heap: &Heap, function: ObjRef) -> String {
    let mut out = String::new();
    let mut pending = vec![function];
    while let Some(next) = pending.pop() {
        let function = heap.as_function(next);
        let name = match function.name {
            Some(name) => heap.as_str(name).to_string(),
            None => "<script>".to_string(),
        };
        out.push_str(&Disassembler::new(&function.chunk, heap).disassemble(&name));

        let nested = function
            .chunk
            .constants()
            .iter()
            .rev()
            .filter(|value| heap.is_obj_type(**value, ObjType::Function))
            .filter_map(|value| match value {
                Value::Obj(obj) => Some(*obj),
                _ => None,
            });
        pending.extend(nested);
    }
    out
}
