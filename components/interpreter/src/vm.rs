//! Virtual Machine for bytecode execution
//!
//! Main entry point for running compiled Lox functions.

use std::io::Write;

use arrayvec::ArrayVec;
use core_types::{ObjRef, RuntimeError, RuntimeErrorKind, StackFrame, Value};
use memory_manager::{GcConfig, Heap, NativeFn, Obj, ObjClosure, ObjNative, ObjType, Table};

use crate::call_frame::{CallFrame, FRAMES_MAX, STACK_MAX};
use crate::gc_integration::{vm_roots, VmRoots};
use crate::natives;

/// Virtual Machine for executing Lox bytecode
///
/// The VM owns all execution state:
/// - the object heap and its collector
/// - the value stack and the bounded call stack
/// - the globals table and the list of open upvalues
///
/// Independent VMs share nothing.
///
/// # Example
///
/// ```
/// use interpreter::Vm;
///
/// let mut vm = Vm::new();
/// let (heap, roots) = vm.heap_and_roots();
/// let script = parser::compile("var answer = 6 * 7;", heap, &roots).unwrap();
///
/// let mut out = Vec::new();
/// vm.execute(script, &mut out).unwrap();
/// assert_eq!(vm.global("answer"), Some(core_types::Value::Number(42.0)));
/// ```
#[derive(Debug)]
pub struct Vm {
    pub(crate) heap: Heap,
    pub(crate) stack: Vec<Value>,
    pub(crate) frames: ArrayVec<CallFrame, FRAMES_MAX>,
    pub(crate) globals: Table,
    /// Open upvalues ordered by stack slot, lowest first
    pub(crate) open_upvalues: Vec<ObjRef>,
    pub(crate) init_string: ObjRef,
}

impl Vm {
    /// Create a VM with the default collector settings and the standard
    /// natives defined.
    pub fn new() -> Self {
        Self::with_gc_config(GcConfig::default())
    }

    /// Create a VM whose heap uses `config`.
    pub fn with_gc_config(config: GcConfig) -> Self {
        let mut heap = Heap::with_config(config);
        let init_string = heap.intern("init", &memory_manager::NoRoots);
        let mut vm = Self {
            heap,
            stack: Vec::with_capacity(STACK_MAX),
            frames: ArrayVec::new(),
            globals: Table::new(),
            open_upvalues: Vec::new(),
            init_string,
        };
        natives::install(&mut vm);
        vm
    }

    /// Run `function` as a top-level script, writing `print` output to `out`.
    ///
    /// Returns the value returned by the outermost frame. After an error the
    /// stacks are reset; globals survive, so the VM can run further scripts.
    ///
    /// # Panics
    ///
    /// Panics if `function` is not a live function object.
    pub fn execute(&mut self, function: ObjRef, out: &mut dyn Write) -> Result<Value, RuntimeError> {
        assert!(
            self.heap.is_obj_type(Value::Obj(function), ObjType::Function),
            "execute expects a function object"
        );
        self.push(Value::Obj(function))?;
        let closure = self.alloc(Obj::Closure(ObjClosure {
            function,
            upvalues: Vec::new(),
        }));
        self.pop();
        self.push(Value::Obj(closure))?;
        self.call_closure(closure, 0)?;
        self.run(out)
    }

    /// Bind a host function to a global name.
    pub fn define_native(&mut self, name: &str, function: NativeFn) {
        let name = self.intern(name);
        self.stack.push(Value::Obj(name));
        let native = self.alloc(Obj::Native(ObjNative { function }));
        self.stack.push(Value::Obj(native));
        self.globals.insert(name, Value::Obj(native));
        self.stack.truncate(self.stack.len() - 2);
    }

    /// Current value of the global `name`, if defined.
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = self.heap.interned(name)?;
        self.globals.get(&name).copied()
    }

    /// Run a full collection now.
    pub fn collect_garbage(&mut self) {
        let roots = vm_roots!(self);
        self.heap.collect(&roots);
    }

    /// The heap, for rendering values and inspecting collector state.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The heap together with the VM's root set.
    ///
    /// Compile against these so a collection triggered while compiling keeps
    /// everything the VM holds.
    pub fn heap_and_roots(&mut self) -> (&mut Heap, VmRoots<'_>) {
        let roots = vm_roots!(self);
        (&mut self.heap, roots)
    }

    /// Number of active call frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of values on the stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() == STACK_MAX {
            return Err(self.runtime_error(RuntimeErrorKind::StackOverflow, "Stack overflow."));
        }
        self.stack.push(value);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Value {
        let Some(value) = self.stack.pop() else {
            panic!("value stack underflow");
        };
        value
    }

    pub(crate) fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    /// Build an error carrying the current call stack, then reset the
    /// stacks.
    pub(crate) fn runtime_error(
        &mut self,
        kind: RuntimeErrorKind,
        message: impl Into<String>,
    ) -> RuntimeError {
        let trace = self
            .frames
            .iter()
            .rev()
            .map(|frame| {
                let function = self.heap.as_function(frame.function);
                StackFrame {
                    function_name: function.name.map(|name| self.heap.as_str(name).to_string()),
                    line: function.chunk.line_at(frame.ip.saturating_sub(1)),
                }
            })
            .collect();
        self.reset_stack();
        let error = RuntimeError::new(kind, message).with_trace(trace);
        tracing::debug!(target: "vm::exec", kind = ?error.kind, line = ?error.line, "runtime error");
        error
    }

    /// Captured locals are closed first, so closures that escaped the failed
    /// run keep their values.
    fn reset_stack(&mut self) {
        self.close_upvalues(0);
        self.stack.clear();
        self.frames.clear();
        self.open_upvalues.clear();
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
