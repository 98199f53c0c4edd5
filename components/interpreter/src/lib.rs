//! Bytecode interpreter for the Lox runtime
//!
//! This crate provides the stack virtual machine:
//! - A bounded value stack and call stack
//! - Closures with upvalues that outlive their stack frames
//! - Classes with copy-down inheritance, bound methods and fused invokes
//! - Collection from the VM's root set on any allocation
//!
//! # Example
//!
//! ```
//! use interpreter::Vm;
//!
//! let mut vm = Vm::new();
//! let (heap, roots) = vm.heap_and_roots();
//! let script = parser::compile("print \"hi \" + \"there\";", heap, &roots).unwrap();
//!
//! let mut out = Vec::new();
//! vm.execute(script, &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "hi there\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
mod dispatch;
pub mod gc_integration;
pub mod natives;
mod upvalue;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::{CallFrame, FRAMES_MAX, STACK_MAX};
pub use gc_integration::VmRoots;
pub use vm::Vm;
