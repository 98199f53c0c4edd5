//! Memory Manager - Lox object heap and garbage collector
//!
//! This component provides:
//! - The heap object model (strings, functions, closures, upvalues, natives,
//!   classes, instances, bound methods)
//! - An arena heap with byte accounting and slot reuse
//! - Tri-color mark-sweep collection from an explicit root set
//! - FNV-1a string interning with weak entries

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gc;
pub mod heap;
pub mod interner;
pub mod object;

// Re-export main types
pub use gc::{GcConfig, MarkColor, Marker, NoRoots, RootSource, Trace};
pub use heap::{GcStats, Heap};
pub use interner::{fnv1a, Interner};
pub use object::{
    NativeFn, Obj, ObjBoundMethod, ObjClass, ObjClosure, ObjFunction, ObjInstance, ObjNative,
    ObjString, ObjType, ObjUpvalue, Table, UpvalueState, TABLE_ENTRY_SIZE,
};
