//! Heap object model
//!
//! Every value that does not fit inline in a [`Value`] lives on the heap as
//! one of the [`Obj`] variants. Objects refer to each other through
//! [`ObjRef`] handles, never through pointers, so cycles are harmless until
//! the collector decides they are unreachable.

use std::collections::HashMap;
use std::mem::size_of;

use bytecode_system::Chunk;
use core_types::{ObjRef, Value};

/// Name-keyed table used for globals, instance fields and class methods.
///
/// Keys are interned string handles, so handle equality is name equality.
pub type Table = HashMap<ObjRef, Value>;

/// Signature of a host function callable from scripts.
///
/// Receives the arguments and returns the result, or an error message that
/// becomes a runtime error.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// Immutable interned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjString {
    chars: Box<str>,
    hash: u32,
}

impl ObjString {
    pub(crate) fn new(chars: &str, hash: u32) -> Self {
        Self {
            chars: chars.into(),
            hash,
        }
    }

    /// String contents
    pub fn as_str(&self) -> &str {
        &self.chars
    }

    /// Cached FNV-1a hash of the contents
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True for the empty string
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// A compiled function body.
#[derive(Debug, Clone, Default)]
pub struct ObjFunction {
    /// Declared parameter count
    pub arity: u8,
    /// Number of variables captured by closures over this function
    pub upvalue_count: usize,
    /// Interned name, None for the top-level script
    pub name: Option<ObjRef>,
    /// Bytecode
    pub chunk: Chunk,
}

impl ObjFunction {
    /// An empty anonymous function
    pub fn new() -> Self {
        Self::default()
    }
}

/// Runtime function value: a function plus its captured variables.
#[derive(Debug, Clone)]
pub struct ObjClosure {
    /// The underlying [`ObjFunction`]
    pub function: ObjRef,
    /// One [`ObjUpvalue`] handle per captured variable
    pub upvalues: Vec<ObjRef>,
}

/// Where a captured variable currently lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpvalueState {
    /// Still on the value stack at this absolute slot
    Open(usize),
    /// Copied off the stack when its scope ended
    Closed(Value),
}

/// Indirection to a captured variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjUpvalue {
    /// Current location
    pub state: UpvalueState,
}

impl ObjUpvalue {
    /// An upvalue aliasing stack slot `slot`
    pub fn open(slot: usize) -> Self {
        Self {
            state: UpvalueState::Open(slot),
        }
    }

    /// The stack slot, while still open
    pub fn open_slot(&self) -> Option<usize> {
        match self.state {
            UpvalueState::Open(slot) => Some(slot),
            UpvalueState::Closed(_) => None,
        }
    }
}

/// Host-provided callable.
#[derive(Debug, Clone, Copy)]
pub struct ObjNative {
    /// The host function
    pub function: NativeFn,
}

/// Class definition.
#[derive(Debug, Clone)]
pub struct ObjClass {
    /// Interned class name
    pub name: ObjRef,
    /// Method name to closure
    pub methods: Table,
}

impl ObjClass {
    /// A class with no methods
    pub fn new(name: ObjRef) -> Self {
        Self {
            name,
            methods: Table::new(),
        }
    }
}

/// Class instance.
#[derive(Debug, Clone)]
pub struct ObjInstance {
    /// The instance's class
    pub class: ObjRef,
    /// Field name to value
    pub fields: Table,
}

impl ObjInstance {
    /// An instance with no fields
    pub fn new(class: ObjRef) -> Self {
        Self {
            class,
            fields: Table::new(),
        }
    }
}

/// A method closure bound to its receiver.
#[derive(Debug, Clone, Copy)]
pub struct ObjBoundMethod {
    /// `this` inside the method
    pub receiver: Value,
    /// The method closure
    pub method: ObjRef,
}

/// Kind tag of a heap object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjType {
    /// [`ObjString`]
    String,
    /// [`ObjFunction`]
    Function,
    /// [`ObjClosure`]
    Closure,
    /// [`ObjUpvalue`]
    Upvalue,
    /// [`ObjNative`]
    Native,
    /// [`ObjClass`]
    Class,
    /// [`ObjInstance`]
    Instance,
    /// [`ObjBoundMethod`]
    BoundMethod,
}

/// A heap object.
#[derive(Debug, Clone)]
pub enum Obj {
    /// Interned string
    String(ObjString),
    /// Compiled function
    Function(ObjFunction),
    /// Closure
    Closure(ObjClosure),
    /// Captured variable
    Upvalue(ObjUpvalue),
    /// Host function
    Native(ObjNative),
    /// Class
    Class(ObjClass),
    /// Instance
    Instance(ObjInstance),
    /// Bound method
    BoundMethod(ObjBoundMethod),
}

impl Obj {
    /// Kind tag of this object
    pub fn obj_type(&self) -> ObjType {
        match self {
            Obj::String(_) => ObjType::String,
            Obj::Function(_) => ObjType::Function,
            Obj::Closure(_) => ObjType::Closure,
            Obj::Upvalue(_) => ObjType::Upvalue,
            Obj::Native(_) => ObjType::Native,
            Obj::Class(_) => ObjType::Class,
            Obj::Instance(_) => ObjType::Instance,
            Obj::BoundMethod(_) => ObjType::BoundMethod,
        }
    }

    /// Bytes charged to the collector's counter for this object.
    pub fn size_hint(&self) -> usize {
        let payload = match self {
            Obj::String(s) => s.len(),
            Obj::Function(f) => f.chunk.size_hint(),
            Obj::Closure(c) => c.upvalues.capacity() * size_of::<ObjRef>(),
            Obj::Class(c) => table_size(&c.methods),
            Obj::Instance(i) => table_size(&i.fields),
            Obj::Upvalue(_) | Obj::Native(_) | Obj::BoundMethod(_) => 0,
        };
        size_of::<Obj>() + payload
    }
}

/// Bytes charged per table entry.
pub const TABLE_ENTRY_SIZE: usize = size_of::<ObjRef>() + size_of::<Value>();

fn table_size(table: &Table) -> usize {
    table.len() * TABLE_ENTRY_SIZE
}
